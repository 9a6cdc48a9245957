//! Sled-backed store.
//!
//! One tree, prefixed keys, bincode values:
//! `profile/<uuid>`, `members/<uuid>`, `tag/<id>`, `role/<role>/<address>`,
//! `meta/lifecycle`. A commit is applied as one `sled::Batch`.

use super::{ChangeSet, RegistryStore, Write};
use crate::access::Role;
use crate::agent::profile::AgentRecord;
use crate::error::StorageError;
use crate::lifecycle::LifecycleState;
use crate::tags::TagSet;
use crate::types::{Address, AgentUuid, TagId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const LIFECYCLE_KEY: &str = "meta/lifecycle";

pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) a store at `path`
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)?;
        tracing::debug!(path = %path.display(), "Opened registry store");
        Ok(Self { db })
    }

    /// Store that is discarded when dropped
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    fn profile_key(uuid: &AgentUuid) -> String {
        format!("profile/{}", uuid.hyphenated())
    }

    fn members_key(uuid: &AgentUuid) -> String {
        format!("members/{}", uuid.hyphenated())
    }

    fn tag_key(id: TagId) -> String {
        format!("tag/{}", id)
    }

    fn role_key(role: Role, account: &Address) -> String {
        format!("role/{}/{}", role, account)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes).map_err(|e| StorageError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(value)?)
    }
}

impl RegistryStore for SledStore {
    fn profile(&self, uuid: &AgentUuid) -> Result<Option<AgentRecord>, StorageError> {
        self.read(&Self::profile_key(uuid))
    }

    fn members(&self, uuid: &AgentUuid) -> Result<TagSet, StorageError> {
        Ok(self.read(&Self::members_key(uuid))?.unwrap_or_default())
    }

    fn tag_text(&self, id: TagId) -> Result<Option<String>, StorageError> {
        self.read(&Self::tag_key(id))
    }

    fn has_role(&self, role: Role, account: &Address) -> Result<bool, StorageError> {
        Ok(self
            .db
            .contains_key(Self::role_key(role, account).as_bytes())?)
    }

    fn lifecycle(&self) -> Result<LifecycleState, StorageError> {
        Ok(self.read(LIFECYCLE_KEY)?.unwrap_or_default())
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), StorageError> {
        let mut batch = sled::Batch::default();
        for write in changes.into_writes() {
            match write {
                Write::Profile(uuid, record) => {
                    batch.insert(Self::profile_key(&uuid).as_bytes(), Self::encode(&record)?);
                }
                Write::Members(uuid, members) => {
                    batch.insert(Self::members_key(&uuid).as_bytes(), Self::encode(&members)?);
                }
                Write::TagText(id, text) => {
                    batch.insert(Self::tag_key(id).as_bytes(), Self::encode(&text)?);
                }
                Write::Role {
                    role,
                    account,
                    granted,
                } => {
                    let key = Self::role_key(role, &account);
                    if granted {
                        batch.insert(key.as_bytes(), Self::encode(&true)?);
                    } else {
                        batch.remove(key.as_bytes());
                    }
                }
                Write::Lifecycle(state) => {
                    batch.insert(LIFECYCLE_KEY.as_bytes(), Self::encode(&state)?);
                }
            }
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::profile::{AgentDetails, AgentStatus};
    use tempfile::TempDir;

    fn sample_record() -> AgentRecord {
        AgentRecord {
            status: AgentStatus::Active,
            details: AgentDetails {
                name: "someName".to_string(),
                base_url: "someBaseURL".to_string(),
                description: "someDescription".to_string(),
                version: 1,
                onchain_address: Address::from_low_u8(7),
            },
            registered_at: 1_700_000_000,
            updated_at: 1_700_000_000,
            balance_snapshot: 1_000_000_000_000_000_000,
        }
    }

    #[test]
    fn test_round_trip_through_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registry.sled");
        let uuid = AgentUuid::from_u128(1);
        let admin = Address::from_low_u8(1);

        {
            let store = SledStore::open(&path).unwrap();
            let mut changes = ChangeSet::new();
            changes.put_profile(uuid, sample_record());
            let mut members = TagSet::from(vec![0, 1, 2]);
            members.remove(0);
            changes.put_members(uuid, members);
            changes.put_tag_text(2, "TagTwo".to_string());
            changes.put_role(Role::Admin, admin, true);
            changes.put_lifecycle(LifecycleState {
                initialized: true,
                implementation: None,
            });
            store.commit(changes).unwrap();
        }

        let store = SledStore::open(&path).unwrap();
        assert_eq!(store.profile(&uuid).unwrap(), Some(sample_record()));
        assert_eq!(store.members(&uuid).unwrap().as_slice(), &[2, 1]);
        assert_eq!(store.tag_text(2).unwrap().as_deref(), Some("TagTwo"));
        assert!(store.tag_text(3).unwrap().is_none());
        assert!(store.has_role(Role::Admin, &admin).unwrap());
        assert!(!store.has_role(Role::Provider, &admin).unwrap());
        assert!(store.lifecycle().unwrap().initialized);
    }

    #[test]
    fn test_revoke_removes_role_key() {
        let store = SledStore::temporary().unwrap();
        let account = Address::from_low_u8(2);

        let mut grant = ChangeSet::new();
        grant.put_role(Role::Provider, account, true);
        store.commit(grant).unwrap();
        assert!(store.has_role(Role::Provider, &account).unwrap());

        let mut revoke = ChangeSet::new();
        revoke.put_role(Role::Provider, account, false);
        store.commit(revoke).unwrap();
        assert!(!store.has_role(Role::Provider, &account).unwrap());
    }

    #[test]
    fn test_corrupt_value_is_reported() {
        let store = SledStore::temporary().unwrap();
        let uuid = AgentUuid::from_u128(9);
        store
            .db
            .insert(SledStore::profile_key(&uuid).as_bytes(), vec![0xff])
            .unwrap();
        let err = store.profile(&uuid).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
