//! In-process store backed by hash maps behind a single lock.

use super::{ChangeSet, RegistryStore, Write};
use crate::access::Role;
use crate::agent::profile::AgentRecord;
use crate::error::StorageError;
use crate::lifecycle::LifecycleState;
use crate::tags::TagSet;
use crate::types::{Address, AgentUuid, TagId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<AgentUuid, AgentRecord>,
    members: HashMap<AgentUuid, TagSet>,
    tags: HashMap<TagId, String>,
    roles: HashSet<(Role, Address)>,
    lifecycle: LifecycleState,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for MemoryStore {
    fn profile(&self, uuid: &AgentUuid) -> Result<Option<AgentRecord>, StorageError> {
        Ok(self.state.read().profiles.get(uuid).cloned())
    }

    fn members(&self, uuid: &AgentUuid) -> Result<TagSet, StorageError> {
        Ok(self
            .state
            .read()
            .members
            .get(uuid)
            .cloned()
            .unwrap_or_default())
    }

    fn tag_text(&self, id: TagId) -> Result<Option<String>, StorageError> {
        Ok(self.state.read().tags.get(&id).cloned())
    }

    fn has_role(&self, role: Role, account: &Address) -> Result<bool, StorageError> {
        Ok(self.state.read().roles.contains(&(role, *account)))
    }

    fn lifecycle(&self) -> Result<LifecycleState, StorageError> {
        Ok(self.state.read().lifecycle.clone())
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), StorageError> {
        let mut state = self.state.write();
        for write in changes.into_writes() {
            match write {
                Write::Profile(uuid, record) => {
                    state.profiles.insert(uuid, record);
                }
                Write::Members(uuid, members) => {
                    state.members.insert(uuid, members);
                }
                Write::TagText(id, text) => {
                    state.tags.insert(id, text);
                }
                Write::Role {
                    role,
                    account,
                    granted,
                } => {
                    if granted {
                        state.roles.insert((role, account));
                    } else {
                        state.roles.remove(&(role, account));
                    }
                }
                Write::Lifecycle(lifecycle) => {
                    state.lifecycle = lifecycle;
                }
            }
        }
        Ok(())
    }
}
