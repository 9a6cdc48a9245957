//! Agent registry: profile lifecycle, tag dictionary writes and tag toggles.
//!
//! Every mutating call holds the state lock exclusively: the caller's role is
//! checked first, the call stages its writes and notifications, and only a
//! fully successful call is committed to the store and announced to the event
//! sink. Public reads hold the lock shared for their whole duration, so a read
//! never observes part of a commit.

use crate::access::{Role, RoleGate, RoleMembership};
use crate::agent::profile::{AgentDetails, AgentProfile, AgentRecord, AgentStatus};
use crate::error::{RegistryError, StorageError};
use crate::events::{EventSink, RegistryEvent, TracingEventSink};
use crate::ledger::{BalanceOracle, Clock, StaticBalances, SystemClock};
use crate::lifecycle::{NoopUpgrade, UpgradeHandler};
use crate::store::{ChangeSet, RegistryStore};
use crate::tags::{pair_entries, TagDictionary};
use crate::types::{Address, AgentUuid, TagId, Timestamp};
use parking_lot::RwLock;
use std::sync::Arc;

pub const CONTRACT_NAME: &str = "IdentityRegistry";

/// Writes and notifications staged by a call that has not committed yet
#[derive(Debug, Default)]
pub(crate) struct PendingCall {
    pub(crate) changes: ChangeSet,
    pub(crate) events: Vec<RegistryEvent>,
}

impl PendingCall {
    pub(crate) fn emit(&mut self, event: RegistryEvent) {
        self.events.push(event);
    }
}

/// Role lookups answered by the registry's own store
struct StoredRoles {
    store: Arc<dyn RegistryStore>,
}

impl RoleMembership for StoredRoles {
    fn has_role(&self, role: Role, account: &Address) -> Result<bool, RegistryError> {
        Ok(self.store.has_role(role, account)?)
    }
}

pub struct IdentityRegistry {
    pub(crate) store: Arc<dyn RegistryStore>,
    pub(crate) gate: RoleGate,
    pub(crate) dictionary: TagDictionary,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) balances: Arc<dyn BalanceOracle>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) upgrades: Arc<dyn UpgradeHandler>,
    state_lock: RwLock<()>,
}

/// Wires collaborators into an [`IdentityRegistry`]
pub struct RegistryBuilder {
    store: Arc<dyn RegistryStore>,
    roles: Option<Arc<dyn RoleMembership>>,
    clock: Arc<dyn Clock>,
    balances: Arc<dyn BalanceOracle>,
    events: Arc<dyn EventSink>,
    upgrades: Arc<dyn UpgradeHandler>,
}

impl RegistryBuilder {
    /// Replace the store-backed role lookup. Role grants made through the
    /// registry are still written to the store.
    pub fn roles(mut self, roles: Arc<dyn RoleMembership>) -> Self {
        self.roles = Some(roles);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn balances(mut self, balances: Arc<dyn BalanceOracle>) -> Self {
        self.balances = balances;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn upgrades(mut self, upgrades: Arc<dyn UpgradeHandler>) -> Self {
        self.upgrades = upgrades;
        self
    }

    pub fn build(self) -> IdentityRegistry {
        let roles = self.roles.unwrap_or_else(|| {
            Arc::new(StoredRoles {
                store: self.store.clone(),
            })
        });
        IdentityRegistry {
            dictionary: TagDictionary::new(self.store.clone()),
            gate: RoleGate::new(roles),
            store: self.store,
            clock: self.clock,
            balances: self.balances,
            events: self.events,
            upgrades: self.upgrades,
            state_lock: RwLock::new(()),
        }
    }
}

impl IdentityRegistry {
    pub fn builder(store: Arc<dyn RegistryStore>) -> RegistryBuilder {
        RegistryBuilder {
            store,
            roles: None,
            clock: Arc::new(SystemClock),
            balances: Arc::new(StaticBalances::new()),
            events: Arc::new(TracingEventSink),
            upgrades: Arc::new(NoopUpgrade),
        }
    }

    pub fn contract_name(&self) -> &'static str {
        CONTRACT_NAME
    }

    /// Run one mutating call as an all-or-nothing unit.
    ///
    /// Returns the notifications the call emitted.
    pub(crate) fn execute<F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<Vec<RegistryEvent>, RegistryError>
    where
        F: FnOnce(&mut PendingCall) -> Result<(), RegistryError>,
    {
        let _guard = self.state_lock.write();
        let mut pending = PendingCall::default();

        if let Err(err) = call(&mut pending) {
            tracing::debug!(operation, code = err.code(), error = %err, "Call rejected");
            return Err(err);
        }

        let writes = pending.changes.len();
        if !pending.changes.is_empty() {
            if let Err(err) = self.store.commit(pending.changes) {
                tracing::warn!(operation, error = %err, "Commit failed; call rejected");
                return Err(err.into());
            }
        }
        for event in &pending.events {
            self.events.emit(event);
        }
        tracing::info!(operation, writes, events = pending.events.len(), "Call committed");
        Ok(pending.events)
    }

    /// Shared hold on the state lock for multi-key reads
    pub(crate) fn read_guard(&self) -> parking_lot::RwLockReadGuard<'_, ()> {
        self.state_lock.read()
    }

    fn record(&self, uuid: &AgentUuid) -> Result<AgentRecord, StorageError> {
        Ok(self.store.profile(uuid)?.unwrap_or_default())
    }

    fn active_record(&self, uuid: &AgentUuid) -> Result<AgentRecord, RegistryError> {
        let record = self.record(uuid)?;
        if record.status != AgentStatus::Active {
            return Err(RegistryError::AgentNotFound(*uuid));
        }
        Ok(record)
    }

    /// Create the profile for `uuid`.
    pub fn register(
        &self,
        caller: &Address,
        uuid: AgentUuid,
        details: AgentDetails,
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("register", |pending| {
            self.gate.require_role(caller, Role::Provider)?;
            if uuid.is_nil() {
                return Err(RegistryError::ZeroIdentifier);
            }
            if self.record(&uuid)?.is_registered() {
                return Err(RegistryError::AlreadyRegistered(uuid));
            }

            // Zero is the "never registered" marker, so the stamp is at least 1
            let now: Timestamp = self.clock.now().max(1);
            let record = AgentRecord {
                status: AgentStatus::Active,
                balance_snapshot: self.balances.balance_of(&details.onchain_address),
                details: details.clone(),
                registered_at: now,
                updated_at: now,
            };

            pending.changes.put_profile(uuid, record);
            pending.emit(RegistryEvent::AgentRegistered {
                uuid,
                name: details.name,
                base_url: details.base_url,
                description: details.description,
                version: details.version,
                onchain_address: details.onchain_address,
            });
            Ok(())
        })
    }

    /// Overwrite the caller-supplied fields of an active profile.
    pub fn update(
        &self,
        caller: &Address,
        uuid: AgentUuid,
        details: AgentDetails,
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("update", |pending| {
            self.gate.require_role(caller, Role::Provider)?;
            let mut record = self.active_record(&uuid)?;

            let now = self.clock.now();
            let floor = record
                .updated_at
                .checked_add(1)
                .ok_or(RegistryError::TimestampOverflow(uuid))?;
            let next = now.max(floor);
            if next != now {
                tracing::debug!(%uuid, now, updated_at = next, "Clock did not advance; bumping updated_at");
            }

            record.balance_snapshot = self.balances.balance_of(&details.onchain_address);
            record.details = details.clone();
            record.updated_at = next;

            pending.changes.put_profile(uuid, record);
            pending.emit(RegistryEvent::AgentUpdated {
                uuid,
                name: details.name,
                base_url: details.base_url,
                description: details.description,
                version: details.version,
                onchain_address: details.onchain_address,
            });
            Ok(())
        })
    }

    /// Profile view of `uuid`; never-registered ids read as the zero profile.
    pub fn get_profile(&self, uuid: &AgentUuid) -> Result<AgentProfile, RegistryError> {
        let _guard = self.state_lock.read();
        let record = self.record(uuid)?;
        let members = self.store.members(uuid)?;
        let tags = self.dictionary.resolve(&members)?;
        Ok(AgentProfile::from_record(record, tags))
    }

    /// Write dictionary entries pairwise, in input order.
    pub fn set_tag(
        &self,
        caller: &Address,
        ids: &[TagId],
        texts: &[String],
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("set_tag", |pending| {
            self.gate.require_role(caller, Role::Provider)?;
            for (id, text) in pair_entries(ids, texts)? {
                pending.changes.put_tag_text(id, text.clone());
                pending.emit(RegistryEvent::AgentTagSet {
                    id,
                    text: text.clone(),
                });
            }
            Ok(())
        })
    }

    pub fn get_tag_text(&self, id: TagId) -> Result<String, RegistryError> {
        let _guard = self.state_lock.read();
        self.dictionary.text(id)
    }

    /// Toggle each id in the agent's membership set, in input order.
    ///
    /// An id that appears twice flips twice. Any undefined id rejects the
    /// whole batch.
    pub fn update_tags(
        &self,
        caller: &Address,
        uuid: AgentUuid,
        ids: &[TagId],
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("update_tags", |pending| {
            self.gate.require_role(caller, Role::Provider)?;
            self.active_record(&uuid)?;

            let mut members = self.store.members(&uuid)?;
            for &id in ids {
                let text = self.dictionary.defined_text(id)?;
                let active = members.toggle(id);
                pending.emit(RegistryEvent::AgentTagUpdated {
                    uuid,
                    id,
                    text,
                    active,
                });
            }
            pending.changes.put_members(uuid, members);
            Ok(())
        })
    }

    /// Tag ids of `uuid` in enumeration order
    pub fn tag_ids(&self, uuid: &AgentUuid) -> Result<Vec<TagId>, RegistryError> {
        let _guard = self.state_lock.read();
        Ok(self.store.members(uuid)?.as_slice().to_vec())
    }

    pub fn has_tag(&self, uuid: &AgentUuid, id: TagId) -> Result<bool, RegistryError> {
        let _guard = self.state_lock.read();
        Ok(self.store.members(uuid)?.contains(id))
    }

    pub fn has_role(&self, role: Role, account: &Address) -> Result<bool, RegistryError> {
        let _guard = self.state_lock.read();
        self.gate.has_role(role, account)
    }

    /// Grant `role` to `account`. Requires the role's admin role.
    pub fn grant_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("grant_role", |pending| {
            self.gate.require_role(caller, role.admin_role())?;
            if !self.store.has_role(role, &account)? {
                pending.changes.put_role(role, account, true);
                pending.emit(RegistryEvent::RoleGranted {
                    role,
                    account,
                    sender: *caller,
                });
            }
            Ok(())
        })
    }

    /// Revoke `role` from `account`. Requires the role's admin role.
    pub fn revoke_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("revoke_role", |pending| {
            self.gate.require_role(caller, role.admin_role())?;
            self.stage_revoke(pending, caller, role, account)
        })
    }

    /// Drop `role` from the caller itself.
    pub fn renounce_role(
        &self,
        caller: &Address,
        role: Role,
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("renounce_role", |pending| {
            self.stage_revoke(pending, caller, role, *caller)
        })
    }

    fn stage_revoke(
        &self,
        pending: &mut PendingCall,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<(), RegistryError> {
        if self.store.has_role(role, &account)? {
            pending.changes.put_role(role, account, false);
            pending.emit(RegistryEvent::RoleRevoked {
                role,
                account,
                sender: *caller,
            });
        }
        Ok(())
    }
}
