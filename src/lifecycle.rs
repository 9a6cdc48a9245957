//! Lifecycle Guard
//!
//! One-time initialization of a registry instance and the admin-gated upgrade
//! entry point. The registry does not replace its own code; an upgrade hands
//! the new implementation to an [`UpgradeHandler`] and records it.

use crate::access::Role;
use crate::agent::registry::IdentityRegistry;
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleState {
    pub initialized: bool,
    /// Implementation installed by the most recent upgrade
    pub implementation: Option<Address>,
}

/// Upgrade collaborator.
///
/// `upgrade` runs while the call is still staged, before the new
/// implementation is recorded. An `Err` rejects the call with nothing
/// written. If recording then fails, the call is rejected with a storage
/// error and `implementation()` keeps reporting the previous address; the
/// handler must not treat its own `Ok` as proof of installation.
pub trait UpgradeHandler: Send + Sync {
    fn upgrade(&self, implementation: &Address, init_call: &[u8]) -> Result<(), String>;
}

/// Accepts every upgrade without doing anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUpgrade;

impl UpgradeHandler for NoopUpgrade {
    fn upgrade(&self, implementation: &Address, init_call: &[u8]) -> Result<(), String> {
        tracing::info!(
            implementation = %implementation,
            init_call_len = init_call.len(),
            "Upgrade accepted (no-op)"
        );
        Ok(())
    }
}

impl IdentityRegistry {
    /// Grant the admin role to `admin`. Callable once per instance.
    pub fn initialize(&self, admin: Address) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("initialize", |pending| {
            let mut state = self.store.lifecycle()?;
            if state.initialized {
                return Err(RegistryError::AlreadyInitialized);
            }
            state.initialized = true;
            pending.changes.put_lifecycle(state);
            pending.changes.put_role(Role::Admin, admin, true);
            pending.emit(RegistryEvent::RoleGranted {
                role: Role::Admin,
                account: admin,
                sender: admin,
            });
            pending.emit(RegistryEvent::Initialized { admin });
            Ok(())
        })
    }

    pub fn is_initialized(&self) -> Result<bool, RegistryError> {
        let _guard = self.read_guard();
        Ok(self.store.lifecycle()?.initialized)
    }

    /// Hand `implementation` to the upgrade collaborator. Admin only.
    pub fn upgrade_to(
        &self,
        caller: &Address,
        implementation: Address,
        init_call: &[u8],
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        self.execute("upgrade_to", |pending| {
            self.gate.require_role(caller, Role::Admin)?;
            let mut state = self.store.lifecycle()?;
            self.upgrades
                .upgrade(&implementation, init_call)
                .map_err(RegistryError::Upgrade)?;
            state.implementation = Some(implementation);
            pending.changes.put_lifecycle(state);
            pending.emit(RegistryEvent::Upgraded { implementation });
            Ok(())
        })
    }

    pub fn implementation(&self) -> Result<Option<Address>, RegistryError> {
        let _guard = self.read_guard();
        Ok(self.store.lifecycle()?.implementation)
    }
}
