//! Role Gate
//!
//! Authorization tiers of the registry and the check every mutating call
//! performs before anything else. Role membership itself is owned by a
//! collaborator behind the [`RoleMembership`] trait.

use crate::error::RegistryError;
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Authorization tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Controls initialization, upgrades and role administration
    Admin,
    /// Controls every registry-mutating call
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Provider => "provider",
        }
    }

    /// Role whose holders may grant and revoke this role
    pub fn admin_role(&self) -> Role {
        Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "provider" => Ok(Role::Provider),
            other => Err(format!("Invalid role: {}. Must be admin or provider", other)),
        }
    }
}

/// Role-membership collaborator
pub trait RoleMembership: Send + Sync {
    fn has_role(&self, role: Role, account: &Address) -> Result<bool, RegistryError>;
}

/// Answers "does caller hold role R" and rejects the call otherwise
#[derive(Clone)]
pub struct RoleGate {
    membership: Arc<dyn RoleMembership>,
}

impl RoleGate {
    pub fn new(membership: Arc<dyn RoleMembership>) -> Self {
        Self { membership }
    }

    pub fn has_role(&self, role: Role, account: &Address) -> Result<bool, RegistryError> {
        self.membership.has_role(role, account)
    }

    pub fn require_role(&self, caller: &Address, role: Role) -> Result<(), RegistryError> {
        if self.membership.has_role(role, caller)? {
            Ok(())
        } else {
            tracing::debug!(caller = %caller, role = %role, "Rejected call: missing role");
            Err(RegistryError::Unauthorized {
                account: *caller,
                role,
            })
        }
    }
}
