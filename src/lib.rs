//! Identity Registry: role-gated agent identity records
//!
//! Providers register and update agent profiles keyed by caller-chosen UUIDs,
//! maintain a global tag dictionary, and toggle per-agent tag membership.
//! Every mutating call is role-checked and applied all-or-nothing.

pub mod access;
pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod logging;
pub mod store;
pub mod tags;
pub mod tooling;
pub mod types;

pub use access::{Role, RoleGate, RoleMembership};
pub use agent::{AgentDetails, AgentProfile, AgentStatus, IdentityRegistry};
pub use error::{ApiError, RegistryError, StorageError};
pub use events::{EventSink, RegistryEvent};
pub use tags::{TagDictionary, TagSet};
pub use types::{Address, AgentUuid, TagId};
