//! Agent Registry
//!
//! Agent profiles keyed by caller-chosen UUID: created once by a provider,
//! updated in place afterwards, never removed.

pub mod profile;
pub mod registry;

pub use profile::{AgentDetails, AgentProfile, AgentRecord, AgentStatus};
pub use registry::{IdentityRegistry, RegistryBuilder, CONTRACT_NAME};
