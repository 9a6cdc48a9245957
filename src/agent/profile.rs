//! Agent profile record and its read view.

use crate::types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an agent record.
///
/// Discriminant 1 is reserved; no transition leads to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AgentStatus {
    #[default]
    Unregistered = 0,
    Active = 2,
}

impl AgentStatus {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Caller-supplied fields shared by register and update
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentDetails {
    pub name: String,
    pub base_url: String,
    pub description: String,
    /// Opaque to the registry; no ordering is enforced
    pub version: u64,
    pub onchain_address: Address,
}

/// Stored form of an agent profile. Tags live in a separate membership set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentRecord {
    pub status: AgentStatus,
    pub details: AgentDetails,
    pub registered_at: Timestamp,
    pub updated_at: Timestamp,
    /// Balance of `details.onchain_address` when the record was last written
    pub balance_snapshot: Amount,
}

impl AgentRecord {
    pub fn is_registered(&self) -> bool {
        self.registered_at > 0
    }
}

/// Read view of an agent with tag texts resolved through the dictionary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    pub status: AgentStatus,
    pub name: String,
    pub base_url: String,
    pub description: String,
    pub version: u64,
    pub registered_at: Timestamp,
    pub updated_at: Timestamp,
    pub onchain_address: Address,
    pub balance_snapshot: Amount,
    pub tags: Vec<String>,
}

impl AgentProfile {
    pub fn from_record(record: AgentRecord, tags: Vec<String>) -> Self {
        let AgentRecord {
            status,
            details,
            registered_at,
            updated_at,
            balance_snapshot,
        } = record;
        Self {
            status,
            name: details.name,
            base_url: details.base_url,
            description: details.description,
            version: details.version,
            registered_at,
            updated_at,
            onchain_address: details.onchain_address,
            balance_snapshot,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AgentStatus::Unregistered.code(), 0);
        assert_eq!(AgentStatus::Active.code(), 2);
        assert_eq!(AgentStatus::default(), AgentStatus::Unregistered);
    }

    #[test]
    fn test_default_record_is_unregistered() {
        let record = AgentRecord::default();
        assert!(!record.is_registered());
        assert_eq!(record.status, AgentStatus::Unregistered);
        assert!(record.details.onchain_address.is_zero());
    }

    #[test]
    fn test_profile_from_record() {
        let record = AgentRecord {
            status: AgentStatus::Active,
            details: AgentDetails {
                name: "n".to_string(),
                base_url: "b".to_string(),
                description: "d".to_string(),
                version: 3,
                onchain_address: Address::from_low_u8(4),
            },
            registered_at: 10,
            updated_at: 11,
            balance_snapshot: 99,
        };
        let profile = AgentProfile::from_record(record, vec!["t".to_string()]);
        assert_eq!(profile.name, "n");
        assert_eq!(profile.version, 3);
        assert_eq!(profile.updated_at, 11);
        assert_eq!(profile.balance_snapshot, 99);
        assert_eq!(profile.tags, vec!["t".to_string()]);
    }
}
