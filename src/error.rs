//! Error types for the identity registry.

use crate::access::Role;
use crate::types::{Address, AgentUuid, TagId};
use thiserror::Error;

/// Rejection of a single registry call. The registry is left unchanged.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Account {account} is missing role {role}")]
    Unauthorized { account: Address, role: Role },

    #[error("The nil identifier cannot be registered")]
    ZeroIdentifier,

    #[error("Agent already registered: {0}")]
    AlreadyRegistered(AgentUuid),

    #[error("Agent not found: {0}")]
    AgentNotFound(AgentUuid),

    #[error("Tag arrays must be non-empty and of equal length (ids: {ids}, texts: {texts})")]
    MismatchedTagArrays { ids: usize, texts: usize },

    #[error("Tag {0} has no dictionary text")]
    UndefinedTag(TagId),

    #[error("Registry already initialized")]
    AlreadyInitialized,

    #[error("Timestamp of agent {0} cannot advance past the maximum")]
    TimestampOverflow(AgentUuid),

    #[error("Upgrade rejected: {0}")]
    Upgrade(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RegistryError {
    /// Stable taxonomy name of the rejection
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::Unauthorized { .. } => "Unauthorized",
            RegistryError::ZeroIdentifier => "ZeroIdentifier",
            RegistryError::AlreadyRegistered(_) => "AlreadyRegistered",
            RegistryError::AgentNotFound(_) => "AgentNotFound",
            RegistryError::MismatchedTagArrays { .. } => "MismatchedTagArrays",
            RegistryError::UndefinedTag(_) => "UndefinedTag",
            RegistryError::AlreadyInitialized => "AlreadyInitialized",
            RegistryError::TimestampOverflow(_) => "TimestampOverflow",
            RegistryError::Upgrade(_) => "UpgradeRejected",
            RegistryError::Storage(_) => "Storage",
        }
    }
}

/// Persistence failures of the backing store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Corrupt record under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors surfaced by configuration, logging and CLI plumbing
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
