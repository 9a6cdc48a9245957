//! Registry Store
//!
//! Keyed storage for profiles, membership sets, dictionary entries, role
//! grants and lifecycle state. Every successful call is written as one
//! [`ChangeSet`] that the store applies all-or-nothing.

pub mod memory;
pub mod persistence;

use crate::access::Role;
use crate::agent::profile::AgentRecord;
use crate::error::StorageError;
use crate::lifecycle::LifecycleState;
use crate::tags::TagSet;
use crate::types::{Address, AgentUuid, TagId};

pub use memory::MemoryStore;
pub use persistence::SledStore;

/// Single keyed write
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Profile(AgentUuid, AgentRecord),
    Members(AgentUuid, TagSet),
    TagText(TagId, String),
    Role {
        role: Role,
        account: Address,
        granted: bool,
    },
    Lifecycle(LifecycleState),
}

/// Ordered write set of one call; later writes to the same key win
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    writes: Vec<Write>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_profile(&mut self, uuid: AgentUuid, record: AgentRecord) {
        self.writes.push(Write::Profile(uuid, record));
    }

    pub fn put_members(&mut self, uuid: AgentUuid, members: TagSet) {
        self.writes.push(Write::Members(uuid, members));
    }

    pub fn put_tag_text(&mut self, id: TagId, text: String) {
        self.writes.push(Write::TagText(id, text));
    }

    pub fn put_role(&mut self, role: Role, account: Address, granted: bool) {
        self.writes.push(Write::Role {
            role,
            account,
            granted,
        });
    }

    pub fn put_lifecycle(&mut self, state: LifecycleState) {
        self.writes.push(Write::Lifecycle(state));
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Storage port of the registry
pub trait RegistryStore: Send + Sync {
    fn profile(&self, uuid: &AgentUuid) -> Result<Option<AgentRecord>, StorageError>;
    fn members(&self, uuid: &AgentUuid) -> Result<TagSet, StorageError>;
    fn tag_text(&self, id: TagId) -> Result<Option<String>, StorageError>;
    fn has_role(&self, role: Role, account: &Address) -> Result<bool, StorageError>;
    fn lifecycle(&self) -> Result<LifecycleState, StorageError>;
    /// Apply every write or none of them
    fn commit(&self, changes: ChangeSet) -> Result<(), StorageError>;
}
