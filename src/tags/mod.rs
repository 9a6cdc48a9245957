//! Tag Dictionary
//!
//! Global mapping from tag identifier to display text. Agents reference tags
//! by id only; text is resolved through the dictionary on every read, so an
//! edit to an entry shows up on every agent that carries it.

pub mod set;

use crate::error::RegistryError;
use crate::store::RegistryStore;
use crate::types::TagId;
use std::sync::Arc;

pub use set::TagSet;

#[derive(Clone)]
pub struct TagDictionary {
    store: Arc<dyn RegistryStore>,
}

impl TagDictionary {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    /// Text for `id`; empty when the id was never set
    pub fn text(&self, id: TagId) -> Result<String, RegistryError> {
        Ok(self.store.tag_text(id)?.unwrap_or_default())
    }

    /// Text for `id`, rejecting ids without a defined meaning
    pub fn defined_text(&self, id: TagId) -> Result<String, RegistryError> {
        let text = self.text(id)?;
        if text.is_empty() {
            return Err(RegistryError::UndefinedTag(id));
        }
        Ok(text)
    }

    /// Resolve a membership set in its enumeration order
    pub fn resolve(&self, members: &TagSet) -> Result<Vec<String>, RegistryError> {
        members.iter().map(|id| self.text(id)).collect()
    }
}

/// Pair up ids and texts of a dictionary write
pub fn pair_entries<'a>(
    ids: &'a [TagId],
    texts: &'a [String],
) -> Result<impl Iterator<Item = (TagId, &'a String)>, RegistryError> {
    if ids.is_empty() || ids.len() != texts.len() {
        return Err(RegistryError::MismatchedTagArrays {
            ids: ids.len(),
            texts: texts.len(),
        });
    }
    Ok(ids.iter().copied().zip(texts.iter()))
}
