//! Per-agent tag membership set.
//!
//! Ordered list plus a position index: O(1) add, remove and contains. Removal
//! swaps the last element into the vacated slot, so enumeration order reflects
//! removal history, not insertion order.

use crate::types::TagId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TagId>", into = "Vec<TagId>")]
pub struct TagSet {
    values: Vec<TagId>,
    positions: HashMap<TagId, usize>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: TagId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current enumeration order
    pub fn as_slice(&self) -> &[TagId] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = TagId> + '_ {
        self.values.iter().copied()
    }

    /// Append `id`; returns false if it was already a member.
    pub fn insert(&mut self, id: TagId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id, self.values.len());
        self.values.push(id);
        true
    }

    /// Swap-remove `id`; returns false if it was not a member.
    pub fn remove(&mut self, id: TagId) -> bool {
        let Some(position) = self.positions.remove(&id) else {
            return false;
        };
        let last = self.values.len() - 1;
        if position != last {
            let moved = self.values[last];
            self.values[position] = moved;
            self.positions.insert(moved, position);
        }
        self.values.pop();
        true
    }

    /// Flip membership of `id`; returns true if it is a member afterwards.
    pub fn toggle(&mut self, id: TagId) -> bool {
        if self.remove(id) {
            false
        } else {
            self.insert(id)
        }
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for TagSet {}

impl From<Vec<TagId>> for TagSet {
    fn from(values: Vec<TagId>) -> Self {
        let mut set = TagSet::new();
        for id in values {
            set.insert(id);
        }
        set
    }
}

impl From<TagSet> for Vec<TagId> {
    fn from(set: TagSet) -> Self {
        set.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn index_is_consistent(set: &TagSet) -> bool {
        set.positions.len() == set.values.len()
            && set
                .values
                .iter()
                .enumerate()
                .all(|(i, id)| set.positions.get(id) == Some(&i))
    }

    #[test]
    fn test_insert_appends_in_order() {
        let mut set = TagSet::new();
        assert!(set.insert(5));
        assert!(set.insert(1));
        assert!(set.insert(9));
        assert!(!set.insert(1));
        assert_eq!(set.as_slice(), &[5, 1, 9]);
        assert!(set.contains(9));
        assert!(!set.contains(2));
    }

    #[test]
    fn test_remove_swaps_last_into_hole() {
        let mut set = TagSet::from(vec![0, 1, 2, 3]);
        assert!(set.remove(0));
        assert_eq!(set.as_slice(), &[3, 1, 2]);
        assert!(set.remove(1));
        assert_eq!(set.as_slice(), &[3, 2]);
        assert!(!set.remove(7));
        assert!(index_is_consistent(&set));
    }

    #[test]
    fn test_remove_last_element() {
        let mut set = TagSet::from(vec![4, 8]);
        assert!(set.remove(8));
        assert_eq!(set.as_slice(), &[4]);
        assert!(set.remove(4));
        assert!(set.is_empty());
        assert!(index_is_consistent(&set));
    }

    #[test]
    fn test_toggle_scenario() {
        let mut set = TagSet::new();
        assert!(set.toggle(0));
        assert_eq!(set.as_slice(), &[0]);

        assert!(!set.toggle(0));
        assert!(set.toggle(1));
        assert!(set.toggle(2));
        assert_eq!(set.as_slice(), &[1, 2]);

        assert!(!set.toggle(2));
        assert_eq!(set.as_slice(), &[1]);
        assert!(set.toggle(2));
        assert_eq!(set.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_from_vec_drops_duplicates() {
        let set = TagSet::from(vec![3, 3, 1, 3]);
        assert_eq!(set.as_slice(), &[3, 1]);
        assert!(index_is_consistent(&set));
    }

    #[test]
    fn test_serde_keeps_order_and_rebuilds_index() {
        let mut set = TagSet::from(vec![10, 20, 30]);
        set.remove(10);
        let bytes = bincode::serialize(&set).unwrap();
        let restored: TagSet = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.as_slice(), &[30, 20]);
        assert!(index_is_consistent(&restored));
        assert!(restored.contains(20));
    }

    proptest! {
        #[test]
        fn prop_index_consistent_after_toggles(ids in proptest::collection::vec(0u64..16, 0..64)) {
            let mut set = TagSet::new();
            for id in ids {
                set.toggle(id);
                prop_assert!(index_is_consistent(&set));
            }
        }

        #[test]
        fn prop_double_toggle_restores_membership(
            seed in proptest::collection::vec(0u64..16, 0..32),
            id in 0u64..16,
        ) {
            let mut set = TagSet::from(seed);
            let before: std::collections::HashSet<TagId> = set.iter().collect();
            let first = set.toggle(id);
            let second = set.toggle(id);
            prop_assert_ne!(first, second);
            let after: std::collections::HashSet<TagId> = set.iter().collect();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_membership_matches_parity(ids in proptest::collection::vec(0u64..8, 0..48)) {
            let mut set = TagSet::new();
            for id in &ids {
                set.toggle(*id);
            }
            for id in 0u64..8 {
                let flips = ids.iter().filter(|x| **x == id).count();
                prop_assert_eq!(set.contains(id), flips % 2 == 1);
            }
        }
    }
}
