//! Soft-delete state.

use rustc_hash::FxHashSet;

use crate::model::id::NodeId;

/// Set of filtered node ids plus a global switch. While the switch is off
/// no node reports as filtered, but the set is kept.
#[derive(Debug, Clone)]
pub struct Filter {
    filtered: FxHashSet<NodeId>,
    enabled: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            filtered: FxHashSet::default(),
            enabled: true,
        }
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `id` is filtered and filtering is on.
    pub fn is_filtered(&self, id: NodeId) -> bool {
        self.enabled && self.filtered.contains(&id)
    }

    /// Returns true if `id` is in the set, regardless of the switch.
    pub fn is_marked(&self, id: NodeId) -> bool {
        self.filtered.contains(&id)
    }

    /// Returns true if the id was newly added.
    pub fn insert(&mut self, id: NodeId) -> bool {
        self.filtered.insert(id)
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        self.filtered.remove(&id)
    }

    pub fn clear(&mut self) {
        self.filtered.clear();
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
