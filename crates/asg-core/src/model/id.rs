//! Node and string identifiers.
//!
//! Nodes refer to each other only by [`NodeId`], never by reference, so a
//! graph can be written out and read back without pointer fix-up.

use std::fmt;

/// Opaque handle to a node within one [`Factory`](crate::Factory).
///
/// `0` means "no node". `1` is the legacy filtered sentinel and is never
/// handed out by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The "no node" id.
    pub const NONE: NodeId = NodeId(0);

    /// Returned by legacy getters in place of a filtered target.
    pub const FILTERED: NodeId = NodeId(1);

    /// Returns true for the "no node" id.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns the id as a container index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of an interned string in a [`StringTable`](crate::StringTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Key(pub u32);

impl Key {
    /// Key of the empty string, present in every table.
    pub const EMPTY: Key = Key(0);
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a single-valued edge getter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeTarget {
    /// The edge points to a visible node.
    Node(NodeId),
    /// The edge points to a node that is currently filtered.
    Filtered,
    /// The edge is unset.
    Absent,
}

impl EdgeTarget {
    /// Returns the target id if it is visible.
    pub fn node(self) -> Option<NodeId> {
        match self {
            EdgeTarget::Node(id) => Some(id),
            EdgeTarget::Filtered | EdgeTarget::Absent => None,
        }
    }

    /// Returns true if the edge is unset.
    pub fn is_absent(self) -> bool {
        matches!(self, EdgeTarget::Absent)
    }

    /// Returns true if the edge points to a filtered node.
    pub fn is_filtered(self) -> bool {
        matches!(self, EdgeTarget::Filtered)
    }

    /// Collapses the result onto a plain id: `0` when unset, `1` when
    /// filtered, the real id otherwise.
    pub fn to_legacy(self) -> NodeId {
        match self {
            EdgeTarget::Node(id) => id,
            EdgeTarget::Filtered => NodeId::FILTERED,
            EdgeTarget::Absent => NodeId::NONE,
        }
    }
}
