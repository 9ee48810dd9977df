//! Incoming-edge index.
//!
//! Only the [`Factory`](crate::Factory) writes to this index, from the same
//! code path that claims and releases parent edges.

use rustc_hash::FxHashMap;

use crate::model::id::NodeId;
use crate::model::kind::EdgeKind;

/// One `owner --edge--> target` entry, stored under its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IncomingEdge {
    pub owner: NodeId,
    pub edge: EdgeKind,
}

/// Map from target id to the edges pointing at it.
#[derive(Debug, Clone, Default)]
pub struct ReverseEdges {
    incoming: FxHashMap<NodeId, Vec<IncomingEdge>>,
    len: usize,
}

impl ReverseEdges {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, target: NodeId, owner: NodeId, edge: EdgeKind) {
        self.incoming
            .entry(target)
            .or_default()
            .push(IncomingEdge { owner, edge });
        self.len += 1;
    }

    /// Removes one matching entry. Returns false if none was present.
    pub(crate) fn remove(&mut self, target: NodeId, owner: NodeId, edge: EdgeKind) -> bool {
        let Some(list) = self.incoming.get_mut(&target) else {
            return false;
        };
        let Some(pos) = list.iter().position(|e| e.owner == owner && e.edge == edge) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.incoming.remove(&target);
        }
        self.len -= 1;
        true
    }

    /// Every edge pointing at `target`, in insertion order. Filtering does not
    /// hide entries.
    pub fn incoming(&self, target: NodeId) -> &[IncomingEdge] {
        self.incoming.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Owners pointing at `target` through `edge`.
    pub fn incoming_by(&self, target: NodeId, edge: EdgeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming(target)
            .iter()
            .filter(move |e| e.edge == edge)
            .map(|e| e.owner)
    }

    /// Number of entries for the exact triple. Multi edges may hold the same
    /// target more than once.
    pub fn count(&self, target: NodeId, owner: NodeId, edge: EdgeKind) -> usize {
        self.incoming(target)
            .iter()
            .filter(|e| e.owner == owner && e.edge == edge)
            .count()
    }

    pub fn contains(&self, target: NodeId, owner: NodeId, edge: EdgeKind) -> bool {
        self.count(target, owner, edge) > 0
    }

    /// Iterates `(target, entries)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[IncomingEdge])> {
        self.incoming.iter().map(|(t, list)| (*t, list.as_slice()))
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: EdgeKind = EdgeKind::BlockSyntaxStatements;

    #[test]
    fn test_insert_and_query() {
        let mut rev = ReverseEdges::new();
        rev.insert(NodeId(5), NodeId(2), E);
        rev.insert(NodeId(5), NodeId(3), EdgeKind::WhileStatementSyntaxStatement);
        assert_eq!(rev.len(), 2);
        assert_eq!(rev.incoming(NodeId(5)).len(), 2);
        let owners: Vec<_> = rev.incoming_by(NodeId(5), E).collect();
        assert_eq!(owners, [NodeId(2)]);
        assert!(rev.incoming(NodeId(9)).is_empty());
    }

    #[test]
    fn test_remove_one_duplicate() {
        let mut rev = ReverseEdges::new();
        rev.insert(NodeId(5), NodeId(2), E);
        rev.insert(NodeId(5), NodeId(2), E);
        assert_eq!(rev.count(NodeId(5), NodeId(2), E), 2);
        assert!(rev.remove(NodeId(5), NodeId(2), E));
        assert_eq!(rev.count(NodeId(5), NodeId(2), E), 1);
        assert!(rev.remove(NodeId(5), NodeId(2), E));
        assert!(!rev.remove(NodeId(5), NodeId(2), E));
        assert!(rev.is_empty());
        assert_eq!(rev.iter().count(), 0);
    }
}
