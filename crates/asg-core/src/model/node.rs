//! Node storage.
//!
//! A node keeps its attribute values and edge slots in the flattened layout
//! order of its kind, so encoding is a straight walk over both vectors.

use crate::model::id::{Key, NodeId};
use crate::model::kind::{EdgeKind, NodeKind};
use crate::model::schema::{AttrType, Multiplicity};

/// A stored attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Bool(bool),
    UByte(u8),
    UInt(u32),
    Str(Key),
}

impl AttrValue {
    /// Returns the storage type of this value.
    pub fn ty(&self) -> AttrType {
        match self {
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::UByte(_) => AttrType::UByte,
            AttrValue::UInt(_) => AttrType::UInt,
            AttrValue::Str(_) => AttrType::Str,
        }
    }

    /// The value a freshly allocated node holds: zero, false, or the empty string.
    pub fn default_for(ty: AttrType) -> Self {
        match ty {
            AttrType::Bool => AttrValue::Bool(false),
            AttrType::UByte => AttrValue::UByte(0),
            AttrType::UInt => AttrValue::UInt(0),
            AttrType::Str => AttrValue::Str(Key::EMPTY),
        }
    }
}

/// Storage of one owned edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeSlot {
    /// `NodeId::NONE` when unset.
    Single(NodeId),
    /// Ordered targets; duplicates allowed.
    Multi(Vec<NodeId>),
}

impl EdgeSlot {
    pub(crate) fn empty(multiplicity: Multiplicity) -> Self {
        match multiplicity {
            Multiplicity::Single => EdgeSlot::Single(NodeId::NONE),
            Multiplicity::Multi => EdgeSlot::Multi(Vec::new()),
        }
    }

    /// Returns the stored targets, unset single edges yielding nothing.
    pub fn targets(&self) -> &[NodeId] {
        match self {
            EdgeSlot::Single(id) if id.is_none() => &[],
            EdgeSlot::Single(id) => std::slice::from_ref(id),
            EdgeSlot::Multi(ids) => ids,
        }
    }

    pub fn contains(&self, target: NodeId) -> bool {
        self.targets().contains(&target)
    }
}

/// The owner edge currently claiming a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentEdge {
    pub owner: NodeId,
    pub edge: EdgeKind,
}

/// A node in a [`Factory`](crate::Factory).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    pub(crate) attributes: Vec<AttrValue>,
    pub(crate) edges: Vec<EdgeSlot>,
    pub(crate) parent: Option<ParentEdge>,
}

impl Node {
    /// Creates a node with every attribute defaulted and every edge empty.
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        let layout = kind.layout();
        Node {
            id,
            kind,
            attributes: layout
                .attributes
                .iter()
                .map(|a| AttrValue::default_for(a.ty))
                .collect(),
            edges: layout
                .edges
                .iter()
                .map(|e| EdgeSlot::empty(e.multiplicity))
                .collect(),
            parent: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Attribute values in layout order.
    pub fn attributes(&self) -> &[AttrValue] {
        &self.attributes
    }

    /// Edge slots in layout order, paired with their edge kind.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKind, &EdgeSlot)> {
        self.kind
            .layout()
            .edges
            .iter()
            .map(|d| d.edge)
            .zip(self.edges.iter())
    }

    /// Returns the named attribute, or `None` if the kind does not declare it.
    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        let i = self.kind.layout().attribute_index(name)?;
        self.attributes.get(i).copied()
    }

    /// Returns the slot of `edge`, or `None` if the kind does not own it.
    pub fn slot(&self, edge: EdgeKind) -> Option<&EdgeSlot> {
        let i = self.kind.layout().edge_index(edge)?;
        self.edges.get(i)
    }

    pub(crate) fn slot_mut(&mut self, edge: EdgeKind) -> Option<&mut EdgeSlot> {
        let i = self.kind.layout().edge_index(edge)?;
        self.edges.get_mut(i)
    }

    /// Returns the owner edge currently claiming this node.
    pub fn parent(&self) -> Option<ParentEdge> {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new(NodeId(2), NodeKind::ClassDeclarationSyntax);
        assert_eq!(node.id(), NodeId(2));
        assert_eq!(node.attribute("line"), Some(AttrValue::UInt(0)));
        assert_eq!(node.attribute("identifier"), Some(AttrValue::Str(Key::EMPTY)));
        assert_eq!(node.attribute("is_partial"), Some(AttrValue::Bool(false)));
        assert_eq!(node.attribute("operator"), None);
        let slot = node.slot(EdgeKind::ClassDeclarationSyntaxMembers);
        assert_eq!(slot, Some(&EdgeSlot::Multi(Vec::new())));
        assert!(node.parent().is_none());
    }

    #[test]
    fn test_slot_targets() {
        assert!(EdgeSlot::Single(NodeId::NONE).targets().is_empty());
        assert_eq!(EdgeSlot::Single(NodeId(5)).targets(), &[NodeId(5)]);
        let multi = EdgeSlot::Multi(vec![NodeId(3), NodeId(3), NodeId(4)]);
        assert_eq!(multi.targets().len(), 3);
        assert!(multi.contains(NodeId(4)));
        assert!(!multi.contains(NodeId(5)));
    }

    #[test]
    fn test_edges_in_layout_order() {
        let node = Node::new(NodeId(2), NodeKind::OperatorDeclarationSyntax);
        let kinds: Vec<_> = node.edges().map(|(e, _)| e).collect();
        assert_eq!(kinds[0], EdgeKind::BaseMethodDeclarationSyntaxBody);
        assert_eq!(kinds[2], EdgeKind::OperatorDeclarationSyntaxExpressionBody);
    }
}
