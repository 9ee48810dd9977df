//! The node arena.
//!
//! A [`Factory`] owns every node of one graph, hands out ids, and is the
//! only place edges are written. Every edge write goes through the same
//! claim/release path, which also keeps the optional [`ReverseEdges`] index
//! in step with the forward edges.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::error::AsgError;
use crate::limits::{FIRST_NODE_ID, MAX_NODES};
use crate::model::filter::Filter;
use crate::model::id::{EdgeTarget, Key, NodeId};
use crate::model::kind::{EdgeKind, NodeKind};
use crate::model::node::{AttrValue, EdgeSlot, Node, ParentEdge};
use crate::model::reverse_edges::ReverseEdges;
use crate::model::schema::{AttrType, Multiplicity};
use crate::model::string_table::StringTable;

/// Owning arena for the nodes of one graph.
#[derive(Debug, Clone)]
pub struct Factory {
    /// Indexed by id. Slots below [`FIRST_NODE_ID`] are always empty.
    nodes: Vec<Option<Node>>,
    next_id: u32,
    len: usize,
    strings: StringTable,
    filter: Filter,
    reverse: Option<ReverseEdges>,
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl Factory {
    /// Creates an empty factory with reverse edges disabled.
    pub fn new() -> Self {
        Factory {
            nodes: vec![None; FIRST_NODE_ID as usize],
            next_id: FIRST_NODE_ID,
            len: 0,
            strings: StringTable::new(),
            filter: Filter::new(),
            reverse: None,
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Creates a node of `kind` with default attributes and empty edges.
    pub fn allocate(&mut self, kind: NodeKind) -> Result<NodeId, AsgError> {
        if kind.is_abstract() {
            return Err(AsgError::AbstractKind { kind });
        }
        if self.next_id == u32::MAX || self.len >= MAX_NODES {
            return Err(AsgError::AllocatorExhausted);
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(Some(Node::new(id, kind)));
        self.len += 1;
        trace!(%id, %kind, "allocated node");
        Ok(id)
    }

    /// Returns true if `id` names an allocated node.
    pub fn exists(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Dereferences `id`.
    pub fn node(&self, id: NodeId) -> Result<&Node, AsgError> {
        self.get(id).ok_or(AsgError::NotFound { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, AsgError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(AsgError::NotFound { id })
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind, AsgError> {
        Ok(self.node(id)?.kind())
    }

    /// Iterates live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// Iterates nodes that no edge currently claims, in id order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes().filter(|n| n.parent().is_none())
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The id the next allocation will return. Every live id is below it.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn strings_mut(&mut self) -> &mut StringTable {
        &mut self.strings
    }

    /// Interns `s` in this graph's string table.
    pub fn intern(&mut self, s: &str) -> Key {
        self.strings.intern(s)
    }

    /// Rebuilds the string table from the strings node attributes still
    /// reference, renumbering keys densely in id and layout order. Returns
    /// the number of entries dropped.
    ///
    /// Keys obtained before the call are invalid afterwards.
    pub fn compact_strings(&mut self) -> usize {
        let before = self.strings.len();
        let mut table = StringTable::new();
        let mut remap: FxHashMap<Key, Key> = FxHashMap::default();
        remap.insert(Key::EMPTY, Key::EMPTY);

        for node in self.nodes.iter_mut().flatten() {
            for value in node.attributes.iter_mut() {
                if let AttrValue::Str(old) = *value {
                    let new = match remap.get(&old) {
                        Some(&new) => new,
                        None => {
                            let new = table.intern(self.strings.get(old).unwrap_or_default());
                            remap.insert(old, new);
                            new
                        }
                    };
                    *value = AttrValue::Str(new);
                }
            }
        }

        self.strings = table;
        let dropped = before.saturating_sub(self.strings.len());
        debug!(kept = self.strings.len(), dropped, "compacted strings");
        dropped
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    fn attribute_slot(&self, id: NodeId, name: &str) -> Result<(usize, AttrType), AsgError> {
        let kind = self.kind(id)?;
        let layout = kind.layout();
        let i = layout
            .attribute_index(name)
            .ok_or_else(|| AsgError::UnknownAttribute {
                kind,
                name: name.to_owned(),
            })?;
        Ok((i, layout.attributes[i].ty))
    }

    /// Stores an attribute value. String values must already be interned.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: AttrValue) -> Result<(), AsgError> {
        let (i, ty) = self.attribute_slot(id, name)?;
        if value.ty() != ty {
            let decl = self.kind(id)?.layout().attributes[i];
            return Err(AsgError::AttributeTypeMismatch {
                name: decl.name,
                expected: ty,
            });
        }
        if let AttrValue::Str(key) = value {
            self.strings.lookup(key)?;
        }
        self.node_mut(id)?.attributes[i] = value;
        Ok(())
    }

    /// Interns `value` and stores it in a string attribute.
    pub fn set_string(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), AsgError> {
        let (i, ty) = self.attribute_slot(id, name)?;
        if ty != AttrType::Str {
            let decl = self.kind(id)?.layout().attributes[i];
            return Err(AsgError::AttributeTypeMismatch {
                name: decl.name,
                expected: ty,
            });
        }
        let key = self.strings.intern(value);
        self.set_attribute(id, name, AttrValue::Str(key))
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Result<AttrValue, AsgError> {
        let (i, _) = self.attribute_slot(id, name)?;
        Ok(self.node(id)?.attributes[i])
    }

    /// Resolves a string attribute.
    pub fn string(&self, id: NodeId, name: &str) -> Result<&str, AsgError> {
        let (i, ty) = self.attribute_slot(id, name)?;
        match self.node(id)?.attributes[i] {
            AttrValue::Str(key) => self.strings.lookup(key),
            _ => {
                let decl = self.kind(id)?.layout().attributes[i];
                Err(AsgError::AttributeTypeMismatch {
                    name: decl.name,
                    expected: ty,
                })
            }
        }
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Checks that `owner` exists and declares `edge` with the given shape.
    fn check_edge(
        &self,
        owner: NodeId,
        edge: EdgeKind,
        multiplicity: Option<Multiplicity>,
    ) -> Result<&EdgeSlot, AsgError> {
        let node = self.node(owner)?;
        let slot = node.slot(edge).ok_or(AsgError::EdgeNotDeclared {
            kind: node.kind(),
            edge,
        })?;
        if let Some(expected) = multiplicity {
            if edge.multiplicity() != expected {
                return Err(AsgError::WrongMultiplicity {
                    edge,
                    expected: edge.multiplicity(),
                });
            }
        }
        Ok(slot)
    }

    /// Checks that `target` exists and satisfies the edge's base kind.
    fn check_target(&self, edge: EdgeKind, target: NodeId) -> Result<(), AsgError> {
        let found = self.kind(target)?;
        let expected = edge.target();
        if !found.is_kind_of(expected) {
            return Err(AsgError::KindMismatch {
                edge,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn slot_mut(&mut self, owner: NodeId, edge: EdgeKind) -> Result<&mut EdgeSlot, AsgError> {
        let node = self.node_mut(owner)?;
        let kind = node.kind();
        node.slot_mut(edge)
            .ok_or(AsgError::EdgeNotDeclared { kind, edge })
    }

    /// Records `owner --edge--> target` as the claim on `target`, replacing
    /// any earlier claim.
    pub(crate) fn set_parent_edge(&mut self, target: NodeId, owner: NodeId, edge: EdgeKind) {
        if let Some(Some(node)) = self.nodes.get_mut(target.index()) {
            node.parent = Some(ParentEdge { owner, edge });
        }
        if let Some(rev) = &mut self.reverse {
            rev.insert(target, owner, edge);
        }
    }

    /// Drops one `owner --edge--> target` entry. The claim on `target` is
    /// cleared only if it is this edge's.
    pub(crate) fn remove_parent_edge(&mut self, target: NodeId, owner: NodeId, edge: EdgeKind) {
        if let Some(Some(node)) = self.nodes.get_mut(target.index()) {
            if node.parent == Some(ParentEdge { owner, edge }) {
                node.parent = None;
            }
        }
        self.remove_reverse(target, owner, edge);
    }

    fn remove_reverse(&mut self, target: NodeId, owner: NodeId, edge: EdgeKind) {
        if let Some(rev) = &mut self.reverse {
            rev.remove(target, owner, edge);
        }
    }

    /// Sets a single-valued edge. `NodeId::NONE` clears it.
    ///
    /// On error the edge keeps its previous value.
    pub fn set_edge(&mut self, owner: NodeId, edge: EdgeKind, target: NodeId) -> Result<(), AsgError> {
        let old = match self.check_edge(owner, edge, Some(Multiplicity::Single))? {
            EdgeSlot::Single(old) => *old,
            EdgeSlot::Multi(_) => {
                return Err(AsgError::WrongMultiplicity {
                    edge,
                    expected: Multiplicity::Multi,
                });
            }
        };
        if !target.is_none() {
            self.check_target(edge, target)?;
        }
        if !old.is_none() {
            self.remove_parent_edge(old, owner, edge);
        }
        *self.slot_mut(owner, edge)? = EdgeSlot::Single(target);
        if !target.is_none() {
            self.set_parent_edge(target, owner, edge);
        }
        trace!(%owner, %edge, %old, new = %target, "set edge");
        Ok(())
    }

    /// Appends to a multi-valued edge.
    ///
    /// On error the sequence is unchanged.
    pub fn add_edge(&mut self, owner: NodeId, edge: EdgeKind, target: NodeId) -> Result<(), AsgError> {
        self.check_edge(owner, edge, Some(Multiplicity::Multi))?;
        if target.is_none() {
            return Err(AsgError::NotFound { id: target });
        }
        self.check_target(edge, target)?;
        match self.slot_mut(owner, edge)? {
            EdgeSlot::Multi(ids) => ids.push(target),
            EdgeSlot::Single(_) => {
                return Err(AsgError::WrongMultiplicity {
                    edge,
                    expected: Multiplicity::Single,
                });
            }
        }
        self.set_parent_edge(target, owner, edge);
        trace!(%owner, %edge, %target, "added edge");
        Ok(())
    }

    /// Removes `target` from an edge: the first matching element of a
    /// multi-valued edge, or the value of a single-valued edge if it is
    /// `target`.
    pub fn remove_edge(&mut self, owner: NodeId, edge: EdgeKind, target: NodeId) -> Result<(), AsgError> {
        self.check_edge(owner, edge, None)?;
        let still_held = match self.slot_mut(owner, edge)? {
            EdgeSlot::Single(id) if *id == target && !target.is_none() => {
                *id = NodeId::NONE;
                false
            }
            EdgeSlot::Multi(ids) => match ids.iter().position(|id| *id == target) {
                Some(pos) => {
                    ids.remove(pos);
                    ids.contains(&target)
                }
                None => return Err(AsgError::EdgeTargetMissing { edge, target }),
            },
            EdgeSlot::Single(_) => return Err(AsgError::EdgeTargetMissing { edge, target }),
        };
        if still_held {
            self.remove_reverse(target, owner, edge);
        } else {
            self.remove_parent_edge(target, owner, edge);
        }
        trace!(%owner, %edge, %target, "removed edge");
        Ok(())
    }

    /// Reads a single-valued edge.
    pub fn edge(&self, owner: NodeId, edge: EdgeKind) -> Result<EdgeTarget, AsgError> {
        match self.check_edge(owner, edge, Some(Multiplicity::Single))? {
            EdgeSlot::Single(id) if id.is_none() => Ok(EdgeTarget::Absent),
            EdgeSlot::Single(id) if self.filter.is_filtered(*id) => Ok(EdgeTarget::Filtered),
            EdgeSlot::Single(id) => Ok(EdgeTarget::Node(*id)),
            EdgeSlot::Multi(_) => Err(AsgError::WrongMultiplicity {
                edge,
                expected: Multiplicity::Multi,
            }),
        }
    }

    /// Reads a single-valued edge as a plain id: `0` when unset, `1` when
    /// the target is filtered.
    pub fn edge_legacy(&self, owner: NodeId, edge: EdgeKind) -> Result<NodeId, AsgError> {
        Ok(self.edge(owner, edge)?.to_legacy())
    }

    /// Iterates the visible targets of an edge in order. Filtered targets are
    /// skipped. The iterator is `Clone`, so it can be restarted.
    pub fn edges(&self, owner: NodeId, edge: EdgeKind) -> Result<EdgeIter<'_>, AsgError> {
        let slot = self.check_edge(owner, edge, None)?;
        Ok(EdgeIter {
            ids: slot.targets().iter(),
            filter: &self.filter,
        })
    }

    /// Stored targets of an edge, filtered ones included.
    pub fn edges_all(&self, owner: NodeId, edge: EdgeKind) -> Result<&[NodeId], AsgError> {
        Ok(self.check_edge(owner, edge, None)?.targets())
    }

    /// Number of stored targets, filtered ones included.
    pub fn edge_len(&self, owner: NodeId, edge: EdgeKind) -> Result<usize, AsgError> {
        Ok(self.edges_all(owner, edge)?.len())
    }

    pub fn edge_is_empty(&self, owner: NodeId, edge: EdgeKind) -> Result<bool, AsgError> {
        Ok(self.edge_len(owner, edge)? == 0)
    }

    /// Returns the edge currently claiming `id`.
    pub fn parent(&self, id: NodeId) -> Result<Option<ParentEdge>, AsgError> {
        Ok(self.node(id)?.parent())
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Returns true if `id` is filtered and filtering is on.
    pub fn is_filtered(&self, id: NodeId) -> bool {
        self.filter.is_filtered(id)
    }

    /// Soft-deletes a node. Idempotent.
    pub fn filter(&mut self, id: NodeId) -> Result<(), AsgError> {
        self.node(id)?;
        self.filter.insert(id);
        Ok(())
    }

    pub fn unfilter(&mut self, id: NodeId) -> Result<(), AsgError> {
        self.node(id)?;
        self.filter.remove(id);
        Ok(())
    }

    /// Filters `id` and every node it transitively owns.
    pub fn filter_subtree(&mut self, id: NodeId) -> Result<(), AsgError> {
        for n in self.subtree(id)? {
            self.filter.insert(n);
        }
        Ok(())
    }

    pub fn unfilter_subtree(&mut self, id: NodeId) -> Result<(), AsgError> {
        for n in self.subtree(id)? {
            self.filter.remove(n);
        }
        Ok(())
    }

    fn subtree(&self, root: NodeId) -> Result<Vec<NodeId>, AsgError> {
        self.node(root)?;
        let mut seen = FxHashSet::default();
        let mut stack = vec![root];
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(node) = self.get(id) {
                for (_, slot) in node.edges() {
                    stack.extend(slot.targets().iter().rev());
                }
            }
        }
        Ok(out)
    }

    /// Number of nodes marked filtered, whether or not filtering is on.
    pub fn filtered_count(&self) -> usize {
        self.filter.len()
    }

    /// Stops reporting any node as filtered. Marks are kept.
    pub fn turn_filter_off(&mut self) {
        self.filter.set_enabled(false);
    }

    pub fn turn_filter_on(&mut self) {
        self.filter.set_enabled(true);
    }

    pub fn is_filter_on(&self) -> bool {
        self.filter.is_enabled()
    }

    pub(crate) fn filter_state(&self) -> &Filter {
        &self.filter
    }

    pub(crate) fn filter_state_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }

    // =========================================================================
    // Reverse edges
    // =========================================================================

    /// Builds the reverse index from the current forward edges. Rebuilds it
    /// if it already exists.
    pub fn init_reverse_edges(&mut self) {
        let mut rev = ReverseEdges::new();
        for node in self.nodes() {
            for (edge, slot) in node.edges() {
                for target in slot.targets() {
                    rev.insert(*target, node.id(), edge);
                }
            }
        }
        trace!(entries = rev.len(), "built reverse edges");
        self.reverse = Some(rev);
    }

    pub fn destroy_reverse_edges(&mut self) {
        self.reverse = None;
    }

    pub fn has_reverse_edges(&self) -> bool {
        self.reverse.is_some()
    }

    pub fn reverse_edges(&self) -> Option<&ReverseEdges> {
        self.reverse.as_ref()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Creates an empty factory sized for a decoded graph.
    pub(crate) fn for_load(next_id: u32, strings: StringTable) -> Self {
        let mut nodes = Vec::new();
        nodes.resize(next_id as usize, None);
        Factory {
            nodes,
            next_id,
            len: 0,
            strings,
            filter: Filter::new(),
            reverse: None,
        }
    }

    /// Places a decoded node. Returns false if its slot is taken or out of range.
    pub(crate) fn insert_loaded(&mut self, node: Node) -> bool {
        match self.nodes.get_mut(node.id().index()) {
            Some(slot @ None) => {
                *slot = Some(node);
                self.len += 1;
                true
            }
            _ => false,
        }
    }

    /// Re-establishes every parent claim from the forward edges, in id and
    /// layout order, without kind checks. Targets must already exist.
    pub(crate) fn restore_claims(&mut self) {
        let mut claims = Vec::new();
        for node in self.nodes() {
            for (edge, slot) in node.edges() {
                for target in slot.targets() {
                    claims.push((*target, node.id(), edge));
                }
            }
        }
        for (target, owner, edge) in claims {
            self.set_parent_edge(target, owner, edge);
        }
    }
}

/// Visible targets of one edge. See [`Factory::edges`].
#[derive(Debug, Clone)]
pub struct EdgeIter<'a> {
    ids: std::slice::Iter<'a, NodeId>,
    filter: &'a Filter,
}

impl Iterator for EdgeIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let filter = self.filter;
        self.ids.find(|id| !filter.is_filtered(**id)).copied()
    }
}
