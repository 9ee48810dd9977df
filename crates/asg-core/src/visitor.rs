//! Read-only traversal.
//!
//! [`Traversal`] walks the nodes owned by a root: `enter` before a node's
//! children, `leave` after them. Children come in layout edge order, and in
//! insertion order within a multi-valued edge. Visitors dispatch on
//! [`Node::kind`] for per-kind behaviour.
//!
//! An edge leading back to a node still being visited is not followed, so
//! every walk ends even on ownership cycles.

use rustc_hash::FxHashSet;

use crate::error::AsgError;
use crate::model::{EdgeKind, Factory, Node, NodeId};

/// Callbacks issued by a [`Traversal`]. Every method defaults to doing nothing.
pub trait Visitor {
    fn enter(&mut self, _factory: &Factory, _node: &Node) {}

    fn leave(&mut self, _factory: &Factory, _node: &Node) {}

    /// Issued before `enter` on a child reached through `edge`.
    fn edge_enter(&mut self, _factory: &Factory, _owner: &Node, _edge: EdgeKind, _target: &Node) {}

    /// Issued after `leave` on a child reached through `edge`.
    fn edge_leave(&mut self, _factory: &Factory, _owner: &Node, _edge: EdgeKind, _target: &Node) {}
}

/// Traversal settings.
///
/// ```
/// use asg_core::{Factory, NodeKind, Traversal, Visitor, Node};
///
/// struct Count(usize);
/// impl Visitor for Count {
///     fn enter(&mut self, _: &Factory, _: &Node) {
///         self.0 += 1;
///     }
/// }
///
/// let mut f = Factory::new();
/// let unit = f.allocate(NodeKind::CompilationUnitSyntax).unwrap();
/// let mut count = Count(0);
/// Traversal::new().run(&f, unit, &mut count).unwrap();
/// assert_eq!(count.0, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Traversal {
    visit_filtered: bool,
    safe: bool,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Enter(NodeId, Option<(NodeId, EdgeKind)>),
    Leave(NodeId, Option<(NodeId, EdgeKind)>),
}

impl Traversal {
    /// Skips filtered nodes. A node held by several edges is visited once
    /// per edge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also descend into filtered nodes.
    pub fn visit_filtered(mut self, visit_filtered: bool) -> Self {
        self.visit_filtered = visit_filtered;
        self
    }

    /// Visit each node at most once, even when several edges hold it.
    pub fn safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    fn hidden(&self, factory: &Factory, id: NodeId) -> bool {
        !self.visit_filtered && factory.is_filtered(id)
    }

    /// Walks the subtree owned by `root`.
    pub fn run<V: Visitor + ?Sized>(
        &self,
        factory: &Factory,
        root: NodeId,
        visitor: &mut V,
    ) -> Result<(), AsgError> {
        factory.node(root)?;
        if self.hidden(factory, root) {
            return Ok(());
        }

        let mut visited = FxHashSet::default();
        let mut on_path = FxHashSet::default();
        let mut stack = vec![Frame::Enter(root, None)];
        let mut children = Vec::new();
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id, via) => {
                    if on_path.contains(&id) || (self.safe && !visited.insert(id)) {
                        continue;
                    }
                    on_path.insert(id);
                    let node = factory.node(id)?;
                    if let Some((owner, edge)) = via {
                        visitor.edge_enter(factory, factory.node(owner)?, edge, node);
                    }
                    visitor.enter(factory, node);
                    stack.push(Frame::Leave(id, via));

                    children.clear();
                    for (edge, slot) in node.edges() {
                        for &target in slot.targets() {
                            if !self.hidden(factory, target) {
                                children.push(Frame::Enter(target, Some((id, edge))));
                            }
                        }
                    }
                    stack.extend(children.drain(..).rev());
                }
                Frame::Leave(id, via) => {
                    on_path.remove(&id);
                    let node = factory.node(id)?;
                    visitor.leave(factory, node);
                    if let Some((owner, edge)) = via {
                        visitor.edge_leave(factory, factory.node(owner)?, edge, node);
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks every node no edge claims, in id order.
    pub fn run_all<V: Visitor + ?Sized>(
        &self,
        factory: &Factory,
        visitor: &mut V,
    ) -> Result<(), AsgError> {
        for root in factory.roots() {
            self.run(factory, root.id(), visitor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl Visitor for Log {
        fn enter(&mut self, _: &Factory, node: &Node) {
            self.0.push(format!("enter {}", node.id()));
        }
        fn leave(&mut self, _: &Factory, node: &Node) {
            self.0.push(format!("leave {}", node.id()));
        }
        fn edge_enter(&mut self, _: &Factory, owner: &Node, edge: EdgeKind, target: &Node) {
            self.0
                .push(format!("{} -{}-> {}", owner.id(), edge.name(), target.id()));
        }
        fn edge_leave(&mut self, _: &Factory, owner: &Node, _: EdgeKind, target: &Node) {
            self.0.push(format!("{} <- {}", owner.id(), target.id()));
        }
    }

    /// while (c) { return x; return y; }
    fn sample() -> (Factory, [NodeId; 6]) {
        let mut f = Factory::new();
        let w = f.allocate(NodeKind::WhileStatementSyntax).unwrap();
        let c = f.allocate(NodeKind::IdentifierNameSyntax).unwrap();
        let b = f.allocate(NodeKind::BlockSyntax).unwrap();
        let r1 = f.allocate(NodeKind::ReturnStatementSyntax).unwrap();
        let r2 = f.allocate(NodeKind::ReturnStatementSyntax).unwrap();
        let x = f.allocate(NodeKind::IdentifierNameSyntax).unwrap();
        f.set_edge(w, EdgeKind::WhileStatementSyntaxCondition, c).unwrap();
        f.set_edge(w, EdgeKind::WhileStatementSyntaxStatement, b).unwrap();
        f.add_edge(b, EdgeKind::BlockSyntaxStatements, r1).unwrap();
        f.add_edge(b, EdgeKind::BlockSyntaxStatements, r2).unwrap();
        f.set_edge(r1, EdgeKind::ReturnStatementSyntaxExpression, x).unwrap();
        (f, [w, c, b, r1, r2, x])
    }

    #[test]
    fn test_order() {
        let (f, [w, ..]) = sample();
        let mut log = Log::default();
        Traversal::new().run(&f, w, &mut log).unwrap();
        assert_eq!(
            log.0,
            [
                "enter 2",
                "2 -Condition-> 3",
                "enter 3",
                "leave 3",
                "2 <- 3",
                "2 -Statement-> 4",
                "enter 4",
                "4 -Statements-> 5",
                "enter 5",
                "5 -Expression-> 7",
                "enter 7",
                "leave 7",
                "5 <- 7",
                "leave 5",
                "4 <- 5",
                "4 -Statements-> 6",
                "enter 6",
                "leave 6",
                "4 <- 6",
                "leave 4",
                "2 <- 4",
                "leave 2",
            ]
        );
    }

    #[test]
    fn test_filtered_children_skipped() {
        let (mut f, [w, _, b, r1, ..]) = sample();
        f.filter(r1).unwrap();
        let mut log = Log::default();
        Traversal::new().run(&f, b, &mut log).unwrap();
        assert_eq!(log.0, ["enter 4", "4 -Statements-> 6", "enter 6", "leave 6", "4 <- 6", "leave 4"]);

        let mut log = Log::default();
        Traversal::new().visit_filtered(true).run(&f, w, &mut log).unwrap();
        assert!(log.0.contains(&"enter 5".to_string()));

        f.filter(w).unwrap();
        let mut log = Log::default();
        Traversal::new().run(&f, w, &mut log).unwrap();
        assert!(log.0.is_empty());
    }

    #[test]
    fn test_safe_visits_once() {
        let mut f = Factory::new();
        let b = f.allocate(NodeKind::BlockSyntax).unwrap();
        let r = f.allocate(NodeKind::ReturnStatementSyntax).unwrap();
        f.add_edge(b, EdgeKind::BlockSyntaxStatements, r).unwrap();
        f.add_edge(b, EdgeKind::BlockSyntaxStatements, r).unwrap();

        let mut log = Log::default();
        Traversal::new().run(&f, b, &mut log).unwrap();
        assert_eq!(log.0.iter().filter(|e| *e == "enter 3").count(), 2);

        let mut log = Log::default();
        Traversal::new().safe(true).run(&f, b, &mut log).unwrap();
        assert_eq!(log.0.iter().filter(|e| *e == "enter 3").count(), 1);
    }

    #[test]
    fn test_default_terminates_on_cycle() {
        let mut f = Factory::new();
        let body = f.allocate(NodeKind::QueryBodySyntax).unwrap();
        let cont = f.allocate(NodeKind::QueryContinuationSyntax).unwrap();
        let inner = f.allocate(NodeKind::QueryBodySyntax).unwrap();
        f.set_edge(body, EdgeKind::QueryBodySyntaxContinuation, cont).unwrap();
        f.set_edge(cont, EdgeKind::QueryContinuationSyntaxBody, body).unwrap();
        f.set_edge(inner, EdgeKind::QueryBodySyntaxContinuation, cont).unwrap();

        let mut log = Log::default();
        Traversal::new().run(&f, body, &mut log).unwrap();
        assert_eq!(log.0, ["enter 2", "2 -Continuation-> 3", "enter 3", "leave 3", "2 <- 3", "leave 2"]);

        // The back-edge is skipped only while its target is on the path.
        let mut log = Log::default();
        Traversal::new().run(&f, inner, &mut log).unwrap();
        assert_eq!(
            log.0,
            [
                "enter 4",
                "4 -Continuation-> 3",
                "enter 3",
                "3 -Body-> 2",
                "enter 2",
                "leave 2",
                "3 <- 2",
                "leave 3",
                "4 <- 3",
                "leave 4",
            ]
        );
    }

    #[test]
    fn test_safe_terminates_on_cycle() {
        let mut f = Factory::new();
        let body = f.allocate(NodeKind::QueryBodySyntax).unwrap();
        let cont = f.allocate(NodeKind::QueryContinuationSyntax).unwrap();
        f.set_edge(body, EdgeKind::QueryBodySyntaxContinuation, cont).unwrap();
        f.set_edge(cont, EdgeKind::QueryContinuationSyntaxBody, body).unwrap();

        let mut log = Log::default();
        Traversal::new().safe(true).run(&f, body, &mut log).unwrap();
        assert_eq!(log.0, ["enter 2", "2 -Continuation-> 3", "enter 3", "leave 3", "2 <- 3", "leave 2"]);
    }

    #[test]
    fn test_run_all_and_missing_root() {
        let (mut f, _) = sample();
        let lone = f.allocate(NodeKind::BlockSyntax).unwrap();
        let mut log = Log::default();
        Traversal::new().run_all(&f, &mut log).unwrap();
        let entered: Vec<_> = log.0.iter().filter(|e| e.starts_with("enter")).collect();
        assert_eq!(entered.len(), 7);
        assert_eq!(log.0.last().unwrap(), &format!("leave {}", lone));

        let err = Traversal::new().run(&f, NodeId(99), &mut log).unwrap_err();
        assert_eq!(err, AsgError::NotFound { id: NodeId(99) });
    }
}
