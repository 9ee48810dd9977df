//! Whole-graph consistency check.
//!
//! The mutation API keeps a graph consistent on its own. This check exists
//! for graphs that came from elsewhere: a trusted load skips kind checks,
//! so [`LoadOptions::verify`](crate::codec::LoadOptions) runs it afterwards.

use rustc_hash::FxHashMap;

use crate::error::ValidationError;
use crate::model::{EdgeKind, Factory, NodeId};

/// Checks that:
/// - every edge target exists and satisfies the edge's base kind
/// - every parent claim names an owner edge that still holds the node
/// - the reverse index, when present, matches the forward edges exactly
///
/// Returns the first violation found.
pub fn validate_graph(factory: &Factory) -> Result<(), ValidationError> {
    let mut forward: FxHashMap<(NodeId, NodeId, EdgeKind), usize> = FxHashMap::default();

    for node in factory.nodes() {
        let owner = node.id();
        for (edge, slot) in node.edges() {
            for &target in slot.targets() {
                let found = match factory.get(target) {
                    Some(t) => t.kind(),
                    None => return Err(ValidationError::DanglingEdge { owner, edge, target }),
                };
                if !found.is_kind_of(edge.target()) {
                    return Err(ValidationError::KindMismatch {
                        owner,
                        edge,
                        target,
                        found,
                    });
                }
                *forward.entry((target, owner, edge)).or_default() += 1;
            }
        }
    }

    for node in factory.nodes() {
        let Some(claim) = node.parent() else {
            continue;
        };
        let held = factory
            .get(claim.owner)
            .and_then(|owner| owner.slot(claim.edge))
            .is_some_and(|slot| slot.contains(node.id()));
        if !held {
            return Err(ValidationError::BrokenParentClaim {
                node: node.id(),
                owner: claim.owner,
                edge: claim.edge,
            });
        }
    }

    if let Some(rev) = factory.reverse_edges() {
        let mut indexed: FxHashMap<(NodeId, NodeId, EdgeKind), usize> = FxHashMap::default();
        for (target, entries) in rev.iter() {
            for e in entries {
                *indexed.entry((target, e.owner, e.edge)).or_default() += 1;
            }
        }
        for (&(target, owner, edge), &count) in &indexed {
            if forward.get(&(target, owner, edge)).copied().unwrap_or(0) < count {
                return Err(ValidationError::ReverseEdgeStale { target, owner, edge });
            }
        }
        for (&(target, owner, edge), &count) in &forward {
            if indexed.get(&(target, owner, edge)).copied().unwrap_or(0) < count {
                return Err(ValidationError::ReverseEdgeMissing { target, owner, edge });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    fn block_with_return(f: &mut Factory) -> (NodeId, NodeId) {
        let block = f.allocate(NodeKind::BlockSyntax).unwrap();
        let ret = f.allocate(NodeKind::ReturnStatementSyntax).unwrap();
        f.add_edge(block, EdgeKind::BlockSyntaxStatements, ret).unwrap();
        f.add_edge(block, EdgeKind::BlockSyntaxStatements, ret).unwrap();
        (block, ret)
    }

    #[test]
    fn test_consistent_graph() {
        let mut f = Factory::new();
        block_with_return(&mut f);
        assert_eq!(validate_graph(&f), Ok(()));
        f.init_reverse_edges();
        assert_eq!(validate_graph(&f), Ok(()));
    }

    #[test]
    fn test_broken_parent_claim() {
        let mut f = Factory::new();
        let (_, ret) = block_with_return(&mut f);
        let other = f.allocate(NodeKind::WhileStatementSyntax).unwrap();
        f.set_parent_edge(ret, other, EdgeKind::WhileStatementSyntaxStatement);
        assert_eq!(
            validate_graph(&f),
            Err(ValidationError::BrokenParentClaim {
                node: ret,
                owner: other,
                edge: EdgeKind::WhileStatementSyntaxStatement,
            })
        );
    }

    #[test]
    fn test_reverse_index_drift() {
        let mut f = Factory::new();
        f.init_reverse_edges();
        let (block, ret) = block_with_return(&mut f);
        f.remove_parent_edge(ret, block, EdgeKind::BlockSyntaxStatements);
        assert_eq!(
            validate_graph(&f),
            Err(ValidationError::ReverseEdgeMissing {
                target: ret,
                owner: block,
                edge: EdgeKind::BlockSyntaxStatements,
            })
        );

        let mut f = Factory::new();
        f.init_reverse_edges();
        let (block, ret) = block_with_return(&mut f);
        f.set_parent_edge(ret, block, EdgeKind::BlockSyntaxStatements);
        assert_eq!(
            validate_graph(&f),
            Err(ValidationError::ReverseEdgeStale {
                target: ret,
                owner: block,
                edge: EdgeKind::BlockSyntaxStatements,
            })
        );
    }
}
