//! In-memory graph model.
//!
//! - Identifiers ([`NodeId`], [`Key`]) and the tri-state [`EdgeTarget`]
//! - The kind catalogue and the tables derived from it
//! - Nodes, the string table, the filter and the reverse-edge index
//! - The [`Factory`] arena tying them together, and structural node hashes

pub mod factory;
pub mod filter;
pub mod hash;
pub mod id;
pub mod kind;
pub mod node;
pub mod reverse_edges;
pub mod schema;
pub mod string_table;

pub use factory::{EdgeIter, Factory};
pub use filter::Filter;
pub use id::{EdgeTarget, Key, NodeId};
pub use kind::{EdgeKind, KindSet, Layout, NodeKind};
pub use node::{AttrValue, EdgeSlot, Node, ParentEdge};
pub use reverse_edges::{IncomingEdge, ReverseEdges};
pub use schema::{AttrDecl, AttrType, CATALOGUE, EdgeDecl, KindDecl, Multiplicity};
pub use string_table::StringTable;
