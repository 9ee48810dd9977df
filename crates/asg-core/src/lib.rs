//! ASG: arena-backed abstract semantic graph with binary persistence.
//!
//! This crate stores the nodes of a program model in a single arena,
//! addresses them by dense [`NodeId`]s, and keeps typed edges between them
//! consistent with a fixed catalogue of node kinds.
//!
//! # Overview
//!
//! - **Typed edges**: every edge is declared on a kind and names the base
//!   kind its targets must have
//! - **Ownership**: a node records the single edge that claims it as parent
//! - **Filtering**: nodes can be hidden from queries without being removed
//! - **Persistence**: whole graphs round-trip through a compact binary stream
//!
//! # Quick Start
//!
//! ```rust
//! use asg_core::{EdgeKind, Factory, NodeKind, load_graph, save_graph};
//!
//! let mut factory = Factory::new();
//! let block = factory.allocate(NodeKind::BlockSyntax).unwrap();
//! let ret = factory.allocate(NodeKind::ReturnStatementSyntax).unwrap();
//! factory.add_edge(block, EdgeKind::BlockSyntaxStatements, ret).unwrap();
//!
//! let bytes = save_graph(&mut factory).unwrap();
//! let loaded = load_graph(&bytes).unwrap();
//! assert_eq!(loaded.node_count(), 2);
//! assert_eq!(loaded.parent(ret).unwrap().map(|p| p.owner), Some(block));
//! ```
//!
//! # Modules
//!
//! - [`model`]: ids, the kind catalogue, nodes and the [`Factory`] arena
//! - [`codec`]: graph and filter streams, with optional zstd compression
//! - [`validate`]: whole-graph consistency check
//! - [`visitor`]: ordered read-only traversal
//! - [`error`]: error types
//! - [`limits`]: format constants and decoding limits
//!
//! # Security
//!
//! The loader treats its input as untrusted:
//! - Every count and length is checked against a limit before allocating
//! - Node ids must be dense and below the declared bound
//! - Every edge must point to a node present in the stream
//! - A digest over the content rejects silent corruption
//!
//! # Wire Format
//!
//! - Uncompressed: `ASG1` magic + version + data + digest
//! - Compressed: `ASG1Z` magic + uncompressed size + zstd data
//!
//! The loader detects both formats.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod validate;
pub mod visitor;

// Re-export commonly used types at crate root
pub use codec::{
    load_filter, load_from_path, load_graph, load_graph_with_options, save_filter, save_graph,
    save_graph_with_options, save_to_path, LoadOptions, SaveOptions,
};
pub use error::{AsgError, DecodeError, EncodeError, ErrorCode, ValidationError};
pub use model::{
    AttrType, AttrValue, EdgeIter, EdgeKind, EdgeSlot, EdgeTarget, Factory, IncomingEdge, Key,
    KindSet, Multiplicity, Node, NodeId, NodeKind, ParentEdge, ReverseEdges, StringTable,
};
pub use validate::validate_graph;
pub use visitor::{Traversal, Visitor};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Graph stream format version this crate writes.
pub const FORMAT_VERSION: u8 = limits::FORMAT_VERSION;
