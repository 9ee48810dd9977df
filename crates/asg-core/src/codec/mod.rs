//! Binary persistence for graphs and filter state.
//!
//! A graph stream is a string section followed by a node section and a
//! truncated SHA-256 digest. Filter state travels in a separate stream.

pub mod graph;
pub mod node;
pub mod primitives;

pub use graph::{
    decompress, load_filter, load_from_path, load_graph, load_graph_with_options, save_filter,
    save_graph, save_graph_with_options, save_to_path, LoadOptions, SaveOptions,
};
pub use node::{decode_node, encode_node};
pub use primitives::{Reader, Writer};
