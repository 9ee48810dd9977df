//! Wire-format constants and safety limits for graph loading.
//!
//! The loader treats its input as untrusted: every count and length read
//! from the stream is checked against these bounds before allocating.

/// Magic bytes of an uncompressed graph stream.
pub const MAGIC_UNCOMPRESSED: &[u8; 4] = b"ASG1";

/// Magic bytes of a zstd-compressed graph stream.
pub const MAGIC_COMPRESSED: &[u8; 5] = b"ASG1Z";

/// Magic bytes of a filter stream.
pub const MAGIC_FILTER: &[u8; 4] = b"ASGF";

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Oldest format version this crate can read.
pub const MIN_FORMAT_VERSION: u8 = 1;

/// First id handed out by the allocator.
///
/// `0` means "no node" and `1` is the filtered sentinel, so neither is ever
/// assigned to a live node.
pub const FIRST_NODE_ID: u32 = 2;

/// Maximum number of nodes in one graph.
pub const MAX_NODES: usize = 1 << 26;

/// Maximum number of persisted strings.
pub const MAX_STRINGS: usize = 1 << 24;

/// Maximum byte length of a single string.
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Maximum number of targets in one multi-valued edge.
pub const MAX_MULTI_EDGE_LEN: usize = 1 << 24;

/// Maximum size of an uncompressed graph stream.
pub const MAX_GRAPH_SIZE: usize = 1 << 30;

/// Length of the truncated SHA-256 digest closing every graph stream.
pub const DIGEST_LEN: usize = 16;

/// Maximum encoded length of a varint (the compressed-stream size prefix).
pub const MAX_VARINT_BYTES: usize = 10;
