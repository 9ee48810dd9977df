//! Whole-graph save/load.
//!
//! Uncompressed stream:
//!
//! ```text
//! "ASG1" version:u8 next_id:u32
//! string_count:u32 (key:u32 len:u32 bytes)*
//! node_count:u32 node*
//! digest:[u8; 16]
//! ```
//!
//! The digest is the first 16 bytes of the SHA-256 of everything before it.
//! Compressed stream: `"ASG1Z"`, uncompressed size as a varint, zstd payload.
//!
//! Filter stream, stored separately from the graph:
//! `"ASGF" version:u8 bound:u32 bitmap`, one bit per id below `bound`.

use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::codec::node::{decode_node, encode_node};
use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    DIGEST_LEN, FIRST_NODE_ID, FORMAT_VERSION, MAGIC_COMPRESSED, MAGIC_FILTER, MAGIC_UNCOMPRESSED,
    MAX_GRAPH_SIZE, MAX_NODES, MAX_STRING_LEN, MAX_STRINGS, MIN_FORMAT_VERSION,
};
use crate::model::{Factory, Key, NodeId, StringTable};
use crate::validate::validate_graph;

/// Kind tag plus id.
const MIN_NODE_RECORD_LEN: usize = 6;

/// Options for saving graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// zstd level; `None` writes the uncompressed format.
    pub compression_level: Option<i32>,
}

impl SaveOptions {
    /// Uncompressed output.
    pub fn new() -> Self {
        Self::default()
    }

    /// zstd-compressed output at `level`.
    pub fn compressed(level: i32) -> Self {
        Self {
            compression_level: Some(level),
        }
    }
}

/// Options for loading graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Re-check edge kinds and ownership after loading.
    ///
    /// The loader normally trusts the kinds recorded by the writer.
    pub verify: bool,
    /// Build the reverse-edge index on the loaded factory.
    pub reverse_edges: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn reverse_edges(mut self, reverse_edges: bool) -> Self {
        self.reverse_edges = reverse_edges;
        self
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decompresses an `ASG1Z` stream, returning the uncompressed bytes.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if input.len() < 5 {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }
    if &input[0..5] != MAGIC_COMPRESSED {
        let mut found = [0u8; 4];
        found.copy_from_slice(&input[0..4]);
        return Err(DecodeError::InvalidMagic { found });
    }
    decompress_zstd(&input[5..])
}

/// Loads a graph, detecting compression.
pub fn load_graph(input: &[u8]) -> Result<Factory, DecodeError> {
    load_graph_with_options(input, LoadOptions::default())
}

/// Loads a graph, detecting compression.
///
/// Either the whole graph loads, or an error is returned and nothing is
/// produced.
#[instrument(skip_all, fields(len = input.len()))]
pub fn load_graph_with_options(input: &[u8], options: LoadOptions) -> Result<Factory, DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }

    if input.len() >= 5 && &input[0..5] == MAGIC_COMPRESSED {
        let decompressed = decompress_zstd(&input[5..])?;
        decode_graph(&decompressed, options)
    } else if &input[0..4] == MAGIC_UNCOMPRESSED {
        if input.len() > MAX_GRAPH_SIZE {
            return Err(DecodeError::LengthExceedsLimit {
                field: "graph",
                len: input.len(),
                max: MAX_GRAPH_SIZE,
            });
        }
        decode_graph(input, options)
    } else {
        let mut found = [0u8; 4];
        found.copy_from_slice(&input[0..4]);
        Err(DecodeError::InvalidMagic { found })
    }
}

fn decode_graph(input: &[u8], options: LoadOptions) -> Result<Factory, DecodeError> {
    let mut reader = Reader::new(input);
    let magic = reader.read_bytes(4, "magic")?;
    if magic != MAGIC_UNCOMPRESSED {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(DecodeError::InvalidMagic { found });
    }
    let version = reader.read_byte("version")?;
    if !(MIN_FORMAT_VERSION..=FORMAT_VERSION).contains(&version) {
        return Err(DecodeError::UnsupportedVersion { version });
    }

    // Integrity digest closes the stream
    if input.len() < 5 + DIGEST_LEN {
        return Err(DecodeError::UnexpectedEof { context: "digest" });
    }
    let (body, digest) = input.split_at(input.len() - DIGEST_LEN);
    if Sha256::digest(body)[..DIGEST_LEN] != *digest {
        return Err(DecodeError::DigestMismatch);
    }
    let mut reader = Reader::new(&body[5..]);

    let next_id = reader.read_u32("next_id")?;
    if next_id < FIRST_NODE_ID || (next_id - FIRST_NODE_ID) as usize > MAX_NODES {
        return Err(DecodeError::LengthExceedsLimit {
            field: "next_id",
            len: next_id as usize,
            max: MAX_NODES + FIRST_NODE_ID as usize,
        });
    }

    // String section
    let string_count = reader.read_count(MAX_STRINGS, "string_count")?;
    let mut strings = StringTable::new();
    for _ in 0..string_count {
        let key = Key(reader.read_u32("string_key")?);
        if key.0 as usize >= MAX_STRINGS {
            return Err(DecodeError::LengthExceedsLimit {
                field: "string_key",
                len: key.0 as usize,
                max: MAX_STRINGS - 1,
            });
        }
        let value = reader.read_string(MAX_STRING_LEN, "string")?;
        if key == Key::EMPTY || !strings.insert_with_key(key, value) {
            return Err(DecodeError::DuplicateKey { key });
        }
    }

    // Node section. Ids are dense since nodes are never removed.
    let node_count = reader.read_count(MAX_NODES, "node_count")?;
    if node_count != (next_id - FIRST_NODE_ID) as usize {
        return Err(DecodeError::NodeCountMismatch {
            count: node_count,
            bound: next_id,
        });
    }
    if node_count > reader.remaining_len() / MIN_NODE_RECORD_LEN {
        return Err(DecodeError::UnexpectedEof { context: "nodes" });
    }
    let mut factory = Factory::for_load(next_id, strings);
    for _ in 0..node_count {
        let node = decode_node(&mut reader, next_id, factory.strings())?;
        let id = node.id();
        if !factory.insert_loaded(node) {
            return Err(DecodeError::DuplicateNodeId { id });
        }
    }
    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            len: reader.remaining_len(),
        });
    }

    for node in factory.nodes() {
        for (edge, slot) in node.edges() {
            if let Some(target) = slot.targets().iter().find(|t| !factory.exists(**t)) {
                return Err(DecodeError::DanglingEdge {
                    owner: node.id(),
                    edge,
                    target: *target,
                });
            }
        }
    }
    factory.restore_claims();
    if options.reverse_edges {
        factory.init_reverse_edges();
    }

    if options.verify {
        if let Err(err) = validate_graph(&factory) {
            warn!(error = %err, "loaded graph failed verification");
            return Err(err.into());
        }
    }

    debug!(
        nodes = factory.node_count(),
        strings = string_count,
        bytes = input.len(),
        "loaded graph"
    );
    Ok(factory)
}

/// Decompresses zstd data with size prefix.
fn decompress_zstd(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(compressed);
    let declared_size = reader.read_varint("uncompressed_size")? as usize;

    if declared_size > MAX_GRAPH_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "uncompressed_size",
            len: declared_size,
            max: MAX_GRAPH_SIZE,
        });
    }

    let decoder = zstd::Decoder::new(reader.remaining())
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    // One byte past the declared size is enough to detect a lying prefix
    let mut decompressed = Vec::with_capacity(declared_size);
    decoder
        .take(declared_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}

/// Reads a graph file written by [`save_to_path`].
pub fn load_from_path(path: impl AsRef<Path>, options: LoadOptions) -> Result<Factory, DecodeError> {
    let bytes = std::fs::read(path).map_err(|e| DecodeError::Io(e.to_string()))?;
    load_graph_with_options(&bytes, options)
}

/// Replaces the filter marks of `factory` with those in a filter stream.
///
/// The stream must have been saved from a graph with the same id bound.
#[instrument(skip_all, fields(len = input.len()))]
pub fn load_filter(factory: &mut Factory, input: &[u8]) -> Result<(), DecodeError> {
    let mut reader = Reader::new(input);
    let magic = reader.read_bytes(4, "magic")?;
    if magic != MAGIC_FILTER {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(DecodeError::InvalidMagic { found });
    }
    let version = reader.read_byte("version")?;
    if !(MIN_FORMAT_VERSION..=FORMAT_VERSION).contains(&version) {
        return Err(DecodeError::UnsupportedVersion { version });
    }
    let bound = reader.read_u32("filter_bound")?;
    let expected = factory.next_id().0;
    if bound != expected {
        return Err(DecodeError::FilterSizeMismatch {
            expected,
            found: bound,
        });
    }
    let bitmap = reader.read_bytes((bound as usize).div_ceil(8), "filter_bitmap")?;
    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            len: reader.remaining_len(),
        });
    }

    let mut marked = FxHashSet::default();
    for (i, byte) in bitmap.iter().enumerate() {
        for bit in 0..8 {
            if byte & (1 << bit) == 0 {
                continue;
            }
            let id = NodeId((i * 8 + bit) as u32);
            if !factory.exists(id) {
                return Err(DecodeError::FilterUnknownNode { id });
            }
            marked.insert(id);
        }
    }

    let filter = factory.filter_state_mut();
    filter.clear();
    for id in marked {
        filter.insert(id);
    }
    debug!(filtered = filter.len(), "loaded filter");
    Ok(())
}

// =============================================================================
// ENCODING
// =============================================================================

/// Saves a graph in the uncompressed format.
///
/// Saving runs the string liveness pass, so it needs the factory mutably:
/// every persist mark is cleared, then set again for each key a node still
/// references. Only marked strings are written.
pub fn save_graph(factory: &mut Factory) -> Result<Vec<u8>, EncodeError> {
    save_graph_with_options(factory, SaveOptions::default())
}

/// Saves a graph, compressing it if `options` asks for it.
#[instrument(skip_all, fields(nodes = factory.node_count()))]
pub fn save_graph_with_options(
    factory: &mut Factory,
    options: SaveOptions,
) -> Result<Vec<u8>, EncodeError> {
    // The table leaves the factory for the duration of the node walk
    let mut strings = std::mem::take(factory.strings_mut());
    let result = encode_graph(factory, &mut strings);
    *factory.strings_mut() = strings;
    let uncompressed = result?;

    let Some(level) = options.compression_level else {
        return Ok(uncompressed);
    };
    let compressed = zstd::encode_all(uncompressed.as_slice(), level)
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;

    let mut writer = Writer::with_capacity(5 + 10 + compressed.len());
    writer.write_bytes(MAGIC_COMPRESSED);
    writer.write_varint(uncompressed.len() as u64);
    writer.write_bytes(&compressed);
    debug!(
        uncompressed = uncompressed.len(),
        compressed = writer.len(),
        "compressed graph"
    );
    Ok(writer.into_bytes())
}

fn encode_graph(factory: &Factory, strings: &mut StringTable) -> Result<Vec<u8>, EncodeError> {
    strings.clear_marks();

    let mut nodes = Writer::with_capacity(factory.node_count() * 32);
    for node in factory.nodes() {
        encode_node(&mut nodes, node, strings)?;
    }

    let marked: Vec<(Key, &str)> = strings.marked().collect();
    if marked.len() > MAX_STRINGS {
        return Err(EncodeError::LengthExceedsLimit {
            field: "strings",
            len: marked.len(),
            max: MAX_STRINGS,
        });
    }

    let mut writer = Writer::with_capacity(64 + nodes.len());
    writer.write_bytes(MAGIC_UNCOMPRESSED);
    writer.write_byte(FORMAT_VERSION);
    writer.write_u32(factory.next_id().0);

    writer.write_u32(marked.len() as u32);
    for (key, value) in &marked {
        if key.0 as usize >= MAX_STRINGS {
            return Err(EncodeError::LengthExceedsLimit {
                field: "string_key",
                len: key.0 as usize,
                max: MAX_STRINGS - 1,
            });
        }
        if value.len() > MAX_STRING_LEN {
            return Err(EncodeError::LengthExceedsLimit {
                field: "string",
                len: value.len(),
                max: MAX_STRING_LEN,
            });
        }
        writer.write_u32(key.0);
        writer.write_string(value);
    }

    writer.write_u32(factory.node_count() as u32);
    writer.write_bytes(nodes.as_bytes());

    let digest = Sha256::digest(writer.as_bytes());
    writer.write_bytes(&digest[..DIGEST_LEN]);

    if writer.len() > MAX_GRAPH_SIZE {
        return Err(EncodeError::LengthExceedsLimit {
            field: "graph",
            len: writer.len(),
            max: MAX_GRAPH_SIZE,
        });
    }
    debug!(
        nodes = factory.node_count(),
        strings = marked.len(),
        bytes = writer.len(),
        "saved graph"
    );
    Ok(writer.into_bytes())
}

/// Writes a graph file readable by [`load_from_path`].
pub fn save_to_path(
    factory: &mut Factory,
    path: impl AsRef<Path>,
    options: SaveOptions,
) -> Result<(), EncodeError> {
    let bytes = save_graph_with_options(factory, options)?;
    std::fs::write(path, bytes).map_err(|e| EncodeError::Io(e.to_string()))
}

/// Saves the filter marks of `factory`, whether or not filtering is on.
#[instrument(skip_all, fields(filtered = factory.filtered_count()))]
pub fn save_filter(factory: &Factory) -> Vec<u8> {
    let bound = factory.next_id().0;
    let mut bitmap = vec![0u8; (bound as usize).div_ceil(8)];
    for node in factory.nodes() {
        let id = node.id();
        if factory.filter_state().is_marked(id) {
            bitmap[id.index() / 8] |= 1 << (id.index() % 8);
        }
    }

    let mut writer = Writer::with_capacity(9 + bitmap.len());
    writer.write_bytes(MAGIC_FILTER);
    writer.write_byte(FORMAT_VERSION);
    writer.write_u32(bound);
    writer.write_bytes(&bitmap);
    writer.into_bytes()
}
