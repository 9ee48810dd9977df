//! Error types for graph mutation, persistence and validation.

use thiserror::Error;

use crate::model::{EdgeKind, Key, NodeId, NodeKind};
use crate::model::schema::{AttrType, Multiplicity};

/// Error categories every failure maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A001: id is `0` or was never allocated
    NotFound,
    /// A002: edge target fails the required-base-kind check
    KindMismatch,
    /// A003: string-table key not recognized
    InvalidKey,
    /// A004: truncated, malformed or inconsistent graph stream
    CorruptStream,
    /// A005: call does not match the kind catalogue (undeclared edge or attribute)
    Schema,
    /// A006: the id space or node limit is used up
    Exhausted,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "A001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "A001",
            ErrorCode::KindMismatch => "A002",
            ErrorCode::InvalidKey => "A003",
            ErrorCode::CorruptStream => "A004",
            ErrorCode::Schema => "A005",
            ErrorCode::Exhausted => "A006",
        }
    }
}

/// Error raised by in-memory graph operations.
///
/// Every mutating call that fails with one of these leaves the graph
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsgError {
    #[error("[A001] node {id} does not exist")]
    NotFound { id: NodeId },

    #[error("[A002] edge {edge} requires {expected}, found {found}")]
    KindMismatch {
        edge: EdgeKind,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("[A003] string key {key} is not in the string table")]
    InvalidKey { key: Key },

    #[error("[A005] edge {edge} is not declared on {kind}")]
    EdgeNotDeclared { kind: NodeKind, edge: EdgeKind },

    #[error("[A005] edge {edge} is {expected:?}-valued")]
    WrongMultiplicity {
        edge: EdgeKind,
        expected: Multiplicity,
    },

    #[error("[A005] attribute {name:?} is not declared on {kind}")]
    UnknownAttribute { kind: NodeKind, name: String },

    #[error("[A005] attribute {name:?} has type {expected:?}")]
    AttributeTypeMismatch { name: &'static str, expected: AttrType },

    #[error("[A005] {kind} is abstract and cannot be allocated")]
    AbstractKind { kind: NodeKind },

    #[error("[A001] edge {edge} does not point to node {target}")]
    EdgeTargetMissing { edge: EdgeKind, target: NodeId },

    #[error("[A006] node id space exhausted")]
    AllocatorExhausted,
}

impl AsgError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AsgError::NotFound { .. } | AsgError::EdgeTargetMissing { .. } => ErrorCode::NotFound,
            AsgError::AllocatorExhausted => ErrorCode::Exhausted,
            AsgError::KindMismatch { .. } => ErrorCode::KindMismatch,
            AsgError::InvalidKey { .. } => ErrorCode::InvalidKey,
            AsgError::EdgeNotDeclared { .. }
            | AsgError::WrongMultiplicity { .. }
            | AsgError::UnknownAttribute { .. }
            | AsgError::AttributeTypeMismatch { .. }
            | AsgError::AbstractKind { .. } => ErrorCode::Schema,
        }
    }
}

/// Error during graph loading. Every variant means the stream is corrupt
/// (or was written by a different schema) and no usable graph was produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("[A004] invalid magic bytes: expected ASG1 or ASG1Z, found {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("[A004] unsupported version: {version}")]
    UnsupportedVersion { version: u8 },

    #[error("[A004] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[A004] varint exceeds maximum length")]
    VarintTooLong,

    #[error("[A004] varint overflow")]
    VarintOverflow,

    #[error("[A004] invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("[A004] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[A004] invalid bool value: {value} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8 },

    #[error("[A004] unknown node kind tag: {tag}")]
    UnknownNodeKind { tag: u16 },

    #[error("[A004] abstract node kind {kind} in node section")]
    AbstractNodeKind { kind: NodeKind },

    #[error("[A004] node id {id} is reserved")]
    ReservedNodeId { id: NodeId },

    #[error("[A004] node id {id} is not below the declared id bound {bound}")]
    NodeIdOutOfRange { id: NodeId, bound: u32 },

    #[error("[A004] node count {count} does not match id bound {bound}")]
    NodeCountMismatch { count: usize, bound: u32 },

    #[error("[A004] node id {id} appears twice")]
    DuplicateNodeId { id: NodeId },

    #[error("[A004] edge {edge} of node {owner} points to missing node {target}")]
    DanglingEdge {
        owner: NodeId,
        edge: EdgeKind,
        target: NodeId,
    },

    #[error("[A004] string key {key} appears twice")]
    DuplicateKey { key: Key },

    #[error("[A004] string key {key} is not in the string section")]
    UnknownStringKey { key: Key },

    #[error("[A004] {len} trailing bytes after node section")]
    TrailingBytes { len: usize },

    #[error("[A004] integrity digest does not match content")]
    DigestMismatch,

    #[error("[A004] filter covers {found} ids, graph has {expected}")]
    FilterSizeMismatch { expected: u32, found: u32 },

    #[error("[A004] filter marks node {id}, which does not exist")]
    FilterUnknownNode { id: NodeId },

    #[error("[A004] loaded graph failed verification: {0}")]
    VerificationFailed(ValidationError),

    #[error("[A004] zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("[A004] decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },

    #[error("[A004] read failed: {0}")]
    Io(String),
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::CorruptStream
    }
}

/// Error during graph saving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("attribute refers to string key {key} missing from the string table")]
    UnknownStringKey { key: Key },

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),

    #[error("write failed: {0}")]
    Io(String),
}

/// Structural inconsistency found by [`crate::validate::validate_graph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("edge {edge} of node {owner} points to missing node {target}")]
    DanglingEdge {
        owner: NodeId,
        edge: EdgeKind,
        target: NodeId,
    },

    #[error("edge {edge} of node {owner} points to {target} of kind {found}")]
    KindMismatch {
        owner: NodeId,
        edge: EdgeKind,
        target: NodeId,
        found: NodeKind,
    },

    #[error("node {node} claims parent {owner} via {edge}, which does not hold it")]
    BrokenParentClaim {
        node: NodeId,
        owner: NodeId,
        edge: EdgeKind,
    },

    #[error("reverse index is missing {owner} --{edge}--> {target}")]
    ReverseEdgeMissing {
        target: NodeId,
        owner: NodeId,
        edge: EdgeKind,
    },

    #[error("reverse index has stale entry {owner} --{edge}--> {target}")]
    ReverseEdgeStale {
        target: NodeId,
        owner: NodeId,
        edge: EdgeKind,
    },
}

impl From<ValidationError> for DecodeError {
    fn from(err: ValidationError) -> Self {
        DecodeError::VerificationFailed(err)
    }
}
