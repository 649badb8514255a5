//! Error taxonomy for the routing daemon.
//!
//! The protocol never carries error signals on the wire (see the error
//! handling design in the spec): the only feedback a peer gets is the
//! absence of a DV entry. These types exist purely for local diagnostics
//! and for the handful of genuinely fatal bootstrap failures.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal at startup: bad arguments, missing topology file, unknown label,
/// bind failure. `main` maps any of these to a non-zero exit code.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("topology file not found: {0}")]
    TopologyNotFound(PathBuf),

    #[error("malformed topology line {line}: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("this node's port {0} does not appear as a destination in the topology file")]
    LabelNotFound(u16),

    #[error("port {0} is reserved for in-network routers [10000, 10005]")]
    ReservedPort(u16),

    #[error("failed to bind UDP socket on port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    #[error("failed to open run log {path:?}: {source}")]
    RunLog { path: PathBuf, source: std::io::Error },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Logged and dropped; the offending datagram has no further effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("empty datagram")]
    Empty,

    #[error("unknown packet type byte {0}")]
    UnknownType(u8),

    #[error("DATA packet too short: {0} bytes")]
    DataTooShort(usize),

    #[error("payload exceeds {max} bytes: got {actual}")]
    PayloadTooLarge { max: usize, actual: usize },

    #[error("DV datagram length {0} is not a multiple of the 8-byte entry size")]
    Unaligned(usize),

    #[error("DV entry count {count} exceeds capacity {capacity}")]
    TooManyEntries { count: usize, capacity: usize },
}

/// Programming-bug-level invariant violations. The engine returns these
/// rather than panicking so a single malformed update cannot take the
/// daemon down.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("sender port {0} is not a registered neighbor")]
    UnknownNeighbor(u16),
}
