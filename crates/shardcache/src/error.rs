//! Error types for shardcache

use std::fmt;
use std::io;

/// Result type alias for shardcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sharded cache operations
#[derive(Debug)]
pub enum Error {
    /// I/O error while reading a config file
    Io(io::Error),

    /// Config file is not valid JSON for [`crate::ShardConfig`]
    Parse(String),

    /// Config values out of range
    InvalidConfig(String),

    /// Node is already part of the ring
    DuplicateNode(String),

    /// No node to route a key to
    NoNodes,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            Error::DuplicateNode(node) => write!(f, "Node already on the ring: {}", node),
            Error::NoNodes => write!(f, "Ring has no nodes"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
