//! Error types for memshard

use thiserror::Error;

/// Main error type for memshard
#[derive(Error, Debug)]
pub enum MemshardError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MemshardError {
    /// Returns true if the error came from a socket deadline expiring
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(e) | Self::Connect { source: e, .. } => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// Command encoding and reply decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Malformed reply line: {0}")]
    MalformedReply(String),

    #[error("No pending item for key {0}")]
    MissingItem(String),

    #[error("Invalid bytes length for key {0}")]
    InvalidBytesLength(String),

    #[error("Value block for key {0} not terminated by CRLF")]
    UnterminatedValue(String),
}

/// Reply value coercion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("{0:?} is not an integer")]
    NotInteger(String),

    #[error("{0:?} is not a float")]
    NotFloat(String),

    #[error("Value is not valid UTF-8")]
    NotUtf8,
}

pub type Result<T> = std::result::Result<T, MemshardError>;
