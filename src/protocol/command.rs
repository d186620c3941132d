//! Memcached ASCII protocol command kinds

use crate::ProtocolError;

/// Family a command name belongs to. Decides how its reply is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandKind {
    /// set, add, replace, append, prepend, cas
    Storage = 1,
    /// get, gets
    Retrieval = 2,
    /// delete
    Deletion = 3,
    /// incr, decr
    IncrDecr = 4,
    /// touch
    Touch = 5,
    /// slabs
    Slabs = 6,
    /// stats
    Statistics = 7,
}

impl CommandKind {
    /// Classify a command name (case-insensitive).
    ///
    /// Returns the kind and the lowercase name as it goes on the wire.
    pub fn classify(name: &str) -> Result<(Self, String), ProtocolError> {
        let lower = name.to_ascii_lowercase();
        let kind = match lower.as_str() {
            "set" | "add" | "replace" | "append" | "prepend" | "cas" => CommandKind::Storage,
            "get" | "gets" => CommandKind::Retrieval,
            "delete" => CommandKind::Deletion,
            "incr" | "decr" => CommandKind::IncrDecr,
            "touch" => CommandKind::Touch,
            "slabs" => CommandKind::Slabs,
            "stats" => CommandKind::Statistics,
            _ => return Err(ProtocolError::InvalidCommand(name.to_string())),
        };
        Ok((kind, lower))
    }

    /// Returns true if a data block line follows the command line
    pub fn has_body(self) -> bool {
        self == CommandKind::Storage
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Storage => "storage",
            CommandKind::Retrieval => "retrieval",
            CommandKind::Deletion => "deletion",
            CommandKind::IncrDecr => "incr_decr",
            CommandKind::Touch => "touch",
            CommandKind::Slabs => "slabs",
            CommandKind::Statistics => "statistics",
        }
    }
}
