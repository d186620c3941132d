//! Server selection: mapping a key to one of the configured nodes

pub mod hash;
pub mod modulo;
pub mod ring;

pub use hash::{adler32, ring_hash};
pub use modulo::ModSelector;
pub use ring::{HashRing, VIRTUAL_NODES, VirtualNode};

use crate::MemshardError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Strategy for mapping keys to nodes.
///
/// Both strategies are pure functions of the key and the node set, so every
/// client configured with the same servers in the same order agrees on
/// where a key lives.
pub trait NodeSelector<T>: Send + Sync {
    /// Register a node. `host`/`port` identify it for placement.
    fn add(&mut self, host: &str, port: u16, node: T);

    /// Node owning `key`, or `None` when no node is registered
    fn get(&self, key: &[u8]) -> Option<&T>;

    /// All nodes in the order they were added
    fn list(&self) -> &[T];
}

/// Which [`NodeSelector`] a cluster uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// `adler32(key) % node_count`
    #[serde(alias = "mod")]
    Modulo,
    /// Ring of virtual nodes
    #[default]
    #[serde(alias = "hash")]
    Consistent,
}

impl SelectorKind {
    /// Build an empty selector of this kind
    pub fn build<T: Send + Sync + 'static>(self) -> Box<dyn NodeSelector<T>> {
        match self {
            SelectorKind::Modulo => Box::new(ModSelector::new()),
            SelectorKind::Consistent => Box::new(HashRing::new()),
        }
    }
}

impl FromStr for SelectorKind {
    type Err = MemshardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modulo" | "mod" => Ok(SelectorKind::Modulo),
            "consistent" | "hash" => Ok(SelectorKind::Consistent),
            other => Err(MemshardError::Config(format!(
                "unknown selector {other:?} (expected \"modulo\" or \"consistent\")"
            ))),
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorKind::Modulo => f.write_str("modulo"),
            SelectorKind::Consistent => f.write_str("consistent"),
        }
    }
}

/// Split a `host:port` endpoint. IPv6 hosts must be bracketed: `[::1]:11211`.
pub fn parse_endpoint(endpoint: &str) -> crate::Result<(String, u16)> {
    let bad = |why: String| MemshardError::Config(format!("invalid endpoint {endpoint:?}: {why}"));

    let colon = memchr::memrchr(b':', endpoint.as_bytes())
        .ok_or_else(|| bad("missing port".to_string()))?;
    let (host, port) = (&endpoint[..colon], &endpoint[colon + 1..]);

    let host = if let Some(inner) = host.strip_prefix('[') {
        inner
            .strip_suffix(']')
            .ok_or_else(|| bad("missing ']'".to_string()))?
    } else if host.contains([':', '[', ']']) {
        return Err(bad("too many colons".to_string()));
    } else {
        host
    };

    if host.is_empty() {
        return Err(bad("missing host".to_string()));
    }

    let port = port
        .parse::<u16>()
        .map_err(|e| bad(format!("port {port:?}: {e}")))?;

    Ok((host.to_string(), port))
}
