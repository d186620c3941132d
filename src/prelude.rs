//! Prelude module for common imports.
//!
//! # Usage
//!
//! ```ignore
//! use memshard::prelude::*;
//! ```

// Error types
pub use crate::error::{MemshardError, ProtocolError, Result, ValueError};

// Configuration
pub use crate::config::{ClusterConfig, TimeoutConfig};

// Cluster and connections
pub use crate::cluster::{Cluster, SharedConnection};
pub use crate::connection::NodeConnection;
pub use crate::selector::{NodeSelector, SelectorKind};

// Protocol
pub use crate::protocol::{CommandKind, Item, ReplyStatus, ReplyValue, Value};
pub use crate::session::CommandSession;

// Metrics
pub use crate::metrics::Metrics;

// Common external crates
pub use std::sync::Arc;
pub use tracing::{debug, error, info, trace, warn};
