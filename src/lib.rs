//! # memshard
//!
//! Client for a cluster of memcached servers speaking the ASCII protocol.
//!
//! ## Features
//!
//! - Modulo (`adler32(key) % n`) or consistent-hash (32 virtual nodes per
//!   server) key routing
//! - Storage, retrieval, delete, incr/decr, touch, slabs and stats commands
//! - Reply decoding for status lines, multi-key VALUE blocks, STAT listings
//!   and bare incr/decr numbers
//! - Connect, read and write deadlines on every socket operation
//! - Optional Prometheus metrics
//!
//! ## Example
//!
//! ```ignore
//! use memshard::{Cluster, SelectorKind, TimeoutConfig, Value};
//!
//! let cluster = Cluster::new(SelectorKind::Consistent, TimeoutConfig::default());
//! cluster.configure(["10.0.0.1:11211", "10.0.0.2:11211"])?;
//!
//! let conn = cluster.get(b"id").expect("no server available");
//! let mut conn = conn.lock();
//! conn.command("set", 112, &["id".into(), 0.into(), 0.into(), 3.into()])?;
//! let session = conn.command("get", Value::Nil, &["id".into()])?;
//! assert_eq!(session.item("id").unwrap().to_i64()?, 112);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  get(key)  ┌──────────────────────┐
//! │ app/service  │───────────▶│ Cluster (RwLock)     │
//! └──────┬───────┘            │  └─ NodeSelector     │
//!        │                    │      ├─ ModSelector  │
//!        │ command()          │      └─ HashRing     │
//!        ▼                    └──────────┬───────────┘
//! ┌──────────────────────┐               │ one per server
//! │ NodeConnection       │◀──────────────┘
//! │  ├─ RequestWriter    │
//! │  └─ reply decoder    │──▶ CommandSession
//! └──────────────────────┘
//! ```

// Modules
pub mod cluster;
pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod prelude;
pub mod protocol;
pub mod selector;
pub mod session;

// Re-exports for convenience
pub use cluster::{Cluster, SharedConnection};
pub use config::{ClusterConfig, TimeoutConfig};
pub use connection::NodeConnection;
pub use error::{MemshardError, ProtocolError, Result, ValueError};
pub use protocol::{CommandKind, Item, ReplyStatus, ReplyValue, Value};
pub use selector::SelectorKind;
pub use session::CommandSession;
