//! Cluster facade: a node set behind one reader/writer lock

use crate::config::{ClusterConfig, TimeoutConfig};
use crate::connection::NodeConnection;
use crate::metrics::Metrics;
use crate::selector::{NodeSelector, SelectorKind, parse_endpoint};
use crate::Result;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

/// Handle to a node connection. The mutex serialises commands on it.
pub type SharedConnection = Arc<Mutex<NodeConnection>>;

/// Client-side view of a set of memcached nodes.
///
/// `add`/`configure` take the write lock, `get`/`list` the read lock, so
/// lookups from many threads proceed in parallel. Nodes are never removed.
pub struct Cluster {
    kind: SelectorKind,
    selector: RwLock<Box<dyn NodeSelector<SharedConnection>>>,
    timeouts: TimeoutConfig,
    metrics: Option<Arc<Metrics>>,
}

impl Cluster {
    /// Create an empty cluster. The selector kind is fixed from here on.
    pub fn new(kind: SelectorKind, timeouts: TimeoutConfig) -> Self {
        Self {
            kind,
            selector: RwLock::new(kind.build()),
            timeouts,
            metrics: None,
        }
    }

    /// Create an empty cluster whose connections report to `metrics`
    pub fn with_metrics(kind: SelectorKind, timeouts: TimeoutConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new(kind, timeouts)
        }
    }

    /// Create a cluster and dial every configured server
    pub fn from_config(config: &ClusterConfig) -> Result<Self> {
        let cluster = Self::new(config.selector, config.timeouts);
        cluster.configure(&config.servers)?;
        Ok(cluster)
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Dial `host:port` and register it.
    ///
    /// A failed dial leaves the node set untouched.
    pub fn add(&self, host: &str, port: u16) -> Result<()> {
        let conn = match NodeConnection::connect_timeout(host, port, &self.timeouts) {
            Ok(conn) => conn,
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.connect_errors.inc();
                }
                return Err(e);
            }
        };
        let conn = match &self.metrics {
            Some(metrics) => {
                metrics.connections_opened.inc();
                conn.with_metrics(Arc::clone(metrics))
            }
            None => conn,
        };

        self.selector
            .write()
            .add(host, port, Arc::new(Mutex::new(conn)));
        debug!("Added {}:{} to {} cluster", host, port, self.kind);
        Ok(())
    }

    /// Parse and add each `host:port` endpoint in order.
    ///
    /// Stops at the first bad endpoint or failed dial; nodes added before it stay.
    pub fn configure<I, S>(&self, endpoints: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for endpoint in endpoints {
            let (host, port) = parse_endpoint(endpoint.as_ref())?;
            self.add(&host, port)?;
        }
        Ok(())
    }

    /// Connection owning `key`, or `None` if the cluster has no nodes
    pub fn get(&self, key: &[u8]) -> Option<SharedConnection> {
        self.selector.read().get(key).cloned()
    }

    /// Snapshot of all connections in the order they were added
    pub fn list(&self) -> Vec<SharedConnection> {
        self.selector.read().list().to_vec()
    }

    pub fn len(&self) -> usize {
        self.selector.read().list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("kind", &self.kind)
            .field("nodes", &self.len())
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
