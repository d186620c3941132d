//! memshard - demonstration client
//!
//! Connects to the configured memcached servers, routes the key `id` to its
//! owner and runs a short set/get/incr/stats sequence against it.

use memshard::metrics::Metrics;
use memshard::{Cluster, ClusterConfig, ReplyValue, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = if let Some(config_path) = std::env::args().nth(1) {
        info!("Loading configuration from {}", config_path);
        ClusterConfig::from_file(&config_path)?
    } else {
        info!("Using environment configuration (set MEMSHARD_* env vars to customize)");
        ClusterConfig::from_env()?
    };

    info!("Configuration: {:?}", config);
    if config.servers.is_empty() {
        anyhow::bail!("no servers configured");
    }

    let metrics = Arc::new(Metrics::new());
    let cluster = Cluster::with_metrics(config.selector, config.timeouts, Arc::clone(&metrics));
    cluster.configure(&config.servers)?;
    info!("Connected to {} servers using {} selection", cluster.len(), cluster.kind());

    let key = "id";
    let Some(conn) = cluster.get(key.as_bytes()) else {
        anyhow::bail!("no server available for {key}");
    };
    let mut conn = conn.lock();
    info!("{} is owned by {}:{}", key, conn.host(), conn.port());

    let body = Value::from(112);
    let session = conn.command(
        "set",
        body.clone(),
        &[key.into(), 0.into(), 0.into(), body.wire_len().into()],
    )?;
    info!("set {} -> {:?}", key, session.status());

    let session = conn.command("get", Value::Nil, &[key.into()])?;
    match session.item(key) {
        Some(item) => info!("get {} -> {:?} ({:?})", key, item.to_i64(), session.status()),
        None => warn!("get {} -> miss", key),
    }

    let session = conn.command("incr", Value::Nil, &[key.into(), 20.into()])?;
    match session.values().get("data").map(ReplyValue::to_i64) {
        Some(Ok(value)) => info!("incr {} -> {}", key, value),
        _ => warn!("incr {} -> {:?} {}", key, session.status(), session.error()),
    }

    let session = conn.command("stats", Value::Nil, &[])?;
    let mut stats: Vec<_> = session.values().iter().collect();
    stats.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in stats {
        info!("stat {} = {}", name, String::from_utf8_lossy(value.as_bytes()));
    }

    debug!("Metrics:\n{}", metrics.gather());
    Ok(())
}
