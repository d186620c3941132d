//! Prometheus metrics for memshard clients

use crate::protocol::{CommandKind, ReplyStatus};
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::time::Duration;

/// Client-side metrics, shared by every connection of a cluster
pub struct Metrics {
    pub registry: Registry,

    // Command counters
    pub cmd_storage: IntCounter,
    pub cmd_retrieval: IntCounter,
    pub cmd_deletion: IntCounter,
    pub cmd_incr_decr: IntCounter,
    pub cmd_touch: IntCounter,
    pub cmd_slabs: IntCounter,
    pub cmd_stats: IntCounter,

    // Connection metrics
    pub connections_opened: IntCounter,
    pub connect_errors: IntCounter,

    // Bytes counters
    pub bytes_read: IntCounter,
    pub bytes_written: IntCounter,

    // Latency histograms
    pub cmd_latency: Histogram,

    // Error counters
    pub io_errors: IntCounter,
    pub protocol_errors: IntCounter,
    pub reply_errors: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("valid metric name");
    registry
        .register(Box::new(counter.clone()))
        .expect("metric registered once");
    counter
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        let registry = Registry::new();
        let r = &registry;

        let cmd_latency = Histogram::with_opts(
            HistogramOpts::new("memshard_cmd_latency_seconds", "Command round trip in seconds")
                .buckets(vec![
                    0.0001, 0.0005, 0.001, 0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
                ]),
        )
        .expect("valid histogram");
        registry
            .register(Box::new(cmd_latency.clone()))
            .expect("metric registered once");

        Self {
            cmd_storage: counter(r, "memshard_cmd_storage_total", "Total storage commands"),
            cmd_retrieval: counter(r, "memshard_cmd_retrieval_total", "Total get/gets commands"),
            cmd_deletion: counter(r, "memshard_cmd_delete_total", "Total DELETE commands"),
            cmd_incr_decr: counter(r, "memshard_cmd_incr_decr_total", "Total INCR/DECR commands"),
            cmd_touch: counter(r, "memshard_cmd_touch_total", "Total TOUCH commands"),
            cmd_slabs: counter(r, "memshard_cmd_slabs_total", "Total SLABS commands"),
            cmd_stats: counter(r, "memshard_cmd_stats_total", "Total STATS commands"),
            connections_opened: counter(
                r,
                "memshard_connections_opened_total",
                "Total connections established",
            ),
            connect_errors: counter(r, "memshard_connect_errors_total", "Total failed dials"),
            bytes_read: counter(r, "memshard_bytes_read_total", "Total bytes read"),
            bytes_written: counter(r, "memshard_bytes_written_total", "Total bytes written"),
            io_errors: counter(r, "memshard_io_errors_total", "Total socket errors and timeouts"),
            protocol_errors: counter(
                r,
                "memshard_protocol_errors_total",
                "Total undecodable replies",
            ),
            reply_errors: counter(
                r,
                "memshard_reply_errors_total",
                "Total ERROR, CLIENT_ERROR and SERVER_ERROR replies",
            ),
            cmd_latency,
            registry,
        }
    }

    /// Count a command of `kind`
    pub fn record_command(&self, kind: CommandKind) {
        match kind {
            CommandKind::Storage => self.cmd_storage.inc(),
            CommandKind::Retrieval => self.cmd_retrieval.inc(),
            CommandKind::Deletion => self.cmd_deletion.inc(),
            CommandKind::IncrDecr => self.cmd_incr_decr.inc(),
            CommandKind::Touch => self.cmd_touch.inc(),
            CommandKind::Slabs => self.cmd_slabs.inc(),
            CommandKind::Statistics => self.cmd_stats.inc(),
        }
    }

    /// Record a completed exchange
    pub fn record_reply(&self, status: ReplyStatus, written: usize, read: usize, elapsed: Duration) {
        self.bytes_written.inc_by(written as u64);
        self.bytes_read.inc_by(read as u64);
        self.cmd_latency.observe(elapsed.as_secs_f64());
        if status.is_error() {
            self.reply_errors.inc();
        }
    }

    /// Get Prometheus formatted metrics
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
