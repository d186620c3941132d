//! Configuration for memshard

use crate::selector::SelectorKind;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Server selection strategy, fixed for the lifetime of the cluster
    pub selector: SelectorKind,

    /// Servers as `host:port`, dialed in order
    pub servers: Vec<String>,

    pub timeouts: TimeoutConfig,
}

/// Socket deadlines in milliseconds (0 = no deadline)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on establishing the TCP connection
    pub connect_ms: u64,

    /// Applied to every socket write
    pub write_ms: u64,

    /// Applied to every socket read, including each partial read of a data block
    pub read_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 1000,
            write_ms: 500,
            read_ms: 500,
        }
    }
}

impl TimeoutConfig {
    /// No deadlines at all
    pub fn none() -> Self {
        Self {
            connect_ms: 0,
            write_ms: 0,
            read_ms: 0,
        }
    }

    pub fn connect(&self) -> Option<Duration> {
        non_zero(self.connect_ms)
    }

    pub fn write(&self) -> Option<Duration> {
        non_zero(self.write_ms)
    }

    pub fn read(&self) -> Option<Duration> {
        non_zero(self.read_ms)
    }
}

fn non_zero(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl ClusterConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::MemshardError::Config(format!("Failed to read config file: {e}"))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::MemshardError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables or use defaults
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();

        if let Ok(kind) = std::env::var("MEMSHARD_SELECTOR") {
            config.selector = kind.parse()?;
        }

        if let Ok(servers) = std::env::var("MEMSHARD_SERVERS") {
            config.servers = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(ms) = env_millis("MEMSHARD_CONNECT_TIMEOUT_MS")? {
            config.timeouts.connect_ms = ms;
        }
        if let Some(ms) = env_millis("MEMSHARD_WRITE_TIMEOUT_MS")? {
            config.timeouts.write_ms = ms;
        }
        if let Some(ms) = env_millis("MEMSHARD_READ_TIMEOUT_MS")? {
            config.timeouts.read_ms = ms;
        }

        Ok(config)
    }
}

fn env_millis(name: &str) -> crate::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| crate::MemshardError::Config(format!("{name}={value}: {e}"))),
        Err(_) => Ok(None),
    }
}
