//! A single blocking connection to one memcached node

use crate::config::TimeoutConfig;
use crate::metrics::Metrics;
use crate::protocol::{Value, decode_reply};
use crate::session::CommandSession;
use crate::{MemshardError, Result};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// One live TCP connection to one node.
///
/// Commands are strictly request/response: one command is written, then its
/// whole reply is read before the next command may be issued. The connection
/// is not shared between callers; the cluster hands it out behind a mutex.
///
/// A failed exchange can leave part of a reply unread, so the first error
/// shuts the socket down and every later command fails with `NotConnected`.
pub struct NodeConnection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    host: String,
    port: u16,
    timeouts: TimeoutConfig,
    metrics: Option<Arc<Metrics>>,
    broken: bool,
}

impl NodeConnection {
    /// Dial without any deadlines
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_timeout(host, port, &TimeoutConfig::none())
    }

    /// Dial with a bounded connect, then apply the read/write deadlines to the socket.
    ///
    /// Socket timeouts apply to each individual read or write call, so every
    /// partial read of a large value gets its own deadline.
    pub fn connect_timeout(host: &str, port: u16, timeouts: &TimeoutConfig) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let stream = dial(host, port, timeouts).map_err(|source| MemshardError::Connect {
            addr: addr.clone(),
            source,
        })?;

        // Disable Nagle's algorithm for lower latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeouts.read())?;
        stream.set_write_timeout(timeouts.write())?;

        let read_stream = stream.try_clone()?;
        debug!("Connected to {}", addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            host: host.to_string(),
            port,
            timeouts: *timeouts,
            metrics: None,
            broken: false,
        })
    }

    /// Attach metrics that every command on this connection reports to
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// True once an exchange has failed; the connection accepts no more commands
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Build a session for `name` with the given arguments.
    ///
    /// Unknown command names fail here, before anything touches the socket.
    pub fn create_command(&self, name: &str, args: &[Value]) -> Result<CommandSession> {
        CommandSession::new(name, args).map_err(|e| {
            if let Some(metrics) = &self.metrics {
                metrics.protocol_errors.inc();
            }
            e.into()
        })
    }

    /// Write the session's request (plus `body` for storage commands) and decode the reply.
    ///
    /// `body` is ignored for commands that carry no data block. The returned
    /// session holds the decoded result. On error the session is dropped and
    /// the connection is shut down.
    pub fn send(
        &mut self,
        mut session: CommandSession,
        body: impl Into<Value>,
    ) -> Result<CommandSession> {
        if self.broken {
            return Err(std::io::Error::new(
                ErrorKind::NotConnected,
                format!(
                    "connection to {}:{} is closed after an earlier error",
                    self.host, self.port
                ),
            )
            .into());
        }
        if session.kind().has_body() {
            session.push_body(&body.into());
        }
        let started = Instant::now();
        if let Some(metrics) = &self.metrics {
            metrics.record_command(session.kind());
        }

        let result = self.exchange(&mut session);
        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(()) => metrics.record_reply(
                    session.status(),
                    session.request_body().len(),
                    session.reply_body().len(),
                    started.elapsed(),
                ),
                Err(MemshardError::Protocol(_)) => metrics.protocol_errors.inc(),
                Err(_) => metrics.io_errors.inc(),
            }
        }
        if let Err(e) = result {
            self.broken = true;
            let _ = self.writer.get_ref().shutdown(Shutdown::Both);
            debug!("{}:{} closed after error: {}", self.host, self.port, e);
            return Err(e);
        }

        trace!(
            "{}:{} {:?} -> {:?}",
            self.host,
            self.port,
            session.kind(),
            session.status()
        );
        Ok(session)
    }

    /// Create and send a command in one step
    pub fn command(
        &mut self,
        name: &str,
        body: impl Into<Value>,
        args: &[Value],
    ) -> Result<CommandSession> {
        let session = self.create_command(name, args)?;
        self.send(session, body)
    }

    fn exchange(&mut self, session: &mut CommandSession) -> Result<()> {
        self.writer.write_all(session.request_body())?;
        self.writer.flush()?;
        decode_reply(&mut self.reader, session)
    }
}

impl std::fmt::Debug for NodeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

/// Try each resolved address in turn, keeping the last error
fn dial(host: &str, port: u16, timeouts: &TimeoutConfig) -> std::io::Result<TcpStream> {
    let Some(timeout) = timeouts.connect() else {
        return TcpStream::connect((host, port));
    };

    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{host} resolved to no addresses"),
        )
    }))
}
