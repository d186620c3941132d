//! Per-command request/reply state

use crate::ProtocolError;
use crate::protocol::{CommandKind, Item, ReplyStatus, ReplyValue, RequestWriter, Value};
use bytes::BytesMut;
use std::collections::HashMap;

/// One request/response exchange.
///
/// Created by [`NodeConnection::create_command`](crate::NodeConnection::create_command),
/// filled in by `send`, then read by the caller. A session is never reused.
#[derive(Debug)]
pub struct CommandSession {
    kind: CommandKind,
    pub(crate) status: ReplyStatus,
    pub(crate) request: BytesMut,
    pub(crate) reply: BytesMut,
    pub(crate) values: HashMap<String, ReplyValue>,
}

impl CommandSession {
    /// Classify `name` and encode its command line.
    ///
    /// Fails with [`ProtocolError::InvalidCommand`] for names outside the
    /// supported command families.
    pub fn new(name: &str, args: &[Value]) -> Result<Self, ProtocolError> {
        let (kind, name) = CommandKind::classify(name)?;
        let mut writer = RequestWriter::default();
        writer.command_line(&name, args);

        Ok(Self {
            kind,
            status: ReplyStatus::Unknown,
            request: writer.take(),
            reply: BytesMut::new(),
            values: HashMap::new(),
        })
    }

    /// Append the data block line (storage commands only)
    pub(crate) fn push_body(&mut self, body: &Value) {
        body.write_body(&mut self.request);
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn status(&self) -> ReplyStatus {
        self.status
    }

    /// Error text of a CLIENT_ERROR or SERVER_ERROR reply, empty otherwise
    pub fn error(&self) -> &str {
        self.scalar("error").unwrap_or_default()
    }

    /// Message of a slabs reply such as BUSY or NOSPARE
    pub fn message(&self) -> Option<&str> {
        self.scalar("message")
    }

    /// All decoded values keyed by item key, stat name or pseudo-key
    pub fn values(&self) -> &HashMap<String, ReplyValue> {
        &self.values
    }

    /// The retrieved item for `key`, if the reply carried one
    pub fn item(&self, key: &str) -> Option<&Item> {
        self.values.get(key).and_then(ReplyValue::as_item)
    }

    /// A flat value such as a stat or the `data` of an incr/decr reply
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(ReplyValue::as_scalar)
    }

    /// Bytes written to the server
    pub fn request_body(&self) -> &[u8] {
        &self.request
    }

    /// Bytes read from the server
    pub fn reply_body(&self) -> &[u8] {
        &self.reply
    }

    pub(crate) fn set_scalar(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), ReplyValue::Scalar(value.into()));
    }
}
