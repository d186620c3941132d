//! Memcached ASCII protocol request builder

use crate::protocol::value::Value;
use bytes::BytesMut;

/// Request builder for memcached ASCII protocol
pub struct RequestWriter {
    buf: BytesMut,
}

impl RequestWriter {
    /// Create a new request writer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the internal buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Take the buffer, leaving an empty buffer in its place
    pub fn take(&mut self) -> BytesMut {
        std::mem::take(&mut self.buf)
    }

    /// Write the command line
    /// Format: <name> <arg1> ... <argN>\r\n
    pub fn command_line(&mut self, name: &str, args: &[Value]) {
        self.buf.extend_from_slice(name.as_bytes());
        for arg in args {
            self.buf.extend_from_slice(b" ");
            arg.write_arg(&mut self.buf);
        }
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Write the data block of a storage command
    /// Format: <data>\r\n, nothing for an absent body
    pub fn body(&mut self, body: &Value) {
        body.write_body(&mut self.buf);
    }
}

impl Default for RequestWriter {
    fn default() -> Self {
        Self::new(256)
    }
}
