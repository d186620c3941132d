//! Wire representation of command arguments and storage bodies

use bytes::{Bytes, BytesMut};
use itoa::Buffer;

/// A command argument or storage body
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value: `0` as an argument, no line as a body
    #[default]
    Nil,
    /// Raw bytes, written as-is
    Bytes(Bytes),
    /// Text, written as-is
    Str(String),
    Int(i64),
    UInt(u64),
    /// Fixed-point with six decimals
    Float(f64),
}

impl Value {
    /// Returns true for the absent value
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Append the wire form of this value as a command argument
    pub fn write_arg(&self, buf: &mut BytesMut) {
        match self {
            Value::Nil => buf.extend_from_slice(b"0"),
            other => other.write_raw(buf),
        }
    }

    /// Append the wire form of this value as a storage body.
    ///
    /// `Nil` writes nothing, including no terminator.
    pub fn write_body(&self, buf: &mut BytesMut) {
        if self.is_nil() {
            return;
        }
        self.write_raw(buf);
        buf.extend_from_slice(b"\r\n");
    }

    /// Number of bytes the body occupies on the wire, excluding the terminator
    pub fn wire_len(&self) -> usize {
        match self {
            Value::Nil => 0,
            Value::Bytes(b) => b.len(),
            Value::Str(s) => s.len(),
            Value::Int(i) => Buffer::new().format(*i).len(),
            Value::UInt(u) => Buffer::new().format(*u).len(),
            Value::Float(f) => format_float(*f).len(),
        }
    }

    fn write_raw(&self, buf: &mut BytesMut) {
        let mut itoa_buf = Buffer::new();
        match self {
            Value::Nil => {}
            Value::Bytes(b) => buf.extend_from_slice(b),
            Value::Str(s) => buf.extend_from_slice(s.as_bytes()),
            Value::Int(i) => buf.extend_from_slice(itoa_buf.format(*i).as_bytes()),
            Value::UInt(u) => buf.extend_from_slice(itoa_buf.format(*u).as_bytes()),
            Value::Float(f) => buf.extend_from_slice(format_float(*f).as_bytes()),
        }
    }
}

fn format_float(f: f64) -> String {
    format!("{f:.6}")
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(b))
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Value::Int(i64::from(i))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(u: $t) -> Self {
                Value::UInt(u64::from(u))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Value::UInt(u as u64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(v: impl Into<Value>) -> Vec<u8> {
        let mut buf = BytesMut::new();
        v.into().write_arg(&mut buf);
        buf.to_vec()
    }

    fn body(v: impl Into<Value>) -> Vec<u8> {
        let mut buf = BytesMut::new();
        v.into().write_body(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_arg_forms() {
        assert_eq!(arg("id"), b"id");
        assert_eq!(arg(&b"raw\x01"[..]), b"raw\x01");
        assert_eq!(arg(-42i32), b"-42");
        assert_eq!(arg(300u64), b"300");
        assert_eq!(arg(1.5f64), b"1.500000");
        assert_eq!(arg(Value::Nil), b"0");
        assert_eq!(arg(None::<u32>), b"0");
    }

    #[test]
    fn test_body_forms() {
        assert_eq!(body(112), b"112\r\n");
        assert_eq!(body("hello"), b"hello\r\n");
        assert_eq!(body(0.25f64), b"0.250000\r\n");
        assert!(body(Value::Nil).is_empty());
    }

    #[test]
    fn test_wire_len() {
        assert_eq!(Value::from(112).wire_len(), 3);
        assert_eq!(Value::from(-7i64).wire_len(), 2);
        assert_eq!(Value::from("hello").wire_len(), 5);
        assert_eq!(Value::from(vec![0u8; 16]).wire_len(), 16);
        assert_eq!(Value::from(3.0f64).wire_len(), "3.000000".len());
        assert_eq!(Value::Nil.wire_len(), 0);
    }
}
