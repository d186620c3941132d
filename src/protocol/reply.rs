//! Decoded reply types

use crate::ValueError;
use bytes::Bytes;

/// Terminal classification of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum ReplyStatus {
    /// Nothing recognised yet, or a reply line that carries no status
    #[default]
    Unknown = 0,
    Stored = 1,
    NotStored = 2,
    Exists = 3,
    NotFound = 4,
    Error = 5,
    ClientError = 6,
    ServerError = 7,
    Deleted = 8,
    Touched = 9,
    /// Reserved; a bare `OK` line decodes as `Unknown`
    Ok = 10,
    Busy = 11,
    BadClass = 12,
    NoSpare = 13,
    NotFull = 14,
    Unsafe = 15,
    Same = 16,
    /// VALUE, STAT or bare numeric data was returned
    Value = 17,
}

impl ReplyStatus {
    /// Returns true for ERROR, CLIENT_ERROR and SERVER_ERROR
    pub fn is_error(self) -> bool {
        matches!(
            self,
            ReplyStatus::Error | ReplyStatus::ClientError | ReplyStatus::ServerError
        )
    }
}

/// One retrieved item: the fields of a `VALUE` header plus its data block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Item {
    pub flags: String,
    /// Declared data length, as sent by the server
    pub bytes: String,
    /// CAS token, only present for `gets`
    pub unique: Option<String>,
    /// Data block with the trailing CRLF stripped, set once the body is read
    pub data: Option<Bytes>,
}

impl Item {
    /// Look up a field by its protocol name: `flags`, `bytes`, `unique` or `data`
    pub fn field(&self, name: &str) -> Option<&[u8]> {
        match name {
            "flags" => Some(self.flags.as_bytes()),
            "bytes" => Some(self.bytes.as_bytes()),
            "unique" => self.unique.as_deref().map(str::as_bytes),
            "data" => self.data.as_deref(),
            _ => None,
        }
    }

    /// Data block as UTF-8 text
    pub fn as_str(&self) -> Result<&str, ValueError> {
        std::str::from_utf8(self.data.as_deref().unwrap_or_default())
            .map_err(|_| ValueError::NotUtf8)
    }

    /// Data block parsed as a base-10 integer
    pub fn to_i64(&self) -> Result<i64, ValueError> {
        parse_i64(self.as_str()?)
    }

    /// Data block parsed as a float
    pub fn to_f64(&self) -> Result<f64, ValueError> {
        parse_f64(self.as_str()?)
    }

    /// Flags parsed as the 32-bit integer the server stores
    pub fn flags_u32(&self) -> Result<u32, ValueError> {
        self.flags
            .parse()
            .map_err(|_| ValueError::NotInteger(self.flags.clone()))
    }

    /// CAS token parsed as a 64-bit integer
    pub fn cas(&self) -> Option<u64> {
        self.unique.as_deref().and_then(|u| u.parse().ok())
    }
}

/// An entry in a session's result mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyValue {
    /// Flat value: a STAT value, an error message or a bare number
    Scalar(String),
    /// Nested fields of a retrieved item
    Item(Item),
}

impl ReplyValue {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            ReplyValue::Item(item) => Some(item),
            ReplyValue::Scalar(_) => None,
        }
    }

    pub(crate) fn as_item_mut(&mut self) -> Option<&mut Item> {
        match self {
            ReplyValue::Item(item) => Some(item),
            ReplyValue::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ReplyValue::Scalar(s) => Some(s),
            ReplyValue::Item(_) => None,
        }
    }

    /// Text form: the scalar itself, or an item's data block
    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            ReplyValue::Scalar(s) => Ok(s),
            ReplyValue::Item(item) => item.as_str(),
        }
    }

    /// Raw bytes: the scalar's bytes, or an item's data block
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ReplyValue::Scalar(s) => s.as_bytes(),
            ReplyValue::Item(item) => item.data.as_deref().unwrap_or_default(),
        }
    }

    pub fn to_i64(&self) -> Result<i64, ValueError> {
        parse_i64(self.as_str()?)
    }

    pub fn to_f64(&self) -> Result<f64, ValueError> {
        parse_f64(self.as_str()?)
    }
}

fn parse_i64(s: &str) -> Result<i64, ValueError> {
    s.parse().map_err(|_| ValueError::NotInteger(s.to_string()))
}

fn parse_f64(s: &str) -> Result<f64, ValueError> {
    s.parse().map_err(|_| ValueError::NotFloat(s.to_string()))
}
