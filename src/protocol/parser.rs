//! Hand-written memcached ASCII reply decoder
//!
//! A reply is consumed one unit at a time:
//! 1. A status/header line (up to \r\n) decides the next state
//! 2. After a `VALUE` header, a data block of the declared length plus \r\n
//!
//! Decoding stops at the first terminal line or error. There is no attempt
//! to resynchronise the stream after an error.

use crate::protocol::{CommandKind, Item, ReplyStatus, ReplyValue};
use crate::session::CommandSession;
use crate::{ProtocolError, Result};
use bytes::Bytes;
use std::io::{BufRead, ErrorKind};
#[cfg(test)]
use std::io::Read;

/// Upper bound on the up-front allocation for a data block
const BODY_PREALLOC: usize = 64 * 1024;
/// Bytes requested from the reader per call while filling a data block
const READ_CHUNK: usize = 8 * 1024;

/// Where the decoder is within a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadState {
    /// No line read yet
    Start,
    /// A data block for the given item key is expected
    Body(String),
    /// Another status/header line is expected
    Next,
    /// Reply complete
    End,
}

/// Decode a full reply into `session`, reading from `reader` until the reply ends
pub fn decode_reply<R: BufRead>(reader: &mut R, session: &mut CommandSession) -> Result<()> {
    let mut state = ReadState::Start;
    loop {
        state = match state {
            ReadState::End => return Ok(()),
            ReadState::Body(key) => read_body(reader, session, &key)?,
            ReadState::Start | ReadState::Next => {
                let line = read_line(reader, session)?;
                parse_line(session, &line)?
            }
        };
    }
}

/// Apply one reply line to the session and return the next state
pub fn parse_line(session: &mut CommandSession, line: &[u8]) -> std::result::Result<ReadState, ProtocolError> {
    let line = trim_crlf(line);
    let (token, rest) = match memchr::memchr(b' ', line) {
        Some(pos) => (&line[..pos], &line[pos + 1..]),
        None => (line, &b""[..]),
    };

    let status = match token {
        b"ERROR" => ReplyStatus::Error,
        b"STORED" => ReplyStatus::Stored,
        b"NOT_STORED" => ReplyStatus::NotStored,
        b"EXISTS" => ReplyStatus::Exists,
        b"NOT_FOUND" => ReplyStatus::NotFound,
        b"DELETED" => ReplyStatus::Deleted,
        b"TOUCHED" => ReplyStatus::Touched,
        b"CLIENT_ERROR" | b"SERVER_ERROR" => {
            session.status = if token == b"CLIENT_ERROR" {
                ReplyStatus::ClientError
            } else {
                ReplyStatus::ServerError
            };
            session.set_scalar("error", lossy(rest));
            return Ok(ReadState::End);
        }
        b"BUSY" | b"BADCLASS" | b"NOSPARE" | b"NOTFULL" | b"UNSAFE" | b"SAME" => {
            session.status = slabs_status(token);
            session.set_scalar("message", lossy(rest));
            return Ok(ReadState::End);
        }
        b"VALUE" => return parse_value_header(session, rest),
        b"STAT" => {
            let (name, value) = match memchr::memchr(b' ', rest) {
                Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                None => (rest, &b""[..]),
            };
            if name.is_empty() {
                return Err(ProtocolError::MalformedReply(lossy(line)));
            }
            session.status = ReplyStatus::Value;
            session.set_scalar(lossy(name), lossy(value));
            return Ok(ReadState::Next);
        }
        b"END" => return Ok(ReadState::End),
        // incr/decr answer with the bare new value
        _ if session.kind() == CommandKind::IncrDecr => {
            session.status = ReplyStatus::Value;
            session.set_scalar("data", lossy(token));
            return Ok(ReadState::End);
        }
        _ => return Ok(ReadState::End),
    };

    session.status = status;
    Ok(ReadState::End)
}

/// Declared data length of the pending item `key`
pub fn body_len(session: &CommandSession, key: &str) -> std::result::Result<usize, ProtocolError> {
    let item = session
        .values
        .get(key)
        .and_then(ReplyValue::as_item)
        .ok_or_else(|| ProtocolError::MissingItem(key.to_string()))?;

    item.bytes
        .parse()
        .map_err(|_| ProtocolError::InvalidBytesLength(key.to_string()))
}

/// VALUE <key> <flags> <bytes> [<unique>]
fn parse_value_header(
    session: &mut CommandSession,
    rest: &[u8],
) -> std::result::Result<ReadState, ProtocolError> {
    let mut parts = rest.split(|&b| b == b' ');
    let key = match parts.next() {
        Some(k) if !k.is_empty() => lossy(k),
        _ => return Err(ProtocolError::MalformedReply(format!("VALUE {}", lossy(rest)))),
    };

    // A missing bytes field surfaces when the data block is read
    let item = Item {
        flags: parts.next().map(lossy).unwrap_or_default(),
        bytes: parts.next().map(lossy).unwrap_or_default(),
        unique: parts.next().map(lossy),
        data: None,
    };

    session.status = ReplyStatus::Value;
    session.values.insert(key.clone(), ReplyValue::Item(item));
    Ok(ReadState::Body(key))
}

/// Read one line including its terminator, recording it in the raw reply
fn read_line<R: BufRead>(reader: &mut R, session: &mut CommandSession) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "connection closed before reply was complete",
        )
        .into());
    }
    session.reply.extend_from_slice(&line);
    Ok(line)
}

/// Read the data block of `key` plus its trailing \r\n, across as many reads as it takes
fn read_body<R: BufRead>(
    reader: &mut R,
    session: &mut CommandSession,
    key: &str,
) -> Result<ReadState> {
    let len = body_len(session, key)?;
    let total = len
        .checked_add(2)
        .ok_or_else(|| ProtocolError::InvalidBytesLength(key.to_string()))?;

    // The declared length is untrusted, so grow with what actually arrives
    let mut block = Vec::with_capacity(total.min(BODY_PREALLOC));
    let mut chunk = [0u8; READ_CHUNK];
    while block.len() < total {
        let want = (total - block.len()).min(READ_CHUNK);
        let n = match reader.read(&mut chunk[..want]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "connection closed inside a data block",
                )
                .into());
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        session.reply.extend_from_slice(&chunk[..n]);
        block.extend_from_slice(&chunk[..n]);
    }

    if !block.ends_with(b"\r\n") {
        return Err(ProtocolError::UnterminatedValue(key.to_string()).into());
    }
    block.truncate(len);

    if let Some(item) = session.values.get_mut(key).and_then(ReplyValue::as_item_mut) {
        item.data = Some(Bytes::from(block));
    }
    Ok(ReadState::Next)
}

fn slabs_status(token: &[u8]) -> ReplyStatus {
    match token {
        b"BUSY" => ReplyStatus::Busy,
        b"BADCLASS" => ReplyStatus::BadClass,
        b"NOSPARE" => ReplyStatus::NoSpare,
        b"NOTFULL" => ReplyStatus::NotFull,
        b"UNSAFE" => ReplyStatus::Unsafe,
        _ => ReplyStatus::Same,
    }
}

fn trim_crlf(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemshardError;
    use std::io::{BufReader, Cursor};

    /// Reader that hands out at most `chunk` bytes per call
    struct ChunkedReader {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn decode(command: &str, reply: &[u8]) -> Result<CommandSession> {
        let mut session = CommandSession::new(command, &[]).unwrap();
        decode_reply(&mut Cursor::new(reply.to_vec()), &mut session)?;
        Ok(session)
    }

    fn decode_chunked(command: &str, reply: &[u8], chunk: usize) -> CommandSession {
        let mut session = CommandSession::new(command, &[]).unwrap();
        let reader = ChunkedReader {
            data: reply.to_vec(),
            pos: 0,
            chunk,
        };
        let mut reader = BufReader::with_capacity(4, reader);
        decode_reply(&mut reader, &mut session).unwrap();
        session
    }

    #[test]
    fn test_stored() {
        let session = decode("set", b"STORED\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::Stored);
        assert!(session.values().is_empty());
    }

    #[test]
    fn test_bare_statuses() {
        let cases: [(&[u8], ReplyStatus); 7] = [
            (b"ERROR\r\n", ReplyStatus::Error),
            (b"NOT_STORED\r\n", ReplyStatus::NotStored),
            (b"EXISTS\r\n", ReplyStatus::Exists),
            (b"NOT_FOUND\r\n", ReplyStatus::NotFound),
            (b"DELETED\r\n", ReplyStatus::Deleted),
            (b"TOUCHED\r\n", ReplyStatus::Touched),
            (b"STORED\r\n", ReplyStatus::Stored),
        ];
        for (reply, status) in cases {
            assert_eq!(decode("delete", reply).unwrap().status(), status);
        }
    }

    #[test]
    fn test_single_value() {
        let reply = b"VALUE id 0 3\r\n112\r\nEND\r\n";
        let session = decode("get", reply).unwrap();
        assert_eq!(session.status(), ReplyStatus::Value);

        let item = session.item("id").unwrap();
        assert_eq!(item.flags, "0");
        assert_eq!(item.bytes, "3");
        assert_eq!(item.unique, None);
        assert_eq!(item.data.as_deref(), Some(&b"112"[..]));
        assert_eq!(session.reply_body(), reply);
    }

    #[test]
    fn test_gets_unique() {
        let session = decode("gets", b"VALUE id 7 2 4242\r\nhi\r\nEND\r\n").unwrap();
        let item = session.item("id").unwrap();
        assert_eq!(item.unique.as_deref(), Some("4242"));
        assert_eq!(item.flags_u32(), Ok(7));
    }

    #[test]
    fn test_multi_get() {
        let reply = b"VALUE a 0 1\r\nx\r\nVALUE b 1 3\r\nyyy\r\nEND\r\n";
        let session = decode("get", reply).unwrap();
        assert_eq!(session.values().len(), 2);
        assert_eq!(session.item("a").unwrap().data.as_deref(), Some(&b"x"[..]));
        assert_eq!(session.item("b").unwrap().data.as_deref(), Some(&b"yyy"[..]));
    }

    #[test]
    fn test_get_miss() {
        let session = decode("get", b"END\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::Unknown);
        assert!(session.values().is_empty());
    }

    #[test]
    fn test_value_with_embedded_crlf() {
        let session = decode("get", b"VALUE k 0 4\r\n\r\n\r\n\r\nEND\r\n").unwrap();
        assert_eq!(
            session.item("k").unwrap().data.as_deref(),
            Some(&b"\r\n\r\n"[..])
        );
    }

    #[test]
    fn test_empty_value() {
        let session = decode("get", b"VALUE k 0 0\r\n\r\nEND\r\n").unwrap();
        assert_eq!(session.item("k").unwrap().data.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_stats_are_flat() {
        let session = decode("stats", b"STAT pid 123\r\nSTAT uptime 456\r\nEND\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::Value);
        assert_eq!(session.values().len(), 2);
        assert_eq!(session.scalar("pid"), Some("123"));
        assert_eq!(session.scalar("uptime"), Some("456"));
        assert!(session.item("pid").is_none());
    }

    #[test]
    fn test_client_and_server_error() {
        let session = decode("set", b"CLIENT_ERROR bad data chunk\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::ClientError);
        assert_eq!(session.error(), "bad data chunk");

        let session = decode("get", b"SERVER_ERROR out of memory\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::ServerError);
        assert_eq!(session.error(), "out of memory");
    }

    #[test]
    fn test_slabs_messages() {
        let session = decode("slabs", b"BUSY currently processing reassign request\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::Busy);
        assert_eq!(
            session.message(),
            Some("currently processing reassign request")
        );

        let cases: [(&[u8], ReplyStatus); 5] = [
            (b"BADCLASS invalid src or dst class id\r\n", ReplyStatus::BadClass),
            (b"NOSPARE source class has no spare pages\r\n", ReplyStatus::NoSpare),
            (b"NOTFULL dest class has spare memory\r\n", ReplyStatus::NotFull),
            (b"UNSAFE src class is in an unsafe state\r\n", ReplyStatus::Unsafe),
            (b"SAME src and dst class are identical\r\n", ReplyStatus::Same),
        ];
        for (reply, status) in cases {
            let session = decode("slabs", reply).unwrap();
            assert_eq!(session.status(), status);
            assert!(session.message().is_some());
        }
    }

    #[test]
    fn test_incr_bare_number() {
        let session = decode("incr", b"132\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::Value);
        assert_eq!(session.scalar("data"), Some("132"));
        assert_eq!(session.values()["data"].to_i64(), Ok(132));
    }

    #[test]
    fn test_incr_not_found_keeps_status() {
        let session = decode("decr", b"NOT_FOUND\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::NotFound);
        assert!(session.scalar("data").is_none());
    }

    #[test]
    fn test_unrecognised_line_is_ignored() {
        let session = decode("touch", b"42\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::Unknown);
        assert!(session.values().is_empty());

        let session = decode("slabs", b"OK\r\n").unwrap();
        assert_eq!(session.status(), ReplyStatus::Unknown);
    }

    #[test]
    fn test_chunked_body_matches_single_read() {
        let reply = b"VALUE blob 0 10\r\n0123\r\n6789\r\nVALUE x 0 2\r\nab\r\nEND\r\n";
        let whole = decode("get", reply).unwrap();

        for chunk in [1, 2, 3, 5, 7, 64] {
            let session = decode_chunked("get", reply, chunk);
            assert_eq!(session.values(), whole.values(), "chunk size {chunk}");
            assert_eq!(session.reply_body(), reply);
        }
        assert_eq!(
            whole.item("blob").unwrap().data.as_deref(),
            Some(&b"0123\r\n6789"[..])
        );
    }

    #[test]
    fn test_invalid_bytes_length() {
        let err = decode("get", b"VALUE id 0 abc\r\n112\r\nEND\r\n").unwrap_err();
        assert!(matches!(
            err,
            MemshardError::Protocol(ProtocolError::InvalidBytesLength(ref k)) if k == "id"
        ));

        let err = decode("get", b"VALUE id 0\r\n").unwrap_err();
        assert!(matches!(
            err,
            MemshardError::Protocol(ProtocolError::InvalidBytesLength(_))
        ));

        let err = decode("get", b"VALUE id 0 -1\r\n").unwrap_err();
        assert!(matches!(
            err,
            MemshardError::Protocol(ProtocolError::InvalidBytesLength(_))
        ));
    }

    #[test]
    fn test_oversized_declared_length() {
        for header in [
            &b"VALUE k 0 18446744073709551613\r\n"[..],
            b"VALUE k 0 1000000000000\r\n",
        ] {
            let mut reply = header.to_vec();
            reply.extend_from_slice(b"abc\r\nEND\r\n");
            let err = decode("get", &reply).unwrap_err();
            assert!(matches!(err, MemshardError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));
        }

        let err = decode("get", b"VALUE k 0 18446744073709551615\r\nabc\r\n").unwrap_err();
        assert!(matches!(
            err,
            MemshardError::Protocol(ProtocolError::InvalidBytesLength(_))
        ));
    }

    #[test]
    fn test_value_without_key() {
        let err = decode("get", b"VALUE\r\n").unwrap_err();
        assert!(matches!(
            err,
            MemshardError::Protocol(ProtocolError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_unterminated_value() {
        let err = decode("get", b"VALUE id 0 3\r\n1124\r\nEND\r\n").unwrap_err();
        assert!(matches!(
            err,
            MemshardError::Protocol(ProtocolError::UnterminatedValue(_))
        ));
    }

    #[test]
    fn test_eof_mid_reply() {
        let err = decode("stats", b"STAT pid 1\r\n").unwrap_err();
        assert!(matches!(err, MemshardError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));

        let err = decode("get", b"VALUE id 0 10\r\n1234").unwrap_err();
        assert!(matches!(err, MemshardError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_parse_line_transitions() {
        let mut session = CommandSession::new("get", &[]).unwrap();
        assert_eq!(
            parse_line(&mut session, b"VALUE k 0 1\r\n"),
            Ok(ReadState::Body("k".to_string()))
        );
        assert_eq!(body_len(&session, "k"), Ok(1));
        assert_eq!(
            body_len(&session, "missing"),
            Err(ProtocolError::MissingItem("missing".to_string()))
        );
        assert_eq!(parse_line(&mut session, b"STAT a b\r\n"), Ok(ReadState::Next));
        assert_eq!(parse_line(&mut session, b"END\r\n"), Ok(ReadState::End));
    }

    #[test]
    fn test_trim_crlf() {
        assert_eq!(trim_crlf(b"END\r\n"), b"END");
        assert_eq!(trim_crlf(b"END\n"), b"END");
        assert_eq!(trim_crlf(b"END"), b"END");
        assert_eq!(trim_crlf(b"\r\n"), b"");
    }
}
