//! Memcached ASCII protocol, client side

pub mod command;
pub mod parser;
pub mod reply;
pub mod request;
pub mod value;

pub use command::CommandKind;
pub use parser::{ReadState, body_len, decode_reply, parse_line};
pub use reply::{Item, ReplyStatus, ReplyValue};
pub use request::RequestWriter;
pub use value::Value;
