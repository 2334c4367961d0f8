//! Protocol Module
//!
//! Wire format shared with any RESP-speaking server.
//!
//! ## Request Format
//! ```text
//! *3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n
//! └┬─┘  └─────┬────┘ └───┬──┘ └───┬──┘
//! argc    command name   key     value
//! ```
//!
//! ## Reply Format
//! | Sigil | Shape      | Example                  |
//! |-------|------------|--------------------------|
//! | `+`   | status     | `+OK\r\n`                |
//! | `-`   | error      | `-ERR unknown\r\n`       |
//! | `:`   | integer    | `:42\r\n`                |
//! | `$`   | bulk       | `$3\r\nfoo\r\n`, `$-1\r\n` |
//! | `*`   | multi-bulk | `*2\r\n:1\r\n:2\r\n`, `*-1\r\n` |
//!
//! The protocol carries no request ids: the Nth reply answers the Nth command.

mod command;
mod decoder;
mod encoder;
mod reply;

pub use command::{Command, CommandName, Pending};
pub use decoder::{ReplyDecoder, DEFAULT_MAX_BULK_LEN, DEFAULT_MAX_DEPTH};
pub use encoder::{encode_command, encode_parts};
pub use reply::Reply;
