//! Reply definitions
//!
//! The five reply shapes a server can send.

use std::fmt;

use bytes::Bytes;

use crate::error::{RedlineError, Result};
use crate::transcoder::Transcoder;

/// A single decoded reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK\r\n`
    Status(String),

    /// `-ERR message\r\n`
    Error(String),

    /// `:42\r\n`
    Integer(i64),

    /// `$3\r\nfoo\r\n`, or `$-1\r\n` for nil
    Bulk(Option<Bytes>),

    /// `*2\r\n...`, or `*-1\r\n` for nil. Elements may nest.
    MultiBulk(Option<Vec<Reply>>),
}

impl Reply {
    /// Short name of the reply shape, for logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(None) => "nil bulk",
            Reply::Bulk(Some(_)) => "bulk",
            Reply::MultiBulk(None) => "nil multi-bulk",
            Reply::MultiBulk(Some(_)) => "multi-bulk",
        }
    }

    /// True for a nil bulk or nil multi-bulk
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Bulk(None) | Reply::MultiBulk(None))
    }

    /// Convenience constructor for a non-nil bulk
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(Some(data.into()))
    }
}

// =============================================================================
// Reply Mapping
// =============================================================================

impl Reply {
    /// Status text (`+OK`), also accepting a bulk string (`ECHO`)
    pub fn into_status(self) -> Result<String> {
        match self {
            Reply::Status(text) => Ok(text),
            Reply::Bulk(Some(data)) => String::from_utf8(data.to_vec())
                .map_err(|e| RedlineError::Transcoder(format!("status is not UTF-8: {}", e))),
            other => Err(other.unexpected("status")),
        }
    }

    /// Integer reply
    pub fn into_integer(self) -> Result<i64> {
        match self {
            Reply::Integer(n) => Ok(n),
            other => Err(other.unexpected("integer")),
        }
    }

    /// Integer reply read as a flag (`SETNX`, `EXISTS`, `EXPIRE`)
    pub fn into_bool(self) -> Result<bool> {
        self.into_integer().map(|n| n != 0)
    }

    /// Single payload through `transcoder`; nil is `None`
    ///
    /// Integer and status replies are fed to the transcoder as their decimal
    /// or text form, so the engine never has to look at the payload shape.
    pub fn decode_with<T: Transcoder>(self, transcoder: &T) -> Result<Option<T::Value>> {
        match self {
            Reply::Bulk(None) | Reply::MultiBulk(None) => Ok(None),
            Reply::Bulk(Some(data)) => transcoder.decode(data).map(Some),
            Reply::Integer(n) => transcoder.decode(Bytes::from(n.to_string())).map(Some),
            Reply::Status(text) => transcoder.decode(Bytes::from(text)).map(Some),
            other => Err(other.unexpected("bulk")),
        }
    }

    /// Every element of a multi-bulk through `transcoder`; nil is empty
    pub fn decode_all_with<T: Transcoder>(self, transcoder: &T) -> Result<Vec<Option<T::Value>>> {
        match self {
            Reply::MultiBulk(None) => Ok(Vec::new()),
            Reply::MultiBulk(Some(items)) => items
                .into_iter()
                .map(|item| item.decode_with(transcoder))
                .collect(),
            other => Err(other.unexpected("multi-bulk")),
        }
    }

    fn unexpected(self, expected: &str) -> RedlineError {
        match self {
            Reply::Error(msg) => RedlineError::Server(msg),
            other => RedlineError::Transcoder(format!(
                "expected {} reply, got {}",
                expected,
                other.kind()
            )),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(text) => f.write_str(text),
            Reply::Error(msg) => write!(f, "(error) {}", msg),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(None) | Reply::MultiBulk(None) => f.write_str("(nil)"),
            Reply::Bulk(Some(data)) => match std::str::from_utf8(data) {
                Ok(text) => write!(f, "\"{}\"", text),
                Err(_) => write!(f, "{:?}", data),
            },
            Reply::MultiBulk(Some(items)) => {
                if items.is_empty() {
                    return f.write_str("(empty array)");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}
