//! Transcoder Module
//!
//! Codecs between typed application values and raw wire payloads.
//!
//! ## Responsibilities
//! - Turn a typed argument into the bytes sent on the wire
//! - Turn a reply payload back into the caller's type
//!
//! Each call site binds one transcoder statically; the engine never looks at
//! payload shape to pick one.
//!
//! | Transcoder | Value | Wire form |
//! |---|---|---|
//! | `IntegerTranscoder` | `i32` | canonical decimal ASCII |
//! | `LongTranscoder` | `i64` | canonical decimal ASCII |
//! | `DoubleTranscoder` | `f64` | decimal, optional fraction |
//! | `RawTranscoder` | `Bytes` | identity |
//! | `StringTranscoder` | `String` | UTF-8 |
//! | `SerializingTranscoder<T>` | any serde type | bincode |

mod numeric;
mod raw;
mod serializing;

pub use numeric::{DoubleTranscoder, IntegerTranscoder, LongTranscoder};
pub use raw::{RawTranscoder, StringTranscoder};
pub use serializing::SerializingTranscoder;

use bytes::Bytes;

use crate::error::Result;

/// A stateless codec for one value type
pub trait Transcoder: Send + Sync + 'static {
    /// The application-side type
    type Value: Send + 'static;

    /// Value to wire bytes
    fn encode(&self, value: &Self::Value) -> Result<Bytes>;

    /// Wire bytes to value; fails with `RedlineError::Transcoder`
    fn decode(&self, data: Bytes) -> Result<Self::Value>;
}
