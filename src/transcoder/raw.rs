//! Byte and text transcoders

use bytes::Bytes;

use crate::error::{RedlineError, Result};
use super::Transcoder;

/// Identity on bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTranscoder;

/// UTF-8 text
#[derive(Debug, Clone, Copy, Default)]
pub struct StringTranscoder;

impl Transcoder for RawTranscoder {
    type Value = Bytes;

    fn encode(&self, value: &Bytes) -> Result<Bytes> {
        Ok(value.clone())
    }

    fn decode(&self, data: Bytes) -> Result<Bytes> {
        Ok(data)
    }
}

impl Transcoder for StringTranscoder {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode(&self, data: Bytes) -> Result<String> {
        String::from_utf8(data.to_vec())
            .map_err(|e| RedlineError::Transcoder(format!("payload is not UTF-8: {}", e)))
    }
}
