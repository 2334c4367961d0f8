//! Generic object transcoder
//!
//! Compound values are stored as bincode. Anything the encode side accepts
//! decodes back to an equal value.

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use super::Transcoder;

/// serde + bincode codec for `T`
pub struct SerializingTranscoder<T> {
    // fn() -> T keeps the transcoder Send + Sync for any T
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerializingTranscoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerializingTranscoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerializingTranscoder<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SerializingTranscoder<T> {}

impl<T> fmt::Debug for SerializingTranscoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerializingTranscoder<{}>", std::any::type_name::<T>())
    }
}

impl<T> Transcoder for SerializingTranscoder<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(value)?))
    }

    fn decode(&self, data: Bytes) -> Result<T> {
        Ok(bincode::deserialize(&data)?)
    }
}
