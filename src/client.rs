//! Client facade
//!
//! Typed command surface over one [`Connection`]. Every method builds a
//! command, submits it and returns a [`Pending`] handle right away; failures
//! only show up when the handle is inspected.
//!
//! Typed variants (`set_i32`, `get_f64`, ...) differ only in the transcoder
//! they bind. The `*_with` methods take any transcoder.
//!
//! # Example
//!
//! ```no_run
//! use redline::{Client, Config};
//!
//! let config = Config::builder().address("127.0.0.1:6379").build();
//! let client = Client::connect(config).unwrap();
//!
//! let set = client.set_str("greeting", "hello");
//! let get = client.get_str("greeting");
//! set.wait().unwrap();
//! assert_eq!(get.wait().unwrap().as_deref(), Some("hello"));
//! ```

use std::borrow::Borrow;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::network::{Connection, ConnectionState};
use crate::protocol::{Command, CommandName, Pending, Reply};
use crate::transcoder::{
    DoubleTranscoder, IntegerTranscoder, LongTranscoder, RawTranscoder, SerializingTranscoder,
    StringTranscoder, Transcoder,
};

/// Pipelined client for one server
///
/// `Client` is `Send + Sync`; share it across threads behind an `Arc`.
pub struct Client {
    connection: Connection,
}

impl Client {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connect and run the handshake
    ///
    /// Blocks until AUTH (if a password is set) and then SELECT (if the
    /// database is not 0) have been answered. Either failing aborts with
    /// `RedlineError::Connection`, and nothing after the failed step is sent.
    pub fn connect(config: Config) -> Result<Self> {
        let connection = Connection::open(config)?;
        Ok(Self { connection })
    }

    /// Connect to `addr` with default settings
    pub fn open(addr: impl Into<String>) -> Result<Self> {
        Self::connect(Config::builder().address(addr).build())
    }

    /// Reconnect a `Disconnected` client and repeat the handshake
    ///
    /// User commands issued while this runs fail with `ConnectionClosed`;
    /// none reach the wire ahead of AUTH and SELECT. If the handshake fails
    /// the client is `Disconnected` again.
    pub fn reconnect(&self) -> Result<()> {
        self.connection.connect()
    }

    /// Close the connection; pending commands fail with `ConnectionClosed`
    pub fn close(&self) {
        self.connection.close();
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Commands written but not yet answered
    pub fn pending(&self) -> usize {
        self.connection.pending()
    }

    pub fn config(&self) -> &Config {
        self.connection.config()
    }

    // =========================================================================
    // Engine entry point
    // =========================================================================

    /// Submit `name args...` and map the reply with `map`
    pub fn execute<T, F>(&self, name: CommandName, args: Vec<Bytes>, map: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        let (command, pending) = Command::new(name, args, map);
        self.connection.submit(command);
        pending
    }

    /// Encode `value` as the last argument, or fail the handle if it cannot be
    fn execute_value<X, T, F>(
        &self,
        name: CommandName,
        mut args: Vec<Bytes>,
        transcoder: &X,
        value: &X::Value,
        map: F,
    ) -> Pending<T>
    where
        X: Transcoder,
        T: Send + 'static,
        F: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        match transcoder.encode(value) {
            Ok(encoded) => {
                args.push(encoded);
                self.execute(name, args, map)
            }
            Err(e) => Pending::failed(name, e),
        }
    }

    // =========================================================================
    // Connection commands
    // =========================================================================

    pub fn auth(&self, password: impl AsRef<[u8]>) -> Pending<String> {
        self.execute(CommandName::Auth, vec![arg(password)], Reply::into_status)
    }

    pub fn ping(&self) -> Pending<String> {
        self.execute(CommandName::Ping, Vec::new(), Reply::into_status)
    }

    pub fn echo(&self, message: impl AsRef<[u8]>) -> Pending<String> {
        self.execute(CommandName::Echo, vec![arg(message)], Reply::into_status)
    }

    pub fn select(&self, db: u32) -> Pending<String> {
        self.execute(CommandName::Select, vec![number(db)], Reply::into_status)
    }

    /// Ask the server to close the connection after replying
    pub fn quit(&self) -> Pending<String> {
        self.execute(CommandName::Quit, Vec::new(), Reply::into_status)
    }

    // =========================================================================
    // Key commands
    // =========================================================================

    /// Delete one key; resolves to the number of keys removed
    pub fn del(&self, key: impl AsRef<[u8]>) -> Pending<i64> {
        self.execute(CommandName::Del, vec![arg(key)], Reply::into_integer)
    }

    /// Delete several keys in one command
    pub fn del_many<K: AsRef<[u8]>>(&self, keys: &[K]) -> Pending<i64> {
        let args = keys.iter().map(arg).collect();
        self.execute(CommandName::Del, args, Reply::into_integer)
    }

    pub fn exists(&self, key: impl AsRef<[u8]>) -> Pending<bool> {
        self.execute(CommandName::Exists, vec![arg(key)], Reply::into_bool)
    }

    /// Set a time-to-live; false if the key does not exist
    pub fn expire(&self, key: impl AsRef<[u8]>, seconds: u64) -> Pending<bool> {
        self.execute(CommandName::Expire, vec![arg(key), number(seconds)], Reply::into_bool)
    }

    /// Expire at a unix timestamp in seconds; false if the key does not exist
    pub fn expire_at(&self, key: impl AsRef<[u8]>, unix_seconds: u64) -> Pending<bool> {
        self.execute(CommandName::ExpireAt, vec![arg(key), number(unix_seconds)], Reply::into_bool)
    }

    /// Names of all keys matching a glob `pattern`
    pub fn keys(&self, pattern: impl AsRef<[u8]>) -> Pending<Vec<String>> {
        self.execute(CommandName::Keys, vec![arg(pattern)], |reply| {
            let names = reply.decode_all_with(&StringTranscoder)?;
            Ok(names.into_iter().flatten().collect())
        })
    }

    /// MOVE a key to database `db`; false if it was not moved
    pub fn move_db(&self, key: impl AsRef<[u8]>, db: u32) -> Pending<bool> {
        self.execute(CommandName::Move, vec![arg(key), number(db)], Reply::into_bool)
    }

    /// Remove a time-to-live; false if there was none
    pub fn persist(&self, key: impl AsRef<[u8]>) -> Pending<bool> {
        self.execute(CommandName::Persist, vec![arg(key)], Reply::into_bool)
    }

    // =========================================================================
    // SET family
    // =========================================================================

    pub fn set_with<X: Transcoder>(&self, key: impl AsRef<[u8]>, transcoder: &X, value: &X::Value) -> Pending<String> {
        self.execute_value(CommandName::Set, vec![arg(key)], transcoder, value, Reply::into_status)
    }

    pub fn set_i32(&self, key: impl AsRef<[u8]>, value: i32) -> Pending<String> {
        self.set_with(key, &IntegerTranscoder, &value)
    }

    pub fn set_i64(&self, key: impl AsRef<[u8]>, value: i64) -> Pending<String> {
        self.set_with(key, &LongTranscoder, &value)
    }

    pub fn set_f64(&self, key: impl AsRef<[u8]>, value: f64) -> Pending<String> {
        self.set_with(key, &DoubleTranscoder, &value)
    }

    pub fn set_str(&self, key: impl AsRef<[u8]>, value: impl Into<String>) -> Pending<String> {
        self.set_with(key, &StringTranscoder, &value.into())
    }

    pub fn set_raw(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>) -> Pending<String> {
        self.set_with(key, &RawTranscoder, &value.into())
    }

    /// Store any serde value with the generic object transcoder
    pub fn set_object<V>(&self, key: impl AsRef<[u8]>, value: &V) -> Pending<String>
    where
        V: Serialize + DeserializeOwned + Send + 'static,
    {
        self.set_with(key, &SerializingTranscoder::<V>::new(), value)
    }

    /// SETNX; resolves to true if the key was set
    pub fn setnx_with<X: Transcoder>(&self, key: impl AsRef<[u8]>, transcoder: &X, value: &X::Value) -> Pending<bool> {
        self.execute_value(CommandName::SetNx, vec![arg(key)], transcoder, value, Reply::into_bool)
    }

    pub fn setnx_i32(&self, key: impl AsRef<[u8]>, value: i32) -> Pending<bool> {
        self.setnx_with(key, &IntegerTranscoder, &value)
    }

    pub fn setnx_i64(&self, key: impl AsRef<[u8]>, value: i64) -> Pending<bool> {
        self.setnx_with(key, &LongTranscoder, &value)
    }

    pub fn setnx_f64(&self, key: impl AsRef<[u8]>, value: f64) -> Pending<bool> {
        self.setnx_with(key, &DoubleTranscoder, &value)
    }

    pub fn setnx_str(&self, key: impl AsRef<[u8]>, value: impl Into<String>) -> Pending<bool> {
        self.setnx_with(key, &StringTranscoder, &value.into())
    }

    pub fn setnx_object<V>(&self, key: impl AsRef<[u8]>, value: &V) -> Pending<bool>
    where
        V: Serialize + DeserializeOwned + Send + 'static,
    {
        self.setnx_with(key, &SerializingTranscoder::<V>::new(), value)
    }

    /// SETEX key seconds value
    pub fn set_ex_with<X: Transcoder>(
        &self,
        key: impl AsRef<[u8]>,
        seconds: u64,
        transcoder: &X,
        value: &X::Value,
    ) -> Pending<String> {
        let args = vec![arg(key), number(seconds)];
        self.execute_value(CommandName::SetEx, args, transcoder, value, Reply::into_status)
    }

    pub fn set_ex_i32(&self, key: impl AsRef<[u8]>, seconds: u64, value: i32) -> Pending<String> {
        self.set_ex_with(key, seconds, &IntegerTranscoder, &value)
    }

    pub fn set_ex_i64(&self, key: impl AsRef<[u8]>, seconds: u64, value: i64) -> Pending<String> {
        self.set_ex_with(key, seconds, &LongTranscoder, &value)
    }

    pub fn set_ex_f64(&self, key: impl AsRef<[u8]>, seconds: u64, value: f64) -> Pending<String> {
        self.set_ex_with(key, seconds, &DoubleTranscoder, &value)
    }

    pub fn set_ex_str(&self, key: impl AsRef<[u8]>, seconds: u64, value: impl Into<String>) -> Pending<String> {
        self.set_ex_with(key, seconds, &StringTranscoder, &value.into())
    }

    pub fn set_ex_object<V>(&self, key: impl AsRef<[u8]>, seconds: u64, value: &V) -> Pending<String>
    where
        V: Serialize + DeserializeOwned + Send + 'static,
    {
        self.set_ex_with(key, seconds, &SerializingTranscoder::<V>::new(), value)
    }

    // =========================================================================
    // GET family
    // =========================================================================

    /// GET through `transcoder`; a missing key resolves to `None`
    pub fn get_with<X: Transcoder>(&self, key: impl AsRef<[u8]>, transcoder: X) -> Pending<Option<X::Value>> {
        self.execute(CommandName::Get, vec![arg(key)], move |reply| reply.decode_with(&transcoder))
    }

    pub fn get_object<V>(&self, key: impl AsRef<[u8]>) -> Pending<Option<V>>
    where
        V: Serialize + DeserializeOwned + Send + 'static,
    {
        self.get_with(key, SerializingTranscoder::<V>::new())
    }

    pub fn get_i32(&self, key: impl AsRef<[u8]>) -> Pending<Option<i32>> {
        self.get_with(key, IntegerTranscoder)
    }

    pub fn get_i64(&self, key: impl AsRef<[u8]>) -> Pending<Option<i64>> {
        self.get_with(key, LongTranscoder)
    }

    pub fn get_f64(&self, key: impl AsRef<[u8]>) -> Pending<Option<f64>> {
        self.get_with(key, DoubleTranscoder)
    }

    pub fn get_str(&self, key: impl AsRef<[u8]>) -> Pending<Option<String>> {
        self.get_with(key, StringTranscoder)
    }

    pub fn get_raw(&self, key: impl AsRef<[u8]>) -> Pending<Option<Bytes>> {
        self.get_with(key, RawTranscoder)
    }

    /// GETSET: store `value` and resolve to the previous value, if any
    pub fn getset_with<X: Transcoder>(&self, key: impl AsRef<[u8]>, transcoder: X, value: &X::Value) -> Pending<Option<X::Value>> {
        match transcoder.encode(value) {
            Ok(encoded) => self.execute(CommandName::GetSet, vec![arg(key), encoded], move |reply| {
                reply.decode_with(&transcoder)
            }),
            Err(e) => Pending::failed(CommandName::GetSet, e),
        }
    }

    pub fn getset_i32(&self, key: impl AsRef<[u8]>, value: i32) -> Pending<Option<i32>> {
        self.getset_with(key, IntegerTranscoder, &value)
    }

    pub fn getset_i64(&self, key: impl AsRef<[u8]>, value: i64) -> Pending<Option<i64>> {
        self.getset_with(key, LongTranscoder, &value)
    }

    pub fn getset_f64(&self, key: impl AsRef<[u8]>, value: f64) -> Pending<Option<f64>> {
        self.getset_with(key, DoubleTranscoder, &value)
    }

    pub fn getset_str(&self, key: impl AsRef<[u8]>, value: impl Into<String>) -> Pending<Option<String>> {
        self.getset_with(key, StringTranscoder, &value.into())
    }

    pub fn getset_object<V>(&self, key: impl AsRef<[u8]>, value: &V) -> Pending<Option<V>>
    where
        V: Serialize + DeserializeOwned + Send + 'static,
    {
        self.getset_with(key, SerializingTranscoder::<V>::new(), value)
    }

    // =========================================================================
    // MGET / MSET families
    // =========================================================================

    /// MGET; one entry per key, `None` where the key is missing
    pub fn mget_with<X: Transcoder, K: AsRef<[u8]>>(&self, keys: &[K], transcoder: X) -> Pending<Vec<Option<X::Value>>> {
        let args = keys.iter().map(arg).collect();
        self.execute(CommandName::MGet, args, move |reply| reply.decode_all_with(&transcoder))
    }

    pub fn mget_object<V, K>(&self, keys: &[K]) -> Pending<Vec<Option<V>>>
    where
        V: Serialize + DeserializeOwned + Send + 'static,
        K: AsRef<[u8]>,
    {
        self.mget_with(keys, SerializingTranscoder::<V>::new())
    }

    pub fn mget_i32<K: AsRef<[u8]>>(&self, keys: &[K]) -> Pending<Vec<Option<i32>>> {
        self.mget_with(keys, IntegerTranscoder)
    }

    pub fn mget_i64<K: AsRef<[u8]>>(&self, keys: &[K]) -> Pending<Vec<Option<i64>>> {
        self.mget_with(keys, LongTranscoder)
    }

    pub fn mget_f64<K: AsRef<[u8]>>(&self, keys: &[K]) -> Pending<Vec<Option<f64>>> {
        self.mget_with(keys, DoubleTranscoder)
    }

    pub fn mget_str<K: AsRef<[u8]>>(&self, keys: &[K]) -> Pending<Vec<Option<String>>> {
        self.mget_with(keys, StringTranscoder)
    }

    /// MSET every `(key, value)` pair through `transcoder`
    pub fn mset_with<X, I, K, V>(&self, transcoder: &X, entries: I) -> Pending<String>
    where
        X: Transcoder,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<X::Value>,
    {
        match pairs(transcoder, entries) {
            Ok(args) => self.execute(CommandName::MSet, args, Reply::into_status),
            Err(e) => Pending::failed(CommandName::MSet, e),
        }
    }

    /// MSET from a map (or any pair iterator) of `i32` values
    pub fn mset_i32<I, K, V>(&self, entries: I) -> Pending<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<i32>,
    {
        self.mset_with(&IntegerTranscoder, entries)
    }

    pub fn mset_i64<I, K, V>(&self, entries: I) -> Pending<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<i64>,
    {
        self.mset_with(&LongTranscoder, entries)
    }

    pub fn mset_f64<I, K, V>(&self, entries: I) -> Pending<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<f64>,
    {
        self.mset_with(&DoubleTranscoder, entries)
    }

    pub fn mset_object<T, I, K, V>(&self, entries: I) -> Pending<String>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<T>,
    {
        self.mset_with(&SerializingTranscoder::<T>::new(), entries)
    }

    /// MSETNX; true only if no key existed and all were set
    pub fn msetnx_with<X, I, K, V>(&self, transcoder: &X, entries: I) -> Pending<bool>
    where
        X: Transcoder,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<X::Value>,
    {
        match pairs(transcoder, entries) {
            Ok(args) => self.execute(CommandName::MSetNx, args, Reply::into_bool),
            Err(e) => Pending::failed(CommandName::MSetNx, e),
        }
    }

    pub fn msetnx_i32<I, K, V>(&self, entries: I) -> Pending<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<i32>,
    {
        self.msetnx_with(&IntegerTranscoder, entries)
    }

    pub fn msetnx_i64<I, K, V>(&self, entries: I) -> Pending<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<i64>,
    {
        self.msetnx_with(&LongTranscoder, entries)
    }

    pub fn msetnx_f64<I, K, V>(&self, entries: I) -> Pending<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<f64>,
    {
        self.msetnx_with(&DoubleTranscoder, entries)
    }

    pub fn msetnx_object<T, I, K, V>(&self, entries: I) -> Pending<bool>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Borrow<T>,
    {
        self.msetnx_with(&SerializingTranscoder::<T>::new(), entries)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    pub fn incr(&self, key: impl AsRef<[u8]>) -> Pending<i64> {
        self.execute(CommandName::Incr, vec![arg(key)], Reply::into_integer)
    }

    pub fn incr_by(&self, key: impl AsRef<[u8]>, delta: i64) -> Pending<i64> {
        self.execute(CommandName::IncrBy, vec![arg(key), number(delta)], Reply::into_integer)
    }

    pub fn decr(&self, key: impl AsRef<[u8]>) -> Pending<i64> {
        self.execute(CommandName::Decr, vec![arg(key)], Reply::into_integer)
    }

    pub fn decr_by(&self, key: impl AsRef<[u8]>, delta: i64) -> Pending<i64> {
        self.execute(CommandName::DecrBy, vec![arg(key), number(delta)], Reply::into_integer)
    }
}

// =============================================================================
// Argument helpers
// =============================================================================

fn arg(data: impl AsRef<[u8]>) -> Bytes {
    Bytes::copy_from_slice(data.as_ref())
}

fn number(n: impl ToString) -> Bytes {
    Bytes::from(n.to_string())
}

/// Flatten `(key, value)` pairs into `key value key value ...`
fn pairs<X, I, K, V>(transcoder: &X, entries: I) -> Result<Vec<Bytes>>
where
    X: Transcoder,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: Borrow<X::Value>,
{
    let mut args = Vec::new();
    for (key, value) in entries {
        args.push(arg(key));
        args.push(transcoder.encode(value.borrow())?);
    }
    Ok(args)
}
