//! Configuration for redline
//!
//! Connection target and tuning knobs, with sensible defaults.

use std::time::Duration;

use crate::error::{RedlineError, Result};

/// Main configuration for a redline client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target
    // -------------------------------------------------------------------------
    /// Server address (host:port)
    pub address: String,

    /// Password sent with AUTH during the handshake
    pub password: Option<String>,

    /// Database index; 0 means no SELECT is issued
    pub database: u32,

    // -------------------------------------------------------------------------
    // Timeouts (milliseconds, 0 = none)
    // -------------------------------------------------------------------------
    /// TCP connect timeout
    pub connect_timeout_ms: u64,

    /// Socket write timeout
    pub write_timeout_ms: u64,

    /// Bound on each AUTH / SELECT wait during the handshake
    pub handshake_timeout_ms: u64,

    /// How long `close` waits for the reader to observe the shutdown
    pub close_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Decoder
    // -------------------------------------------------------------------------
    /// Bytes requested from the socket per read
    pub read_buffer_size: usize,

    /// Largest bulk payload accepted from the server
    pub max_bulk_len: usize,

    /// Deepest multi-bulk nesting accepted from the server
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6379".to_string(),
            password: None,
            database: 0,
            connect_timeout_ms: 5000,
            write_timeout_ms: 5000,
            handshake_timeout_ms: 5000,
            close_timeout_ms: 500,
            read_buffer_size: 8 * 1024,
            max_bulk_len: 512 * 1024 * 1024, // 512 MB
            max_depth: 32,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the address splits into a host and a numeric port
    pub fn validate(&self) -> Result<()> {
        let (host, port) = self
            .address
            .rsplit_once(':')
            .ok_or_else(|| RedlineError::Config(format!("address '{}' has no port", self.address)))?;

        if host.is_empty() {
            return Err(RedlineError::Config(format!(
                "address '{}' has no host",
                self.address
            )));
        }

        port.parse::<u16>().map_err(|_| {
            RedlineError::Config(format!("address '{}' has an invalid port", self.address))
        })?;

        if self.read_buffer_size == 0 {
            return Err(RedlineError::Config("read_buffer_size must be > 0".to_string()));
        }

        Ok(())
    }

    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub(crate) fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub(crate) fn handshake_timeout(&self) -> Option<Duration> {
        millis(self.handshake_timeout_ms)
    }

    pub(crate) fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server address (host:port)
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.config.address = addr.into();
        self
    }

    /// Set the AUTH password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the database index
    pub fn database(mut self, db: u32) -> Self {
        self.config.database = db;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the per-step handshake timeout (in milliseconds)
    pub fn handshake_timeout_ms(mut self, ms: u64) -> Self {
        self.config.handshake_timeout_ms = ms;
        self
    }

    /// Set the close timeout (in milliseconds)
    pub fn close_timeout_ms(mut self, ms: u64) -> Self {
        self.config.close_timeout_ms = ms;
        self
    }

    /// Set the socket read chunk size (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the maximum bulk payload length (in bytes)
    pub fn max_bulk_len(mut self, len: usize) -> Self {
        self.config.max_bulk_len = len;
        self
    }

    /// Set the maximum multi-bulk nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
