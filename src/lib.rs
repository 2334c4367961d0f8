//! # redline
//!
//! A pipelined client for RESP-speaking key-value servers:
//! - Many concurrent callers multiplexed over one connection
//! - Exact FIFO correlation of replies to commands
//! - Pluggable transcoders for typed values
//! - Every in-flight command fails cleanly when the connection goes away
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Client facade (typed calls)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command + Pending<T>
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Connection Manager                          │
//! │     write lock: encode → enqueue → transmit (atomic)         │
//! └──────────┬───────────────────────────────────▲──────────────┘
//!            │ bytes                             │ Reply
//!            ▼                                   │
//!     ┌─────────────┐    bytes    ┌──────────────┴─┐    ┌────────────┐
//!     │  TcpStream  │ ──────────▶ │ Reply Decoder  │ ─▶ │ Correlator │
//!     └─────────────┘             └────────────────┘    │   (FIFO)   │
//!                                                       └─────┬──────┘
//!                                                             │ transcoder
//!                                                             ▼
//!                                                       Pending<T> fulfilled
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transcoder;
pub mod pipeline;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RedlineError, Result};
pub use config::Config;
pub use client::Client;
pub use network::{Connection, ConnectionState};
pub use protocol::{CommandName, Pending, Reply};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of redline
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
