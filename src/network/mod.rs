//! Network Module
//!
//! Connection lifecycle and the read/write paths.
//!
//! ## Architecture
//! - Caller threads write through one lock
//! - One reader thread per connection decodes and correlates
//! - Teardown fails every pending command

mod state;
mod connection;

pub use state::ConnectionState;
pub use connection::Connection;
