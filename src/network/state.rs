//! Connection lifecycle states
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ready──▶ Connected ──close──▶ Closing ──▶ Closed
//!       ▲                        │                    │
//!       └────── connect failed ──┘                    │
//!       └────────────── transport lost / fatal error ─┘
//! ```
//!
//! Leaving `Disconnected` again takes an explicit reconnect; nothing here
//! retries on its own. `Closed` is terminal.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Whether new commands are accepted
    pub fn accepts_commands(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
