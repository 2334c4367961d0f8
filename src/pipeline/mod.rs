//! Pipeline Module
//!
//! Correlates replies with the commands that caused them.
//!
//! ## Responsibilities
//! - Keep in-flight commands in write order
//! - Fulfil the oldest command with each decoded reply
//! - Fail everything still pending when the connection goes away
//!
//! The correlator does no locking of its own; the connection guards it
//! together with the lifecycle state.

mod correlator;

pub use correlator::{Correlator, Matched};
