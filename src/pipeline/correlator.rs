//! Pipeline correlator
//!
//! FIFO queue of in-flight commands. The wire carries no request ids, so the
//! only rule is: the Nth reply decoded belongs to the Nth command written.

use std::collections::VecDeque;

use crate::error::{RedlineError, Result};
use crate::protocol::{Command, CommandName, Reply};

/// Matches decoded replies to the oldest outstanding command
#[derive(Debug, Default)]
pub struct Correlator {
    pending: VecDeque<Command>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command that is about to be written
    pub fn enqueue(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Hand `reply` to the oldest pending command and complete it
    ///
    /// Returns the verb that was completed. A reply with nothing pending means
    /// reads and writes are out of step; the caller must tear the connection
    /// down.
    pub fn on_reply(&mut self, reply: Reply) -> Result<CommandName> {
        self.take_match(reply).map(Matched::complete)
    }

    /// Pair `reply` with the oldest pending command without completing it
    ///
    /// Lets the caller run the completion after releasing whatever lock
    /// guards the correlator.
    pub fn take_match(&mut self, reply: Reply) -> Result<Matched> {
        let command = self.pending.pop_front().ok_or_else(|| {
            RedlineError::Correlation(format!("{} reply with no pending command", reply.kind()))
        })?;

        tracing::debug!(command = %command.name(), reply = reply.kind(), "reply matched");
        Ok(Matched { command, reply })
    }

    /// Fail every pending command, oldest first; returns how many were failed
    pub fn fail_all<F>(&mut self, mut error: F) -> usize
    where
        F: FnMut() -> RedlineError,
    {
        let count = self.pending.len();
        for command in self.pending.drain(..) {
            command.fail(error());
        }
        count
    }

    /// Number of commands awaiting a reply
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// A command paired with its reply, not yet completed
#[derive(Debug)]
pub struct Matched {
    command: Command,
    reply: Reply,
}

impl Matched {
    pub fn name(&self) -> CommandName {
        self.command.name()
    }

    /// Run the command's completion; returns its verb
    pub fn complete(self) -> CommandName {
        let name = self.command.name();
        self.command.complete(self.reply);
        name
    }
}
