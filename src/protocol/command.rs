//! Command definitions
//!
//! A `Command` is one pending operation: the verb, its already-transcoded
//! arguments, and the completion that turns the eventual reply into a typed
//! result. The caller keeps the matching [`Pending`] handle.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{RedlineError, Result};
use super::Reply;

/// Command verbs understood by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Auth,
    Ping,
    Echo,
    Select,
    Quit,
    Del,
    Exists,
    Expire,
    ExpireAt,
    Keys,
    Move,
    Persist,
    Set,
    SetNx,
    SetEx,
    Get,
    GetSet,
    MGet,
    MSet,
    MSetNx,
    Incr,
    IncrBy,
    Decr,
    DecrBy,
}

impl CommandName {
    /// Wire spelling of the verb
    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Auth => "AUTH",
            CommandName::Ping => "PING",
            CommandName::Echo => "ECHO",
            CommandName::Select => "SELECT",
            CommandName::Quit => "QUIT",
            CommandName::Del => "DEL",
            CommandName::Exists => "EXISTS",
            CommandName::Expire => "EXPIRE",
            CommandName::ExpireAt => "EXPIREAT",
            CommandName::Keys => "KEYS",
            CommandName::Move => "MOVE",
            CommandName::Persist => "PERSIST",
            CommandName::Set => "SET",
            CommandName::SetNx => "SETNX",
            CommandName::SetEx => "SETEX",
            CommandName::Get => "GET",
            CommandName::GetSet => "GETSET",
            CommandName::MGet => "MGET",
            CommandName::MSet => "MSET",
            CommandName::MSetNx => "MSETNX",
            CommandName::Incr => "INCR",
            CommandName::IncrBy => "INCRBY",
            CommandName::Decr => "DECR",
            CommandName::DecrBy => "DECRBY",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-erased completion; consumed exactly once
type Completion = Box<dyn FnOnce(Result<Reply>) + Send>;

/// A command waiting to be written and answered
pub struct Command {
    name: CommandName,
    args: Vec<Bytes>,
    completion: Completion,
}

impl Command {
    /// Create a command and the handle its result will be delivered to
    ///
    /// `map` converts a non-error reply into the caller's type; it runs on the
    /// connection's reader thread and must not block.
    pub fn new<T, F>(name: CommandName, args: Vec<Bytes>, map: F) -> (Self, Pending<T>)
    where
        T: Send + 'static,
        F: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);

        let completion: Completion = Box::new(move |outcome| {
            let result = outcome.and_then(|reply| match reply {
                Reply::Error(msg) => Err(RedlineError::Server(msg)),
                reply => map(reply),
            });
            // The caller may have dropped its handle; nothing to deliver to
            let _ = tx.send(result);
        });

        let command = Self {
            name,
            args,
            completion,
        };
        (
            command,
            Pending {
                name,
                rx,
                ready: None,
            },
        )
    }

    pub fn name(&self) -> CommandName {
        self.name
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// Fulfil the result slot from a reply
    pub fn complete(self, reply: Reply) {
        (self.completion)(Ok(reply));
    }

    /// Fail the result slot
    pub fn fail(self, err: RedlineError) {
        (self.completion)(Err(err));
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("argc", &self.args.len())
            .finish()
    }
}

/// Handle to the eventual result of one command
///
/// Returned immediately when a command is issued. Wait on it, wait with a
/// deadline, or poll it.
#[derive(Debug)]
pub struct Pending<T> {
    name: CommandName,
    rx: Receiver<Result<T>>,

    /// Result observed by a poll but not yet taken
    ready: Option<Result<T>>,
}

impl<T> Pending<T> {
    /// A handle that already holds `err`; used when a command cannot be built
    pub(crate) fn failed(name: CommandName, err: RedlineError) -> Self {
        let (_, rx) = channel::bounded(1);
        Self {
            name,
            rx,
            ready: Some(Err(err)),
        }
    }

    /// Verb of the command this handle belongs to
    pub fn name(&self) -> CommandName {
        self.name
    }

    /// Block until the result arrives
    pub fn wait(self) -> Result<T> {
        if let Some(result) = self.ready {
            return result;
        }
        self.rx.recv().unwrap_or(Err(RedlineError::ConnectionClosed))
    }

    /// Block until the result arrives or `timeout` elapses
    ///
    /// On timeout the command stays in flight; its result is discarded.
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        if let Some(result) = self.ready {
            return result;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(RedlineError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(RedlineError::ConnectionClosed),
        }
    }

    /// Take the result if it has arrived
    pub fn try_take(&mut self) -> Option<Result<T>> {
        self.poll();
        self.ready.take()
    }

    /// Whether the result has arrived (or the command was abandoned)
    pub fn is_ready(&mut self) -> bool {
        self.poll();
        self.ready.is_some()
    }

    fn poll(&mut self) {
        if self.ready.is_some() {
            return;
        }
        self.ready = match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RedlineError::ConnectionClosed)),
        };
    }
}
