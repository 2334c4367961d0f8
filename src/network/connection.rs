//! Connection Manager
//!
//! Owns the TCP stream, the pending queue and the lifecycle state.
//!
//! ## Handshake
//! `connect` opens the transport, then runs AUTH and SELECT while the state
//! is still `Connecting`. Only handshake commands are admitted in that
//! window; user commands fail with `ConnectionClosed` until the state is
//! `Connected`. A failed handshake tears the transport down again.
//!
//! ## Threads
//! - Callers write. `submit` holds the write lock across enqueue and
//!   transmit, so queue order and wire order are the same order.
//! - One reader thread per connection decodes replies and hands them to the
//!   correlator strictly in arrival order.
//!
//! ## Locks
//! Order is `writer`, then `pipeline`, then `control`. The reader thread
//! never takes `writer`. The pending queue and the state share `pipeline`, so
//! a command can never be enqueued after teardown drained the queue.
//! Teardown takes the control handle under the same generation-checked
//! `pipeline` lock, so it can only ever shut down its own transport.
//!
//! The pending queue is unbounded: a caller that writes faster than replies
//! drain grows memory without limit.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use tracing::Span;

use crate::config::Config;
use crate::error::{RedlineError, Result};
use crate::pipeline::Correlator;
use crate::protocol::{encode_command, Command, CommandName, Reply, ReplyDecoder};
use super::ConnectionState;

/// A single multiplexed connection to the server
pub struct Connection {
    shared: Arc<Shared>,
}

/// State shared between callers and the reader thread
struct Shared {
    config: Config,

    /// Connection-scoped logging handle
    span: Span,

    /// Write half; the lock serializes encode → enqueue → transmit
    writer: Mutex<Option<TcpStream>>,

    /// Lifecycle state and pending queue
    pipeline: Mutex<Pipeline>,

    /// Signalled whenever the state leaves `Connected`/`Closing`
    state_changed: Condvar,

    /// Handle used only to shut the socket down
    control: Mutex<Option<TcpStream>>,

    reader: Mutex<Option<JoinHandle<()>>>,
}

struct Pipeline {
    state: ConnectionState,

    /// Bumped on every connect attempt so a stale reader cannot tear down its successor
    generation: u64,

    correlator: Correlator,
}

impl Connection {
    /// Create a connection and connect it
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let connection = Self::new(config);
        connection.connect()?;
        Ok(connection)
    }

    /// Create a connection in the `Disconnected` state
    pub fn new(config: Config) -> Self {
        let span = tracing::info_span!("connection", addr = %config.address, db = config.database);

        Self {
            shared: Arc::new(Shared {
                config,
                span,
                writer: Mutex::new(None),
                pipeline: Mutex::new(Pipeline {
                    state: ConnectionState::Disconnected,
                    generation: 0,
                    correlator: Correlator::new(),
                }),
                state_changed: Condvar::new(),
                control: Mutex::new(None),
                reader: Mutex::new(None),
            }),
        }
    }

    /// Open the transport and run the handshake
    ///
    /// `Disconnected → Connecting → Connected`. Blocks until AUTH (if a
    /// password is set) and then SELECT (if the database is not 0) have been
    /// answered. Any failure returns `Connection` and leaves the state
    /// `Disconnected` (or `Closed` if `close` was called meanwhile).
    pub fn connect(&self) -> Result<()> {
        let shared = &self.shared;
        let _enter = shared.span.enter();

        let generation = {
            let mut pipeline = shared.pipeline.lock();
            if pipeline.state != ConnectionState::Disconnected {
                return Err(RedlineError::Connection(format!(
                    "cannot connect while {}",
                    pipeline.state
                )));
            }
            pipeline.state = ConnectionState::Connecting;
            pipeline.generation += 1;
            pipeline.generation
        };
        tracing::debug!(generation, "connecting");

        let stream = match shared.establish() {
            Ok(stream) => stream,
            Err(e) => {
                shared.teardown(generation, "connect failed");
                tracing::warn!("connect failed: {}", e);
                return Err(RedlineError::Connection(format!(
                    "connect to {}: {}",
                    shared.config.address, e
                )));
            }
        };

        let split = stream.try_clone().and_then(|r| Ok((r, stream.try_clone()?)));
        let (read_stream, control_stream) = match split {
            Ok(halves) => halves,
            Err(e) => {
                let _ = stream.shutdown(Shutdown::Both);
                shared.teardown(generation, "split failed");
                return Err(RedlineError::Connection(format!("split stream: {}", e)));
            }
        };

        // Publish the transport only if no close or teardown intervened
        {
            let mut writer = shared.writer.lock();
            let pipeline = shared.pipeline.lock();
            if pipeline.state != ConnectionState::Connecting || pipeline.generation != generation {
                drop(pipeline);
                drop(writer);
                let _ = stream.shutdown(Shutdown::Both);
                shared.teardown(generation, "closed while connecting");
                return Err(RedlineError::Connection("closed while connecting".to_string()));
            }
            *writer = Some(stream);
            *shared.control.lock() = Some(control_stream);
        }

        let reader_shared = Arc::clone(shared);
        let spawned = thread::Builder::new()
            .name("redline-reader".to_string())
            .spawn(move || reader_shared.read_loop(read_stream, generation));

        match spawned {
            Ok(handle) => {
                // A previous reader has already torn itself down; just reap it
                if let Some(old) = shared.reader.lock().replace(handle) {
                    let _ = old.join();
                }
            }
            Err(e) => {
                shared.teardown(generation, "reader thread failed to start");
                return Err(RedlineError::Connection(format!("spawn reader: {}", e)));
            }
        }

        if let Err(e) = shared.handshake(generation) {
            shared.teardown(generation, "handshake failed");
            return Err(e);
        }

        {
            let mut pipeline = shared.pipeline.lock();
            if pipeline.state != ConnectionState::Connecting || pipeline.generation != generation {
                return Err(RedlineError::Connection(format!(
                    "connection {} during handshake",
                    pipeline.state
                )));
            }
            pipeline.state = ConnectionState::Connected;
            shared.state_changed.notify_all();
        }

        tracing::info!("connected");
        Ok(())
    }

    /// Write a command and queue it for its reply
    ///
    /// Never fails synchronously: if the connection cannot take the command,
    /// its result slot fails with `ConnectionClosed`.
    pub fn submit(&self, command: Command) {
        let _enter = self.shared.span.enter();
        self.shared.transmit(command, None);
    }

    /// Close the connection: `Connected → Closing → Closed`
    ///
    /// Shuts the socket down and waits up to `close_timeout_ms` for the reader
    /// to observe it. Commands still pending fail with `ConnectionClosed`. A
    /// `connect` still in progress is aborted.
    pub fn close(&self) {
        let shared = &self.shared;
        let _enter = shared.span.enter();

        let control = {
            let mut pipeline = shared.pipeline.lock();
            match pipeline.state {
                ConnectionState::Closed => return,
                ConnectionState::Closing => None,
                ConnectionState::Connected | ConnectionState::Connecting => {
                    pipeline.state = ConnectionState::Closing;
                    shared.control.lock().take()
                }
                ConnectionState::Disconnected => {
                    pipeline.state = ConnectionState::Closed;
                    pipeline.correlator.fail_all(|| RedlineError::ConnectionClosed);
                    shared.state_changed.notify_all();
                    tracing::info!("closed");
                    return;
                }
            }
        };
        tracing::debug!("closing");

        if let Some(stream) = control {
            let _ = stream.shutdown(Shutdown::Both);
        }

        let deadline = Instant::now() + shared.config.close_timeout();
        let mut pipeline = shared.pipeline.lock();
        while pipeline.state != ConnectionState::Closed {
            if shared.state_changed.wait_until(&mut pipeline, deadline).timed_out() {
                break;
            }
        }

        if pipeline.state != ConnectionState::Closed {
            // Reader did not notice in time; finish the teardown here
            let failed = pipeline.correlator.fail_all(|| RedlineError::ConnectionClosed);
            pipeline.state = ConnectionState::Closed;
            shared.state_changed.notify_all();
            tracing::warn!(failed, "close timed out waiting for reader");
        }
        drop(pipeline);

        if let Some(handle) = shared.reader.lock().take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.shared.pipeline.lock().state
    }

    /// Number of commands awaiting a reply
    pub fn pending(&self) -> usize {
        self.shared.pipeline.lock().correlator.len()
    }

    /// Read-only view of the configuration
    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl Shared {
    /// Resolve the address and open a configured TCP stream
    fn establish(&self) -> io::Result<TcpStream> {
        let addrs: Vec<SocketAddr> = self.config.address.to_socket_addrs()?.collect();

        let mut last_err = io::Error::new(io::ErrorKind::AddrNotAvailable, "address resolved to nothing");
        let mut connected = None;
        for addr in addrs {
            let attempt = match self.config.connect_timeout() {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => last_err = e,
            }
        }
        let stream = connected.ok_or(last_err)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_write_timeout(self.config.write_timeout())?;
        Ok(stream)
    }

    /// AUTH then SELECT on the transport of `generation`
    fn handshake(&self, generation: u64) -> Result<()> {
        if let Some(password) = &self.config.password {
            tracing::info!("authenticating");
            let args = vec![Bytes::copy_from_slice(password.as_bytes())];
            let reply = self
                .handshake_step(generation, CommandName::Auth, args)
                .map_err(|e| RedlineError::Connection(format!("AUTH failed: {}", e)))?;
            tracing::info!(reply = %reply, "auth reply");
        }

        let db = self.config.database;
        if db > 0 {
            tracing::debug!(db, "selecting database");
            let args = vec![Bytes::from(db.to_string())];
            let reply = self
                .handshake_step(generation, CommandName::Select, args)
                .map_err(|e| RedlineError::Connection(format!("SELECT {} failed: {}", db, e)))?;
            tracing::info!(reply = %reply, "select reply");
        }

        Ok(())
    }

    /// Send one handshake command and block for its reply
    fn handshake_step(&self, generation: u64, name: CommandName, args: Vec<Bytes>) -> Result<String> {
        let (command, pending) = Command::new(name, args, Reply::into_status);
        self.transmit(command, Some(generation));
        match self.config.handshake_timeout() {
            Some(timeout) => pending.wait_timeout(timeout),
            None => pending.wait(),
        }
    }

    /// Encode, enqueue and write `command` as one unit
    ///
    /// `handshake` carries the generation being established; such commands
    /// are admitted only while that generation is `Connecting`. All others
    /// need `Connected`.
    fn transmit(&self, command: Command, handshake: Option<u64>) {
        let frame = encode_command(&command);
        let name = command.name();

        let mut writer = self.writer.lock();

        let generation = {
            let mut pipeline = self.pipeline.lock();
            let admitted = match handshake {
                None => pipeline.state.accepts_commands(),
                Some(generation) => {
                    pipeline.state == ConnectionState::Connecting && pipeline.generation == generation
                }
            };
            if !admitted {
                let state = pipeline.state;
                drop(pipeline);
                tracing::debug!(command = %name, %state, "rejecting command");
                command.fail(RedlineError::ConnectionClosed);
                return;
            }
            pipeline.correlator.enqueue(command);
            pipeline.generation
        };

        let written = match writer.as_mut() {
            Some(stream) => stream.write_all(&frame),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "no write half")),
        };

        match written {
            Ok(()) => tracing::debug!(command = %name, bytes = frame.len(), "command sent"),
            Err(e) => {
                tracing::warn!(command = %name, "write failed: {}", e);
                drop(writer);
                self.teardown(generation, "write failed");
            }
        }
    }

    /// Reader thread body: bytes in, replies to the correlator
    fn read_loop(self: Arc<Self>, mut stream: TcpStream, generation: u64) {
        let _enter = self.span.enter();
        let mut decoder = ReplyDecoder::from_config(&self.config);
        let mut chunk = vec![0u8; self.config.read_buffer_size];

        let reason = loop {
            let n = match stream.read(&mut chunk) {
                Ok(0) => break "closed by peer",
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("read failed: {}", e);
                    break "read failed";
                }
            };

            decoder.extend(&chunk[..n]);
            if let Err(e) = self.dispatch(&mut decoder) {
                tracing::error!("{}", e);
                break "fatal stream error";
            }
        };

        self.teardown(generation, reason);
    }

    /// Hand every complete reply in `decoder` to the correlator
    ///
    /// The matched command completes after `pipeline` is released, so reply
    /// mapping never holds up writers. Only this thread completes commands
    /// from replies, so completion order is still arrival order.
    fn dispatch(&self, decoder: &mut ReplyDecoder) -> Result<()> {
        while let Some(reply) = decoder.decode()? {
            let matched = self.pipeline.lock().correlator.take_match(reply)?;
            matched.complete();
        }
        Ok(())
    }

    /// Leave `Connecting`/`Connected`/`Closing` and fail everything pending
    ///
    /// Ignored unless `generation` is still current, so a stale reader or
    /// writer never touches a newer transport.
    fn teardown(&self, generation: u64, reason: &str) {
        let (failed, next, control) = {
            let mut pipeline = self.pipeline.lock();
            if pipeline.generation != generation {
                return;
            }
            let next = match pipeline.state {
                ConnectionState::Connecting | ConnectionState::Connected => ConnectionState::Disconnected,
                ConnectionState::Closing => ConnectionState::Closed,
                _ => return,
            };
            pipeline.state = next;
            let failed = pipeline.correlator.fail_all(|| RedlineError::ConnectionClosed);
            let control = self.control.lock().take();
            self.state_changed.notify_all();
            (failed, next, control)
        };

        if let Some(stream) = control {
            let _ = stream.shutdown(Shutdown::Both);
        }
        tracing::info!(reason, failed, state = %next, "connection torn down");
    }
}
