//! Result Slot Tests
//!
//! These tests verify:
//! - wait / wait_timeout / try_take / is_ready
//! - A command dropped without completion resolves to ConnectionClosed
//! - A result delivered from another thread wakes the waiter

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use redline::protocol::Command;
use redline::{CommandName, RedlineError, Reply};

fn ping() -> (Command, redline::Pending<String>) {
    Command::new(CommandName::Ping, Vec::new(), Reply::into_status)
}

#[test]
fn test_wait_returns_completed_value() {
    let (command, pending) = ping();
    assert_eq!(pending.name(), CommandName::Ping);
    command.complete(Reply::Status("PONG".into()));
    assert_eq!(pending.wait().unwrap(), "PONG");
}

#[test]
fn test_wait_timeout_expires_while_in_flight() {
    let (_command, pending) = ping();
    let start = Instant::now();
    assert!(matches!(
        pending.wait_timeout(Duration::from_millis(30)),
        Err(RedlineError::Timeout)
    ));
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_wait_timeout_returns_early_result() {
    let (command, pending) = ping();
    command.complete(Reply::Status("PONG".into()));
    assert_eq!(pending.wait_timeout(Duration::from_secs(5)).unwrap(), "PONG");
}

#[test]
fn test_try_take_and_is_ready() {
    let (command, mut pending) = Command::new(CommandName::Incr, vec![Bytes::from("n")], Reply::into_integer);

    assert!(!pending.is_ready());
    assert!(pending.try_take().is_none());

    command.complete(Reply::Integer(9));
    assert!(pending.is_ready());
    assert!(pending.is_ready(), "polling twice keeps the result");
    assert_eq!(pending.try_take().unwrap().unwrap(), 9);
    assert!(pending.try_take().is_none(), "result is taken once");
}

#[test]
fn test_dropped_command_resolves_to_connection_closed() {
    let (command, pending) = ping();
    drop(command);
    assert!(matches!(pending.wait(), Err(RedlineError::ConnectionClosed)));

    let (command, mut pending) = ping();
    drop(command);
    assert!(pending.is_ready());
    assert!(matches!(pending.try_take(), Some(Err(RedlineError::ConnectionClosed))));
}

#[test]
fn test_failed_command_delivers_error() {
    let (command, pending) = ping();
    command.fail(RedlineError::Protocol("bad frame".into()));
    assert!(matches!(pending.wait(), Err(RedlineError::Protocol(_))));
}

#[test]
fn test_completion_from_another_thread() {
    let (command, pending) = ping();
    let completer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        command.complete(Reply::Status("PONG".into()));
    });

    assert_eq!(pending.wait().unwrap(), "PONG");
    completer.join().unwrap();
}

#[test]
fn test_dropping_handle_does_not_break_completion() {
    let (command, pending) = ping();
    drop(pending);
    command.complete(Reply::Status("PONG".into()));
}
