//! Command encoder
//!
//! Serializes a command as an array of bulk strings:
//!
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<name>\r\n
//! $<len>\r\n<arg>\r\n      (once per argument)
//! ```
//!
//! Arguments are already bytes here; typed values went through their
//! transcoder when the command was built.

use bytes::{BufMut, Bytes, BytesMut};

use super::{Command, CommandName};

/// Encode a command into one contiguous buffer
pub fn encode_command(command: &Command) -> Bytes {
    encode_parts(command.name(), command.args())
}

/// Encode a verb and its arguments
pub fn encode_parts(name: CommandName, args: &[Bytes]) -> Bytes {
    let payload: usize = args.iter().map(|a| a.len() + 16).sum();
    let mut buf = BytesMut::with_capacity(32 + payload);

    write_header(&mut buf, b'*', args.len() + 1);
    write_bulk(&mut buf, name.as_bytes());
    for arg in args {
        write_bulk(&mut buf, arg);
    }

    buf.freeze()
}

fn write_bulk(buf: &mut BytesMut, data: &[u8]) {
    write_header(buf, b'$', data.len());
    buf.put_slice(data);
    buf.put_slice(b"\r\n");
}

fn write_header(buf: &mut BytesMut, sigil: u8, len: usize) {
    buf.put_u8(sigil);
    buf.put_slice(len.to_string().as_bytes());
    buf.put_slice(b"\r\n");
}
