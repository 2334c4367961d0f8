//! Streaming reply decoder
//!
//! Accumulates bytes from the transport and yields one [`Reply`] per complete
//! frame. Frames may arrive split across any number of reads.
//!
//! Decoding is two-phase:
//! 1. `Scan::advance` walks the buffered bytes and either finds the end of one
//!    complete frame or reports that more data is needed. Nothing is
//!    consumed, but the scan remembers how far it got, so a frame arriving
//!    over many reads is walked once rather than once per read.
//! 2. The frame is split off the buffer, frozen, and `build` turns it into a
//!    `Reply`. Bulk payloads are zero-copy slices of the frozen frame.

use bytes::{Bytes, BytesMut};

use crate::config::Config;
use crate::error::{RedlineError, Result};
use super::Reply;

/// Default maximum bulk payload (512 MB)
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Default maximum multi-bulk nesting
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Outcome of a failed parse step
#[derive(Debug)]
enum Step {
    /// Need more bytes
    Incomplete,

    /// Bytes can never form a valid reply
    Invalid(String),
}

/// Progress through the frame at the front of the buffer
#[derive(Debug, Default)]
struct Scan {
    /// Offset of the next element to scan
    pos: usize,

    /// Elements still expected by each open multi-bulk, outermost first
    open: Vec<usize>,
}

/// Streaming decoder turning a byte stream into replies
#[derive(Debug)]
pub struct ReplyDecoder {
    /// Bytes received but not yet consumed as a complete frame
    buffer: BytesMut,

    scan: Scan,

    max_bulk_len: usize,

    max_depth: usize,
}

impl ReplyDecoder {
    /// Create a decoder with default limits
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_BULK_LEN, DEFAULT_MAX_DEPTH)
    }

    /// Create a decoder with explicit limits
    pub fn with_limits(max_bulk_len: usize, max_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            scan: Scan::default(),
            max_bulk_len,
            max_depth,
        }
    }

    /// Create a decoder using the limits from `config`
    pub fn from_config(config: &Config) -> Self {
        let mut decoder = Self::with_limits(config.max_bulk_len, config.max_depth);
        decoder.buffer.reserve(config.read_buffer_size);
        decoder
    }

    /// Append bytes received from the transport
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet decoded
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Decode the next complete reply
    ///
    /// Returns `Ok(None)` when the buffer holds no complete frame yet. A
    /// `Protocol` error means the stream can no longer be trusted.
    pub fn decode(&mut self) -> Result<Option<Reply>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let consumed = match self.scan.advance(&self.buffer, self.max_bulk_len, self.max_depth) {
            Ok(end) => end,
            Err(Step::Incomplete) => return Ok(None),
            Err(Step::Invalid(msg)) => {
                self.scan = Scan::default();
                return Err(RedlineError::Protocol(msg));
            }
        };
        self.scan = Scan::default();

        let frame = self.buffer.split_to(consumed).freeze();
        let (reply, end) = build(&frame, 0).map_err(|step| match step {
            Step::Invalid(msg) => RedlineError::Protocol(msg),
            Step::Incomplete => RedlineError::Protocol("frame truncated after scan".to_string()),
        })?;
        debug_assert_eq!(end, consumed);

        tracing::trace!(kind = reply.kind(), bytes = consumed, "decoded reply");
        Ok(Some(reply))
    }
}

impl Scan {
    /// Continue scanning `src`; returns the end offset of the complete frame
    ///
    /// On `Incomplete` the position of the first unfinished element is kept,
    /// so the next call resumes there.
    fn advance(&mut self, src: &[u8], max_bulk_len: usize, max_depth: usize) -> std::result::Result<usize, Step> {
        loop {
            let sigil = *src.get(self.pos).ok_or(Step::Incomplete)?;
            if !matches!(sigil, b'+' | b'-' | b':' | b'$' | b'*') {
                return Err(Step::Invalid(format!(
                    "invalid reply type byte 0x{:02x}",
                    sigil
                )));
            }

            let (line, next) = read_line(src, self.pos + 1)?;

            let end = match sigil {
                b'+' | b'-' => next,
                b':' => {
                    parse_decimal(line)?;
                    next
                }
                b'$' => match parse_length(line)? {
                    None => next,
                    Some(len) => {
                        if len > max_bulk_len {
                            return Err(Step::Invalid(format!(
                                "bulk length {} exceeds limit {}",
                                len, max_bulk_len
                            )));
                        }
                        let end = next + len;
                        if src.len() < end + 2 {
                            return Err(Step::Incomplete);
                        }
                        if &src[end..end + 2] != b"\r\n" {
                            return Err(Step::Invalid("bulk payload not terminated by CRLF".to_string()));
                        }
                        end + 2
                    }
                },
                _ => match parse_length(line)? {
                    None => next,
                    Some(count) => {
                        if self.open.len() >= max_depth {
                            return Err(Step::Invalid(format!(
                                "multi-bulk nesting exceeds depth {}",
                                max_depth
                            )));
                        }
                        if count > 0 {
                            self.open.push(count);
                            self.pos = next;
                            continue;
                        }
                        next
                    }
                },
            };

            // One element finished; close every multi-bulk it completes
            self.pos = end;
            loop {
                match self.open.last_mut() {
                    None => return Ok(end),
                    Some(remaining) if *remaining > 1 => {
                        *remaining -= 1;
                        break;
                    }
                    Some(_) => {
                        self.open.pop();
                    }
                }
            }
        }
    }
}

impl Default for ReplyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the reply starting at `pos` in an already-scanned frame
fn build(frame: &Bytes, pos: usize) -> std::result::Result<(Reply, usize), Step> {
    let sigil = *frame.get(pos).ok_or(Step::Incomplete)?;
    let (line, next) = read_line(frame, pos + 1)?;

    match sigil {
        b'+' => Ok((Reply::Status(text(line)), next)),
        b'-' => Ok((Reply::Error(text(line)), next)),
        b':' => Ok((Reply::Integer(parse_decimal(line)?), next)),
        b'$' => match parse_length(line)? {
            None => Ok((Reply::Bulk(None), next)),
            Some(len) => {
                let end = next + len;
                if frame.len() < end + 2 {
                    return Err(Step::Incomplete);
                }
                Ok((Reply::Bulk(Some(frame.slice(next..end))), end + 2))
            }
        },
        b'*' => match parse_length(line)? {
            None => Ok((Reply::MultiBulk(None), next)),
            Some(count) => {
                let mut items = Vec::with_capacity(count.min(1024));
                let mut pos = next;
                for _ in 0..count {
                    let (item, end) = build(frame, pos)?;
                    items.push(item);
                    pos = end;
                }
                Ok((Reply::MultiBulk(Some(items)), pos))
            }
        },
        other => Err(Step::Invalid(format!(
            "invalid reply type byte 0x{:02x}",
            other
        ))),
    }
}

// =============================================================================
// Line helpers
// =============================================================================

/// Read up to the next CRLF; returns the line and the offset after CRLF
fn read_line(src: &[u8], start: usize) -> std::result::Result<(&[u8], usize), Step> {
    if start >= src.len() {
        return Err(Step::Incomplete);
    }

    src[start..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| (&src[start..start + i], start + i + 2))
        .ok_or(Step::Incomplete)
}

fn text(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

/// Strict signed decimal: optional '-', then at least one digit
fn parse_decimal(line: &[u8]) -> std::result::Result<i64, Step> {
    let digits = line.strip_prefix(b"-").unwrap_or(line);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(Step::Invalid(format!(
            "invalid integer '{}'",
            String::from_utf8_lossy(line)
        )));
    }

    // Only ASCII digits and sign remain, so this is valid UTF-8
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| Step::Invalid(format!("integer out of range '{}'", String::from_utf8_lossy(line))))
}

/// Length prefix: `-1` is nil, other negatives are invalid
fn parse_length(line: &[u8]) -> std::result::Result<Option<usize>, Step> {
    match parse_decimal(line)? {
        -1 => Ok(None),
        n if n < 0 => Err(Step::Invalid(format!("invalid length {}", n))),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| Step::Invalid(format!("length {} too large", n))),
    }
}
