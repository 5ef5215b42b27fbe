use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::line::{parse_line, unrecognized, Command};
use crate::message::CanMessage;
use crate::port::Port;
use crate::record::unpack_record;

/// Set-speed acknowledgement (`;` + status 01 + checksum 9B).
pub const ACK_PREFIX: &[u8] = b";019B";

/// Set-speed rejection (`;` + status 00 + checksum 9A).
pub const NAK_PREFIX: &[u8] = b";009A";

/// Default upper bound on a single line, terminator included.
pub const DEFAULT_MAX_LINE_LEN: usize = 256;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Configuration for the stream decoder.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum line length in bytes before the stream is declared corrupt.
    pub max_line_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// Something the adapter sent that is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A set-speed command was accepted.
    Ack,
    /// A CAN message arrived on `port`.
    Message { port: Port, message: CanMessage },
}

/// Classify one adapter line.
///
/// NAK lines come back as `Err(FrameError::SpeedSetRejected)`. Control
/// prefixes win over everything else, trailing bytes are ignored.
pub fn classify_line(line: &[u8]) -> Result<Reply> {
    if line.starts_with(NAK_PREFIX) {
        return Err(FrameError::SpeedSetRejected);
    }
    if line.starts_with(ACK_PREFIX) {
        return Ok(Reply::Ack);
    }
    if line.first() != Some(&Command::Received.as_byte()) {
        return Err(unrecognized(line));
    }

    let (_, record) = parse_line(line)?;
    let (port, message) = unpack_record(&record)?;
    Ok(Reply::Message { port, message })
}

/// Reads adapter replies from any `Read` stream, one line per call.
///
/// Owns its read buffer; bytes past the current line stay buffered for the
/// next call. A line that fails to decode is consumed, so after an error the
/// caller decides whether to keep going. An over-long line is dropped up to
/// and including its newline.
pub struct StreamDecoder<T> {
    inner: T,
    buf: BytesMut,
    config: DecoderConfig,
    discarding: bool,
}

impl<T: Read> StreamDecoder<T> {
    /// Create a new decoder with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    /// Create a new decoder with explicit configuration.
    pub fn with_config(inner: T, config: DecoderConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            discarding: false,
        }
    }

    /// Read and decode the next line (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn decode_next(&mut self) -> Result<Reply> {
        let line = self.read_line()?;
        classify_line(&line)
    }

    /// Read the next raw `\n`-terminated line (blocking), terminator included.
    pub fn read_line(&mut self) -> Result<Bytes> {
        loop {
            let newline = self.buf.iter().position(|b| *b == b'\n');

            if self.discarding {
                match newline {
                    Some(pos) => {
                        self.buf.advance(pos + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => self.buf.clear(),
                }
            } else if let Some(pos) = newline {
                let len = pos + 1;
                if len > self.config.max_line_len {
                    self.buf.advance(len);
                    return Err(FrameError::LineTooLong {
                        len,
                        max: self.config.max_line_len,
                    });
                }
                let line = self.buf.split_to(len).freeze();
                tracing::debug!(line = %String::from_utf8_lossy(line.trim_ascii_end()), "rx");
                return Ok(line);
            } else if self.buf.len() >= self.config.max_line_len {
                let len = self.buf.len();
                self.buf.clear();
                self.discarding = true;
                return Err(FrameError::LineTooLong {
                    len,
                    max: self.config.max_line_len,
                });
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    tracing::debug!(pending = self.buf.len(), "stream ended mid-line");
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the decoder and return the inner stream. Buffered bytes are lost.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}
