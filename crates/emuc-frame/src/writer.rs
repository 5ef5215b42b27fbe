use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::error::{FrameError, Result};
use crate::line::{encode_request, Request};
use crate::message::CanMessage;
use crate::port::Port;

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Writes complete command lines to any `Write` stream.
pub struct LineWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> LineWriter<T> {
    /// Create a new line writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Ask the adapter to run `port` at `kbps` kbit/s.
    ///
    /// The adapter answers with an ACK or NAK line on the read side.
    pub fn set_speed(&mut self, port: Port, kbps: u16) -> Result<()> {
        self.write_request(&Request::SetSpeed { port, kbps })
    }

    /// Transmit a CAN message on `port`.
    pub fn send(&mut self, port: Port, message: &CanMessage) -> Result<()> {
        self.write_request(&Request::Transmit {
            port,
            message: *message,
        })
    }

    /// Encode and write one request line (blocking).
    pub fn write_request(&mut self, request: &Request) -> Result<()> {
        self.buf.clear();
        encode_request(request, &mut self.buf);
        tracing::debug!(line = %String::from_utf8_lossy(self.buf.trim_ascii_end()), "tx");

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    fn written(writer: LineWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn send_writes_transmit_line() {
        let mut writer = LineWriter::new(Cursor::new(Vec::new()));
        writer
            .send(Port::One, &CanMessage::new(0x123, &[0xDE, 0xAD]))
            .unwrap();
        assert_eq!(written(writer), b"<010800000123DEAD000000000000D8\r\n");
    }

    #[test]
    fn set_speed_writes_speed_line() {
        let mut writer = LineWriter::new(Cursor::new(Vec::new()));
        writer.set_speed(Port::Both, 500).unwrap();
        assert_eq!(written(writer), b":0301F477\r\n");
    }

    #[test]
    fn consecutive_requests_parse_back() {
        let requests = [
            Request::SetSpeed {
                port: Port::One,
                kbps: 250,
            },
            Request::Transmit {
                port: Port::Two,
                message: CanMessage::new_extended(0x0CF0_0400, &[0xFF, 0x7D]),
            },
            Request::Transmit {
                port: Port::Both,
                message: CanMessage::new(0x3FF, &[]),
            },
        ];

        let mut writer = LineWriter::new(Cursor::new(Vec::new()));
        for request in &requests {
            writer.write_request(request).unwrap();
        }

        let wire = written(writer);
        let lines: Vec<&[u8]> = wire
            .split_inclusive(|b| *b == b'\n')
            .collect();
        assert_eq!(lines.len(), requests.len());
        for (line, request) in lines.into_iter().zip(requests) {
            assert_eq!(Request::parse(line).unwrap(), request);
        }
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = LineWriter::new(sink);

        writer.set_speed(Port::One, 125).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_and_would_block() {
        let mut writer = LineWriter::new(FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            flush_failures: vec![ErrorKind::WouldBlock, ErrorKind::Interrupted],
            data: Vec::new(),
        });
        writer.set_speed(Port::Two, 1000).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, b":0203E87B\r\n");
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = LineWriter::new(ZeroWriter);
        let err = writer.set_speed(Port::One, 50).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn write_error_propagates() {
        let mut writer = LineWriter::new(FlakyWriter {
            failures: vec![ErrorKind::PermissionDenied],
            flush_failures: Vec::new(),
            data: Vec::new(),
        });
        let err = writer.set_speed(Port::One, 50).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::PermissionDenied));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = LineWriter::new(Cursor::new(Vec::<u8>::new()));
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails with each queued error once, then writes a few bytes at a time.
    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        flush_failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.failures.is_empty() {
                return Err(std::io::Error::from(self.failures.remove(0)));
            }
            let n = buf.len().min(3);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_failures.is_empty() {
                return Err(std::io::Error::from(self.flush_failures.remove(0)));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
