//! Tokio codec for adapter lines.
//!
//! Same framing and classification as [`StreamDecoder`](crate::StreamDecoder)
//! and [`LineWriter`](crate::LineWriter), for use with
//! `tokio_util::codec::Framed` over an async device handle.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::decoder::{classify_line, Reply, DEFAULT_MAX_LINE_LEN};
use crate::error::FrameError;
use crate::line::{encode_request, Request};

/// Tokio codec: decodes adapter replies, encodes host requests.
#[derive(Debug, Clone)]
pub struct EmucCodec {
    max_line_len: usize,
    discarding: bool,
}

impl EmucCodec {
    /// Create a new codec with default settings.
    pub fn new() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a codec with a custom line length limit.
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            max_line_len,
            discarding: false,
        }
    }
}

impl Default for EmucCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EmucCodec {
    type Item = Reply;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src.iter().position(|b| *b == b'\n');

            if self.discarding {
                match newline {
                    Some(pos) => {
                        src.advance(pos + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        src.clear();
                        return Ok(None);
                    }
                }
            }

            let Some(pos) = newline else {
                if src.len() >= self.max_line_len {
                    let len = src.len();
                    src.clear();
                    self.discarding = true;
                    return Err(FrameError::LineTooLong {
                        len,
                        max: self.max_line_len,
                    });
                }
                return Ok(None);
            };

            let len = pos + 1;
            if len > self.max_line_len {
                src.advance(len);
                return Err(FrameError::LineTooLong {
                    len,
                    max: self.max_line_len,
                });
            }

            let line = src.split_to(len);
            return classify_line(&line).map(Some);
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(reply) => Ok(Some(reply)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Request> for EmucCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_request(&item, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::message::CanMessage;
    use crate::port::Port;

    #[test]
    fn decode_waits_for_newline() {
        let mut codec = EmucCodec::new();
        let mut buf = BytesMut::from(&b";019B"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Reply::Ack));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_rejects_runaway_line() {
        let mut codec = EmucCodec::with_max_line_len(8);
        let mut buf = BytesMut::from(&b"=000000000000"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::LineTooLong { max: 8, .. })
        ));
    }

    #[test]
    fn decode_recovers_after_oversized_line() {
        let mut codec = EmucCodec::with_max_line_len(8);
        let mut buf = BytesMut::from(&b"=0123456789\r\n;019B\r\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::LineTooLong { len: 13, max: 8 })
        ));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Reply::Ack));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_skips_runaway_line_across_reads() {
        let mut codec = EmucCodec::with_max_line_len(8);
        let mut buf = BytesMut::from(&b"=000000000000"[..]);
        assert!(codec.decode(&mut buf).is_err());
        assert!(buf.is_empty());

        buf.extend_from_slice(b"0000");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(b"00\r\n;019B\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Reply::Ack));
    }

    #[test]
    fn decode_eof_with_partial_line() {
        let mut codec = EmucCodec::new();
        let mut buf = BytesMut::from(&b"=0108"[..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(FrameError::ConnectionClosed)
        ));
        assert!(codec.decode_eof(&mut BytesMut::new()).unwrap().is_none());
    }

    #[tokio::test]
    async fn framed_read_yields_replies() {
        let wire: &[u8] = b";019B\r\n=010800000123DEAD000000000000D9\r\n";
        let mut framed = FramedRead::new(wire, EmucCodec::new());

        assert_eq!(framed.next().await.unwrap().unwrap(), Reply::Ack);
        assert_eq!(
            framed.next().await.unwrap().unwrap(),
            Reply::Message {
                port: Port::One,
                message: CanMessage::new(0x123, &[0xDE, 0xAD]),
            }
        );
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_surfaces_nak() {
        let wire: &[u8] = b";009A\r\n";
        let mut framed = FramedRead::new(wire, EmucCodec::new());
        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::SpeedSetRejected));
    }

    #[tokio::test]
    async fn framed_write_encodes_requests() {
        let mut framed = FramedWrite::new(Vec::new(), EmucCodec::new());
        framed
            .send(Request::SetSpeed {
                port: Port::Both,
                kbps: 500,
            })
            .await
            .unwrap();
        framed
            .send(Request::Transmit {
                port: Port::One,
                message: CanMessage::new(0x123, &[0xDE, 0xAD]),
            })
            .await
            .unwrap();

        assert_eq!(
            framed.get_ref().as_slice(),
            b":0301F477\r\n<010800000123DEAD000000000000D8\r\n"
        );
    }
}
