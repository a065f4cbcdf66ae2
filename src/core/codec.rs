use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::frame::{Frame, HEADER_SIZE, MAX_MESSAGE_SIZE};
use crate::error::ConnectionError;

/// Where the decoder is inside the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Waiting for the 4-byte length prefix
    AwaitingHeader,
    /// Prefix consumed, waiting for exactly this many payload bytes
    AwaitingPayload(usize),
}

/// Length-prefixed frame codec.
///
/// Decoding is a two-state machine: the prefix is consumed as soon as four bytes
/// are buffered, and the declared length is validated before any payload byte is
/// waited for. A partial header or payload leaves the buffer untouched so the
/// next read simply appends to it.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_message_size: usize,
    state: DecodeState,
}

impl FrameCodec {
    pub fn new(max_message_size: usize) -> Self {
        Self {
            // the prefix cannot express anything larger
            max_message_size: max_message_size.min(u32::MAX as usize),
            state: DecodeState::AwaitingHeader,
        }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = ConnectionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let len = match self.state {
            DecodeState::AwaitingHeader => {
                if src.len() < HEADER_SIZE {
                    src.reserve(HEADER_SIZE - src.len());
                    return Ok(None);
                }

                let len = src.get_u32_le() as usize;
                if len > self.max_message_size {
                    return Err(ConnectionError::OversizedFrame {
                        size: len,
                        max: self.max_message_size,
                    });
                }
                if len == 0 {
                    return Ok(Some(Frame::Heartbeat));
                }

                self.state = DecodeState::AwaitingPayload(len);
                len
            }
            DecodeState::AwaitingPayload(len) => len,
        };

        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let payload = src.split_to(len).freeze();
        self.state = DecodeState::AwaitingHeader;
        Ok(Some(Frame::Message(payload)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() && self.state == DecodeState::AwaitingHeader => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended in the middle of a frame",
            )
            .into()),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = ConnectionError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = item.payload_len();
        if len > self.max_message_size {
            return Err(ConnectionError::OversizedFrame {
                size: len,
                max: self.max_message_size,
            });
        }

        item.write_to(dst);
        Ok(())
    }
}
