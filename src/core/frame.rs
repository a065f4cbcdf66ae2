use bytes::{BufMut, Bytes, BytesMut};

/// Size of the length prefix in bytes
pub const HEADER_SIZE: usize = 4;

/// Max allowed message size (64 MiB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// One unit on the wire.
///
/// A zero length prefix is always a heartbeat, so an empty [`Frame::Message`]
/// encodes to exactly the same four bytes as [`Frame::Heartbeat`] and is never
/// handed back out by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Heartbeat,
    Message(Bytes),
}

impl Frame {
    /// Payload length as written into the prefix
    #[inline]
    pub fn payload_len(&self) -> usize {
        match self {
            Frame::Heartbeat => 0,
            Frame::Message(payload) => payload.len(),
        }
    }

    /// Total encoded size (prefix + payload)
    #[inline]
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload_len()
    }

    #[inline]
    pub fn is_heartbeat(&self) -> bool {
        self.payload_len() == 0
    }

    /// Serialize to a standalone buffer.
    ///
    /// Lengths that do not fit the 4-byte prefix must be rejected by the caller;
    /// the codec does that before calling in here.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf.freeze()
    }

    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u32_le(self.payload_len() as u32);
        if let Frame::Message(payload) = self {
            dst.extend_from_slice(payload);
        }
    }
}

impl From<Bytes> for Frame {
    fn from(payload: Bytes) -> Self {
        if payload.is_empty() {
            Frame::Heartbeat
        } else {
            Frame::Message(payload)
        }
    }
}

impl From<Vec<u8>> for Frame {
    fn from(payload: Vec<u8>) -> Self {
        Bytes::from(payload).into()
    }
}
