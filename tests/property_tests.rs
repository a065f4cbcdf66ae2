//! Property-based tests using proptest
//!
//! Framing invariants checked across randomly generated payloads and arbitrary
//! splits of the byte stream.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::{Bytes, BytesMut};
use network_connection::{ConnectionError, Frame, FrameCodec};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

const MAX: usize = 4096;

fn encode_all(payloads: &[Vec<u8>]) -> BytesMut {
    let mut codec = FrameCodec::new(MAX);
    let mut wire = BytesMut::new();
    for payload in payloads {
        codec
            .encode(Frame::from(payload.clone()), &mut wire)
            .expect("payload within limit");
    }
    wire
}

// Property: a payload survives encode → decode unchanged, empty ones as heartbeats
proptest! {
    #[test]
    fn prop_frame_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..=MAX)) {
        let mut wire = encode_all(std::slice::from_ref(&payload));
        prop_assert_eq!(wire.len(), 4 + payload.len());

        let mut codec = FrameCodec::new(MAX);
        let decoded = codec.decode(&mut wire).expect("decode").expect("complete frame");
        if payload.is_empty() {
            prop_assert_eq!(decoded, Frame::Heartbeat);
        } else {
            prop_assert_eq!(decoded, Frame::Message(Bytes::from(payload)));
        }
        prop_assert!(wire.is_empty());
    }
}

// Property: however the stream is chopped up, the same messages come out in order
proptest! {
    #[test]
    fn prop_arbitrary_chunking_preserves_messages(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 1..20),
        cuts in prop::collection::vec(1usize..64, 1..200),
    ) {
        let wire = encode_all(&payloads).freeze();
        let mut codec = FrameCodec::new(MAX);
        let mut buffer = BytesMut::new();
        let mut out = Vec::new();

        let mut offset = 0;
        let mut cut = cuts.iter().cycle();
        while offset < wire.len() {
            let step = (*cut.next().unwrap()).min(wire.len() - offset);
            buffer.extend_from_slice(&wire[offset..offset + step]);
            offset += step;
            while let Some(frame) = codec.decode(&mut buffer).expect("decode") {
                if let Frame::Message(payload) = frame {
                    out.push(payload.to_vec());
                }
            }
        }

        let expected: Vec<Vec<u8>> = payloads.into_iter().filter(|p| !p.is_empty()).collect();
        prop_assert_eq!(out, expected);
        prop_assert!(buffer.is_empty());
    }
}

// Property: any declared length above the limit is rejected from the header alone
proptest! {
    #[test]
    fn prop_oversized_header_rejected(declared in (MAX as u32 + 1)..=u32::MAX) {
        let mut codec = FrameCodec::new(MAX);
        let mut buffer = BytesMut::from(&declared.to_le_bytes()[..]);

        match codec.decode(&mut buffer) {
            Err(ConnectionError::OversizedFrame { size, max }) => {
                prop_assert_eq!(size, declared as usize);
                prop_assert_eq!(max, MAX);
            }
            other => prop_assert!(false, "unexpected result: {:?}", other),
        }
    }
}

// Property: the decoder never panics on garbage
proptest! {
    #[test]
    fn prop_decode_garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let mut codec = FrameCodec::new(MAX);
        let mut buffer = BytesMut::from(&data[..]);
        while let Ok(Some(_)) = codec.decode(&mut buffer) {}
    }
}
