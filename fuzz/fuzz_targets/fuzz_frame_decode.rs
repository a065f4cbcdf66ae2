#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use network_connection::FrameCodec;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Small limit so the oversize path is reachable
    let mut codec = FrameCodec::new(1024);
    let mut buf = BytesMut::from(data);
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
    let _ = codec.decode_eof(&mut buf);
});
