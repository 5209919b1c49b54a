//! Parse frame header

#![no_main]

use ws_engine::web_socket::FrameHeader;

libfuzzer_sys::fuzz_target!(|data: &[u8]| {
  if let Ok(Some((header, len))) = FrameHeader::parse(data) {
    assert_eq!(header.len(), len);
    let _rslt = header.validate::<false>(true);
  }
});
