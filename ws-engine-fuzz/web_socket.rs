//! WebSocket

#![expect(clippy::unwrap_used, reason = "does not matter")]
#![no_main]

use tokio::runtime::Builder;
use ws_engine::{
  misc::FlatBuffer,
  rng::Xorshift64,
  stream::BytesStream,
  web_socket::{WebSocketConfig, WebSocketServer},
};

libfuzzer_sys::fuzz_target!(|data: Vec<u8>| {
  Builder::new_current_thread().build().unwrap().block_on(async move {
    let Ok(ws) = WebSocketServer::open(
      WebSocketConfig::default().set_read_message_max(u16::MAX.into()),
      (),
      Xorshift64::from(0),
      BytesStream::new(data),
      BytesStream::default(),
    ) else {
      return;
    };
    let mut buffer = FlatBuffer::default();
    while ws.read(&mut buffer).await.is_ok() {
      buffer.clear();
    }
  });
});
