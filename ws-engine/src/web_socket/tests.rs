use crate::{
  misc::{DynamicBuffer, FlatBuffer},
  rng::Xorshift64,
  stream::{BytesStream, StreamWriter},
  web_socket::{
    control_frame::serialize_frame, CloseCode, CloseReason, ControlCallback, FrameHeader,
    FrameType, NegotiatedCompression, OpCode, PingData, Status, WebSocketClient, WebSocketConfig,
    WebSocketError, WebSocketServer,
  },
};
use std::sync::{Arc, Mutex};
use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

type Client<NC> = WebSocketClient<NC, Xorshift64, ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;
type Server<NC> = WebSocketServer<NC, Xorshift64, ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;
type Received = Arc<Mutex<Vec<(FrameType, Vec<u8>)>>>;

fn pair<CNC, SNC>(
  capacity: usize,
  config: WebSocketConfig,
  client_nc: CNC,
  server_nc: SNC,
) -> (Client<CNC>, Server<SNC>)
where
  CNC: NegotiatedCompression,
  SNC: NegotiatedCompression,
{
  let (client_stream, server_stream) = duplex(capacity);
  let (client_sr, client_sw) = split(client_stream);
  let (server_sr, server_sw) = split(server_stream);
  let client =
    Client::open(config, client_nc, Xorshift64::from(1), client_sr, client_sw).unwrap();
  let server =
    Server::open(config, server_nc, Xorshift64::from(2), server_sr, server_sw).unwrap();
  (client, server)
}

/// Server whose peer is driven byte by byte.
fn raw_client(config: WebSocketConfig) -> (DuplexStream, Server<()>) {
  let (client_stream, server_stream) = duplex(1024);
  let (server_sr, server_sw) = split(server_stream);
  let server = Server::open(config, (), Xorshift64::from(2), server_sr, server_sw).unwrap();
  (client_stream, server)
}

fn masked_frame(fin: bool, op_code: OpCode, payload: &[u8]) -> Vec<u8> {
  let mut buffer = Vec::new();
  let header = FrameHeader {
    mask_key: Some(0x3712_0a4f),
    ..FrameHeader::new(fin, op_code, payload.len() as u64)
  };
  serialize_frame(&mut buffer, &header, payload);
  buffer
}

/// Counts how many times the sending direction was shut down.
#[derive(Debug)]
struct ShutdownCounter {
  inner: BytesStream,
  shutdowns: usize,
}

impl StreamWriter for ShutdownCounter {
  async fn write_all(&mut self, bytes: &[u8]) -> crate::Result<()> {
    self.inner.write_all(bytes).await
  }

  async fn shutdown(&mut self) -> crate::Result<()> {
    self.shutdowns = self.shutdowns.wrapping_add(1);
    self.inner.shutdown().await
  }
}

fn in_memory_server(
  input: Vec<u8>,
) -> WebSocketServer<(), Xorshift64, BytesStream, ShutdownCounter> {
  WebSocketServer::open(
    WebSocketConfig::default(),
    (),
    Xorshift64::from(4),
    BytesStream::new(input),
    ShutdownCounter { inner: BytesStream::new(Vec::new()), shutdowns: 0 },
  )
  .unwrap()
}

fn recorder() -> (Received, ControlCallback) {
  let received = Received::default();
  let cloned = Arc::clone(&received);
  let cb: ControlCallback = Box::new(move |frame_type: FrameType, payload: &[u8]| {
    cloned.lock().unwrap().push((frame_type, payload.to_vec()));
  });
  (received, cb)
}

/// Sends `frames` as a client would, ends the sending direction and returns everything the
/// server wrote back.
async fn send_and_collect(stream: &mut DuplexStream, frames: &[Vec<u8>]) -> Vec<u8> {
  for frame in frames {
    stream.write_all(frame).await.unwrap();
  }
  stream.shutdown().await.unwrap();
  let mut response = Vec::new();
  let _ = stream.read_to_end(&mut response).await.unwrap();
  response
}

async fn assert_protocol_failure(
  config: WebSocketConfig,
  frames: &[Vec<u8>],
  error: WebSocketError,
  code: CloseCode,
) {
  let (mut stream, server) = raw_client(config);
  let (response, ()) = tokio::join!(send_and_collect(&mut stream, frames), async {
    let mut buffer = FlatBuffer::default();
    let err = server.read(&mut buffer).await.unwrap_err();
    assert!(matches!(err, crate::Error::WebSocketError(elem) if elem == error), "{err:?}");
    assert_eq!(server.status(), Status::Failed);
  });
  let [c0, c1] = u16::from(code).to_be_bytes();
  assert_eq!(response, [0b1000_1000, 2, c0, c1]);
}

#[tokio::test]
async fn echo_and_close() {
  #[cfg(feature = "_tracing-tree")]
  let _rslt = crate::misc::tracing_tree_init(None);
  let (client, server) = pair(1024, WebSocketConfig::default(), (), ());
  tokio::join!(
    async {
      client.write(b"Hello", true).await.unwrap();
      let mut buffer = FlatBuffer::default();
      let info = client.read(&mut buffer).await.unwrap();
      assert!(info.is_final && info.is_text);
      assert_eq!(buffer.as_str(), Some("Hello"));
      assert!(client.got_text());
      client.close(&CloseReason::from(CloseCode::Normal)).await.unwrap();
      assert_eq!(client.status(), Status::Closed);
      assert_eq!(client.close_reason().unwrap().code(), Some(CloseCode::Normal));
      assert!(client.write(b"late", true).await.unwrap_err().is_operation_aborted());
    },
    async {
      let mut buffer = FlatBuffer::default();
      let info = server.read(&mut buffer).await.unwrap();
      server.write(buffer.data(), info.is_text).await.unwrap();
      buffer.clear();
      assert!(server.read(&mut buffer).await.unwrap_err().is_closed());
      assert_eq!(server.status(), Status::Closed);
      assert_eq!(server.close_reason().unwrap().code(), Some(CloseCode::Normal));
    }
  );
}

#[tokio::test]
async fn fragmented_message_is_reassembled() {
  let (client, server) = pair(1024, WebSocketConfig::default(), (), ());
  tokio::join!(
    async {
      client.write_some(b"ab", true, false).await.unwrap();
      client.write_some(b"cd", true, false).await.unwrap();
      client.write_some(b"ef", true, true).await.unwrap();
    },
    async {
      let mut buffer = FlatBuffer::default();
      let info = server.read(&mut buffer).await.unwrap();
      assert_eq!(info.len, 6);
      assert!(info.is_final && info.is_text);
      assert_eq!(buffer.as_str(), Some("abcdef"));
      assert!(server.is_message_done());
    }
  );
}

#[tokio::test]
async fn auto_fragmentation_splits_large_writes() {
  let config = WebSocketConfig::default().set_write_buffer_size(16);
  let (mut stream, server) = raw_client(config);
  tokio::join!(
    async {
      server.write(&[7; 40], false).await.unwrap();
    },
    async {
      let mut bytes = [0; 3 * 2 + 40];
      stream.read_exact(&mut bytes).await.unwrap();
      assert_eq!(bytes[..2], [0b0000_0010, 16]);
      assert_eq!(bytes[18..20], [0b0000_0000, 16]);
      assert_eq!(bytes[36..38], [0b1000_0000, 8]);
    }
  );
}

#[tokio::test]
async fn read_some_honors_the_limit() {
  let (client, server) = pair(1024, WebSocketConfig::default(), (), ());
  tokio::join!(
    async {
      client.write(b"0123456789", false).await.unwrap();
    },
    async {
      let mut buffer = FlatBuffer::default();
      let first = server.read_some(&mut buffer, 4).await.unwrap();
      assert_eq!((first.len, first.is_final, first.is_text), (4, false, false));
      assert!(!server.is_message_done());
      let mut total = first.len;
      while total < 10 {
        total += server.read_some(&mut buffer, 4).await.unwrap().len;
      }
      assert_eq!(buffer.data(), b"0123456789");
      assert!(server.is_message_done());
      assert!(server.got_binary());
    }
  );
}

#[tokio::test]
async fn ping_between_fragments_is_answered() {
  let (client, server) = pair(1024, WebSocketConfig::default(), (), ());
  let (client_received, client_cb) = recorder();
  let (server_received, server_cb) = recorder();
  client.set_control_callback(Some(client_cb));
  server.set_control_callback(Some(server_cb));
  tokio::join!(
    async {
      client.write_some(b"ab", true, false).await.unwrap();
      client.ping(&PingData::new(b"x").unwrap()).await.unwrap();
      client.write_some(b"cd", true, true).await.unwrap();
      let mut buffer = FlatBuffer::default();
      let _info = client.read(&mut buffer).await.unwrap();
      assert_eq!(buffer.as_str(), Some("done"));
    },
    async {
      let mut buffer = FlatBuffer::default();
      let _info = server.read(&mut buffer).await.unwrap();
      assert_eq!(buffer.as_str(), Some("abcd"));
      server.write(b"done", true).await.unwrap();
    }
  );
  assert_eq!(*server_received.lock().unwrap(), [(FrameType::Ping, b"x".to_vec())]);
  assert_eq!(*client_received.lock().unwrap(), [(FrameType::Pong, b"x".to_vec())]);
}

#[tokio::test]
async fn empty_non_final_frames_are_skipped() {
  let (mut stream, server) = raw_client(WebSocketConfig::default());
  let frames = [
    masked_frame(false, OpCode::Text, b""),
    masked_frame(false, OpCode::Continuation, b""),
    masked_frame(true, OpCode::Continuation, b"a"),
  ];
  tokio::join!(
    async {
      for frame in &frames {
        stream.write_all(frame).await.unwrap();
      }
    },
    async {
      let mut buffer = FlatBuffer::default();
      let info = server.read(&mut buffer).await.unwrap();
      assert!(info.is_text);
      assert_eq!(buffer.as_str(), Some("a"));
    }
  );
}

#[tokio::test]
async fn illegal_close_payloads_fail_with_protocol_error() {
  let config = WebSocketConfig::default();
  let cases: [(&[u8], WebSocketError); 4] = [
    (&[3], WebSocketError::BadCloseSize),
    (&[3, 237], WebSocketError::BadCloseCode),
    (&[0, 100], WebSocketError::BadCloseCode),
    (&[3, 232, 0xff], WebSocketError::BadClosePayload),
  ];
  for (payload, error) in cases {
    let frames = [masked_frame(true, OpCode::Close, payload)];
    assert_protocol_failure(config, &frames, error, CloseCode::Protocol).await;
  }
}

#[tokio::test]
async fn invalid_text_fails_with_1007() {
  let frames = [masked_frame(true, OpCode::Text, &[0xc3, 0x28])];
  assert_protocol_failure(
    WebSocketConfig::default(),
    &frames,
    WebSocketError::BadFramePayload,
    CloseCode::Invalid,
  )
  .await;
}

#[tokio::test]
async fn truncated_code_point_fails_at_the_end_of_the_message() {
  let frames = [
    masked_frame(false, OpCode::Text, b"a\xe2\x82"),
    masked_frame(true, OpCode::Continuation, b""),
  ];
  assert_protocol_failure(
    WebSocketConfig::default(),
    &frames,
    WebSocketError::BadFramePayload,
    CloseCode::Invalid,
  )
  .await;
}

#[tokio::test]
async fn large_message_fails_with_1009() {
  let frames = [masked_frame(true, OpCode::Binary, &[1, 2, 3, 4, 5])];
  assert_protocol_failure(
    WebSocketConfig::default().set_read_message_max(4),
    &frames,
    WebSocketError::MessageTooBig,
    CloseCode::Size,
  )
  .await;
}

#[tokio::test]
async fn unexpected_continuation_fails_with_1002() {
  let frames = [masked_frame(true, OpCode::Continuation, b"a")];
  assert_protocol_failure(
    WebSocketConfig::default(),
    &frames,
    WebSocketError::BadContinuation,
    CloseCode::Protocol,
  )
  .await;
}

#[tokio::test]
async fn unmasked_client_frame_fails_with_1002() {
  let mut frame = Vec::new();
  serialize_frame(&mut frame, &FrameHeader::new(true, OpCode::Text, 1), b"a");
  assert_protocol_failure(
    WebSocketConfig::default(),
    &[frame],
    WebSocketError::BadUnmaskedFrame,
    CloseCode::Protocol,
  )
  .await;
}

#[tokio::test]
async fn close_interrupts_pending_read() {
  let (client, server) = pair(1024, WebSocketConfig::default(), (), ());
  tokio::join!(
    async {
      let mut buffer = FlatBuffer::default();
      let err = client.read(&mut buffer).await.unwrap_err();
      assert!(err.is_operation_aborted(), "{err:?}");
    },
    async {
      client.close(&CloseReason::new(CloseCode::Away, "bye").unwrap()).await.unwrap();
      assert_eq!(client.status(), Status::Closed);
    },
    async {
      let mut buffer = FlatBuffer::default();
      assert!(server.read(&mut buffer).await.unwrap_err().is_closed());
      let close_reason = server.close_reason().unwrap();
      assert_eq!(close_reason.code(), Some(CloseCode::Away));
      assert_eq!(close_reason.reason(), "bye");
    }
  );
}

#[tokio::test]
async fn peer_that_disappears_ends_the_closing_handshake() {
  let (mut stream, server) = raw_client(WebSocketConfig::default());
  tokio::join!(
    async {
      server.close(&CloseReason::none()).await.unwrap();
      assert_eq!(server.status(), Status::Closed);
      assert!(server.close_reason().is_none());
    },
    async {
      let mut bytes = [0; 2];
      stream.read_exact(&mut bytes).await.unwrap();
      assert_eq!(bytes, [0b1000_1000, 0]);
      drop(stream);
    }
  );
}

#[tokio::test]
#[should_panic(expected = "only one write operation can be outstanding at a time")]
async fn concurrent_writes_panic() {
  let (client, _server) = pair(8, WebSocketConfig::default(), (), ());
  let payload = [0; 1024];
  let _rslt = tokio::join!(client.write(&payload, false), client.write(b"a", false));
}

#[tokio::test]
#[should_panic(expected = "all parts of a message must have the same type")]
async fn changing_the_type_of_a_message_panics() {
  let (client, _server) = pair(1024, WebSocketConfig::default(), (), ());
  client.write_some(b"a", true, false).await.unwrap();
  client.write_some(b"b", false, true).await.unwrap();
}

#[tokio::test]
async fn control_frames_with_large_payloads_are_rejected() {
  assert!(matches!(
    PingData::new(&[0; 126]),
    Err(crate::Error::WebSocketError(WebSocketError::BadControlSize))
  ));
}

#[cfg(feature = "flate2")]
#[tokio::test]
async fn compressed_messages() {
  use crate::web_socket::{CompressionLevel, DeflateParams, Flate2};
  let nc = || Flate2::new(CompressionLevel::default(), DeflateParams::default());
  let config = WebSocketConfig::default().set_write_buffer_size(32);
  let (client, server) = pair(4096, config, nc(), nc());
  let text = "Hello Hello Hello Hello Hello Hello Hello Hello Hello Hello".repeat(20);
  tokio::join!(
    async {
      for _ in 0..3 {
        client.write(text.as_bytes(), true).await.unwrap();
      }
      client.write(b"", false).await.unwrap();
      let mut buffer = FlatBuffer::default();
      let _info = client.read(&mut buffer).await.unwrap();
      assert_eq!(buffer.as_str(), Some(text.as_str()));
    },
    async {
      let mut buffer = FlatBuffer::default();
      for _ in 0..3 {
        buffer.clear();
        let info = server.read(&mut buffer).await.unwrap();
        assert!(info.is_text);
        assert_eq!(buffer.as_str(), Some(text.as_str()));
      }
      buffer.clear();
      let info = server.read(&mut buffer).await.unwrap();
      assert_eq!((info.len, info.is_final, info.is_text), (0, true, false));
      server.write(text.as_bytes(), true).await.unwrap();
    }
  );
}

#[cfg(feature = "flate2")]
#[tokio::test]
async fn compressed_message_larger_than_the_limit_fails_with_1009() {
  use crate::web_socket::{CompressionLevel, DeflateParams, Flate2};
  let nc = || Flate2::new(CompressionLevel::default(), DeflateParams::default());
  let (client, server) =
    pair(4096, WebSocketConfig::default().set_read_message_max(64), nc(), nc());
  tokio::join!(
    async {
      client.write(&[0; 1024], false).await.unwrap();
      let mut buffer = FlatBuffer::default();
      assert!(client.read(&mut buffer).await.unwrap_err().is_closed());
      assert_eq!(client.close_reason().unwrap().code(), Some(CloseCode::Size));
    },
    async {
      let mut buffer = FlatBuffer::default();
      let err = server.read(&mut buffer).await.unwrap_err();
      assert_eq!(err.close_code(), CloseCode::Size);
      assert_eq!(server.status(), Status::Failed);
    }
  );
}

#[test]
fn blocking_operations_over_in_memory_streams() {
  let mut input = masked_frame(true, OpCode::Ping, b"p");
  input.extend(masked_frame(true, OpCode::Binary, &[1, 2, 3]));
  let server = WebSocketServer::open(
    WebSocketConfig::default(),
    (),
    Xorshift64::from(3),
    BytesStream::new(input),
    BytesStream::new(Vec::new()),
  )
  .unwrap();
  let mut buffer = FlatBuffer::default();
  let info = server.read_blocking(&mut buffer).unwrap();
  assert_eq!((info.len, info.is_text), (3, false));
  assert_eq!(buffer.data(), [1, 2, 3]);
  server.write_blocking(b"hi", true).unwrap();
  let (_, sw) = server.into_parts().unwrap();
  assert_eq!(sw.bytes(), [0b1000_1010, 1, b'p', 0b1000_0001, 2, b'h', b'i']);
}

#[tokio::test]
async fn empty_close_is_echoed_with_normal_code() {
  let (mut stream, server) = raw_client(WebSocketConfig::default());
  let frames = [masked_frame(true, OpCode::Close, &[])];
  let (response, ()) = tokio::join!(
    send_and_collect(&mut stream, &frames),
    async {
      let mut buffer = FlatBuffer::default();
      assert!(server.read(&mut buffer).await.unwrap_err().is_closed());
      assert_eq!(server.status(), Status::Closed);
      assert!(server.close(&CloseReason::none()).await.unwrap_err().is_operation_aborted());
    }
  );
  assert_eq!(response, [0b1000_1000, 2, 3, 232]);
}

#[tokio::test]
async fn peer_close_aborts_an_unfinished_message() {
  let (mut stream, server) = raw_client(WebSocketConfig::default());
  let close = masked_frame(true, OpCode::Close, &1000u16.to_be_bytes());
  let frames = [close];
  let (response, ()) = tokio::join!(send_and_collect(&mut stream, &frames), async {
    server.write_some(b"a", true, false).await.unwrap();
    let mut buffer = FlatBuffer::default();
    assert!(server.read(&mut buffer).await.unwrap_err().is_closed());
    assert!(server.write_some(b"b", true, true).await.unwrap_err().is_operation_aborted());
    assert!(server.write(b"c", true).await.unwrap_err().is_operation_aborted());
  });
  assert_eq!(response, [0b0000_0001, 1, b'a', 0b1000_1000, 2, 3, 232]);
}

#[test]
fn teardown_happens_once_after_a_received_close() {
  let server = in_memory_server(masked_frame(true, OpCode::Close, &[]));
  let mut buffer = FlatBuffer::default();
  assert!(server.read_blocking(&mut buffer).unwrap_err().is_closed());
  assert!(server.close_blocking(&CloseReason::none()).unwrap_err().is_operation_aborted());
  assert!(server.write_blocking(b"late", false).unwrap_err().is_operation_aborted());
  let (_, sw) = server.into_parts().unwrap();
  assert_eq!(sw.shutdowns, 1);
  assert!(sw.inner.is_shut_down());
  assert_eq!(sw.inner.bytes(), [0b1000_1000, 2, 3, 232]);
}

#[test]
fn teardown_happens_once_after_a_failure() {
  let mut input = Vec::new();
  serialize_frame(&mut input, &FrameHeader::new(true, OpCode::Binary, 1), &[1]);
  let server = in_memory_server(input);
  let mut buffer = FlatBuffer::default();
  assert!(server.read_blocking(&mut buffer).is_err());
  assert_eq!(server.status(), Status::Failed);
  assert!(server.close_blocking(&CloseReason::none()).unwrap_err().is_operation_aborted());
  let (_, sw) = server.into_parts().unwrap();
  assert_eq!(sw.shutdowns, 1);
  let [c0, c1] = u16::from(CloseCode::Protocol).to_be_bytes();
  assert_eq!(sw.inner.bytes(), [0b1000_1000, 2, c0, c1]);
}

#[test]
fn debug_output_names_the_role() {
  let server = in_memory_server(Vec::new());
  assert!(format!("{server:?}").contains("role: \"Server\""));
}

#[tokio::test]
async fn message_state_is_not_observable_during_a_read() {
  let (mut stream, server) = raw_client(WebSocketConfig::default());
  tokio::join!(
    async {
      let mut buffer = FlatBuffer::default();
      let info = server.read(&mut buffer).await.unwrap();
      assert!(info.is_text);
    },
    async {
      tokio::task::yield_now().await;
      assert!(!server.is_message_done());
      assert!(!server.got_text() && !server.got_binary());
      stream.write_all(&masked_frame(true, OpCode::Text, b"hi")).await.unwrap();
    }
  );
  assert!(server.is_message_done() && server.got_text());
}
