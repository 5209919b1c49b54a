//! A computer communications protocol, providing full-duplex communication channels over a single
//! TCP connection.
//!
//! <https://tools.ietf.org/html/rfc6455>

mod close_code;
mod close_reason;
pub mod compression;
mod control_frame;
mod frame_header;
mod mask;
mod op_code;
mod ping_data;
mod session;
mod soft_mutex;
#[cfg(all(feature = "tokio", test))]
mod tests;
mod utf8_checker;
mod web_socket_closer;
mod web_socket_config;
mod web_socket_error;
mod web_socket_reader;
mod web_socket_writer;

use crate::{
  misc::{DynamicBuffer, Role},
  rng::Rng,
  stream::{StreamReader, StreamWriter},
  web_socket::{
    compression::NegotiatedCompression,
    session::{Families, Family, Session},
    soft_mutex::SoftMutex,
    web_socket_reader::ReaderPart,
    web_socket_writer::WriterPart,
  },
};
pub use close_code::{is_valid_close_code, CloseCode};
pub use close_reason::{CloseReason, MAX_CLOSE_REASON_LEN};
#[cfg(feature = "flate2")]
pub use compression::{Flate2, Flate2Deflater, Flate2Inflater};
pub use compression::{
  CompressionLevel, DeflateConfig, DeflateParams, Deflater, Inflater, WindowBits,
};
pub use control_frame::serialize_control_frame;
pub use frame_header::FrameHeader;
pub use mask::{unmask, PreparedKey};
pub use op_code::OpCode;
pub use ping_data::PingData;
pub use session::Status;
pub use utf8_checker::Utf8Checker;
pub use web_socket_config::WebSocketConfig;
pub use web_socket_error::WebSocketError;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Maximum payload of ping, pong and close frames.
pub const MAX_CONTROL_PAYLOAD_LEN: usize = 125;
/// Maximum number of bytes of a frame header.
pub const MAX_HEADER_LEN: usize = 14;

/// Invoked with the payload of every ping, pong or close frame received while reading.
pub type ControlCallback = Box<dyn FnMut(FrameType, &[u8]) + Send>;
/// [`WebSocket`] that connects to a server.
pub type WebSocketClient<NC, R, SR, SW> = WebSocket<NC, R, SR, SW, true>;
/// [`WebSocket`] that accepts a client.
pub type WebSocketServer<NC, R, SR, SW> = WebSocket<NC, R, SR, SW, false>;

/// Kind of a received control frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameType {
  /// Close
  Close,
  /// Ping
  Ping,
  /// Pong
  Pong,
}

/// Outcome of a read operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageInfo {
  /// If the message is complete.
  pub is_final: bool,
  /// Text or binary.
  pub is_text: bool,
  /// Number of payload bytes appended to the provided buffer by this operation.
  pub len: usize,
}

/// Full-duplex communication over a transport that already completed the opening handshake.
///
/// Every method takes `&self`: a read, a write, a ping or pong and a close can be in flight at
/// the same time, for example through `tokio::join!`, and frames are never interleaved on the
/// wire. Starting a second operation of the same kind before the first one finishes panics.
pub struct WebSocket<NC, R, SR, SW, const IS_CLIENT: bool>
where
  NC: NegotiatedCompression,
{
  callback: Mutex<Option<ControlCallback>>,
  config: WebSocketConfig,
  families: Families,
  reader: SoftMutex<ReaderPart<NC::Inflater, SR>>,
  session: Mutex<Session>,
  writer: SoftMutex<WriterPart<NC::Deflater, R, SW>>,
}

impl<NC, R, SR, SW, const IS_CLIENT: bool> WebSocket<NC, R, SR, SW, IS_CLIENT>
where
  NC: NegotiatedCompression,
  R: Rng,
  SR: StreamReader,
  SW: StreamWriter,
{
  /// Starts a session over the halves of a transport whose HTTP upgrade was accepted. `nc`
  /// is the compression negotiated during the handshake, if any.
  #[inline]
  pub fn open(
    config: WebSocketConfig,
    nc: NC,
    rng: R,
    stream_reader: SR,
    stream_writer: SW,
  ) -> crate::Result<Self> {
    let (deflater, inflater) = match nc.split(Role::from_is_client(IS_CLIENT))? {
      Some((deflater, inflater)) => (Some(deflater), Some(inflater)),
      None => (None, None),
    };
    let config = config
      .set_read_buffer_size(config.read_buffer_size)
      .set_write_buffer_size(config.write_buffer_size);
    _debug!(is_client = IS_CLIENT, "Session opened");
    Ok(Self {
      callback: Mutex::new(None),
      config,
      families: Families::default(),
      reader: SoftMutex::new(ReaderPart::new(inflater, stream_reader)),
      session: Mutex::new(Session::new()),
      writer: SoftMutex::new(WriterPart::new(deflater, rng, stream_writer)),
    })
  }

  /// Sends a close frame and waits until the peer answers with its own close frame, or until
  /// the transport ends, then tears the transport down.
  ///
  /// Pending reads are interrupted with [`WebSocketError::OperationAborted`].
  #[inline]
  pub async fn close(&self, close_reason: &CloseReason) -> crate::Result<()> {
    let _family = self.families.enter(Family::Close);
    self.close_op(close_reason).await
  }

  /// The close frame received from the peer, if any.
  #[inline]
  pub fn close_reason(&self) -> Option<CloseReason> {
    self.session().close_reason.clone()
  }

  /// See [`WebSocketConfig`].
  #[inline]
  pub fn config(&self) -> &WebSocketConfig {
    &self.config
  }

  /// Returns the transport halves. Fails if an operation still owns one of them, which only
  /// happens if a guard was leaked.
  #[inline]
  pub fn into_parts(self) -> crate::Result<(SR, SW)> {
    let reader = self.reader.into_inner().ok_or(WebSocketError::OperationInProgress)?;
    let writer = self.writer.into_inner().ok_or(WebSocketError::OperationInProgress)?;
    Ok((reader.into_stream(), writer.into_stream()))
  }

  /// If the last read finished a message. `true` before anything is read.
  ///
  /// Returns `false` while a read is running or while the reader is claimed by another operation.
  #[inline]
  pub fn is_message_done(&self) -> bool {
    self.reader.try_lock(soft_mutex::Owner::Read).map_or(false, |rd| rd.is_message_done())
  }

  /// Sends a ping frame.
  #[inline]
  pub async fn ping(&self, data: &PingData) -> crate::Result<()> {
    let _family = self.families.enter(Family::Ping);
    self.control_op(OpCode::Ping, data).await
  }

  /// Sends an unsolicited pong frame.
  #[inline]
  pub async fn pong(&self, data: &PingData) -> crate::Result<()> {
    let _family = self.families.enter(Family::Ping);
    self.control_op(OpCode::Pong, data).await
  }

  /// Reads a complete message into `buffer`.
  ///
  /// Ping, pong and close frames received in the meantime are handled transparently. Returns
  /// [`WebSocketError::Closed`] after the peer initiated closing handshake completes.
  #[inline]
  pub async fn read(&self, buffer: &mut impl DynamicBuffer) -> crate::Result<MessageInfo> {
    let _family = self.families.enter(Family::Read);
    let mut info = MessageInfo { is_final: false, is_text: false, len: 0 };
    loop {
      let local = self.read_some_op(&mut *buffer, usize::MAX).await?;
      info = MessageInfo {
        is_final: local.is_final,
        is_text: local.is_text,
        len: info.len.wrapping_add(local.len),
      };
      if info.is_final {
        return Ok(info);
      }
    }
  }

  /// Reads at most `limit` bytes of the current message into `buffer`.
  #[inline]
  pub async fn read_some(
    &self,
    buffer: &mut impl DynamicBuffer,
    limit: usize,
  ) -> crate::Result<MessageInfo> {
    let _family = self.families.enter(Family::Read);
    self.read_some_op(buffer, limit).await
  }

  /// Replaces the function invoked when control frames are received.
  #[inline]
  pub fn set_control_callback(&self, cb: Option<ControlCallback>) {
    *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = cb;
  }

  /// See [`Status`].
  #[inline]
  pub fn status(&self) -> Status {
    self.session().status
  }

  /// Sends a complete message.
  #[inline]
  pub async fn write(&self, payload: &[u8], is_text: bool) -> crate::Result<()> {
    let _family = self.families.enter(Family::Write);
    self.write_some_op(payload, is_text, true).await
  }

  /// Sends a part of a message. `is_text` must be the same for all parts of a message and
  /// `fin` marks the last part.
  ///
  /// # Panics
  ///
  /// If `is_text` differs from the value used by the first part of the current message.
  #[inline]
  pub async fn write_some(&self, payload: &[u8], is_text: bool, fin: bool) -> crate::Result<()> {
    let _family = self.families.enter(Family::Write);
    self.write_some_op(payload, is_text, fin).await
  }

  /// Blocking version of [`Self::close`].
  #[inline]
  pub fn close_blocking(&self, close_reason: &CloseReason) -> crate::Result<()> {
    futures_lite::future::block_on(self.close(close_reason))
  }

  /// Blocking version of [`Self::ping`].
  #[inline]
  pub fn ping_blocking(&self, data: &PingData) -> crate::Result<()> {
    futures_lite::future::block_on(self.ping(data))
  }

  /// Blocking version of [`Self::pong`].
  #[inline]
  pub fn pong_blocking(&self, data: &PingData) -> crate::Result<()> {
    futures_lite::future::block_on(self.pong(data))
  }

  /// Blocking version of [`Self::read`].
  #[inline]
  pub fn read_blocking(&self, buffer: &mut impl DynamicBuffer) -> crate::Result<MessageInfo> {
    futures_lite::future::block_on(self.read(buffer))
  }

  /// Blocking version of [`Self::read_some`].
  #[inline]
  pub fn read_some_blocking(
    &self,
    buffer: &mut impl DynamicBuffer,
    limit: usize,
  ) -> crate::Result<MessageInfo> {
    futures_lite::future::block_on(self.read_some(buffer, limit))
  }

  /// Blocking version of [`Self::write`].
  #[inline]
  pub fn write_blocking(&self, payload: &[u8], is_text: bool) -> crate::Result<()> {
    futures_lite::future::block_on(self.write(payload, is_text))
  }

  /// Blocking version of [`Self::write_some`].
  #[inline]
  pub fn write_some_blocking(&self, payload: &[u8], is_text: bool, fin: bool) -> crate::Result<()> {
    futures_lite::future::block_on(self.write_some(payload, is_text, fin))
  }

  pub(crate) fn call_control_callback(&self, frame_type: FrameType, payload: &[u8]) {
    let Some(mut cb) = self.callback.lock().unwrap_or_else(PoisonError::into_inner).take() else {
      return;
    };
    cb(frame_type, payload);
    let mut guard = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_none() {
      *guard = Some(cb);
    }
  }

  pub(crate) fn session(&self) -> MutexGuard<'_, Session> {
    self.session.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<NC, R, SR, SW, const IS_CLIENT: bool> core::fmt::Debug for WebSocket<NC, R, SR, SW, IS_CLIENT>
where
  NC: NegotiatedCompression,
{
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("WebSocket")
      .field("config", &self.config)
      .field("role", &<&str>::from(Role::from_is_client(IS_CLIENT)))
      .field("session", &self.session.lock().unwrap_or_else(PoisonError::into_inner))
      .finish_non_exhaustive()
  }
}
