use crate::web_socket::CloseCode;

/// WebSocket Error
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WebSocketError {
  /// The closing handshake finished. Nothing else can be read or written.
  Closed,
  /// Operation was interrupted because the session was shut down by another operation.
  OperationAborted,
  /// A session was still in use when its parts were requested.
  OperationInProgress,

  /// Received close frame has an invalid status code.
  BadCloseCode,
  /// Received close frame has an invalid reason.
  BadClosePayload,
  /// Received close frame has a payload of one byte.
  BadCloseSize,
  /// Received a continuation frame without a message in progress.
  BadContinuation,
  /// Received a fragmented control frame.
  BadControlFragment,
  /// Received a control frame with a payload greater than 125 bytes.
  BadControlSize,
  /// Received a text or binary frame while a fragmented message was in progress.
  BadDataFrame,
  /// Text message is not valid UTF-8.
  BadFramePayload,
  /// A client received a masked frame.
  BadMaskedFrame,
  /// Received a reserved opcode.
  BadOpcode,
  /// Reserved bits are not zero or were set without a negotiated extension.
  BadReservedBits,
  /// Payload length is not encoded with the minimal number of bytes or uses the most
  /// significant bit.
  BadSize,
  /// A server received an unmasked frame.
  BadUnmaskedFrame,
  /// Message exceeds the configured maximum size.
  MessageTooBig,
  /// Decompressed data remained after the end of a compressed message.
  PartialDeflateBlock,
  /// Received an invalid or unsupported permessage-deflate parameter.
  UnsupportedCompression,
}

impl WebSocketError {
  /// The close code sent to the peer when a session fails because of this error.
  #[inline]
  pub const fn close_code(self) -> CloseCode {
    match self {
      Self::BadFramePayload => CloseCode::Invalid,
      Self::MessageTooBig => CloseCode::Size,
      Self::Closed
      | Self::OperationAborted
      | Self::OperationInProgress
      | Self::PartialDeflateBlock
      | Self::UnsupportedCompression => CloseCode::Error,
      Self::BadCloseCode
      | Self::BadClosePayload
      | Self::BadCloseSize
      | Self::BadContinuation
      | Self::BadControlFragment
      | Self::BadControlSize
      | Self::BadDataFrame
      | Self::BadMaskedFrame
      | Self::BadOpcode
      | Self::BadReservedBits
      | Self::BadSize
      | Self::BadUnmaskedFrame => CloseCode::Protocol,
    }
  }
}
