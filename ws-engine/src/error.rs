use crate::web_socket::{CloseCode, WebSocketError};
use core::fmt::{Debug, Display, Formatter};

/// Grouped individual errors
#[derive(Debug)]
pub enum Error {
  // External
  //
  #[cfg(feature = "flate2")]
  /// See [`flate2::CompressError`].
  Flate2CompressError(flate2::CompressError),
  #[cfg(feature = "flate2")]
  /// See [`flate2::DecompressError`].
  Flate2DecompressError(Box<flate2::DecompressError>),
  /// See [`std::io::Error`].
  IoError(std::io::Error),
  /// See [`core::num::TryFromIntError`].
  TryFromIntError(core::num::TryFromIntError),

  // Internal
  //
  /// A buffer was asked to hold more bytes than it was configured to accept.
  BufferOverflow,
  /// Stream was closed before the expected amount of bytes arrived.
  UnexpectedStreamReadEOF,
  /// A given integer does not map to any known value.
  UnexpectedUint {
    /// Received number
    received: u32,
  },

  // Internal - Grouped
  //
  /// See [`WebSocketError`].
  WebSocketError(WebSocketError),
}

impl Error {
  /// The close code that should be sent to a peer when a session is failed because of `self`.
  #[inline]
  pub fn close_code(&self) -> CloseCode {
    match self {
      Self::WebSocketError(elem) => elem.close_code(),
      _ => CloseCode::Error,
    }
  }

  /// If both sides performed the closing handshake.
  #[inline]
  pub fn is_closed(&self) -> bool {
    matches!(self, Self::WebSocketError(WebSocketError::Closed))
  }

  /// Operation could not run to completion because the session was shut down by another
  /// operation. Not a failure by itself.
  #[inline]
  pub fn is_operation_aborted(&self) -> bool {
    matches!(self, Self::WebSocketError(WebSocketError::OperationAborted))
  }

  /// End-of-stream conditions that are expected while a session is being torn down.
  #[inline]
  pub(crate) fn is_eof(&self) -> bool {
    match self {
      Self::UnexpectedStreamReadEOF => true,
      Self::IoError(elem) => matches!(
        elem.kind(),
        std::io::ErrorKind::UnexpectedEof
          | std::io::ErrorKind::ConnectionReset
          | std::io::ErrorKind::BrokenPipe
          | std::io::ErrorKind::NotConnected
      ),
      _ => false,
    }
  }
}

impl Display for Error {
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    <Self as Debug>::fmt(self, f)
  }
}

impl std::error::Error for Error {}

#[cfg(feature = "flate2")]
impl From<flate2::CompressError> for Error {
  #[inline]
  fn from(from: flate2::CompressError) -> Self {
    Self::Flate2CompressError(from)
  }
}

#[cfg(feature = "flate2")]
impl From<flate2::DecompressError> for Error {
  #[inline]
  fn from(from: flate2::DecompressError) -> Self {
    Self::Flate2DecompressError(from.into())
  }
}

impl From<std::io::Error> for Error {
  #[inline]
  fn from(from: std::io::Error) -> Self {
    Self::IoError(from)
  }
}

impl From<core::num::TryFromIntError> for Error {
  #[inline]
  fn from(from: core::num::TryFromIntError) -> Self {
    Self::TryFromIntError(from)
  }
}

impl From<WebSocketError> for Error {
  #[inline]
  fn from(from: WebSocketError) -> Self {
    Self::WebSocketError(from)
  }
}
