//! Permessage-deflate (RFC 7692).
//!
//! The outcome of the HTTP handshake, [`DeflateParams`], is turned into one [`Deflater`] for
//! the sending direction and one [`Inflater`] for the receiving direction. Both keep their
//! state across messages unless "no context takeover" was negotiated for their direction.

mod compression_level;
mod deflate_config;
mod deflate_params;
#[cfg(feature = "flate2")]
mod flate2;
mod window_bits;

#[cfg(feature = "flate2")]
pub use self::flate2::{Flate2, Flate2Deflater, Flate2Inflater};
pub use compression_level::CompressionLevel;
pub use deflate_config::DeflateConfig;
pub use deflate_params::DeflateParams;
pub use window_bits::WindowBits;

use crate::misc::Role;

/// Bytes that terminate every compressed message. Removed by senders and restored by receivers.
pub const DEFLATE_SUFFIX: [u8; 4] = [0, 0, 255, 255];

/// Compresses outgoing messages.
pub trait Deflater {
  /// Appends the compressed version of `input` to `output`. `fin` marks the last part of a
  /// message, which is flushed and stripped of [`DEFLATE_SUFFIX`].
  fn deflate(&mut self, input: &[u8], output: &mut Vec<u8>, fin: bool) -> crate::Result<()>;
}

/// Decompresses incoming messages.
pub trait Inflater {
  /// Appends the decompressed version of `input` to `output`. Fails with
  /// [`crate::web_socket::WebSocketError::MessageTooBig`] if more than `max_len` bytes would be
  /// appended.
  fn inflate(&mut self, input: &[u8], output: &mut Vec<u8>, max_len: usize) -> crate::Result<()>;

  /// Ends the current message.
  fn finish(&mut self, output: &mut Vec<u8>, max_len: usize) -> crate::Result<()>;
}

/// Compression that was agreed by both parties.
pub trait NegotiatedCompression {
  /// See [`Deflater`].
  type Deflater: Deflater;
  /// See [`Inflater`].
  type Inflater: Inflater;

  /// Splits the state into the sending and the receiving halves of `role`. `None` means that
  /// nothing is compressed.
  fn split(self, role: Role) -> crate::Result<Option<(Self::Deflater, Self::Inflater)>>;
}

impl Deflater for () {
  #[inline]
  fn deflate(&mut self, input: &[u8], output: &mut Vec<u8>, _: bool) -> crate::Result<()> {
    output.extend_from_slice(input);
    Ok(())
  }
}

impl Inflater for () {
  #[inline]
  fn inflate(&mut self, input: &[u8], output: &mut Vec<u8>, _: usize) -> crate::Result<()> {
    output.extend_from_slice(input);
    Ok(())
  }

  #[inline]
  fn finish(&mut self, _: &mut Vec<u8>, _: usize) -> crate::Result<()> {
    Ok(())
  }
}

impl NegotiatedCompression for () {
  type Deflater = ();
  type Inflater = ();

  #[inline]
  fn split(self, _: Role) -> crate::Result<Option<(Self::Deflater, Self::Inflater)>> {
    Ok(None)
  }
}

impl<T> NegotiatedCompression for Option<T>
where
  T: NegotiatedCompression,
{
  type Deflater = T::Deflater;
  type Inflater = T::Inflater;

  #[inline]
  fn split(self, role: Role) -> crate::Result<Option<(Self::Deflater, Self::Inflater)>> {
    match self {
      Some(elem) => elem.split(role),
      None => Ok(None),
    }
  }
}
