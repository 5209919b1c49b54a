use crate::web_socket::compression::WindowBits;
use core::fmt::{Display, Formatter};

/// Permessage-deflate parameters agreed during the handshake. Immutable for the life of a
/// connection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeflateParams {
  /// LZ77 sliding window used by the client to compress.
  pub client_max_window_bits: WindowBits,
  /// Client resets its compression context after each message.
  pub client_no_context_takeover: bool,
  /// LZ77 sliding window used by the server to compress.
  pub server_max_window_bits: WindowBits,
  /// Server resets its compression context after each message.
  pub server_no_context_takeover: bool,
}

impl DeflateParams {
  /// Window and context takeover of the frames sent by `is_client`.
  #[inline]
  pub const fn sending(&self, is_client: bool) -> (WindowBits, bool) {
    if is_client {
      (self.client_max_window_bits, self.client_no_context_takeover)
    } else {
      (self.server_max_window_bits, self.server_no_context_takeover)
    }
  }

  /// Window and context takeover of the frames received by `is_client`.
  #[inline]
  pub const fn receiving(&self, is_client: bool) -> (WindowBits, bool) {
    self.sending(!is_client)
  }
}

/// Value of the `Sec-WebSocket-Extensions` header sent by a server that accepted the
/// extension.
impl Display for DeflateParams {
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str("permessage-deflate")?;
    if self.client_max_window_bits != WindowBits::MAX {
      write!(f, "; client_max_window_bits={}", u8::from(self.client_max_window_bits))?;
    }
    if self.client_no_context_takeover {
      f.write_str("; client_no_context_takeover")?;
    }
    if self.server_max_window_bits != WindowBits::MAX {
      write!(f, "; server_max_window_bits={}", u8::from(self.server_max_window_bits))?;
    }
    if self.server_no_context_takeover {
      f.write_str("; server_no_context_takeover")?;
    }
    Ok(())
  }
}
