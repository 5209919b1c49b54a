/// Options of a session that do not depend on the handshake.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WebSocketConfig {
  /// Writes that are larger than `write_buffer_size` are split into several frames.
  pub auto_fragment: bool,
  /// Outgoing messages use the negotiated compression.
  pub compress: bool,
  /// Messages with fewer bytes are sent uncompressed even when `compress` is set.
  pub compress_threshold: usize,
  /// Maximum number of bytes of a received message. Zero means unlimited.
  pub read_message_max: usize,
  /// Number of bytes requested from the transport on each read.
  pub read_buffer_size: usize,
  /// Maximum payload of each frame when fragmenting automatically.
  pub write_buffer_size: usize,
}

impl WebSocketConfig {
  /// Smallest accepted `write_buffer_size`.
  pub const MIN_WRITE_BUFFER_SIZE: usize = 8;

  /// Instance with default values.
  #[inline]
  pub const fn new() -> Self {
    Self {
      auto_fragment: true,
      compress: true,
      compress_threshold: 0,
      read_message_max: 16 * 1024 * 1024,
      read_buffer_size: 4096,
      write_buffer_size: 4096,
    }
  }

  /// See [`Self::auto_fragment`].
  #[inline]
  pub const fn set_auto_fragment(mut self, value: bool) -> Self {
    self.auto_fragment = value;
    self
  }

  /// See [`Self::compress`].
  #[inline]
  pub const fn set_compress(mut self, value: bool) -> Self {
    self.compress = value;
    self
  }

  /// See [`Self::compress_threshold`].
  #[inline]
  pub const fn set_compress_threshold(mut self, value: usize) -> Self {
    self.compress_threshold = value;
    self
  }

  /// See [`Self::read_buffer_size`]. Values smaller than 1 are rounded up.
  #[inline]
  pub const fn set_read_buffer_size(mut self, value: usize) -> Self {
    self.read_buffer_size = if value == 0 { 1 } else { value };
    self
  }

  /// See [`Self::read_message_max`].
  #[inline]
  pub const fn set_read_message_max(mut self, value: usize) -> Self {
    self.read_message_max = value;
    self
  }

  /// See [`Self::write_buffer_size`]. Values smaller than [`Self::MIN_WRITE_BUFFER_SIZE`] are
  /// rounded up.
  #[inline]
  pub const fn set_write_buffer_size(mut self, value: usize) -> Self {
    self.write_buffer_size =
      if value < Self::MIN_WRITE_BUFFER_SIZE { Self::MIN_WRITE_BUFFER_SIZE } else { value };
    self
  }

  pub(crate) const fn message_max(&self) -> usize {
    if self.read_message_max == 0 {
      usize::MAX
    } else {
      self.read_message_max
    }
  }
}

impl Default for WebSocketConfig {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
