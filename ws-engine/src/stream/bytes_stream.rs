use crate::stream::{StreamReader, StreamWriter};

/// In-memory stream. Written data is stored and later returned to readers in the same order.
#[derive(Clone, Debug, Default)]
pub struct BytesStream {
  buffer: Vec<u8>,
  idx: usize,
  is_shut_down: bool,
}

impl BytesStream {
  /// Stream that will return `bytes` when read.
  #[inline]
  pub fn new(bytes: Vec<u8>) -> Self {
    Self { buffer: bytes, idx: 0, is_shut_down: false }
  }

  /// Bytes that were not read yet.
  #[inline]
  pub fn bytes(&self) -> &[u8] {
    self.buffer.get(self.idx..).unwrap_or_default()
  }

  /// Empties the internal buffer.
  #[inline]
  pub fn clear(&mut self) {
    self.buffer.clear();
    self.idx = 0;
  }

  /// If [`StreamWriter::shutdown`] was called.
  #[inline]
  pub fn is_shut_down(&self) -> bool {
    self.is_shut_down
  }
}

impl StreamReader for BytesStream {
  #[inline]
  async fn read(&mut self, bytes: &mut [u8]) -> crate::Result<usize> {
    let working_buffer = self.buffer.get(self.idx..).unwrap_or_default();
    let len = working_buffer.len().min(bytes.len());
    bytes
      .get_mut(..len)
      .unwrap_or_default()
      .copy_from_slice(working_buffer.get(..len).unwrap_or_default());
    self.idx = self.idx.wrapping_add(len);
    if self.idx >= self.buffer.len() {
      self.clear();
    }
    Ok(len)
  }
}

impl StreamWriter for BytesStream {
  #[inline]
  async fn write_all(&mut self, bytes: &[u8]) -> crate::Result<()> {
    self.buffer.extend_from_slice(bytes);
    Ok(())
  }

  #[inline]
  async fn shutdown(&mut self) -> crate::Result<()> {
    self.is_shut_down = true;
    Ok(())
  }
}
