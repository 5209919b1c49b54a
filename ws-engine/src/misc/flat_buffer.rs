/// Growable byte storage split into a readable region followed by a writable region.
pub trait DynamicBuffer {
  /// Readable bytes.
  fn data(&self) -> &[u8];

  /// Returns a writable region of exactly `len` bytes located after the readable bytes.
  /// Previously prepared but uncommitted bytes are discarded.
  fn prepare(&mut self, len: usize) -> crate::Result<&mut [u8]>;

  /// Moves `len` bytes of the last prepared region into the readable region.
  fn commit(&mut self, len: usize);

  /// Removes `len` bytes from the beginning of the readable region.
  fn consume(&mut self, len: usize);

  /// How many bytes can still be prepared without overflowing.
  fn remaining_capacity(&self) -> usize;
}

impl<T> DynamicBuffer for &mut T
where
  T: DynamicBuffer,
{
  #[inline]
  fn data(&self) -> &[u8] {
    (**self).data()
  }

  #[inline]
  fn prepare(&mut self, len: usize) -> crate::Result<&mut [u8]> {
    (**self).prepare(len)
  }

  #[inline]
  fn commit(&mut self, len: usize) {
    (**self).commit(len);
  }

  #[inline]
  fn consume(&mut self, len: usize) {
    (**self).consume(len);
  }

  #[inline]
  fn remaining_capacity(&self) -> usize {
    (**self).remaining_capacity()
  }
}

/// [`DynamicBuffer`] backed by a single contiguous allocation.
#[derive(Clone, Debug)]
pub struct FlatBuffer {
  begin: usize,
  data: Vec<u8>,
  end: usize,
  max_size: usize,
  prepared: usize,
}

impl FlatBuffer {
  /// Buffer that can hold up to `max_size` readable bytes.
  #[inline]
  pub const fn new(max_size: usize) -> Self {
    Self { begin: 0, data: Vec::new(), end: 0, max_size, prepared: 0 }
  }

  /// Readable bytes interpreted as UTF-8.
  #[inline]
  pub fn as_str(&self) -> Option<&str> {
    core::str::from_utf8(self.data()).ok()
  }

  /// Mutable view of the readable bytes.
  #[inline]
  pub fn data_mut(&mut self) -> &mut [u8] {
    self.data.get_mut(self.begin..self.end).unwrap_or_default()
  }

  /// Removes all readable bytes.
  #[inline]
  pub fn clear(&mut self) {
    self.begin = 0;
    self.end = 0;
    self.prepared = 0;
  }

  /// Number of readable bytes.
  #[inline]
  pub fn len(&self) -> usize {
    self.end.wrapping_sub(self.begin)
  }

  /// If there are no readable bytes.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.begin == self.end
  }

  /// Returns the readable bytes as a vector.
  #[inline]
  pub fn into_vec(mut self) -> Vec<u8> {
    self.data.truncate(self.end);
    let _ = self.data.drain(..self.begin);
    self.data
  }
}

impl Default for FlatBuffer {
  #[inline]
  fn default() -> Self {
    Self::new(usize::MAX)
  }
}

impl DynamicBuffer for FlatBuffer {
  #[inline]
  fn data(&self) -> &[u8] {
    self.data.get(self.begin..self.end).unwrap_or_default()
  }

  #[inline]
  fn prepare(&mut self, len: usize) -> crate::Result<&mut [u8]> {
    if len > self.remaining_capacity() {
      return Err(crate::Error::BufferOverflow);
    }
    if self.data.len().wrapping_sub(self.end) < len && self.begin > 0 {
      self.data.copy_within(self.begin..self.end, 0);
      self.end = self.len();
      self.begin = 0;
    }
    let new_end = self.end.checked_add(len).ok_or(crate::Error::BufferOverflow)?;
    if self.data.len() < new_end {
      self.data.resize(new_end, 0);
    }
    self.prepared = len;
    Ok(self.data.get_mut(self.end..new_end).unwrap_or_default())
  }

  #[inline]
  fn commit(&mut self, len: usize) {
    let n = len.min(self.prepared);
    self.end = self.end.wrapping_add(n);
    self.prepared = 0;
  }

  #[inline]
  fn consume(&mut self, len: usize) {
    self.begin = self.begin.wrapping_add(len.min(self.len()));
    if self.begin == self.end {
      self.begin = 0;
      self.end = 0;
    }
  }

  #[inline]
  fn remaining_capacity(&self) -> usize {
    self.max_size.saturating_sub(self.len())
  }
}
