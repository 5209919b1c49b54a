/// Masking key ready to be applied to consecutive chunks of the same payload.
///
/// The key is rotated after each call, so applying it to `[a, b]` and then to `[c]` yields the
/// same bytes as applying it once to `[a, b, c]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PreparedKey {
  key: [u8; 4],
}

impl PreparedKey {
  /// `raw` is the key as it appears on the wire, in network byte order.
  #[inline]
  pub const fn new(raw: u32) -> Self {
    Self { key: raw.to_be_bytes() }
  }

  /// Masks or unmasks `bytes` in place.
  #[inline]
  pub fn apply(&mut self, bytes: &mut [u8]) {
    unmask(bytes, self.key);
    self.key.rotate_left(bytes.len() % 4);
  }
}

/// XORs `bytes` with the repeated `mask`, starting at the first byte of `mask`.
#[inline]
pub fn unmask(bytes: &mut [u8], mask: [u8; 4]) {
  let mask_u32 = u32::from_ne_bytes(mask);
  let mut chunks = bytes.chunks_exact_mut(4);
  for chunk in chunks.by_ref() {
    if let Ok(array) = <&mut [u8; 4]>::try_from(chunk) {
      *array = (u32::from_ne_bytes(*array) ^ mask_u32).to_ne_bytes();
    }
  }
  for (byte, mask_byte) in chunks.into_remainder().iter_mut().zip(mask) {
    *byte ^= mask_byte;
  }
}


#[cfg(all(feature = "_proptest", test))]
mod proptest {
  use crate::web_socket::PreparedKey;

  #[test_strategy::proptest]
  fn chunked_equivalence(key: u32, payload: Vec<u8>, split: usize) {
    let idx = if payload.is_empty() { 0 } else { split % payload.len() };
    let mut whole = payload.clone();
    PreparedKey::new(key).apply(&mut whole);
    let mut chunked = payload.clone();
    let mut prepared = PreparedKey::new(key);
    let (lhs, rhs) = chunked.split_at_mut(idx);
    prepared.apply(lhs);
    prepared.apply(rhs);
    assert_eq!(chunked, whole);
  }
}
