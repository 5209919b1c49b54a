use crate::web_socket::{WebSocketError, MAX_CONTROL_PAYLOAD_LEN};
use arrayvec::ArrayVec;
use core::ops::Deref;

/// Application data of a ping or a pong frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PingData {
  data: ArrayVec<u8, MAX_CONTROL_PAYLOAD_LEN>,
}

impl PingData {
  /// Fails if `bytes` has more than 125 bytes.
  #[inline]
  pub fn new(bytes: &[u8]) -> crate::Result<Self> {
    let mut data = ArrayVec::new();
    data.try_extend_from_slice(bytes).map_err(|_err| WebSocketError::BadControlSize)?;
    Ok(Self { data })
  }
}

impl Deref for PingData {
  type Target = [u8];

  #[inline]
  fn deref(&self) -> &Self::Target {
    &self.data
  }
}

impl TryFrom<&[u8]> for PingData {
  type Error = crate::Error;

  #[inline]
  fn try_from(from: &[u8]) -> Result<Self, Self::Error> {
    Self::new(from)
  }
}
