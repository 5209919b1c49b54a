use crate::web_socket::{
  is_valid_close_code, CloseCode, Utf8Checker, WebSocketError, MAX_CONTROL_PAYLOAD_LEN,
};
use arrayvec::{ArrayString, ArrayVec};

/// Maximum number of bytes of the textual part of a close frame.
pub const MAX_CLOSE_REASON_LEN: usize = MAX_CONTROL_PAYLOAD_LEN - 2;

/// Status code and textual explanation carried by a close frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CloseReason {
  code: Option<CloseCode>,
  reason: ArrayString<MAX_CLOSE_REASON_LEN>,
}

impl CloseReason {
  /// Close frame with an empty payload.
  #[inline]
  pub const fn none() -> Self {
    Self { code: None, reason: ArrayString::new_const() }
  }

  /// Fails if `code` can not be sent or if `reason` has more than 123 bytes.
  #[inline]
  pub fn new(code: CloseCode, reason: &str) -> crate::Result<Self> {
    if !code.is_allowed() {
      return Err(WebSocketError::BadCloseCode.into());
    }
    let reason = ArrayString::from(reason).map_err(|_err| WebSocketError::BadCloseSize)?;
    Ok(Self { code: Some(code), reason })
  }

  /// Status code, if any.
  #[inline]
  pub const fn code(&self) -> Option<CloseCode> {
    self.code
  }

  /// Textual explanation. Empty when there is no status code.
  #[inline]
  pub fn reason(&self) -> &str {
    &self.reason
  }

  /// Decodes and validates the payload of a received close frame.
  #[inline]
  pub fn parse(payload: &[u8]) -> crate::Result<Self> {
    let [a, b, reason @ ..] = payload else {
      return if payload.is_empty() {
        Ok(Self::none())
      } else {
        Err(WebSocketError::BadCloseSize.into())
      };
    };
    let code = u16::from_be_bytes([*a, *b]);
    if !is_valid_close_code(code) {
      return Err(WebSocketError::BadCloseCode.into());
    }
    let mut checker = Utf8Checker::new();
    if !checker.write(reason) || !checker.finish() {
      return Err(WebSocketError::BadClosePayload.into());
    }
    let reason = core::str::from_utf8(reason).map_err(|_err| WebSocketError::BadClosePayload)?;
    Ok(Self {
      code: Some(CloseCode::try_from(code)?),
      reason: ArrayString::from(reason).map_err(|_err| WebSocketError::BadCloseSize)?,
    })
  }

  /// Big-endian status code followed by the reason. Empty without a status code.
  #[inline]
  pub fn payload(&self) -> ArrayVec<u8, MAX_CONTROL_PAYLOAD_LEN> {
    let mut payload = ArrayVec::new();
    if let Some(code) = self.code {
      let [a, b] = u16::from(code).to_be_bytes();
      payload.push(a);
      payload.push(b);
      let _rslt = payload.try_extend_from_slice(self.reason.as_bytes());
    }
    payload
  }
}

impl From<CloseCode> for CloseReason {
  #[inline]
  fn from(from: CloseCode) -> Self {
    Self { code: Some(from), reason: ArrayString::new() }
  }
}
