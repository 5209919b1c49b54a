/// Status code used to indicate why an endpoint is closing the WebSocket connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CloseCode {
  /// Normal closure.
  Normal,
  /// An endpoint is not longer active.
  Away,
  /// Closing connection due to a protocol error.
  Protocol,
  /// An endpoint does not support a certain type of data.
  Unsupported,
  /// Closing frame without a status code. Local only, never sent.
  Status,
  /// Connection dropped without a closing frame. Local only, never sent.
  Abnormal,
  /// Received data that differs from the frame type.
  Invalid,
  /// Generic error.
  Policy,
  /// Received a very large payload.
  Size,
  /// Client didn't receive extension from the server.
  Extension,
  /// An unexpected condition occurred.
  Error,
  /// Server is restarting.
  Restart,
  /// Server is busy and the client should reconnect.
  Again,
  /// Failure to perform a TLS handshake. Local only, never sent.
  Tls,
  /// Spaces without meaning reserved by RFC 6455, including 1004 and 1014.
  Reserved(u16),
  /// IANA spaces reserved for use by libraries, frameworks, and applications.
  Iana(u16),
  /// Reserved for private use.
  Library(u16),
}

impl CloseCode {
  /// Checks if this instance can be sent or received in a close frame.
  #[inline]
  pub fn is_allowed(self) -> bool {
    is_valid_close_code(self.into())
  }
}

impl TryFrom<u16> for CloseCode {
  type Error = crate::Error;

  #[inline]
  fn try_from(from: u16) -> Result<Self, crate::Error> {
    Ok(match from {
      1000 => Self::Normal,
      1001 => Self::Away,
      1002 => Self::Protocol,
      1003 => Self::Unsupported,
      1005 => Self::Status,
      1006 => Self::Abnormal,
      1007 => Self::Invalid,
      1008 => Self::Policy,
      1009 => Self::Size,
      1010 => Self::Extension,
      1011 => Self::Error,
      1012 => Self::Restart,
      1013 => Self::Again,
      1015 => Self::Tls,
      1004 | 1014 | 1016..=2999 => Self::Reserved(from),
      3000..=3999 => Self::Iana(from),
      4000..=4999 => Self::Library(from),
      received => return Err(crate::Error::UnexpectedUint { received: received.into() }),
    })
  }
}

impl From<CloseCode> for u16 {
  #[inline]
  fn from(from: CloseCode) -> u16 {
    match from {
      CloseCode::Normal => 1000,
      CloseCode::Away => 1001,
      CloseCode::Protocol => 1002,
      CloseCode::Unsupported => 1003,
      CloseCode::Status => 1005,
      CloseCode::Abnormal => 1006,
      CloseCode::Invalid => 1007,
      CloseCode::Policy => 1008,
      CloseCode::Size => 1009,
      CloseCode::Extension => 1010,
      CloseCode::Error => 1011,
      CloseCode::Restart => 1012,
      CloseCode::Again => 1013,
      CloseCode::Tls => 1015,
      CloseCode::Iana(elem) | CloseCode::Library(elem) | CloseCode::Reserved(elem) => elem,
    }
  }
}

/// If `code` can appear on the wire, as defined by RFC 6455 section 7.4.
#[inline]
pub const fn is_valid_close_code(code: u16) -> bool {
  matches!(code, 1000..=1003 | 1007..=1013 | 3000..=4999)
}

#[cfg(test)]
mod tests {
  use crate::web_socket::{is_valid_close_code, CloseCode};

  #[test]
  fn close_code_table() {
    for code in 0..=u16::MAX {
      let expected = matches!(code, 1000..=1003 | 1007..=1013 | 3000..=4999);
      assert_eq!(is_valid_close_code(code), expected, "{code}");
    }
    for code in [0, 999, 1004, 1005, 1006, 1014, 1015, 1016, 2999, 5000] {
      assert!(!is_valid_close_code(code));
    }
  }

  #[test]
  fn enum_agrees_with_table() {
    for code in 1000..=4999 {
      let close_code = CloseCode::try_from(code).unwrap();
      assert_eq!(u16::from(close_code), code);
      assert_eq!(close_code.is_allowed(), is_valid_close_code(code));
    }
    assert!(CloseCode::try_from(999).is_err());
    assert!(CloseCode::try_from(5000).is_err());
  }
}
