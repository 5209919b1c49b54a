create_enum! {
  /// Defines how to interpret the payload data.
  #[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
  #[derive(Clone, Copy, Debug, Eq, PartialEq)]
  pub enum OpCode<u8> {
    /// Continuation of a previous frame.
    Continuation = (0b0000_0000),
    /// UTF-8 text.
    Text = (0b0000_0001),
    /// Opaque bytes.
    Binary = (0b0000_0010),
    /// Connection is closed.
    Close = (0b0000_1000),
    /// Test reachability.
    Ping = (0b0000_1001),
    /// Response of a ping frame.
    Pong = (0b0000_1010),
  }
}

impl OpCode {
  /// Close, Ping or Pong.
  #[inline]
  pub const fn is_control(self) -> bool {
    matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
  }

  /// Continuation frames carry the remaining parts of a fragmented message.
  #[inline]
  pub const fn is_continuation(self) -> bool {
    matches!(self, OpCode::Continuation)
  }

  /// Text or Binary. Opcodes that start a new message.
  #[inline]
  pub const fn is_data(self) -> bool {
    matches!(self, OpCode::Text | OpCode::Binary)
  }
}

#[cfg(test)]
mod tests {
  use crate::web_socket::OpCode;

  #[test]
  fn reserved_opcodes_are_rejected() {
    for n in (3..=7).chain(11..=15) {
      assert!(OpCode::try_from(n).is_err());
    }
    assert_eq!(OpCode::try_from(10).unwrap(), OpCode::Pong);
    assert_eq!(u8::from(OpCode::Close), 8);
    assert_eq!(OpCode::len(), 6);
  }
}
