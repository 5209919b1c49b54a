use crate::web_socket::{OpCode, WebSocketError, MAX_CONTROL_PAYLOAD_LEN, MAX_HEADER_LEN};

const FIN_MASK: u8 = 0b1000_0000;
const MASK_MASK: u8 = 0b1000_0000;
const OP_CODE_MASK: u8 = 0b0000_1111;
const PAYLOAD_MASK: u8 = 0b0111_1111;
const RSV1_MASK: u8 = 0b0100_0000;
const RSV2_MASK: u8 = 0b0010_0000;
const RSV3_MASK: u8 = 0b0001_0000;

/// The first 2 to 14 bytes of every frame.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameHeader {
  /// Last frame of a message.
  pub fin: bool,
  /// Masking key. Frames sent by clients are always masked while frames sent by servers never
  /// are.
  pub mask_key: Option<u32>,
  /// Opcode
  pub op_code: OpCode,
  /// Length of the payload that follows the header. The most significant bit must be zero.
  pub payload_len: u64,
  /// Reserved bit 1. Signals a compressed message when permessage-deflate was negotiated.
  pub rsv1: bool,
  /// Reserved bit 2
  pub rsv2: bool,
  /// Reserved bit 3
  pub rsv3: bool,
}

impl FrameHeader {
  /// Unmasked header without reserved bits.
  #[inline]
  pub const fn new(fin: bool, op_code: OpCode, payload_len: u64) -> Self {
    Self { fin, mask_key: None, op_code, payload_len, rsv1: false, rsv2: false, rsv3: false }
  }

  /// Parses and validates a header according to the role of the receiving side. `rsv1_allowed`
  /// should be `true` only when an extension that defines the bit was negotiated.
  ///
  /// Returns `None` if `bytes` does not contain enough data.
  #[inline]
  pub fn decode<const IS_CLIENT: bool>(
    bytes: &[u8],
    rsv1_allowed: bool,
  ) -> crate::Result<Option<(Self, usize)>> {
    let Some((header, len)) = Self::parse(bytes)? else {
      return Ok(None);
    };
    header.validate::<IS_CLIENT>(rsv1_allowed)?;
    Ok(Some((header, len)))
  }

  /// Writes the wire representation into `buffer` and returns the number of written bytes.
  #[inline]
  pub fn encode(&self, buffer: &mut [u8; MAX_HEADER_LEN]) -> usize {
    let [first, second, rest @ ..] = buffer;
    *first = u8::from(self.fin) << 7
      | u8::from(self.rsv1) << 6
      | u8::from(self.rsv2) << 5
      | u8::from(self.rsv3) << 4
      | u8::from(self.op_code);
    let mask_bit = if self.mask_key.is_some() { MASK_MASK } else { 0 };
    let mut len: usize = 2;
    if let Ok(n @ 0..=125) = u8::try_from(self.payload_len) {
      *second = mask_bit | n;
    } else if let Ok(n) = u16::try_from(self.payload_len) {
      *second = mask_bit | 126;
      let [a, b, ..] = rest;
      [*a, *b] = n.to_be_bytes();
      len = 4;
    } else {
      *second = mask_bit | 127;
      let [a, b, c, d, e, f, g, h, ..] = rest;
      [*a, *b, *c, *d, *e, *f, *g, *h] = self.payload_len.to_be_bytes();
      len = 10;
    }
    if let Some(key) = self.mask_key {
      if let Some([a, b, c, d]) = buffer.get_mut(len..len.wrapping_add(4)) {
        [*a, *b, *c, *d] = key.to_be_bytes();
      }
      len = len.wrapping_add(4);
    }
    len
  }

  /// Total number of header bytes
  #[inline]
  pub const fn len(&self) -> usize {
    let len = if self.payload_len <= 125 {
      2
    } else if self.payload_len <= 0xFFFF {
      4
    } else {
      10
    };
    if self.mask_key.is_some() {
      len + 4
    } else {
      len
    }
  }

  /// Structural parsing without role or extension checks.
  ///
  /// Reserved opcodes, fragmented or oversized control frames and non-minimal length encodings
  /// are rejected. Returns `None` if `bytes` does not contain enough data.
  #[inline]
  pub fn parse(bytes: &[u8]) -> crate::Result<Option<(Self, usize)>> {
    let [first, second, rest @ ..] = bytes else {
      return Ok(None);
    };
    let fin = first & FIN_MASK != 0;
    let op_code = OpCode::try_from(first & OP_CODE_MASK)
      .map_err(|_err| crate::Error::from(WebSocketError::BadOpcode))?;
    let length_code = second & PAYLOAD_MASK;
    if op_code.is_control() {
      if !fin {
        return Err(WebSocketError::BadControlFragment.into());
      }
      if usize::from(length_code) > MAX_CONTROL_PAYLOAD_LEN {
        return Err(WebSocketError::BadControlSize.into());
      }
    }
    let (payload_len, mut len): (u64, usize) = match length_code {
      126 => {
        let [a, b, ..] = rest else {
          return Ok(None);
        };
        let n = u16::from_be_bytes([*a, *b]);
        if n < 126 {
          return Err(WebSocketError::BadSize.into());
        }
        (u64::from(n), 4)
      }
      127 => {
        let [a, b, c, d, e, f, g, h, ..] = rest else {
          return Ok(None);
        };
        let n = u64::from_be_bytes([*a, *b, *c, *d, *e, *f, *g, *h]);
        if n <= 0xFFFF || n & (1 << 63) != 0 {
          return Err(WebSocketError::BadSize.into());
        }
        (n, 10)
      }
      _ => (u64::from(length_code), 2),
    };
    let mask_key = if second & MASK_MASK != 0 {
      let Some(&[a, b, c, d]) = bytes.get(len..len.wrapping_add(4)) else {
        return Ok(None);
      };
      len = len.wrapping_add(4);
      Some(u32::from_be_bytes([a, b, c, d]))
    } else {
      None
    };
    let header = Self {
      fin,
      mask_key,
      op_code,
      payload_len,
      rsv1: first & RSV1_MASK != 0,
      rsv2: first & RSV2_MASK != 0,
      rsv3: first & RSV3_MASK != 0,
    };
    Ok(Some((header, len)))
  }

  /// Role and extension checks of a parsed header.
  #[inline]
  pub fn validate<const IS_CLIENT: bool>(&self, rsv1_allowed: bool) -> crate::Result<()> {
    if self.rsv2 || self.rsv3 || (self.rsv1 && (!rsv1_allowed || self.op_code.is_control())) {
      return Err(WebSocketError::BadReservedBits.into());
    }
    match (IS_CLIENT, self.mask_key.is_some()) {
      (true, true) => Err(WebSocketError::BadMaskedFrame.into()),
      (false, false) => Err(WebSocketError::BadUnmaskedFrame.into()),
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::web_socket::{FrameHeader, OpCode, WebSocketError, MAX_HEADER_LEN};

  fn encode(header: &FrameHeader) -> Vec<u8> {
    let mut buffer = [0; MAX_HEADER_LEN];
    let len = header.encode(&mut buffer);
    buffer[..len].to_vec()
  }

  fn ws_err(rslt: crate::Result<Option<(FrameHeader, usize)>>) -> WebSocketError {
    match rslt {
      Err(crate::Error::WebSocketError(err)) => err,
      other => panic!("{other:?}"),
    }
  }

  #[test]
  fn round_trip_of_length_boundaries() {
    for payload_len in [0, 1, 125, 126, 65_535, 65_536, 1 << 32] {
      for mask_key in [None, Some(0x0102_0304)] {
        for (fin, rsv1) in [(true, false), (false, true)] {
          let header = FrameHeader {
            fin,
            mask_key,
            op_code: OpCode::Binary,
            payload_len,
            rsv1,
            rsv2: false,
            rsv3: false,
          };
          let bytes = encode(&header);
          assert_eq!(bytes.len(), header.len());
          let (decoded, len) = FrameHeader::parse(&bytes).unwrap().unwrap();
          assert_eq!((decoded, len), (header, bytes.len()));
        }
      }
    }
  }

  #[test]
  fn known_wire_bytes() {
    let mut header = FrameHeader::new(true, OpCode::Text, 5);
    assert_eq!(encode(&header), [0x81, 0x05]);
    header.mask_key = Some(0x3790_a23c);
    assert_eq!(encode(&header), [0x81, 0x85, 0x37, 0x90, 0xa2, 0x3c]);
    let header = FrameHeader::new(true, OpCode::Binary, 256);
    assert_eq!(encode(&header), [0x82, 0x7E, 0x01, 0x00]);
  }

  #[test]
  fn incomplete_input_needs_more_bytes() {
    let header = FrameHeader {
      mask_key: Some(7),
      ..FrameHeader::new(true, OpCode::Binary, 70_000)
    };
    let bytes = encode(&header);
    for idx in 0..bytes.len() {
      assert_eq!(FrameHeader::parse(&bytes[..idx]).unwrap(), None);
    }
  }

  #[test]
  fn rejects_malformed_headers() {
    assert_eq!(ws_err(FrameHeader::parse(&[0x83, 0])), WebSocketError::BadOpcode);
    assert_eq!(ws_err(FrameHeader::parse(&[0x09, 0])), WebSocketError::BadControlFragment);
    assert_eq!(ws_err(FrameHeader::parse(&[0x89, 126])), WebSocketError::BadControlSize);
    assert_eq!(ws_err(FrameHeader::parse(&[0x82, 126, 0, 125])), WebSocketError::BadSize);
    assert_eq!(
      ws_err(FrameHeader::parse(&[0x82, 127, 0, 0, 0, 0, 0, 0, 255, 255])),
      WebSocketError::BadSize
    );
    assert_eq!(
      ws_err(FrameHeader::parse(&[0x82, 127, 128, 0, 0, 0, 0, 0, 0, 0])),
      WebSocketError::BadSize
    );
  }

  #[test]
  fn role_and_extension_checks() {
    let unmasked = [0x81, 0];
    let masked = [0x81, 0x80, 1, 2, 3, 4];
    assert!(FrameHeader::decode::<true>(&unmasked, false).unwrap().is_some());
    assert!(FrameHeader::decode::<false>(&masked, false).unwrap().is_some());
    assert_eq!(ws_err(FrameHeader::decode::<true>(&masked, false)), WebSocketError::BadMaskedFrame);
    assert_eq!(
      ws_err(FrameHeader::decode::<false>(&unmasked, false)),
      WebSocketError::BadUnmaskedFrame
    );
    let rsv1 = [0xC1, 0];
    assert_eq!(ws_err(FrameHeader::decode::<true>(&rsv1, false)), WebSocketError::BadReservedBits);
    assert!(FrameHeader::decode::<true>(&rsv1, true).unwrap().is_some());
    let rsv1_ping = [0xC9, 0];
    assert_eq!(
      ws_err(FrameHeader::decode::<true>(&rsv1_ping, true)),
      WebSocketError::BadReservedBits
    );
    let rsv2 = [0xA1, 0];
    assert_eq!(ws_err(FrameHeader::decode::<true>(&rsv2, true)), WebSocketError::BadReservedBits);
  }
}

#[cfg(all(feature = "_proptest", test))]
mod proptest {
  use crate::web_socket::{FrameHeader, OpCode, MAX_HEADER_LEN};

  #[test_strategy::proptest]
  fn encode_then_parse(
    fin: bool,
    mask_key: Option<u32>,
    #[strategy(0u64..(1 << 63))] payload_len: u64,
    rsv1: bool,
  ) {
    let header =
      FrameHeader { rsv1, mask_key, ..FrameHeader::new(fin, OpCode::Binary, payload_len) };
    let mut buffer = [0; MAX_HEADER_LEN];
    let len = header.encode(&mut buffer);
    assert_eq!(FrameHeader::parse(&buffer[..len]).unwrap(), Some((header, len)));
  }
}
