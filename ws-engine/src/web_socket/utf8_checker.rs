/// Incremental UTF-8 validation of a byte stream delivered in arbitrary chunks.
///
/// Invalid sequences are reported as soon as the offending byte is seen, which allows a
/// session to fail a text message before all of it arrives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Utf8Checker {
  // Inclusive bounds of the next continuation byte.
  lower: u8,
  upper: u8,
  needed: u8,
  state: Utf8State,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Utf8State {
  Invalid,
  #[default]
  Valid,
}

impl Utf8Checker {
  /// New instance
  #[inline]
  pub const fn new() -> Self {
    Self { lower: 0x80, upper: 0xBF, needed: 0, state: Utf8State::Valid }
  }

  /// Returns `false` if the stream is not UTF-8 or if a code point was left incomplete.
  #[inline]
  pub fn finish(&self) -> bool {
    self.state == Utf8State::Valid && self.needed == 0
  }

  /// Clears all state.
  #[inline]
  pub fn reset(&mut self) {
    *self = Self::new();
  }

  /// Feeds `bytes`. Returns `false` if an invalid sequence was found here or in any
  /// previous call.
  #[inline]
  pub fn write(&mut self, bytes: &[u8]) -> bool {
    if self.state == Utf8State::Invalid {
      return false;
    }
    let mut idx = 0;
    while self.needed > 0 {
      let Some(byte) = bytes.get(idx).copied() else {
        return true;
      };
      if !(self.lower..=self.upper).contains(&byte) {
        return self.fail();
      }
      self.needed = self.needed.wrapping_sub(1);
      self.lower = 0x80;
      self.upper = 0xBF;
      idx = idx.wrapping_add(1);
    }
    let rest = bytes.get(idx..).unwrap_or_default();
    let Err(err) = from_utf8(rest) else {
      return true;
    };
    if err.error_len().is_some() {
      return self.fail();
    }
    let tail = rest.get(err.valid_up_to()..).unwrap_or_default();
    let [lead, continuations @ ..] = tail else {
      return true;
    };
    let Some((len, lower, upper)) = lead_byte_params(*lead) else {
      return self.fail();
    };
    self.needed = len.wrapping_sub(1).wrapping_sub(continuations.len() as u8);
    (self.lower, self.upper) = if continuations.is_empty() { (lower, upper) } else { (0x80, 0xBF) };
    true
  }

  fn fail(&mut self) -> bool {
    self.state = Utf8State::Invalid;
    false
  }
}

impl Default for Utf8Checker {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(feature = "simdutf8")]
fn from_utf8(bytes: &[u8]) -> Result<&str, simdutf8::compat::Utf8Error> {
  simdutf8::compat::from_utf8(bytes)
}

#[cfg(not(feature = "simdutf8"))]
fn from_utf8(bytes: &[u8]) -> Result<&str, core::str::Utf8Error> {
  core::str::from_utf8(bytes)
}

// Sequence length and the accepted range of the first continuation byte. Excludes overlong
// forms, surrogate halves and code points above U+10FFFF.
const fn lead_byte_params(byte: u8) -> Option<(u8, u8, u8)> {
  Some(match byte {
    0x00..=0x7F => (1, 0x80, 0xBF),
    0xC2..=0xDF => (2, 0x80, 0xBF),
    0xE0 => (3, 0xA0, 0xBF),
    0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80, 0xBF),
    0xED => (3, 0x80, 0x9F),
    0xF0 => (4, 0x90, 0xBF),
    0xF1..=0xF3 => (4, 0x80, 0xBF),
    0xF4 => (4, 0x80, 0x8F),
    _ => return None,
  })
}


#[cfg(all(feature = "_proptest", test))]
mod proptest {
  use crate::web_socket::Utf8Checker;

  #[test_strategy::proptest]
  fn agrees_with_core(bytes: Vec<u8>, split: usize) {
    let idx = if bytes.is_empty() { 0 } else { split % bytes.len() };
    let mut checker = Utf8Checker::new();
    let rslt = checker.write(&bytes[..idx]) && checker.write(&bytes[idx..]) && checker.finish();
    assert_eq!(rslt, core::str::from_utf8(&bytes).is_ok());
  }
}
