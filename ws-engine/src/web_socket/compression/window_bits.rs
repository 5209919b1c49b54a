create_enum! {
  /// LZ77 sliding window size for the `permessage-deflate` extension from the IETF RFC 7692.
  #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
  pub enum WindowBits<u8> {
    /// Nine
    Nine = (9),
    /// Ten
    Ten = (10),
    /// Eleven
    Eleven = (11),
    /// Twelve
    Twelve = (12),
    /// Thirteen
    Thirteen = (13),
    /// Fourteen
    Fourteen = (14),
    /// Fifteen
    #[default]
    Fifteen = (15),
  }
}

impl WindowBits {
  /// Instance that represents the minimum allowed value.
  pub const MIN: Self = Self::Nine;
  /// Instance that represents the maximum allowed value.
  pub const MAX: Self = Self::Fifteen;
}
