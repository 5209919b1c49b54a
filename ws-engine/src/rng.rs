//! Random Number Generators
//!
//! Masking keys of client frames are taken from an explicit source handed to the session at
//! construction time, there is no hidden global state.

pub use self::std::StdRng;

/// Abstraction tailored for the needs of this project. Each implementation should manage how
/// seeds are retrieved as well as how numbers are generated.
pub trait Rng {
  /// Next pseudo-random 32-bit value.
  fn next_u32(&mut self) -> u32;
}

impl<T> Rng for &mut T
where
  T: Rng,
{
  #[inline]
  fn next_u32(&mut self) -> u32 {
    (*self).next_u32()
  }
}

/// Xorshift with a 64-bit state.
///
/// Fast and small but predictable, you probably shouldn't use this structure when the masking
/// keys must be unguessable.
#[derive(Clone, Copy, Debug)]
pub struct Xorshift64 {
  value: u64,
}

impl Xorshift64 {
  /// A zero seed would never produce anything other than zero, so it is replaced.
  #[inline]
  pub const fn new(seed: u64) -> Self {
    Self { value: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed } }
  }

  #[inline]
  fn next_u64(&mut self) -> u64 {
    let mut x = self.value;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    self.value = x;
    x
  }
}

impl From<u64> for Xorshift64 {
  #[inline]
  fn from(from: u64) -> Self {
    Self::new(from)
  }
}

impl Rng for Xorshift64 {
  #[inline]
  fn next_u32(&mut self) -> u32 {
    let [a, b, c, d, ..] = self.next_u64().to_be_bytes();
    u32::from_be_bytes([a, b, c, d])
  }
}

#[cfg(feature = "fastrand")]
mod fastrand {
  use crate::rng::Rng;

  impl Rng for fastrand::Rng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
      self.u32(..)
    }
  }
}

#[cfg(feature = "rand")]
mod rand {
  use crate::rng::Rng;

  macro_rules! implement {
    ($struct:ty) => {
      impl Rng for $struct {
        #[inline]
        fn next_u32(&mut self) -> u32 {
          rand::RngCore::next_u32(self)
        }
      }
    };
  }

  implement!(rand::rngs::mock::StepRng);
  implement!(rand::rngs::SmallRng);
}

mod std {
  use crate::rng::{Rng, Xorshift64};
  use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hasher},
  };

  /// Seeded from the randomness provided by the standard library hasher, then uses
  /// [`Xorshift64`].
  #[derive(Debug)]
  pub struct StdRng(Xorshift64);

  impl Rng for StdRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
      self.0.next_u32()
    }
  }

  impl Default for StdRng {
    #[inline]
    fn default() -> Self {
      Self(Xorshift64::new(Hasher::finish(&BuildHasher::build_hasher(&RandomState::new()))))
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::rng::{Rng, StdRng, Xorshift64};

  #[test]
  fn xorshift_is_deterministic_and_never_stuck() {
    let mut a = Xorshift64::new(0);
    let mut b = Xorshift64::new(0);
    let first = a.next_u32();
    assert_eq!(first, b.next_u32());
    assert_ne!((first, a.next_u32()), (0, 0));
  }

  #[test]
  fn std_rng_produces_different_keys() {
    let mut rng = StdRng::default();
    let keys: Vec<[u8; 4]> = (0..8).map(|_| rng.next_u32().to_be_bytes()).collect();
    assert!(keys.windows(2).any(|elem| elem[0] != elem[1]));
  }
}
