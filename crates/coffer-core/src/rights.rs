//! The capability bitmask carried by every record.
//!
//! Authorization does not compare masks for equality. A caller may see a
//! record when the record's mask shares at least one bit with the default
//! mask, so clearing those bits revokes access while ownership stays intact.

use serde::{Deserialize, Serialize};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rights(i32);

impl Rights {
  /// Read, write and delete.
  pub const DEFAULT_POSITIONS: [u32; 3] = [0, 1, 2];
  pub const DEFAULT: Rights = Rights(0b111);
  pub const NONE: Rights = Rights(0);

  pub const fn new(bits: i32) -> Self { Self(bits) }

  /// Build a mask with the given bit positions set. Positions above 31 are
  /// ignored.
  pub fn from_positions(positions: &[u32]) -> Self {
    Self(
      positions
        .iter()
        .filter(|&&p| p < 32)
        .fold(0u32, |acc, &p| acc | (1 << p)) as i32,
    )
  }

  /// The set bit positions, ascending.
  pub fn positions(self) -> Vec<u32> {
    (0..32).filter(|p| (self.0 as u32) & (1 << p) != 0).collect()
  }

  pub const fn bits(self) -> i32 { self.0 }

  pub const fn is_empty(self) -> bool { self.0 == 0 }

  pub const fn intersects(self, other: Rights) -> bool { self.0 & other.0 != 0 }

  /// Coerce an empty mask to `default`.
  pub const fn or_default(self, default: Rights) -> Rights {
    if self.is_empty() { default } else { self }
  }
}

impl From<i32> for Rights {
  fn from(bits: i32) -> Self { Self(bits) }
}

impl From<Rights> for i32 {
  fn from(r: Rights) -> Self { r.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_matches_default_positions() {
    assert_eq!(Rights::from_positions(&Rights::DEFAULT_POSITIONS), Rights::DEFAULT);
    assert_eq!(Rights::DEFAULT.positions(), Rights::DEFAULT_POSITIONS.to_vec());
  }

  #[test]
  fn high_bit_round_trips() {
    let r = Rights::from_positions(&[31]);
    assert_eq!(r.bits(), i32::MIN);
    assert_eq!(r.positions(), vec![31]);
    assert!(Rights::from_positions(&[32, 40]).is_empty());
  }

  #[test]
  fn intersects_is_any_bit() {
    assert!(Rights::new(0b100).intersects(Rights::DEFAULT));
    assert!(Rights::new(0b1001).intersects(Rights::DEFAULT));
    assert!(!Rights::new(0b1000).intersects(Rights::DEFAULT));
    assert!(!Rights::NONE.intersects(Rights::DEFAULT));
  }

  #[test]
  fn zero_coerces_to_default() {
    assert_eq!(Rights::NONE.or_default(Rights::DEFAULT), Rights::DEFAULT);
    assert_eq!(Rights::new(8).or_default(Rights::DEFAULT), Rights::new(8));
  }

  #[test]
  fn serializes_as_plain_integer() {
    assert_eq!(serde_json::to_string(&Rights::DEFAULT).unwrap(), "7");
    let r: Rights = serde_json::from_str("12").unwrap();
    assert_eq!(r, Rights::new(12));
  }
}
