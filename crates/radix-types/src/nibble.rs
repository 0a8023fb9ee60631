use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of nibble levels in a 256-bit key.
pub const MAX_DEPTH: u8 = 64;

/// A 4-bit branch index (0..=15) selecting one child slot of an inner node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nibble(u8);

impl Nibble {
    /// Number of distinct nibbles, and so the fan-out of an inner node.
    pub const COUNT: usize = 16;

    pub fn new(value: u8) -> Result<Self, TypeError> {
        if usize::from(value) >= Self::COUNT {
            return Err(TypeError::NibbleOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// All nibbles in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..16u8).map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The child slot this nibble selects.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_above_fifteen() {
        assert!(Nibble::new(15).is_ok());
        assert_eq!(Nibble::new(16), Err(TypeError::NibbleOutOfRange(16)));
    }

    #[test]
    fn all_is_ascending() {
        let values: Vec<u8> = Nibble::all().map(Nibble::value).collect();
        assert_eq!(values, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn display_is_hex_digit() {
        assert_eq!(Nibble::new(11).unwrap().to_string(), "b");
    }
}
