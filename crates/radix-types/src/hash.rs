use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::nibble::{Nibble, MAX_DEPTH};

/// 256-bit content hash addressing a trie node or ledger entry.
///
/// Ordering is plain byte-wise comparison. [`Hash256::ZERO`] is reserved: an
/// inner node uses it to mark an empty child slot, and no stored node can
/// ever be addressed by it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The absent hash (all zeros).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap a pre-computed 32-byte digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns `true` if this is [`Hash256::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation (64 lowercase characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }

    /// The nibble that routes this key at `depth`.
    ///
    /// Depth 0 is the high nibble of the first byte, depth 1 its low nibble,
    /// and so on up to depth 63.
    pub fn nibble(&self, depth: u8) -> Result<Nibble, TypeError> {
        if depth >= MAX_DEPTH {
            return Err(TypeError::DepthOutOfRange(depth));
        }
        let byte = self.0[usize::from(depth / 2)];
        let value = if depth % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        Nibble::new(value)
    }

    /// Length of the nibble prefix shared with `other`.
    pub fn common_prefix_len(&self, other: &Self) -> u8 {
        let mut depth = 0u8;
        while depth < MAX_DEPTH {
            match (self.nibble(depth), other.nibble(depth)) {
                (Ok(a), Ok(b)) if a == b => depth += 1,
                _ => break,
            }
        }
        depth
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.short_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for Hash256 {
    type Error = TypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Hash256> for [u8; 32] {
    fn from(hash: Hash256) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
