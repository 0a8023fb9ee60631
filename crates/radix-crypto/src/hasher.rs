use radix_types::Hash256;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"radix-leaf-v1"`) that is
/// prepended to every hash computation, so a leaf and an inner node with
/// identical bytes never share an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for leaf nodes (ledger entries).
    pub const LEAF: Self = Self {
        domain: "radix-leaf-v1",
    };
    /// Hasher for inner nodes (16 child hashes).
    pub const INNER: Self = Self {
        domain: "radix-inner-v1",
    };
    /// Hasher for ledger headers.
    pub const HEADER: Self = Self {
        domain: "radix-header-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Hash256 {
        self.hash_parts(&[data])
    }

    /// Hash a sequence of byte slices as if they were concatenated.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> Hash256 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(part);
        }
        Hash256::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &Hash256) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
