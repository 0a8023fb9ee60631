//! Cryptographic primitives for the ledger radix trie.
//!
//! Provides domain-separated BLAKE3 hashing. Node identities, ledger header
//! identities and integrity checks on received data all go through
//! [`ContentHasher`].

pub mod hasher;

pub use hasher::ContentHasher;
