//! Error types for header decoding and nonce search.

use core::fmt;
use thiserror::Error;

/// The five hex-encoded fields a header is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Version,
    PrevHash,
    MerkleRoot,
    Time,
    Nbits,
}

impl HeaderField {
    /// Number of hex characters the field must contain.
    pub fn hex_len(&self) -> usize {
        match self {
            HeaderField::Version | HeaderField::Time | HeaderField::Nbits => 8,
            HeaderField::PrevHash | HeaderField::MerkleRoot => 64,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeaderField::Version => "version",
            HeaderField::PrevHash => "prev_hash",
            HeaderField::MerkleRoot => "merkle_root",
            HeaderField::Time => "time",
            HeaderField::Nbits => "nbits",
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hex decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("invalid hex character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
}

/// Block header construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("{field} must be {expected} hex characters, got {actual}")]
    InvalidLength {
        field: HeaderField,
        expected: usize,
        actual: usize,
    },

    #[error("{field} is not valid hex: {source}")]
    InvalidHex {
        field: HeaderField,
        #[source]
        source: HexError,
    },
}

/// Nonce search errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MineError {
    /// Every nonce from `start` through `u32::MAX` was tried.
    #[error("nonce space exhausted: no valid nonce in {start}..={max}", max = u32::MAX)]
    NonceSpaceExhausted { start: u32, hashes: u64 },

    /// The stop flag was raised before a valid nonce was found.
    #[error("mining cancelled at nonce {nonce} after {hashes} hashes")]
    Cancelled { nonce: u32, hashes: u64 },
}
