//! Bitcoin block header model (80 bytes, 20 words).

use alloc::vec::Vec;

use crate::difficulty::{nbits_to_threshold, Threshold};
use crate::error::{HeaderError, HeaderField, HexError};
use crate::hash::{double_hash, HashValue, Word};
use crate::miner::valid_hash;

/// Number of words in a serialized header.
pub const HEADER_WORDS: usize = 20;

/// Number of bytes in a serialized header.
pub const HEADER_BYTES: usize = HEADER_WORDS * 4;

const VERSION: usize = 0;
const PREV_HASH: usize = 1;
const MERKLE_ROOT: usize = 9;
const TIME: usize = 17;
const NBITS: usize = 18;
const NONCE: usize = 19;

/// A Bitcoin block header.
///
/// Stored as the 20 wire-order words it hashes as: version, previous hash
/// (8 words), merkle root (8 words), time, nbits and nonce. Only the nonce
/// changes after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    words: [Word; HEADER_WORDS],
}

impl BlockHeader {
    /// Build a header from its five hex-encoded fields.
    ///
    /// Each field is the hex of its serialized bytes (lowest address first),
    /// so the genesis `nbits` of `0x1d00ffff` is written `"ffff001d"`. The
    /// nonce starts at zero.
    pub fn from_hex(
        version: &str,
        prev_hash: &str,
        merkle_root: &str,
        time: &str,
        nbits: &str,
    ) -> Result<Self, HeaderError> {
        let mut words = [0; HEADER_WORDS];

        let fields = [
            (HeaderField::Version, version, VERSION),
            (HeaderField::PrevHash, prev_hash, PREV_HASH),
            (HeaderField::MerkleRoot, merkle_root, MERKLE_ROOT),
            (HeaderField::Time, time, TIME),
            (HeaderField::Nbits, nbits, NBITS),
        ];

        for (field, hex, offset) in fields {
            if hex.len() != field.hex_len() {
                return Err(HeaderError::InvalidLength {
                    field,
                    expected: field.hex_len(),
                    actual: hex.len(),
                });
            }
            let decoded =
                hex_to_words(hex).map_err(|source| HeaderError::InvalidHex { field, source })?;
            words[offset..offset + decoded.len()].copy_from_slice(&decoded);
        }

        Ok(BlockHeader { words })
    }

    /// Build a header from its 20 wire-order words.
    pub fn from_words(words: [Word; HEADER_WORDS]) -> Self {
        BlockHeader { words }
    }

    /// Parse the 80-byte wire serialization.
    pub fn from_bytes(bytes: &[u8; HEADER_BYTES]) -> Self {
        let mut words = [0; HEADER_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = Word::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        BlockHeader { words }
    }

    /// Serialize the header to 80 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_BYTES] {
        let mut bytes = [0u8; HEADER_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(&self.words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// The Bitcoin genesis block header.
    pub fn genesis() -> Self {
        let mut words = [0; HEADER_WORDS];
        words[VERSION] = 1;
        words[MERKLE_ROOT..TIME].copy_from_slice(&GENESIS_MERKLE_ROOT);
        words[TIME] = 0x495fab29;
        words[NBITS] = 0x1d00ffff;
        words[NONCE] = 2083236893;
        BlockHeader { words }
    }

    pub fn version(&self) -> Word {
        self.words[VERSION]
    }

    pub fn prev_hash(&self) -> HashValue {
        let mut hash = [0; 8];
        hash.copy_from_slice(&self.words[PREV_HASH..MERKLE_ROOT]);
        hash
    }

    pub fn merkle_root(&self) -> HashValue {
        let mut hash = [0; 8];
        hash.copy_from_slice(&self.words[MERKLE_ROOT..TIME]);
        hash
    }

    pub fn time(&self) -> Word {
        self.words[TIME]
    }

    pub fn nbits(&self) -> Word {
        self.words[NBITS]
    }

    pub fn nonce(&self) -> Word {
        self.words[NONCE]
    }

    pub fn set_nonce(&mut self, nonce: Word) {
        self.words[NONCE] = nonce;
    }

    /// All 20 words, ready to feed into [`hash`](crate::hash::hash).
    pub fn data(&self) -> &[Word; HEADER_WORDS] {
        &self.words
    }

    pub fn data_mut(&mut self) -> &mut [Word; HEADER_WORDS] {
        &mut self.words
    }

    /// The threshold encoded by this header's nbits.
    pub fn threshold(&self) -> Threshold {
        nbits_to_threshold(self.nbits())
    }

    /// Compute the block hash (double SHA-256 of the header).
    pub fn block_hash(&self) -> HashValue {
        double_hash(&self.words)
    }

    /// Whether the current nonce gives a hash below this header's threshold.
    pub fn meets_threshold(&self) -> bool {
        valid_hash(&self.threshold(), &self.block_hash())
    }
}

/// Merkle root of the genesis block, in wire order.
const GENESIS_MERKLE_ROOT: [Word; 8] = [
    0xfdeda33b, 0xb2127b7a, 0x3e2cc77a, 0x618f7667, 0xc31bc87f, 0x32518a88, 0xaab89f3a, 0x4a5e1e4b,
];

fn nibble(character: char, index: usize) -> Result<Word, HexError> {
    character
        .to_digit(16)
        .ok_or(HexError::InvalidCharacter { character, index })
}

/// Decode a hex string into wire-order words.
///
/// Characters are read in pairs, high nibble first, and every 4 bytes form
/// one word with the first byte in the least significant position. A short
/// final chunk fills only the low bytes of its word, and a lone trailing
/// character is the high nibble of its byte.
pub fn hex_to_words(hex: &str) -> Result<Vec<Word>, HexError> {
    let mut words = Vec::with_capacity(hex.len().div_ceil(8));
    let mut word = 0;

    for (index, character) in hex.char_indices() {
        let byte = (index % 8) / 2;
        let shift = 8 * byte + if index % 2 == 0 { 4 } else { 0 };
        word |= nibble(character, index)? << shift;

        if index % 8 == 7 {
            words.push(word);
            word = 0;
        }
    }

    if hex.len() % 8 != 0 {
        words.push(word);
    }
    Ok(words)
}
