//! Compact "nbits" difficulty decoding and related utilities.
//!
//! A [`Threshold`] is a 256-bit unsigned integer stored least significant
//! word first: byte `n` of the integer is byte `n % 4` (little-endian) of
//! word `n / 4`. This is the same layout a [`HashValue`](crate::hash::HashValue)
//! has, so the two compare directly.

use crate::hash::{Word, HASH_WORDS};

/// The 256-bit value a block hash must stay below.
pub type Threshold = [Word; HASH_WORDS];

/// Compact encoding of the genesis (difficulty 1) target.
pub const GENESIS_NBITS: u32 = 0x1d00ffff;

/// Convert compact "bits" representation to a 256-bit threshold.
///
/// The format is `[exponent (1 byte)][significand (3 bytes)]` and the value is
/// `significand * 256^(exponent - 3)`. Significand bytes that would land below
/// byte 0 or above byte 31 are dropped. The sign bit of the significand gets
/// no special treatment.
pub fn nbits_to_threshold(nbits: u32) -> Threshold {
    let exponent = (nbits >> 24) as usize;
    let significand = nbits & 0x00FF_FFFF;

    let mut threshold = [0; HASH_WORDS];
    for i in 0..3 {
        if exponent + i < 3 {
            continue;
        }
        let position = exponent - 3 + i;
        let (word, offset) = (position / 4, position % 4);
        if word >= HASH_WORDS {
            continue;
        }
        let byte = (significand >> (8 * i)) & 0xFF;
        threshold[word] |= byte << (8 * offset);
    }
    threshold
}

/// Byte `index` of the threshold, counting from the least significant end.
fn byte_at(threshold: &Threshold, index: usize) -> u32 {
    (threshold[index / 4] >> (8 * (index % 4))) & 0xFF
}

/// Convert a 256-bit threshold back to compact "bits" representation.
///
/// This is the inverse of [`nbits_to_threshold`] for canonical encodings.
pub fn threshold_to_nbits(threshold: &Threshold) -> u32 {
    let Some(top) = (0..32).rev().find(|&i| byte_at(threshold, i) != 0) else {
        return 0;
    };
    let mut size = top as u32 + 1;

    let mut significand = 0u32;
    for k in 0..3 {
        significand <<= 8;
        if let Some(index) = top.checked_sub(k) {
            significand |= byte_at(threshold, index);
        }
    }

    // A set top bit would read back as a sign.
    if significand & 0x0080_0000 != 0 {
        significand >>= 8;
        size += 1;
    }

    (size << 24) | significand
}

/// Approximate a threshold as an `f64`.
pub fn threshold_to_f64(threshold: &Threshold) -> f64 {
    threshold
        .iter()
        .rev()
        .fold(0.0, |acc, &word| acc * 4_294_967_296.0 + word as f64)
}

/// Calculate approximate difficulty from nbits.
///
/// Difficulty = genesis_threshold / current_threshold.
pub fn nbits_to_difficulty(nbits: u32) -> f64 {
    let current = threshold_to_f64(&nbits_to_threshold(nbits));
    if current == 0.0 {
        return f64::INFINITY;
    }
    threshold_to_f64(&nbits_to_threshold(GENESIS_NBITS)) / current
}

/// Format difficulty for display (e.g., "1.23T" for trillion).
pub fn format_difficulty(difficulty: f64) -> alloc::string::String {
    if difficulty >= 1e15 {
        alloc::format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        alloc::format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        alloc::format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        alloc::format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        alloc::format!("{:.2}K", difficulty / 1e3)
    } else {
        alloc::format!("{:.2}", difficulty)
    }
}

/// Estimate average hashes needed to find a block at given difficulty.
pub fn expected_hashes(difficulty: f64) -> f64 {
    // On average, need difficulty * 2^32 hashes
    difficulty * 4_294_967_296.0
}
