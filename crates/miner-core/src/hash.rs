//! SHA-256 over 32-bit words.
//!
//! Input words are in wire order: the little-endian bytes of each word are the
//! message bytes, exactly as they sit in a serialized block header. The
//! compression function works on big-endian words, so every word crosses
//! [`to_big_endian`] on the way in and [`from_big_endian`] on the way out.
//! Both conversions are plain value operations and do not depend on the host
//! byte order.

use alloc::string::String;

/// The atomic unit of every structure in this crate.
pub type Word = u32;

/// Number of words in a digest.
pub const HASH_WORDS: usize = 8;

/// Number of words in one compression input.
pub const BLOCK_WORDS: usize = 16;

/// A 256-bit SHA-256 digest.
pub type HashValue = [Word; HASH_WORDS];

/// A 512-bit compression input, in big-endian word order.
pub type MessageBlock = [Word; BLOCK_WORDS];

/// First word of the padding, in big-endian order: a single set bit after the message.
const FIRST_PAD_WORD: Word = 0x8000_0000;

/// SHA-256 initial hash value (fractional parts of the square roots of the first 8 primes).
pub const INITIAL_HASH: HashValue = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// SHA-256 round constants (fractional parts of the cube roots of the first 64 primes).
const K: [Word; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Convert a wire-order word into the big-endian order used by the compression function.
#[inline(always)]
pub fn to_big_endian(word: Word) -> Word {
    Word::from_be_bytes(word.to_le_bytes())
}

/// Convert a big-endian word produced by the compression function back into wire order.
#[inline(always)]
pub fn from_big_endian(word: Word) -> Word {
    Word::from_le_bytes(word.to_be_bytes())
}

#[inline(always)]
fn ch(x: Word, y: Word, z: Word) -> Word {
    (x & y) ^ (!x & z)
}

#[inline(always)]
fn maj(x: Word, y: Word, z: Word) -> Word {
    (x & y) ^ (x & z) ^ (y & z)
}

#[inline(always)]
fn big_sigma0(x: Word) -> Word {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline(always)]
fn big_sigma1(x: Word) -> Word {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline(always)]
fn small_sigma0(x: Word) -> Word {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline(always)]
fn small_sigma1(x: Word) -> Word {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// Expand a block into the 64-word message schedule.
#[inline(always)]
fn message_schedule(block: &MessageBlock) -> [Word; 64] {
    let mut w = [0; 64];
    w[..BLOCK_WORDS].copy_from_slice(block);
    for i in BLOCK_WORDS..64 {
        w[i] = small_sigma1(w[i - 2])
            .wrapping_add(w[i - 7])
            .wrapping_add(small_sigma0(w[i - 15]))
            .wrapping_add(w[i - 16]);
    }
    w
}

/// The 64-round SHA-256 compression function.
///
/// Both `state` and `block` are in big-endian word order; the result is the
/// chained state after mixing in `block`.
pub fn compress(state: &HashValue, block: &MessageBlock) -> HashValue {
    let w = message_schedule(block);

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for i in 0..64 {
        let t1 = h
            .wrapping_add(big_sigma1(e))
            .wrapping_add(ch(e, f, g))
            .wrapping_add(K[i])
            .wrapping_add(w[i]);
        let t2 = big_sigma0(a).wrapping_add(maj(a, b, c));
        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    [
        state[0].wrapping_add(a),
        state[1].wrapping_add(b),
        state[2].wrapping_add(c),
        state[3].wrapping_add(d),
        state[4].wrapping_add(e),
        state[5].wrapping_add(f),
        state[6].wrapping_add(g),
        state[7].wrapping_add(h),
    ]
}

/// Load a full block of wire-order words.
#[inline(always)]
pub(crate) fn load_block(words: &[Word]) -> MessageBlock {
    let mut block = [0; BLOCK_WORDS];
    for (dst, &src) in block.iter_mut().zip(words) {
        *dst = to_big_endian(src);
    }
    block
}

/// Pad and compress the trailing (fewer than 16) words of a message.
///
/// `state` must already include every full block; `total_words` is the
/// length of the whole message.
#[inline(always)]
pub(crate) fn finish(mut state: HashValue, tail: &[Word], total_words: usize) -> HashValue {
    debug_assert!(tail.len() < BLOCK_WORDS);

    let bit_len = (total_words as u64) * 32;
    let mut block = load_block(tail);
    block[tail.len()] = FIRST_PAD_WORD;

    // The 64-bit length needs the last two words of a block.
    if tail.len() >= BLOCK_WORDS - 2 {
        state = compress(&state, &block);
        block = [0; BLOCK_WORDS];
    }

    block[14] = (bit_len >> 32) as Word;
    block[15] = bit_len as Word;
    compress(&state, &block).map(from_big_endian)
}

/// SHA-256 of a sequence of wire-order words.
///
/// The digest is returned in wire order as well, so it can be fed straight
/// back into [`hash`].
pub fn hash(data: &[Word]) -> HashValue {
    let mut state = INITIAL_HASH;
    let mut blocks = data.chunks_exact(BLOCK_WORDS);
    for block in &mut blocks {
        state = compress(&state, &load_block(block));
    }
    finish(state, blocks.remainder(), data.len())
}

/// Bitcoin's double SHA-256: `hash(hash(data))`.
#[inline]
pub fn double_hash(data: &[Word]) -> HashValue {
    hash(&hash(data))
}

/// The 32 digest bytes in standard SHA-256 output order.
pub fn digest_bytes(hash: &HashValue) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(hash) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

/// Convert a hash to its display format (byte-reversed hex).
///
/// Block hashes are shown as the 256-bit little-endian integer they encode,
/// most significant byte first.
pub fn to_display_hex(hash: &HashValue) -> String {
    let mut bytes = digest_bytes(hash);
    bytes.reverse();
    hex::encode(bytes)
}

/// Count leading zero bits of the displayed hash.
///
/// Word 7 holds the most significant bits, so the count starts there.
pub fn count_leading_zeros(hash: &HashValue) -> u32 {
    let mut zeros = 0;
    for word in hash.iter().rev() {
        zeros += word.leading_zeros();
        if *word != 0 {
            break;
        }
    }
    zeros
}
