//! Proof-of-work mining core.
//!
//! This crate provides pure Rust implementations of:
//! - SHA-256 over 32-bit words, including Bitcoin's double hash
//! - The 80-byte Bitcoin block header and its hex construction
//! - Compact "nbits" difficulty decoding and threshold comparison
//! - Nonce search, bounded or run to completion with hash rate reporting

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod block;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod miner;

pub use block::{hex_to_words, BlockHeader};
pub use difficulty::{nbits_to_threshold, threshold_to_nbits, Threshold};
pub use error::{HeaderError, HeaderField, HexError, MineError};
pub use hash::{double_hash, hash, HashValue, MessageBlock, Word};
pub use miner::{search_range, valid_hash, verify, HeaderHasher, MiningResult};

#[cfg(feature = "std")]
pub use miner::{mine, MineOutcome, Miner, MinerConfig};
