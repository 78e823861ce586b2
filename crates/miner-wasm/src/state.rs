//! Mining state exposed to JavaScript.

use pow_miner_core::difficulty::{format_difficulty, nbits_to_difficulty};
use pow_miner_core::hash::to_display_hex;
use pow_miner_core::miner::format_hash_rate;
use pow_miner_core::BlockHeader;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Mining statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningStats {
    /// Total hashes computed.
    pub total_hashes: u64,
    /// Current hash rate (hashes per second).
    pub hash_rate: f64,
    /// Whether a valid nonce was found.
    pub block_found: bool,
    /// Whether every nonce up to `u32::MAX` has been tried.
    pub nonce_space_exhausted: bool,
    /// Next nonce to try.
    pub current_nonce: u32,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: f64,
    /// Best hash found (lowest, display format).
    pub best_hash: Option<String>,
    /// Number of leading zeros in best hash.
    pub best_leading_zeros: u32,
}

impl MiningStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update hash rate based on elapsed time.
    pub fn update_hash_rate(&mut self) {
        if self.elapsed_ms > 0.0 {
            self.hash_rate = (self.total_hashes as f64) / (self.elapsed_ms / 1000.0);
        }
    }

    /// Format hash rate for display.
    pub fn format_hash_rate(&self) -> String {
        format_hash_rate(self.hash_rate)
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Header information for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderInfo {
    /// Block version.
    pub version: u32,
    /// Previous block hash (display format).
    pub prev_hash: String,
    /// Merkle root (display format).
    pub merkle_root: String,
    /// Block timestamp.
    pub time: u32,
    /// Difficulty bits.
    pub nbits: u32,
    /// Threshold the hash must stay below (display format).
    pub threshold: String,
    /// Difficulty as a number.
    pub difficulty: f64,
    /// Formatted difficulty string.
    pub difficulty_display: String,
    /// Nonce the search starts from.
    pub start_nonce: u32,
}

impl HeaderInfo {
    pub fn new(header: &BlockHeader, start_nonce: u32) -> Self {
        let difficulty = nbits_to_difficulty(header.nbits());
        HeaderInfo {
            version: header.version(),
            prev_hash: to_display_hex(&header.prev_hash()),
            merkle_root: to_display_hex(&header.merkle_root()),
            time: header.time(),
            nbits: header.nbits(),
            threshold: to_display_hex(&header.threshold()),
            difficulty,
            difficulty_display: format_difficulty(difficulty),
            start_nonce,
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Result of a mining batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningResultInfo {
    /// Whether a valid nonce was found.
    pub block_found: bool,
    /// The winning nonce (if found).
    pub nonce: Option<u32>,
    /// The block hash (if found, display format).
    pub hash: Option<String>,
    /// Number of leading zeros in the lowest hash of the batch.
    pub leading_zeros: u32,
    /// Hashes computed in this batch.
    pub hashes_computed: u64,
}

impl MiningResultInfo {
    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}
