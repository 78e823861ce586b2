//! Mining controller for the WASM miner.

use pow_miner_core::block::HEADER_BYTES;
use pow_miner_core::hash::{count_leading_zeros, to_display_hex};
use pow_miner_core::{search_range, valid_hash, verify, BlockHeader, HashValue, Threshold};
use wasm_bindgen::prelude::*;

use crate::state::{HeaderInfo, MiningResultInfo, MiningStats};

/// The main mining controller.
#[wasm_bindgen]
pub struct Miner {
    /// The header being mined.
    header: Option<BlockHeader>,
    /// Threshold decoded from the header's nbits.
    threshold: Threshold,
    /// Mining statistics.
    stats: MiningStats,
    /// Start time of mining.
    start_time: f64,
    /// Whether mining is active.
    is_mining: bool,
    /// Next nonce to try.
    current_nonce: u32,
    /// Best hash found so far.
    best_hash: Option<HashValue>,
}

#[wasm_bindgen]
impl Miner {
    /// Create a new miner instance with no header loaded.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Miner {
        Miner {
            header: None,
            threshold: [0; 8],
            stats: MiningStats::new(),
            start_time: 0.0,
            is_mining: false,
            current_nonce: 0,
            best_hash: None,
        }
    }

    /// Load a header from its five hex fields.
    ///
    /// # Arguments
    /// * `version`, `time`, `nbits` - 8 hex characters each, serialized byte order
    /// * `prev_hash`, `merkle_root` - 64 hex characters each, serialized byte order
    /// * `start_nonce` - The first nonce to try
    #[wasm_bindgen]
    pub fn load_header(
        &mut self,
        version: &str,
        prev_hash: &str,
        merkle_root: &str,
        time: &str,
        nbits: &str,
        start_nonce: u32,
    ) -> Result<JsValue, JsValue> {
        let header = BlockHeader::from_hex(version, prev_hash, merkle_root, time, nbits)
            .map_err(|e| JsValue::from_str(&format!("Invalid header: {}", e)))?;
        self.install(header, start_nonce)
    }

    /// Load a full 80-byte serialized header given as hex.
    #[wasm_bindgen]
    pub fn load_raw_header(
        &mut self,
        header_hex: &str,
        start_nonce: u32,
    ) -> Result<JsValue, JsValue> {
        let header = parse_raw_header(header_hex)?;
        self.install(header, start_nonce)
    }

    /// Load the Bitcoin genesis block header.
    #[wasm_bindgen]
    pub fn load_genesis(&mut self, start_nonce: u32) -> Result<JsValue, JsValue> {
        self.install(BlockHeader::genesis(), start_nonce)
    }

    /// Mine a batch of nonces.
    ///
    /// # Arguments
    /// * `batch_size` - Number of nonces to try in this batch
    ///
    /// # Returns
    /// Mining result with block found status and statistics.
    #[wasm_bindgen]
    pub fn mine_batch(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let header = self.header.as_mut()
            .ok_or_else(|| JsValue::from_str("No header loaded"))?;

        if self.stats.block_found || self.stats.nonce_space_exhausted {
            return MiningResultInfo {
                block_found: self.stats.block_found,
                nonce: self.stats.block_found.then(|| header.nonce()),
                hash: None,
                leading_zeros: 0,
                hashes_computed: 0,
            }
            .to_js();
        }

        let result = search_range(header, &self.threshold, self.current_nonce, batch_size);

        // Update statistics
        self.stats.total_hashes += result.hashes_computed;
        match self.current_nonce.checked_add(result.hashes_computed as u32) {
            Some(next) => self.current_nonce = next,
            None => self.stats.nonce_space_exhausted = !result.is_found(),
        }
        self.stats.current_nonce = self.current_nonce;

        // Update elapsed time
        if self.start_time > 0.0 {
            let now = js_sys::Date::now();
            self.stats.elapsed_ms = now - self.start_time;
            self.stats.update_hash_rate();
        }

        let mut info = MiningResultInfo {
            block_found: result.is_found(),
            nonce: result.nonce,
            hash: result.hash.as_ref().map(to_display_hex),
            leading_zeros: 0,
            hashes_computed: result.hashes_computed,
        };

        if let Some((_, hash)) = result.best {
            info.leading_zeros = count_leading_zeros(&hash);

            // Update best hash if this is better
            let is_better = match &self.best_hash {
                None => true,
                Some(best) => valid_hash(best, &hash),
            };
            if is_better {
                self.best_hash = Some(hash);
                self.stats.best_hash = Some(to_display_hex(&hash));
                self.stats.best_leading_zeros = info.leading_zeros;
            }
        }

        if result.is_found() {
            self.stats.block_found = true;
            self.is_mining = false;
        }

        info.to_js()
    }

    /// Start mining.
    #[wasm_bindgen]
    pub fn start_mining(&mut self) {
        self.is_mining = true;
        self.start_time = js_sys::Date::now();
    }

    /// Stop mining.
    #[wasm_bindgen]
    pub fn stop_mining(&mut self) {
        self.is_mining = false;
    }

    /// Check if mining is active.
    #[wasm_bindgen(getter)]
    pub fn is_mining(&self) -> bool {
        self.is_mining
    }

    /// Get current mining statistics.
    #[wasm_bindgen]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        self.stats.to_js()
    }

    /// Get the formatted hash rate.
    #[wasm_bindgen]
    pub fn get_hash_rate_display(&self) -> String {
        self.stats.format_hash_rate()
    }

    /// Get the serialized header (if a valid nonce was found).
    #[wasm_bindgen]
    pub fn get_header_hex(&self) -> Option<String> {
        if self.stats.block_found {
            self.header.as_ref().map(|h| hex::encode(h.to_bytes()))
        } else {
            None
        }
    }

    /// Reset the miner for a new header.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        *self = Miner::new();
    }
}

impl Miner {
    fn install(&mut self, header: BlockHeader, start_nonce: u32) -> Result<JsValue, JsValue> {
        self.reset();
        self.threshold = header.threshold();
        self.current_nonce = start_nonce;
        self.stats.current_nonce = start_nonce;
        self.header = Some(header);
        HeaderInfo::new(&header, start_nonce).to_js()
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_raw_header(header_hex: &str) -> Result<BlockHeader, JsValue> {
    let bytes = hex::decode(header_hex)
        .map_err(|_| JsValue::from_str("Invalid header hex"))?;
    let bytes: [u8; HEADER_BYTES] = bytes
        .try_into()
        .map_err(|_| JsValue::from_str("Header must be 80 bytes"))?;
    Ok(BlockHeader::from_bytes(&bytes))
}

/// Check whether a serialized header's nonce satisfies its own nbits.
#[wasm_bindgen]
pub fn verify_header(header_hex: &str) -> Result<bool, JsValue> {
    parse_raw_header(header_hex).map(|header| verify(&header))
}

/// Block hash of a serialized header, in display format.
#[wasm_bindgen]
pub fn block_hash(header_hex: &str) -> Result<String, JsValue> {
    parse_raw_header(header_hex).map(|header| to_display_hex(&header.block_hash()))
}

/// Log to the browser console.
#[wasm_bindgen]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
