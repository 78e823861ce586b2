//! WebAssembly bindings for the proof-of-work miner.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Loading a block header from hex fields, raw bytes or the genesis block
//! - Mining in caller-sized batches with running statistics
//! - Verifying and hashing serialized headers

use wasm_bindgen::prelude::*;

pub mod miner;
pub mod state;

// Re-export main types for JS access
pub use miner::Miner;

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
