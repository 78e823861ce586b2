//! Browser tests for the WASM bindings.

#![cfg(target_arch = "wasm32")]

use pow_miner_core::BlockHeader;
use pow_miner_wasm::miner::{block_hash, verify_header};
use pow_miner_wasm::Miner;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const GENESIS_NONCE: u32 = 2_083_236_893;

fn genesis_hex() -> String {
    hex::encode(BlockHeader::genesis().to_bytes())
}

#[wasm_bindgen_test]
fn verifies_genesis_header() {
    assert_eq!(verify_header(&genesis_hex()).ok(), Some(true));
    assert_eq!(
        block_hash(&genesis_hex()).ok().as_deref(),
        Some("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f")
    );
}

#[wasm_bindgen_test]
fn rejects_short_header() {
    assert!(verify_header("0100").is_err());
}

#[wasm_bindgen_test]
fn mines_genesis_in_batches() {
    let mut miner = Miner::new();
    miner.load_genesis(GENESIS_NONCE - 250).unwrap();
    miner.start_mining();

    for _ in 0..3 {
        miner.mine_batch(100).unwrap();
    }

    let header = miner.get_header_hex().expect("nonce found");
    assert_eq!(header, genesis_hex());
    assert!(!miner.is_mining());
}

#[wasm_bindgen_test]
fn batch_without_header_fails() {
    let mut miner = Miner::new();
    assert!(miner.mine_batch(10).is_err());
}
