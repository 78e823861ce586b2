//! pow-miner - command-line front end for the proof-of-work core.
//!
//! Mines the Bitcoin genesis header (or one given as hex fields) from a start
//! nonce and prints the winning nonce and block hash.

mod config;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pow_miner_core::difficulty::{expected_hashes, format_difficulty, nbits_to_difficulty};
use pow_miner_core::hash::to_display_hex;
use pow_miner_core::miner::format_hash_rate;
use pow_miner_core::{BlockHeader, HashValue, MineOutcome, Miner};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Args, LogFormat};

/// Result printed on stdout.
#[derive(Debug, Serialize)]
struct Report {
    valid: bool,
    nonce: u32,
    /// Block hash in display order.
    hash: String,
    /// Block hash as wire-order words.
    hash_words: Vec<String>,
    /// Serialized 80-byte header.
    header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
}

impl Report {
    fn new(header: &BlockHeader, hash: &HashValue) -> Self {
        Self {
            valid: header.meets_threshold(),
            nonce: header.nonce(),
            hash: to_display_hex(hash),
            hash_words: hash.iter().map(|word| format!("{word:08x}")).collect(),
            header: hex::encode(header.to_bytes()),
            hashes: None,
            elapsed_ms: None,
        }
    }

    fn with_outcome(mut self, outcome: &MineOutcome) -> Self {
        self.hashes = Some(outcome.hashes);
        self.elapsed_ms = Some(outcome.elapsed.as_millis() as u64);
        self
    }

    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        if self.valid {
            println!("Block solved! Nonce: {}", self.nonce);
        } else {
            println!("Nonce {} does not meet the target", self.nonce);
        }
        println!("Hash: {}", self.hash);
        println!("Words: {}", self.hash_words.join(" "));
        if let (Some(hashes), Some(elapsed_ms)) = (self.hashes, self.elapsed_ms) {
            println!("Hashes: {} in {} ms", hashes, elapsed_ms);
        }
        Ok(())
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let json = args.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with((!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .init();
}

/// Raise `stop` after `secs` seconds.
fn spawn_timeout(secs: u64, stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(secs));
        warn!(secs, "Timeout reached, stopping miner");
        stop.store(true, Ordering::Relaxed);
    });
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut header = args.header()?;

    if args.verify {
        let hash = header.block_hash();
        return Report::new(&header, &hash).print(args.json);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let miner = Miner::new(args.miner_config()).with_stop_flag(Arc::clone(&stop));

    let difficulty = nbits_to_difficulty(header.nbits());
    info!(
        nbits = format!("{:08x}", header.nbits()),
        difficulty = format_difficulty(difficulty),
        expected_hashes = expected_hashes(difficulty),
        start_nonce = args.start_nonce,
        report_interval = miner.config().report_interval,
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );

    if let Some(secs) = args.timeout {
        spawn_timeout(secs, stop);
    }

    let outcome = miner
        .mine(args.start_nonce, &mut header)
        .context("mining failed")?;

    let secs = outcome.elapsed.as_secs_f64();
    if secs > 0.0 {
        info!(
            rate = format_hash_rate(outcome.hashes as f64 / secs),
            "Average hash rate"
        );
    }

    Report::new(&header, &outcome.hash)
        .with_outcome(&outcome)
        .print(args.json)
}
