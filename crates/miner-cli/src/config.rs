//! Command-line configuration.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use pow_miner_core::{BlockHeader, MinerConfig};

/// Nonce the genesis search starts from by default.
pub const DEFAULT_START_NONCE: u32 = 2_080_000_000;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Mine (or verify) a Bitcoin-style block header.
///
/// Without header fields the Bitcoin genesis header is used.
#[derive(Debug, Clone, Parser)]
#[command(name = "pow-miner", version, about)]
pub struct Args {
    /// First nonce to try
    #[arg(
        short = 's',
        long,
        env = "POW_MINER_START_NONCE",
        default_value_t = DEFAULT_START_NONCE
    )]
    pub start_nonce: u32,

    /// Block version, 8 hex characters in serialized byte order
    #[arg(long, env = "POW_MINER_BLOCK_VERSION")]
    pub block_version: Option<String>,

    /// Previous block hash, 64 hex characters in serialized byte order
    #[arg(long, env = "POW_MINER_PREV_HASH")]
    pub prev_hash: Option<String>,

    /// Merkle root, 64 hex characters in serialized byte order
    #[arg(long, env = "POW_MINER_MERKLE_ROOT")]
    pub merkle_root: Option<String>,

    /// Block time, 8 hex characters in serialized byte order
    #[arg(long, env = "POW_MINER_TIME")]
    pub time: Option<String>,

    /// Compact difficulty, 8 hex characters in serialized byte order
    #[arg(long, env = "POW_MINER_NBITS")]
    pub nbits: Option<String>,

    /// Nonce to place in the header before verifying
    #[arg(long, env = "POW_MINER_NONCE")]
    pub nonce: Option<u32>,

    /// Check the header's nonce instead of searching
    #[arg(long)]
    pub verify: bool,

    /// Hashes between hash rate reports (0 disables them)
    #[arg(short = 'r', long, env = "POW_MINER_REPORT_INTERVAL", default_value_t = 10_000)]
    pub report_interval: u32,

    /// Give up after this many seconds
    #[arg(short = 't', long, env = "POW_MINER_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Log level, overridden by RUST_LOG
    #[arg(short = 'l', long, env = "POW_MINER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(
        long,
        env = "POW_MINER_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Build the header to mine from the given fields, or the genesis header.
    pub fn header(&self) -> Result<BlockHeader> {
        let fields = [
            &self.block_version,
            &self.prev_hash,
            &self.merkle_root,
            &self.time,
            &self.nbits,
        ];

        let mut header = match fields {
            [None, None, None, None, None] => BlockHeader::genesis(),
            [Some(version), Some(prev_hash), Some(merkle_root), Some(time), Some(nbits)] => {
                BlockHeader::from_hex(version, prev_hash, merkle_root, time, nbits)
                    .context("invalid block header")?
            }
            _ => bail!(
                "--block-version, --prev-hash, --merkle-root, --time and --nbits \
                 must be given together"
            ),
        };

        if let Some(nonce) = self.nonce {
            header.set_nonce(nonce);
        }
        Ok(header)
    }

    pub fn miner_config(&self) -> MinerConfig {
        MinerConfig {
            report_interval: self.report_interval,
            ..MinerConfig::default()
        }
    }
}
