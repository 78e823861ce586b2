//! Nonce search over a block header.

use alloc::string::String;

use crate::block::{BlockHeader, HEADER_WORDS};
use crate::difficulty::Threshold;
use crate::hash::{compress, finish, hash, load_block, HashValue, Word, BLOCK_WORDS, INITIAL_HASH};

#[cfg(feature = "std")]
use crate::error::MineError;
#[cfg(feature = "std")]
use crate::hash::to_display_hex;
#[cfg(feature = "std")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "std")]
use std::sync::Arc;
#[cfg(feature = "std")]
use std::time::{Duration, Instant};
#[cfg(feature = "std")]
use tracing::{debug, info, warn};

/// Check if a hash is below a threshold (valid proof of work).
///
/// Both are 256-bit integers with word 7 most significant, so the words are
/// compared from the end. Equal values are not valid.
#[inline]
pub fn valid_hash(threshold: &Threshold, hash: &HashValue) -> bool {
    hash.iter().rev().lt(threshold.iter().rev())
}

/// Check the header's current nonce against its own nbits.
pub fn verify(header: &BlockHeader) -> bool {
    header.meets_threshold()
}

/// Double SHA-256 of a header with the first 16 words compressed once.
///
/// The nonce sits in the second block, so the first block's compression is
/// shared by every candidate and each nonce costs two compressions instead
/// of three.
#[derive(Debug, Clone)]
pub struct HeaderHasher {
    midstate: HashValue,
    tail: [Word; HEADER_WORDS - BLOCK_WORDS],
}

impl HeaderHasher {
    pub fn new(header: &BlockHeader) -> Self {
        let data = header.data();
        let midstate = compress(&INITIAL_HASH, &load_block(&data[..BLOCK_WORDS]));
        let mut tail = [0; HEADER_WORDS - BLOCK_WORDS];
        tail.copy_from_slice(&data[BLOCK_WORDS..]);
        HeaderHasher { midstate, tail }
    }

    /// Block hash of the header with `nonce` in place of its own.
    #[inline]
    pub fn hash_with_nonce(&mut self, nonce: Word) -> HashValue {
        let last = self.tail.len() - 1;
        self.tail[last] = nonce;
        hash(&finish(self.midstate, &self.tail, HEADER_WORDS))
    }
}

/// Result of a bounded nonce search.
#[derive(Debug, Clone)]
pub struct MiningResult {
    /// The nonce that produced a valid hash (if found).
    pub nonce: Option<Word>,
    /// The resulting block hash (if found).
    pub hash: Option<HashValue>,
    /// Number of hashes computed.
    pub hashes_computed: u64,
    /// Lowest hash seen and the nonce that produced it.
    pub best: Option<(Word, HashValue)>,
}

impl MiningResult {
    /// Create a result indicating no match found.
    pub fn not_found(hashes: u64, best: Option<(Word, HashValue)>) -> Self {
        MiningResult {
            nonce: None,
            hash: None,
            hashes_computed: hashes,
            best,
        }
    }

    /// Create a result indicating a valid nonce was found.
    pub fn found(nonce: Word, hash: HashValue, hashes: u64) -> Self {
        MiningResult {
            nonce: Some(nonce),
            hash: Some(hash),
            hashes_computed: hashes,
            best: Some((nonce, hash)),
        }
    }

    pub fn is_found(&self) -> bool {
        self.nonce.is_some()
    }
}

/// Try up to `nonce_count` nonces starting at `nonce_start`.
///
/// Stops at the first valid nonce or after `u32::MAX`, whichever comes
/// first. The header is left holding the last nonce tried.
pub fn search_range(
    header: &mut BlockHeader,
    threshold: &Threshold,
    nonce_start: Word,
    nonce_count: u32,
) -> MiningResult {
    let mut hasher = HeaderHasher::new(header);
    let end = (nonce_start as u64 + nonce_count as u64).min(Word::MAX as u64 + 1);
    let mut best: Option<(Word, HashValue)> = None;
    let mut hashes = 0;

    for candidate in nonce_start as u64..end {
        let nonce = candidate as Word;
        header.set_nonce(nonce);
        let digest = hasher.hash_with_nonce(nonce);
        hashes += 1;

        if valid_hash(threshold, &digest) {
            return MiningResult::found(nonce, digest, hashes);
        }

        let is_better = match &best {
            None => true,
            Some((_, lowest)) => valid_hash(lowest, &digest),
        };
        if is_better {
            best = Some((nonce, digest));
        }
    }

    MiningResult::not_found(hashes, best)
}

/// Format hash rate for display.
pub fn format_hash_rate(hash_rate: f64) -> String {
    if hash_rate >= 1_000_000_000.0 {
        alloc::format!("{:.2} GH/s", hash_rate / 1_000_000_000.0)
    } else if hash_rate >= 1_000_000.0 {
        alloc::format!("{:.2} MH/s", hash_rate / 1_000_000.0)
    } else if hash_rate >= 1_000.0 {
        alloc::format!("{:.2} KH/s", hash_rate / 1_000.0)
    } else {
        alloc::format!("{:.2} H/s", hash_rate)
    }
}

/// Miner configuration.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Hashes between hash rate reports (0 disables reporting).
    pub report_interval: u32,
    /// Hashes between checks of the stop flag.
    pub cancel_poll_interval: u32,
}

#[cfg(feature = "std")]
impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            report_interval: 10_000,
            cancel_poll_interval: 1_024,
        }
    }
}

/// A successful search.
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineOutcome {
    pub nonce: Word,
    pub hash: HashValue,
    pub hashes: u64,
    pub elapsed: Duration,
}

/// Single-threaded, blocking nonce search.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct Miner {
    config: MinerConfig,
    stop: Option<Arc<AtomicBool>>,
}

#[cfg(feature = "std")]
impl Miner {
    pub fn new(config: MinerConfig) -> Self {
        Self { config, stop: None }
    }

    /// Abort the search once `stop` is set.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    fn is_stopped(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|stop| stop.load(Ordering::Relaxed))
    }

    /// Search upward from `start_nonce` until the header's double hash is
    /// below the threshold encoded in its nbits.
    ///
    /// The header's nonce is updated in place and holds the winning nonce on
    /// success.
    pub fn mine(
        &self,
        start_nonce: Word,
        header: &mut BlockHeader,
    ) -> Result<MineOutcome, MineError> {
        let threshold = header.threshold();
        debug!(nbits = header.nbits(), start_nonce, "Decoded mining threshold");

        let mut hasher = HeaderHasher::new(header);
        let poll_interval = self.config.cancel_poll_interval.max(1) as u64;
        let started = Instant::now();
        let mut window_start = started;
        let mut window_hashes = 0u64;
        let mut hashes = 0u64;
        let mut nonce = start_nonce;

        loop {
            header.set_nonce(nonce);
            let digest = hasher.hash_with_nonce(nonce);
            hashes += 1;

            if valid_hash(&threshold, &digest) {
                info!(nonce, hashes, hash = %to_display_hex(&digest), "Block solved");
                return Ok(MineOutcome {
                    nonce,
                    hash: digest,
                    hashes,
                    elapsed: started.elapsed(),
                });
            }

            window_hashes += 1;
            if window_hashes == u64::from(self.config.report_interval) {
                let elapsed = window_start.elapsed().as_secs_f64();
                let rate = if elapsed > 0.0 {
                    window_hashes as f64 / elapsed
                } else {
                    0.0
                };
                info!(nonce, hash_rate = rate, "Currently mining at {}", format_hash_rate(rate));
                window_start = Instant::now();
                window_hashes = 0;
            }

            if hashes % poll_interval == 0 && self.is_stopped() {
                debug!(nonce, hashes, "Stop flag raised");
                return Err(MineError::Cancelled { nonce, hashes });
            }

            nonce = match nonce.checked_add(1) {
                Some(next) => next,
                None => {
                    warn!(start_nonce, hashes, "No valid nonce left to try");
                    return Err(MineError::NonceSpaceExhausted {
                        start: start_nonce,
                        hashes,
                    });
                }
            };
        }
    }
}

/// Mine with the default configuration and return the winning nonce.
#[cfg(feature = "std")]
pub fn mine(start_nonce: Word, header: &mut BlockHeader) -> Result<Word, MineError> {
    Miner::default()
        .mine(start_nonce, header)
        .map(|outcome| outcome.nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::nbits_to_threshold;
    use crate::hash::double_hash;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    const GENESIS_START_NONCE: Word = 2_080_000_000;
    const GENESIS_NONCE: Word = 2_083_236_893;

    /// The value as 32 big-endian bytes.
    fn to_be_bytes(words: &[Word; 8]) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words.iter().rev()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    fn unreachable_header() -> BlockHeader {
        let mut words = *BlockHeader::genesis().data();
        words[18] = 0;
        BlockHeader::from_words(words)
    }

    #[test]
    fn test_valid_hash() {
        assert!(valid_hash(&[0x9, 0, 0, 0, 0, 0, 0, 0], &[0x8, 0, 0, 0, 0, 0, 0, 0]));
        assert!(valid_hash(&[0x9, 0x1, 0, 0, 0, 0, 0, 0], &[0xAA, 0, 0, 0, 0, 0, 0, 0]));
        assert!(!valid_hash(&[0x9, 0x1, 0, 0, 0, 0, 0, 0], &[0x9, 0x1, 0, 0, 0, 0, 0, 0]));
        assert!(!valid_hash(&[0, 0, 0, 0, 0, 0, 0, 1], &[0, 0, 0, 0, 0, 0, 0, 2]));
    }

    #[test]
    fn test_genesis_hash_is_valid() {
        let header = BlockHeader::genesis();
        let digest = double_hash(header.data());
        assert!(valid_hash(&nbits_to_threshold(0x1d00ffff), &digest));
        assert!(verify(&header));
    }

    #[test]
    fn test_header_hasher_matches_double_hash() {
        let header = BlockHeader::genesis();
        let mut hasher = HeaderHasher::new(&header);
        assert_eq!(hasher.hash_with_nonce(GENESIS_NONCE), header.block_hash());
    }

    #[test]
    fn test_search_range_finds_genesis_nonce() {
        let mut header = BlockHeader::genesis();
        let threshold = header.threshold();

        let result = search_range(&mut header, &threshold, GENESIS_NONCE - 5, 10);
        assert!(result.is_found());
        assert_eq!(result.nonce, Some(GENESIS_NONCE));
        assert_eq!(result.hashes_computed, 6);
        assert_eq!(header.nonce(), GENESIS_NONCE);
        assert_eq!(result.hash, Some(header.block_hash()));
    }

    #[test]
    fn test_search_range_reports_best_hash() {
        let mut header = unreachable_header();
        let threshold = header.threshold();

        let result = search_range(&mut header, &threshold, 0, 50);
        assert!(!result.is_found());
        assert_eq!(result.hashes_computed, 50);

        let (best_nonce, best_hash) = result.best.unwrap();
        for nonce in 0..50 {
            header.set_nonce(nonce);
            assert!(!valid_hash(&best_hash, &header.block_hash()));
        }
        header.set_nonce(best_nonce);
        assert_eq!(header.block_hash(), best_hash);
    }

    #[test]
    fn test_search_range_stops_at_nonce_space_end() {
        let mut header = unreachable_header();
        let threshold = header.threshold();

        let result = search_range(&mut header, &threshold, Word::MAX - 2, 100);
        assert_eq!(result.hashes_computed, 3);
        assert_eq!(header.nonce(), Word::MAX);
    }

    #[test]
    fn test_mine_genesis() {
        let mut header = BlockHeader::genesis();
        header.set_nonce(0);
        assert_eq!(mine(GENESIS_START_NONCE, &mut header), Ok(GENESIS_NONCE));
        assert_eq!(header.nonce(), GENESIS_NONCE);
        assert_eq!(header, BlockHeader::genesis());
    }

    #[test]
    fn test_mine_outcome() {
        let mut header = BlockHeader::genesis();
        let outcome = Miner::default()
            .mine(GENESIS_NONCE - 99, &mut header)
            .unwrap();
        assert_eq!(outcome.nonce, GENESIS_NONCE);
        assert_eq!(outcome.hashes, 100);
        assert_eq!(outcome.hash, BlockHeader::genesis().block_hash());
    }

    #[test]
    fn test_mine_exhausts_nonce_space() {
        let mut header = unreachable_header();
        let start = Word::MAX - 9;
        assert_eq!(
            mine(start, &mut header),
            Err(MineError::NonceSpaceExhausted { start, hashes: 10 })
        );
    }

    #[test]
    fn test_mine_honours_stop_flag() {
        let stop = Arc::new(AtomicBool::new(true));
        let miner = Miner::new(MinerConfig {
            report_interval: 0,
            cancel_poll_interval: 16,
        })
        .with_stop_flag(stop);

        let mut header = unreachable_header();
        assert_eq!(
            miner.mine(0, &mut header),
            Err(MineError::Cancelled { nonce: 15, hashes: 16 })
        );
    }

    /// Counts hash rate reports.
    struct ReportCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ReportCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().fields().field("hash_rate").is_some() {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Mine until a raised stop flag is polled after 64 hashes and return
    /// the hash count with the number of reports emitted.
    fn run_with_report_interval(report_interval: u32) -> (u64, usize) {
        let reports = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ReportCounter(Arc::clone(&reports)));
        let miner = Miner::new(MinerConfig {
            report_interval,
            cancel_poll_interval: 64,
        })
        .with_stop_flag(Arc::new(AtomicBool::new(true)));

        let mut header = unreachable_header();
        let result = tracing::subscriber::with_default(subscriber, || miner.mine(0, &mut header));
        let hashes = match result {
            Err(MineError::Cancelled { hashes, .. }) => hashes,
            other => panic!("unexpected result: {other:?}"),
        };
        (hashes, reports.load(Ordering::Relaxed))
    }

    #[test]
    fn test_mine_reports_hash_rate_every_interval() {
        assert_eq!(run_with_report_interval(16), (64, 4));
        assert_eq!(run_with_report_interval(10), (64, 6));
        assert_eq!(run_with_report_interval(64), (64, 1));
    }

    #[test]
    fn test_zero_report_interval_disables_reports() {
        assert_eq!(run_with_report_interval(0), (64, 0));
    }

    #[test]
    fn test_format_hash_rate() {
        assert_eq!(format_hash_rate(12.0), "12.00 H/s");
        assert_eq!(format_hash_rate(1_500.0), "1.50 KH/s");
        assert_eq!(format_hash_rate(2_250_000.0), "2.25 MH/s");
        assert_eq!(format_hash_rate(3e9), "3.00 GH/s");
    }

    fn word_pairs() -> impl Strategy<Value = ([Word; 8], [Word; 8])> {
        prop_oneof![
            (any::<[Word; 8]>(), any::<[Word; 8]>()),
            // Mostly equal arrays so the lower words decide.
            (any::<[Word; 8]>(), 0..8usize, any::<Word>()).prop_map(|(a, i, w)| {
                let mut b = a;
                b[i] = w;
                (a, b)
            }),
        ]
    }

    proptest! {
        #[test]
        fn valid_hash_matches_big_integer_order((threshold, hash) in word_pairs()) {
            let expected = to_be_bytes(&hash) < to_be_bytes(&threshold);
            prop_assert_eq!(valid_hash(&threshold, &hash), expected);
        }

        #[test]
        fn header_hasher_matches_double_hash(words in any::<[Word; 20]>(), nonce in any::<Word>()) {
            let mut header = BlockHeader::from_words(words);
            let mut hasher = HeaderHasher::new(&header);
            header.set_nonce(nonce);
            prop_assert_eq!(hasher.hash_with_nonce(nonce), double_hash(header.data()));
        }

        #[test]
        fn nonce_change_changes_block_hash(nonce in any::<Word>(), bit in 0..32u32) {
            let mut header = BlockHeader::genesis();
            header.set_nonce(nonce);
            let before = header.block_hash();
            header.set_nonce(nonce ^ (1 << bit));
            prop_assert_ne!(before, header.block_hash());
        }
    }
}
