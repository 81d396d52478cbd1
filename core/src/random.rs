//! random.rs
//! Injected randomness for ISO 10126 pad bytes and RandomDelta deltas.
//!
//! Nothing in the engine reaches for an ambient RNG. Callers hand a
//! `RandomSource` to the context (or to the free functions directly), so tests
//! can pin the byte stream with a seeded generator.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::constants::DELTA_SEED_LEN;

/// Source of non-cryptographic random bytes.
pub trait RandomSource: Send {
    fn fill(&mut self, dest: &mut [u8]);
}

impl<R: RngCore + Send> RandomSource for R {
    fn fill(&mut self, dest: &mut [u8]) {
        RngCore::fill_bytes(self, dest);
    }
}

/// Entropy-seeded default used when the caller does not inject a source.
pub fn default_source() -> Box<dyn RandomSource> {
    Box::new(StdRng::from_entropy())
}

/// Draw a fresh generator from `source`.
///
/// The fork is deterministic in the parent's output, so a seeded parent gives
/// reproducible children. Used to keep locks short and to replay delta streams.
pub fn fork(source: &mut dyn RandomSource) -> StdRng {
    let mut seed = [0u8; DELTA_SEED_LEN];
    source.fill(&mut seed);
    StdRng::from_seed(seed)
}

/// Replayable delta generator for RandomDelta file encryption.
///
/// The header (all deltas) is written before the ciphertext, so the same
/// sequence is produced twice from one seed instead of being buffered.
#[derive(Clone)]
pub struct DeltaStream {
    seed: [u8; DELTA_SEED_LEN],
    rng: StdRng,
}

impl DeltaStream {
    pub fn new(source: &mut dyn RandomSource) -> Self {
        let mut seed = [0u8; DELTA_SEED_LEN];
        source.fill(&mut seed);
        Self { seed, rng: StdRng::from_seed(seed) }
    }

    /// A stream positioned at the first delta again.
    pub fn replay(&self) -> Self {
        Self { seed: self.seed, rng: StdRng::from_seed(self.seed) }
    }

    /// Next `count` deltas of `block_size` bytes, flattened.
    ///
    /// Deltas are always drawn one block at a time so that the header pass and
    /// the encryption pass see the same bytes regardless of how they batch.
    pub fn next_blocks(&mut self, count: usize, block_size: usize) -> Vec<u8> {
        let mut out = vec![0u8; count * block_size];
        for block in out.chunks_mut(block_size.max(1)) {
            self.rng.fill_bytes(block);
        }
        out
    }
}
