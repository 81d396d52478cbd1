// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters collected while a file is transformed.
//!
//! Converted into an immutable `TelemetrySnapshot` when the operation ends.

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    /// Cipher blocks transformed (padding block included).
    pub blocks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// IV or delta header bytes written (encrypt) or consumed (decrypt).
    pub bytes_header: u64,
    /// Chunks (sequential) or batches (parallel) processed.
    pub batches: u64,
}

impl TelemetryCounters {
    pub fn add_header(&mut self, header_len: usize) {
        self.bytes_header += header_len as u64;
    }

    /// Record one chunk or batch of `blocks` blocks.
    pub fn add_batch(&mut self, blocks: usize, bytes_in: usize, bytes_out: usize) {
        self.batches += 1;
        self.blocks += blocks as u64;
        self.bytes_in += bytes_in as u64;
        self.bytes_out += bytes_out as u64;
    }

    /// Fold a worker's counters into the run totals.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.blocks += other.blocks;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.bytes_header += other.bytes_header;
        self.batches += other.batches;
    }
}
