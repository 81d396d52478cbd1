// ## 📂 File: `src/constants.rs`

//! Engine-wide constants: block size bounds, chunk/batch sizing, header layout.

/// Smallest block size any padding scheme accepts.
pub const MIN_BLOCK_SIZE: usize = 1;
/// Largest block size any padding scheme accepts. A full 256-byte pad stores its
/// count byte as 0x00.
pub const MAX_BLOCK_SIZE: usize = 256;

/// Defaults when `StreamConfig` leaves a field unset.
pub const DEFAULT_CHUNK_BLOCKS: usize = 512;
pub const DEFAULT_BATCH_BLOCKS: usize = 512;

/// Industry-standard chunk sizes (in blocks) the sequential reader snaps to.
pub const ALLOWED_CHUNK_BLOCKS: &[usize] = &[
    1,
    16,
    64,
    256,
    512,   // default
    1024,
    4096,
    16384,
];

/// Max bytes held by one chunk or batch (32 MiB).
pub const MAX_CHUNK_BYTES: usize = 32 * 1024 * 1024;

/// Upper bound on in-flight batches in the parallel pipeline.
pub const MAX_INFLIGHT_BATCHES: usize = 64;
/// Fraction of available memory the parallel pipeline may budget for batches.
pub const DEFAULT_MEM_FRACTION: f64 = 0.25;

/// Size of the RandomDelta block-count prefix (u64, little-endian).
pub const DELTA_COUNT_LEN: usize = 8;

/// Seed length for the replayable delta stream.
pub const DELTA_SEED_LEN: usize = 32;

/// Stable one-byte identifiers, used by config files and log output.
pub mod mode_ids {
    pub const ECB: u8          = 0x00;
    pub const CBC: u8          = 0x01;
    pub const PCBC: u8         = 0x02;
    pub const CFB: u8          = 0x03;
    pub const OFB: u8          = 0x04;
    pub const CTR: u8          = 0x05;
    pub const RANDOM_DELTA: u8 = 0x06;
}

pub mod padding_ids {
    pub const ZEROS: u8      = 0x00;
    pub const ANSI_X923: u8  = 0x01;
    pub const PKCS7: u8      = 0x02;
    pub const ISO10126: u8   = 0x03;
}
