// ## 📂 File: `src/modes/types.rs`

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cipher::CipherError;
use crate::constants::mode_ids;

/// Chaining mode registry.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum CipherMode {
    Ecb         = mode_ids::ECB,
    Cbc         = mode_ids::CBC,
    Pcbc        = mode_ids::PCBC,
    Cfb         = mode_ids::CFB,
    Ofb         = mode_ids::OFB,
    Ctr         = mode_ids::CTR,
    RandomDelta = mode_ids::RANDOM_DELTA,
}

impl CipherMode {
    pub const ALL: [CipherMode; 7] = [
        CipherMode::Ecb,
        CipherMode::Cbc,
        CipherMode::Pcbc,
        CipherMode::Cfb,
        CipherMode::Ofb,
        CipherMode::Ctr,
        CipherMode::RandomDelta,
    ];

    /// Modes that take a one-block IV (and write it as the file header).
    pub fn uses_iv(self) -> bool {
        matches!(
            self,
            CipherMode::Cbc | CipherMode::Pcbc | CipherMode::Cfb | CipherMode::Ofb | CipherMode::Ctr
        )
    }

    /// Block `i` depends only on its index and the key, so batches can run in parallel.
    pub fn is_independent(self) -> bool {
        matches!(self, CipherMode::Ecb | CipherMode::Ctr)
    }

    pub fn verify(raw: u8) -> Result<Self, ModeError> {
        CipherMode::try_from_primitive(raw).map_err(|_| ModeError::UnknownMode { raw })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("buffer length {len} is not a multiple of block size {block_size}")]
    NotAligned { len: usize, block_size: usize },

    #[error("IV length mismatch: expected={expected}, actual={actual}")]
    IvLength { expected: usize, actual: usize },

    #[error("delta count mismatch: expected={expected}, actual={actual}")]
    DeltaCount { expected: usize, actual: usize },

    #[error("RandomDelta requires a delta sequence")]
    MissingDeltas,

    #[error("{0:?} cannot be positioned at an arbitrary block")]
    NotSeekable(CipherMode),

    #[error("unknown mode id 0x{raw:02x}")]
    UnknownMode { raw: u8 },

    #[error(transparent)]
    Cipher(#[from] CipherError),
}
