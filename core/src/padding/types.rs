// ## 📂 File: `src/padding/types.rs`

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{padding_ids, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};

/// Padding scheme registry.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum PaddingScheme {
    Zeros    = padding_ids::ZEROS,
    AnsiX923 = padding_ids::ANSI_X923,
    Pkcs7    = padding_ids::PKCS7,
    Iso10126 = padding_ids::ISO10126,
}

impl PaddingScheme {
    /// True when the final byte records the pad count.
    ///
    /// Marker schemes always add 1..=block_size bytes; Zeros may add none.
    pub fn has_marker(self) -> bool {
        !matches!(self, PaddingScheme::Zeros)
    }

    pub fn verify(raw: u8) -> Result<Self, PaddingError> {
        PaddingScheme::try_from_primitive(raw).map_err(|_| PaddingError::UnknownScheme { raw })
    }
}

/// What `remove` does when the padding does not validate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnpadPolicy {
    /// Fail with `PaddingError::Corrupt`.
    #[default]
    Strict,
    /// Return the input unchanged and log a warning.
    Lenient,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaddingError {
    #[error("block size {0} outside [{min}, {max}]", min = MIN_BLOCK_SIZE, max = MAX_BLOCK_SIZE)]
    InvalidBlockSize(usize),

    #[error("padded length {len} is not a multiple of block size {block_size}")]
    NotAligned { len: usize, block_size: usize },

    #[error("corrupt {scheme:?} padding: {reason}")]
    Corrupt { scheme: PaddingScheme, reason: &'static str },

    #[error("unknown padding scheme id 0x{raw:02x}")]
    UnknownScheme { raw: u8 },
}

/// Reject block sizes the pad-count byte cannot describe.
#[inline]
pub fn check_block_size(block_size: usize) -> Result<(), PaddingError> {
    if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
        return Err(PaddingError::InvalidBlockSize(block_size));
    }
    Ok(())
}
