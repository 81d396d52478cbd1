// ## 📂 File: `src/cipher/types.rs`

use thiserror::Error;

/// Ordered round-key blocks produced by a key schedule.
pub type RoundKeys = Vec<Vec<u8>>;

/// Fixed-block-size cipher primitive.
///
/// Implementations must be shareable across worker threads: the parallel
/// ECB/CTR pipeline calls `encrypt_block` from several threads at once.
pub trait BlockCipher: Send + Sync {
    /// Native block width in bytes. Constant for the lifetime of the instance.
    fn block_size(&self) -> usize;

    /// Install the expanded key. Called once, before any block operation.
    fn set_round_keys(&mut self, round_keys: &[Vec<u8>]) -> Result<(), CipherError>;

    /// Encrypt exactly one block in place.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CipherError>;

    /// Decrypt exactly one block in place.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CipherError>;

    /// Short name for log lines.
    fn name(&self) -> &'static str {
        "block-cipher"
    }
}

/// Key schedule: raw key bytes → round keys.
pub trait KeyExpander {
    fn expand_key(&self, raw_key: &[u8]) -> Result<RoundKeys, CipherError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid block length: expected={expected}, actual={actual}")]
    InvalidBlockLen { expected: usize, actual: usize },

    #[error("invalid key length: {actual} bytes not accepted by {cipher}")]
    InvalidKeyLen { cipher: &'static str, actual: usize },

    #[error("round keys not installed")]
    KeysNotInstalled,

    #[error("key schedule produced no round keys")]
    EmptyRoundKeys,

    #[error("cipher failure: {0}")]
    Failure(String),
}

/// Reject a block whose length differs from the cipher width.
#[inline]
pub fn check_block_len(block: &[u8], expected: usize) -> Result<(), CipherError> {
    if block.len() != expected {
        return Err(CipherError::InvalidBlockLen { expected, actual: block.len() });
    }
    Ok(())
}
