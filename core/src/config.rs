// ## 📂 File: `src/config.rs`

//! Streaming configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all) is
//! a valid config. `validate` runs once at context construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_BATCH_BLOCKS, DEFAULT_CHUNK_BLOCKS, MAX_CHUNK_BYTES};
use crate::padding::UnpadPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Blocks per read in the sequential engine.
    pub chunk_blocks: usize,
    /// Blocks per batch in the parallel engine.
    pub batch_blocks: usize,
    /// Worker threads for ECB/CTR. `None` sizes the pool from the host.
    pub workers: Option<usize>,
    /// Allow the parallel engine for independent-block modes.
    pub parallel: bool,
    pub unpad_policy: UnpadPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_blocks: DEFAULT_CHUNK_BLOCKS,
            batch_blocks: DEFAULT_BATCH_BLOCKS,
            workers: None,
            parallel: true,
            unpad_policy: UnpadPolicy::Strict,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    #[error("{field} of {blocks} blocks x {block_size} bytes exceeds {max} bytes")]
    TooLarge { field: &'static str, blocks: usize, block_size: usize, max: usize },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StreamConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn sequential() -> Self {
        Self { parallel: false, ..Self::default() }
    }

    pub fn with_chunk_blocks(mut self, blocks: usize) -> Self {
        self.chunk_blocks = blocks;
        self
    }

    pub fn with_batch_blocks(mut self, blocks: usize) -> Self {
        self.batch_blocks = blocks;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_unpad_policy(mut self, policy: UnpadPolicy) -> Self {
        self.unpad_policy = policy;
        self
    }

    /// Check sizes against the block width of the cipher in use.
    pub fn validate(&self, block_size: usize) -> Result<(), ConfigError> {
        check_blocks("chunk_blocks", self.chunk_blocks, block_size)?;
        check_blocks("batch_blocks", self.batch_blocks, block_size)?;
        if self.workers == Some(0) {
            return Err(ConfigError::Zero { field: "workers" });
        }
        Ok(())
    }
}

fn check_blocks(field: &'static str, blocks: usize, block_size: usize) -> Result<(), ConfigError> {
    if blocks == 0 {
        return Err(ConfigError::Zero { field });
    }
    if blocks.saturating_mul(block_size) > MAX_CHUNK_BYTES {
        return Err(ConfigError::TooLarge { field, blocks, block_size, max: MAX_CHUNK_BYTES });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = StreamConfig::from_json(r#"{ "chunk_blocks": 16, "unpad_policy": "lenient" }"#).unwrap();
        assert_eq!(cfg.chunk_blocks, 16);
        assert_eq!(cfg.batch_blocks, DEFAULT_BATCH_BLOCKS);
        assert_eq!(cfg.unpad_policy, UnpadPolicy::Lenient);
        assert!(cfg.parallel);
    }

    #[test]
    fn rejects_zero_and_oversized() {
        assert!(matches!(
            StreamConfig::default().with_chunk_blocks(0).validate(16),
            Err(ConfigError::Zero { field: "chunk_blocks" })
        ));
        assert!(matches!(
            StreamConfig::default().with_batch_blocks(MAX_CHUNK_BYTES).validate(16),
            Err(ConfigError::TooLarge { .. })
        ));
        assert!(StreamConfig::default().validate(8).is_ok());
    }
}
