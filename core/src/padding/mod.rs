// ## 📂 File: `src/padding/mod.rs`

//! Padding schemes: Zeros, ANSI X9.23, PKCS#7, ISO 10126.
//!
//! Design notes:
//! - `pad_suffix` yields only the bytes to append, so the streaming engine can
//!   pad the final partial chunk and stay byte-identical to `apply`.
//! - Removal ambiguity is handled by an explicit `UnpadPolicy`.
//! - Block sizes outside `[MIN_BLOCK_SIZE, MAX_BLOCK_SIZE]` are rejected up front.

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::{apply, pad_suffix, padded_len};
pub use decode::remove;
