//! cipher/mod.rs
//! The block-cipher capability the engine consumes.
//!
//! The engine never looks inside a cipher: it needs a fixed block size,
//! single-block encrypt/decrypt, and a way to install round keys produced by an
//! external key schedule. `adapters` wires the RustCrypto `aes` and `des`
//! crates into that shape.

pub mod types;
pub mod adapters;

pub use types::*;
pub use adapters::*;
