// ## 📂 File: `src/stream/mod.rs`

//! Streaming file encryption.
//!
//! Design notes:
//! - Bounded memory: files are read `chunk_blocks` (sequential) or
//!   `batch_blocks` (parallel) at a time.
//! - Output is the mode header followed by exactly the buffer-mode ciphertext.
//! - ECB and CTR may use the parallel pipeline; chained modes never do.

pub mod header;
pub mod io;
pub mod cursor;
pub mod parallelism;
pub mod pipeline;
pub mod core;
pub mod async_io;

pub use header::HeaderError;
pub use cursor::{DecryptCursor, EncryptCursor};
pub use parallelism::ParallelismProfile;
pub use self::core::{decrypt_file, encrypt_file, StreamJob};
pub use async_io::{decrypt_file_async, encrypt_file_async};
