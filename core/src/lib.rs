//! modes-core
//!
//! Block-cipher chaining modes (ECB, CBC, PCBC, CFB, OFB, CTR, RandomDelta),
//! padding schemes and a bounded-memory streaming file engine.
//! Pure Rust; cipher primitives plug in through [`cipher::BlockCipher`].

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod random;
pub mod config;

// Primitives
pub mod cipher;
pub mod padding;
pub mod modes;

// Stream layers
pub mod telemetry;
pub mod stream;

pub mod context;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::cipher::{
        Aes128Block, Aes192Block, Aes256Block, BlockCipher, CipherError, DesBlock, KeyExpander,
        RawKeySchedule, TripleDesBlock,
    };
    pub use crate::config::StreamConfig;
    pub use crate::context::CryptoContext;
    pub use crate::modes::{CipherMode, DeltaSequence, ModeError};
    pub use crate::padding::{PaddingError, PaddingScheme, UnpadPolicy};
    pub use crate::random::RandomSource;
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{StreamError, StreamOutcome};
    pub use tokio_util::sync::CancellationToken;
}
