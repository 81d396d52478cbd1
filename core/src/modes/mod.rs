// ## 📂 File: `src/modes/mod.rs`

//! Block chaining modes over in-memory buffers.
//!
//! All seven modes share one block-stepping state machine (`ChainState`), so
//! the buffer functions here and the streaming engine run identical code.

pub mod types;
pub mod state;
pub mod buffer;

pub use types::*;
pub use state::ChainState;
pub use buffer::{decrypt, encrypt, encrypt_with_deltas, DeltaSequence, ModeOutput};
