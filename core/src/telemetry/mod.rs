// ## 📂 File: `src/telemetry/mod.rs`

//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for file operations.
//!
//! Industry notes:
//! - Sequential runs keep one set of counters in the cursor. Parallel workers each own
//!   counters and stage times that are merged into the run totals when the worker exits;
//!   the ordered writer adds output bytes. No atomics on the data path.
//! - Snapshots are immutable and serde-serializable so benches and callers can log them as JSON.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
