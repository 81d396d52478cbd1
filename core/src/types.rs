// ## 📂 File: `src/types.rs`

use std::io;

use crate::{
    cipher::CipherError,
    config::ConfigError,
    modes::ModeError,
    padding::PaddingError,
    stream::header::HeaderError,
    telemetry::TelemetrySnapshot,
};

/// Unified error covering I/O, cipher, padding, mode, header and config failures.
/// - Ergonomic `From<T>` impls enable `?` across layers.
/// - Messages aim to be stable and contextual for logs.
#[derive(Debug)]
pub enum StreamError {
    Io(io::Error),

    /// Block cipher failure (key length, block length, keys missing).
    Cipher(CipherError),

    /// Padding could not be applied or removed.
    Padding(PaddingError),

    /// Chaining precondition violated (alignment, IV, deltas).
    Mode(ModeError),

    /// Mode header missing, short or inconsistent.
    Header(HeaderError),

    Config(ConfigError),

    /// Encrypted input carried no blocks after its header.
    EmptyPayload,

    /// Encrypted payload length is not a multiple of the block size.
    Truncated { len: u64, block_size: usize },

    /// Pipeline error (worker or channel failure).
    PipelineError(&'static str),

    /// Generic high-level validation with a descriptive message.
    Validation(String),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "I/O error: {}", e),
            StreamError::Cipher(e) => write!(f, "cipher error: {}", e),
            StreamError::Padding(e) => write!(f, "padding error: {}", e),
            StreamError::Mode(e) => write!(f, "mode error: {}", e),
            StreamError::Header(e) => write!(f, "header error: {}", e),
            StreamError::Config(e) => write!(f, "config error: {}", e),
            StreamError::EmptyPayload => write!(f, "encrypted payload is empty"),
            StreamError::Truncated { len, block_size } => write!(
                f,
                "encrypted payload of {} bytes is not a multiple of block size {}",
                len, block_size
            ),
            StreamError::PipelineError(msg) => write!(f, "pipeline error: {}", msg),
            StreamError::Validation(msg) => write!(f, "validation error: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::Cipher(e) => Some(e),
            StreamError::Padding(e) => Some(e),
            StreamError::Mode(e) => Some(e),
            StreamError::Header(e) => Some(e),
            StreamError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<CipherError> for StreamError {
    fn from(e: CipherError) -> Self {
        StreamError::Cipher(e)
    }
}

impl From<PaddingError> for StreamError {
    fn from(e: PaddingError) -> Self {
        StreamError::Padding(e)
    }
}

impl From<ModeError> for StreamError {
    fn from(e: ModeError) -> Self {
        // Surface cipher failures directly rather than nested in the mode layer.
        match e {
            ModeError::Cipher(c) => StreamError::Cipher(c),
            other => StreamError::Mode(other),
        }
    }
}

impl From<HeaderError> for StreamError {
    fn from(e: HeaderError) -> Self {
        StreamError::Header(e)
    }
}

impl From<ConfigError> for StreamError {
    fn from(e: ConfigError) -> Self {
        StreamError::Config(e)
    }
}

/// How a cancellable file operation ended.
///
/// Cancellation is an outcome, not an error: the output file is left partial
/// and the snapshot covers the work done before the token fired.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed(TelemetrySnapshot),
    Cancelled(TelemetrySnapshot),
}

impl StreamOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamOutcome::Cancelled(_))
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        match self {
            StreamOutcome::Completed(s) | StreamOutcome::Cancelled(s) => s,
        }
    }

    pub fn into_snapshot(self) -> TelemetrySnapshot {
        match self {
            StreamOutcome::Completed(s) | StreamOutcome::Cancelled(s) => s,
        }
    }
}
