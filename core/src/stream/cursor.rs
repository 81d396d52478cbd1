// ## 📂 File: `src/stream/cursor.rs`

//! stream/cursor.rs
//! CPU side of sequential file transforms, shared by the blocking and async engines.
//!
//! Design notes:
//! - The input length is measured up front, so every chunk knows whether it is final.
//! - Encrypt pads only the final chunk; decrypt unpads only the final block.
//! - A cursor never touches I/O; callers read `next_read_len()` bytes and hand them in.

use crate::cipher::BlockCipher;
use crate::modes::{ChainState, CipherMode, Direction, ModeError};
use crate::padding::{self, PaddingScheme, UnpadPolicy};
use crate::random::{DeltaStream, RandomSource};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

pub struct EncryptCursor<'a> {
    cipher: &'a dyn BlockCipher,
    state: ChainState,
    padding: PaddingScheme,
    deltas: Option<DeltaStream>,
    input_len: u64,
    remaining: u64,
    chunk_bytes: usize,
    done: bool,
    pub counters: TelemetryCounters,
    pub timer: TelemetryTimer,
}

impl<'a> EncryptCursor<'a> {
    /// `deltas` is required for RandomDelta and must replay the stream written to the header.
    pub fn new(
        cipher: &'a dyn BlockCipher,
        mode: CipherMode,
        padding: PaddingScheme,
        iv: Option<&[u8]>,
        input_len: u64,
        chunk_blocks: usize,
        deltas: Option<DeltaStream>,
    ) -> Result<Self, StreamError> {
        let bs = cipher.block_size();
        if mode == CipherMode::RandomDelta && deltas.is_none() {
            return Err(ModeError::MissingDeltas.into());
        }
        Ok(Self {
            cipher,
            state: ChainState::new(mode, Direction::Encrypt, bs, iv)?,
            padding,
            deltas,
            input_len,
            remaining: input_len,
            chunk_bytes: chunk_blocks * bs,
            done: false,
            counters: TelemetryCounters::default(),
            timer: TelemetryTimer::new(),
        })
    }

    /// Bytes the caller should read next, or `None` once the final chunk was transformed.
    ///
    /// Empty input yields one zero-length read so the padding block is still produced.
    pub fn next_read_len(&self) -> Option<usize> {
        if self.done {
            return None;
        }
        Some(self.remaining.min(self.chunk_bytes as u64) as usize)
    }

    /// Encrypt one chunk of plaintext, padding it if it is the last one.
    pub fn transform(&mut self, mut buf: Vec<u8>, rng: &mut dyn RandomSource) -> Result<Vec<u8>, StreamError> {
        let bs = self.state.block_size();
        let bytes_in = buf.len();
        self.remaining = self.remaining.checked_sub(bytes_in as u64).ok_or_else(|| {
            StreamError::Validation(format!("chunk of {} bytes overruns input", bytes_in))
        })?;

        if self.remaining == 0 {
            let (padding, input_len) = (self.padding, self.input_len as usize);
            let suffix = self
                .timer
                .time(Stage::Pad, || padding::pad_suffix(padding, input_len, bs, rng))?;
            buf.extend_from_slice(&suffix);
            self.done = true;
        }

        let blocks = buf.len() / bs;
        let deltas = match self.deltas.as_mut() {
            Some(stream) => stream.next_blocks(blocks, bs),
            None => Vec::new(),
        };
        let (state, cipher) = (&mut self.state, self.cipher);
        self.timer.time(Stage::Encrypt, || state.process(cipher, &mut buf, &deltas))?;

        self.counters.add_batch(blocks, bytes_in, buf.len());
        Ok(buf)
    }

    pub fn snapshot(&mut self) -> TelemetrySnapshot {
        self.timer.finish();
        TelemetrySnapshot::from(&self.counters, &self.timer)
    }
}

pub struct DecryptCursor<'a> {
    cipher: &'a dyn BlockCipher,
    state: ChainState,
    padding: PaddingScheme,
    policy: UnpadPolicy,
    remaining: u64,
    chunk_bytes: usize,
    pub counters: TelemetryCounters,
    pub timer: TelemetryTimer,
}

impl<'a> DecryptCursor<'a> {
    /// `payload_len` is the ciphertext length after the header.
    pub fn new(
        cipher: &'a dyn BlockCipher,
        mode: CipherMode,
        padding: PaddingScheme,
        policy: UnpadPolicy,
        iv: Option<&[u8]>,
        payload_len: u64,
        chunk_blocks: usize,
    ) -> Result<Self, StreamError> {
        let bs = cipher.block_size();
        check_payload(payload_len, bs)?;
        Ok(Self {
            cipher,
            state: ChainState::new(mode, Direction::Decrypt, bs, iv)?,
            padding,
            policy,
            remaining: payload_len,
            chunk_bytes: chunk_blocks * bs,
            counters: TelemetryCounters::default(),
            timer: TelemetryTimer::new(),
        })
    }

    pub fn next_read_len(&self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        Some(self.remaining.min(self.chunk_bytes as u64) as usize)
    }

    /// Decrypt one chunk. The final chunk comes back with its padding removed.
    ///
    /// `deltas` must be parallel to `buf` for RandomDelta and empty otherwise.
    pub fn transform(&mut self, mut buf: Vec<u8>, deltas: &[u8]) -> Result<Vec<u8>, StreamError> {
        let bs = self.state.block_size();
        let bytes_in = buf.len();
        self.remaining = self.remaining.checked_sub(bytes_in as u64).ok_or_else(|| {
            StreamError::Validation(format!("chunk of {} bytes overruns payload", bytes_in))
        })?;

        let (state, cipher) = (&mut self.state, self.cipher);
        self.timer.time(Stage::Decrypt, || state.process(cipher, &mut buf, deltas))?;

        if self.remaining == 0 {
            let (padding, policy) = (self.padding, self.policy);
            buf = self.timer.time(Stage::Unpad, || unpad_tail(padding, policy, bs, buf))?;
        }

        self.counters.add_batch(bytes_in / bs, bytes_in, buf.len());
        Ok(buf)
    }

    pub fn snapshot(&mut self) -> TelemetrySnapshot {
        self.timer.finish();
        TelemetrySnapshot::from(&self.counters, &self.timer)
    }
}

/// Reject payloads that cannot hold at least one whole block.
pub fn check_payload(payload_len: u64, block_size: usize) -> Result<(), StreamError> {
    if payload_len == 0 {
        return Err(StreamError::EmptyPayload);
    }
    if payload_len % block_size as u64 != 0 {
        return Err(StreamError::Truncated { len: payload_len, block_size });
    }
    Ok(())
}

/// Strip padding from the last block of a decrypted final chunk.
///
/// Marker schemes live entirely in the last block. Zeros is stripped within
/// that block only, so an all-zero block earlier in the tail is kept.
pub fn unpad_tail(
    padding: PaddingScheme,
    policy: UnpadPolicy,
    block_size: usize,
    mut buf: Vec<u8>,
) -> Result<Vec<u8>, StreamError> {
    if buf.len() < block_size {
        return Err(StreamError::EmptyPayload);
    }
    let tail = buf.split_off(buf.len() - block_size);
    let plain = padding::remove(padding, &tail, block_size, policy)?;
    buf.extend_from_slice(&plain);
    Ok(buf)
}
