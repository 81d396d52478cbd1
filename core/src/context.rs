// ## 📂 File: `src/context.rs`

//! CryptoContext: one (cipher, mode, padding, IV, config, randomness) tuple.
//!
//! Design notes:
//! - Round keys are expanded and installed once, in `new`.
//! - Every operation forks a private generator from the shared random source
//!   under a short lock, so no guard is held across I/O or `.await`.
//! - Buffer ops compose pad → mode and mode → unpad. RandomDelta buffers carry
//!   the same count + deltas prefix as RandomDelta files.

use std::path::Path;
use std::sync::Mutex;

use byteorder::{ByteOrder, LittleEndian};
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cipher::{BlockCipher, KeyExpander};
use crate::config::StreamConfig;
use crate::constants::DELTA_COUNT_LEN;
use crate::modes::{self, CipherMode, DeltaSequence, ModeError};
use crate::padding::{self, check_block_size, PaddingScheme};
use crate::random::{self, DeltaStream, RandomSource};
use crate::stream::{self, header, HeaderError, StreamJob};
use crate::telemetry::TelemetrySnapshot;
use crate::types::{StreamError, StreamOutcome};

pub struct CryptoContext {
    cipher: Box<dyn BlockCipher>,
    mode: CipherMode,
    padding: PaddingScheme,
    iv: Option<Vec<u8>>,
    config: StreamConfig,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl std::fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoContext")
            .field("cipher", &self.cipher.name())
            .field("mode", &self.mode)
            .field("padding", &self.padding)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CryptoContext {
    /// Expand `key`, install the round keys and validate the IV.
    ///
    /// `iv` must be one block for CBC, PCBC, CFB, OFB and CTR; it is ignored for ECB and RandomDelta.
    pub fn new(
        key: &[u8],
        mut cipher: Box<dyn BlockCipher>,
        mode: CipherMode,
        padding: PaddingScheme,
        expander: &dyn KeyExpander,
        iv: Option<&[u8]>,
    ) -> Result<Self, StreamError> {
        let round_keys = expander.expand_key(key)?;
        cipher.set_round_keys(&round_keys)?;

        let bs = cipher.block_size();
        check_block_size(bs)?;

        let iv = if mode.uses_iv() {
            match iv {
                Some(iv) if iv.len() == bs => Some(iv.to_vec()),
                other => {
                    return Err(ModeError::IvLength { expected: bs, actual: other.map_or(0, <[u8]>::len) }.into())
                }
            }
        } else {
            None
        };

        let config = StreamConfig::default();
        config.validate(bs)?;
        debug!(cipher = cipher.name(), ?mode, ?padding, block_size = bs, "context ready");

        Ok(Self {
            cipher,
            mode,
            padding,
            iv,
            config,
            rng: Mutex::new(random::default_source()),
        })
    }

    pub fn with_config(mut self, config: StreamConfig) -> Result<Self, StreamError> {
        config.validate(self.block_size())?;
        self.config = config;
        Ok(self)
    }

    /// Replace the entropy-seeded default source (seeded sources make runs reproducible).
    pub fn with_random_source(mut self, source: Box<dyn RandomSource>) -> Self {
        self.rng = Mutex::new(source);
        self
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn padding(&self) -> PaddingScheme {
        self.padding
    }

    pub fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    pub fn iv(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn fork_rng(&self) -> Result<StdRng, StreamError> {
        let mut source = self
            .rng
            .lock()
            .map_err(|_| StreamError::PipelineError("random source lock poisoned"))?;
        Ok(random::fork(&mut **source))
    }

    fn job(&self) -> StreamJob<'_> {
        StreamJob {
            cipher: self.cipher.as_ref(),
            mode: self.mode,
            padding: self.padding,
            iv: self.iv.as_deref(),
            config: &self.config,
        }
    }

    // ============================================================
    // Buffers
    // ============================================================

    /// Pad and encrypt `data`.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, StreamError> {
        let bs = self.block_size();
        let mut rng = self.fork_rng()?;
        let cipher = self.cipher.as_ref();

        if self.mode != CipherMode::RandomDelta {
            let padded = padding::apply(self.padding, data, bs, &mut rng)?;
            let out = modes::encrypt(self.mode, cipher, self.iv(), &padded, &mut rng)?;
            return Ok(out.ciphertext);
        }

        // Same draw order as the file engine: delta seed first, then padding.
        let mut stream = DeltaStream::new(&mut rng);
        let padded = padding::apply(self.padding, data, bs, &mut rng)?;
        let count = padded.len() / bs;
        let deltas = DeltaSequence::generate(&mut stream, count, bs);
        let ciphertext = modes::encrypt_with_deltas(self.mode, cipher, None, &padded, &deltas)?;

        let mut out = vec![0u8; DELTA_COUNT_LEN];
        LittleEndian::write_u64(&mut out, count as u64);
        out.extend_from_slice(deltas.as_bytes());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt and unpad `data` produced by [`CryptoContext::encrypt`].
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, StreamError> {
        let bs = self.block_size();
        let cipher = self.cipher.as_ref();

        let plain = if self.mode == CipherMode::RandomDelta {
            if data.len() < DELTA_COUNT_LEN {
                return Err(HeaderError::Truncated { need: DELTA_COUNT_LEN as u64, have: data.len() as u64 }.into());
            }
            let count = LittleEndian::read_u64(&data[..DELTA_COUNT_LEN]);
            let blocks = header::delta_payload_blocks(data.len() as u64, count, bs)?;
            if blocks == 0 {
                return Err(StreamError::EmptyPayload);
            }
            let split = data.len() - (blocks as usize * bs);
            let deltas = DeltaSequence::from_bytes(bs, data[DELTA_COUNT_LEN..split].to_vec())?;
            modes::decrypt(self.mode, cipher, None, &data[split..], Some(&deltas))?
        } else {
            if data.is_empty() {
                return Err(StreamError::EmptyPayload);
            }
            modes::decrypt(self.mode, cipher, self.iv(), data, None)?
        };

        Ok(padding::remove(self.padding, &plain, bs, self.config.unpad_policy)?)
    }

    // ============================================================
    // Files (blocking)
    // ============================================================

    pub fn encrypt_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<TelemetrySnapshot, StreamError> {
        let mut rng = self.fork_rng()?;
        stream::encrypt_file(&self.job(), input.as_ref(), output.as_ref(), &mut rng, None)
            .map(StreamOutcome::into_snapshot)
    }

    pub fn decrypt_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<TelemetrySnapshot, StreamError> {
        stream::decrypt_file(&self.job(), input.as_ref(), output.as_ref(), None)
            .map(StreamOutcome::into_snapshot)
    }

    /// Blocking encrypt that stops at the next chunk (or batch) boundary once `cancel` fires.
    pub fn encrypt_file_with_cancel(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError> {
        let mut rng = self.fork_rng()?;
        stream::encrypt_file(&self.job(), input.as_ref(), output.as_ref(), &mut rng, Some(cancel))
    }

    pub fn decrypt_file_with_cancel(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError> {
        stream::decrypt_file(&self.job(), input.as_ref(), output.as_ref(), Some(cancel))
    }

    // ============================================================
    // Files (async)
    // ============================================================

    pub async fn encrypt_file_async(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cancel: CancellationToken,
    ) -> Result<StreamOutcome, StreamError> {
        let rng = self.fork_rng()?;
        stream::encrypt_file_async(self.job(), input.as_ref(), output.as_ref(), rng, cancel).await
    }

    pub async fn decrypt_file_async(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cancel: CancellationToken,
    ) -> Result<StreamOutcome, StreamError> {
        stream::decrypt_file_async(self.job(), input.as_ref(), output.as_ref(), cancel).await
    }
}
