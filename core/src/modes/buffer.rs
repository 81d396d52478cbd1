// ## 📂 File: `src/modes/buffer.rs`

//! Whole-buffer encrypt/decrypt on top of `ChainState`.
//!
//! Input must already be block-aligned; padding is the caller's concern.

use crate::cipher::BlockCipher;
use crate::modes::state::ChainState;
use crate::modes::types::{CipherMode, Direction, ModeError};
use crate::random::{DeltaStream, RandomSource};

/// Ordered per-block deltas used by RandomDelta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaSequence {
    block_size: usize,
    bytes: Vec<u8>,
}

impl DeltaSequence {
    /// Wrap flattened delta bytes; `bytes` must be a whole number of blocks.
    pub fn from_bytes(block_size: usize, bytes: Vec<u8>) -> Result<Self, ModeError> {
        if block_size == 0 || bytes.len() % block_size != 0 {
            return Err(ModeError::NotAligned { len: bytes.len(), block_size });
        }
        Ok(Self { block_size, bytes })
    }

    /// Draw `count` deltas from `stream`.
    pub fn generate(stream: &mut DeltaStream, count: usize, block_size: usize) -> Self {
        Self { block_size, bytes: stream.next_blocks(count, block_size) }
    }

    pub fn count(&self) -> usize {
        self.bytes.len() / self.block_size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.block_size)?;
        self.bytes.get(start..start.checked_add(self.block_size)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Ciphertext plus the deltas RandomDelta needs for decryption.
#[derive(Clone, Debug)]
pub struct ModeOutput {
    pub ciphertext: Vec<u8>,
    pub deltas: Option<DeltaSequence>,
}

/// Encrypt an aligned buffer. RandomDelta draws a fresh delta per block from `rng`.
pub fn encrypt(
    mode: CipherMode,
    cipher: &dyn BlockCipher,
    iv: Option<&[u8]>,
    data: &[u8],
    rng: &mut dyn RandomSource,
) -> Result<ModeOutput, ModeError> {
    let bs = cipher.block_size();
    if mode != CipherMode::RandomDelta {
        let ciphertext = run(mode, Direction::Encrypt, cipher, iv, data, &[])?;
        return Ok(ModeOutput { ciphertext, deltas: None });
    }

    if data.len() % bs != 0 {
        return Err(ModeError::NotAligned { len: data.len(), block_size: bs });
    }
    let mut stream = DeltaStream::new(rng);
    let deltas = DeltaSequence::generate(&mut stream, data.len() / bs, bs);
    let ciphertext = encrypt_with_deltas(mode, cipher, iv, data, &deltas)?;
    Ok(ModeOutput { ciphertext, deltas: Some(deltas) })
}

/// Encrypt with caller-supplied deltas (RandomDelta) or none (every other mode).
pub fn encrypt_with_deltas(
    mode: CipherMode,
    cipher: &dyn BlockCipher,
    iv: Option<&[u8]>,
    data: &[u8],
    deltas: &DeltaSequence,
) -> Result<Vec<u8>, ModeError> {
    run(mode, Direction::Encrypt, cipher, iv, data, deltas.as_bytes())
}

/// Decrypt an aligned buffer. RandomDelta requires the deltas used to encrypt it.
pub fn decrypt(
    mode: CipherMode,
    cipher: &dyn BlockCipher,
    iv: Option<&[u8]>,
    data: &[u8],
    deltas: Option<&DeltaSequence>,
) -> Result<Vec<u8>, ModeError> {
    let delta_bytes = match (mode, deltas) {
        (CipherMode::RandomDelta, None) => return Err(ModeError::MissingDeltas),
        (CipherMode::RandomDelta, Some(d)) => d.as_bytes(),
        _ => &[][..],
    };
    run(mode, Direction::Decrypt, cipher, iv, data, delta_bytes)
}

fn run(
    mode: CipherMode,
    direction: Direction,
    cipher: &dyn BlockCipher,
    iv: Option<&[u8]>,
    data: &[u8],
    deltas: &[u8],
) -> Result<Vec<u8>, ModeError> {
    let mut state = ChainState::new(mode, direction, cipher.block_size(), iv)?;
    let mut out = data.to_vec();
    state.process(cipher, &mut out, deltas)?;
    Ok(out)
}
