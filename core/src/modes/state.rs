// ## 📂 File: `src/modes/state.rs`

//! Per-block chaining state machine.
//!
//! Design notes:
//! - Blocks are transformed in place; the caller's IV is copied once into the
//!   feedback register and never touched again.
//! - For CTR the register holds the initial counter and `block_index` is added
//!   per block, so a worker can start anywhere with `at_block`.
//! - RandomDelta takes its deltas as a slice parallel to the data.

use crate::cipher::{BlockCipher, CipherError};
use crate::modes::types::{CipherMode, Direction, ModeError};
use crate::utils::{add_to_counter, xor_in_place};

#[derive(Clone, Debug)]
pub struct ChainState {
    mode: CipherMode,
    direction: Direction,
    block_size: usize,
    register: Vec<u8>,
    scratch: Vec<u8>,
    block_index: u64,
}

impl ChainState {
    /// Fresh state at block 0. `iv` is required (one block) for IV modes and ignored otherwise.
    pub fn new(
        mode: CipherMode,
        direction: Direction,
        block_size: usize,
        iv: Option<&[u8]>,
    ) -> Result<Self, ModeError> {
        let register = if mode.uses_iv() {
            let iv = iv.unwrap_or(&[]);
            if iv.len() != block_size {
                return Err(ModeError::IvLength { expected: block_size, actual: iv.len() });
            }
            iv.to_vec()
        } else {
            Vec::new()
        };

        Ok(Self {
            mode,
            direction,
            block_size,
            register,
            scratch: vec![0u8; block_size],
            block_index: 0,
        })
    }

    /// Reposition an independent-block mode at block `n`.
    pub fn at_block(mut self, n: u64) -> Result<Self, ModeError> {
        if !self.mode.is_independent() {
            return Err(ModeError::NotSeekable(self.mode));
        }
        self.block_index = n;
        Ok(self)
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Blocks processed (or skipped via `at_block`) so far.
    pub fn block_index(&self) -> u64 {
        self.block_index
    }

    /// Transform `data` in place, carrying chaining state to the next call.
    ///
    /// `deltas` must be exactly `data.len()` bytes for RandomDelta and is
    /// ignored by every other mode.
    pub fn process(
        &mut self,
        cipher: &dyn BlockCipher,
        data: &mut [u8],
        deltas: &[u8],
    ) -> Result<(), ModeError> {
        let bs = self.block_size;
        if cipher.block_size() != bs {
            return Err(ModeError::Cipher(CipherError::InvalidBlockLen {
                expected: cipher.block_size(),
                actual: bs,
            }));
        }
        if data.len() % bs != 0 {
            return Err(ModeError::NotAligned { len: data.len(), block_size: bs });
        }
        if self.mode == CipherMode::RandomDelta && deltas.len() != data.len() {
            return Err(ModeError::DeltaCount { expected: data.len() / bs, actual: deltas.len() / bs });
        }

        for (i, block) in data.chunks_exact_mut(bs).enumerate() {
            let delta = match self.mode {
                CipherMode::RandomDelta => &deltas[i * bs..(i + 1) * bs],
                _ => &[][..],
            };
            self.step(cipher, block, delta)?;
            self.block_index = self.block_index.wrapping_add(1);
        }
        Ok(())
    }

    fn step(&mut self, cipher: &dyn BlockCipher, block: &mut [u8], delta: &[u8]) -> Result<(), ModeError> {
        use CipherMode::*;
        use Direction::*;

        match (self.mode, self.direction) {
            (Ecb, Encrypt) => cipher.encrypt_block(block)?,
            (Ecb, Decrypt) => cipher.decrypt_block(block)?,

            (Cbc, Encrypt) => {
                xor_in_place(block, &self.register);
                cipher.encrypt_block(block)?;
                self.register.copy_from_slice(block);
            }
            (Cbc, Decrypt) => {
                self.scratch.copy_from_slice(block);
                cipher.decrypt_block(block)?;
                xor_in_place(block, &self.register);
                std::mem::swap(&mut self.register, &mut self.scratch);
            }

            // register = P[i-1] ^ C[i-1], seeded with the IV
            (Pcbc, Encrypt) => {
                self.scratch.copy_from_slice(block);
                xor_in_place(block, &self.register);
                cipher.encrypt_block(block)?;
                self.register.copy_from_slice(&self.scratch);
                xor_in_place(&mut self.register, block);
            }
            (Pcbc, Decrypt) => {
                self.scratch.copy_from_slice(block);
                cipher.decrypt_block(block)?;
                xor_in_place(block, &self.register);
                self.register.copy_from_slice(block);
                xor_in_place(&mut self.register, &self.scratch);
            }

            (Cfb, Encrypt) => {
                self.scratch.copy_from_slice(&self.register);
                cipher.encrypt_block(&mut self.scratch)?;
                xor_in_place(block, &self.scratch);
                self.register.copy_from_slice(block);
            }
            (Cfb, Decrypt) => {
                self.scratch.copy_from_slice(&self.register);
                cipher.encrypt_block(&mut self.scratch)?;
                self.register.copy_from_slice(block);
                xor_in_place(block, &self.scratch);
            }

            (Ofb, _) => {
                cipher.encrypt_block(&mut self.register)?;
                xor_in_place(block, &self.register);
            }

            (Ctr, _) => {
                self.scratch.copy_from_slice(&self.register);
                add_to_counter(&mut self.scratch, self.block_index);
                cipher.encrypt_block(&mut self.scratch)?;
                xor_in_place(block, &self.scratch);
            }

            (RandomDelta, Encrypt) => {
                xor_in_place(block, delta);
                cipher.encrypt_block(block)?;
            }
            (RandomDelta, Decrypt) => {
                cipher.decrypt_block(block)?;
                xor_in_place(block, delta);
            }
        }
        Ok(())
    }
}
