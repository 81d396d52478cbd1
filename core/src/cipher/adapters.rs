// ## 📂 File: `src/cipher/adapters.rs`

//! Adapters from RustCrypto block ciphers to [`BlockCipher`].
//!
//! RustCrypto ciphers run their own key schedule inside `KeyInit`, so the
//! matching [`RawKeySchedule`] hands the raw key through as a single
//! "round key" and `set_round_keys` builds the cipher from it.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use des::{Des, TdesEde3};

use crate::cipher::types::{check_block_len, BlockCipher, CipherError, KeyExpander, RoundKeys};

/// Generic bridge over any RustCrypto block cipher.
pub struct RustCryptoBlock<C> {
    inner: Option<C>,
    name: &'static str,
}

pub type Aes128Block = RustCryptoBlock<Aes128>;
pub type Aes192Block = RustCryptoBlock<Aes192>;
pub type Aes256Block = RustCryptoBlock<Aes256>;
pub type DesBlock = RustCryptoBlock<Des>;
pub type TripleDesBlock = RustCryptoBlock<TdesEde3>;

impl<C> RustCryptoBlock<C> {
    pub fn with_name(name: &'static str) -> Self {
        Self { inner: None, name }
    }

    pub fn has_keys(&self) -> bool {
        self.inner.is_some()
    }
}

impl RustCryptoBlock<Aes128> {
    pub fn new() -> Self { Self::with_name("AES-128") }
}
impl RustCryptoBlock<Aes192> {
    pub fn new() -> Self { Self::with_name("AES-192") }
}
impl RustCryptoBlock<Aes256> {
    pub fn new() -> Self { Self::with_name("AES-256") }
}
impl RustCryptoBlock<Des> {
    pub fn new() -> Self { Self::with_name("DES") }
}
impl RustCryptoBlock<TdesEde3> {
    pub fn new() -> Self { Self::with_name("3DES-EDE3") }
}

impl<C> BlockCipher for RustCryptoBlock<C>
where
    C: BlockEncrypt + BlockDecrypt + KeyInit + Send + Sync,
{
    fn block_size(&self) -> usize {
        <C as BlockSizeUser>::block_size()
    }

    fn set_round_keys(&mut self, round_keys: &[Vec<u8>]) -> Result<(), CipherError> {
        let key = round_keys.first().ok_or(CipherError::EmptyRoundKeys)?;
        let cipher = C::new_from_slice(key)
            .map_err(|_| CipherError::InvalidKeyLen { cipher: self.name, actual: key.len() })?;
        self.inner = Some(cipher);
        Ok(())
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CipherError> {
        let cipher = self.inner.as_ref().ok_or(CipherError::KeysNotInstalled)?;
        check_block_len(block, self.block_size())?;
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CipherError> {
        let cipher = self.inner.as_ref().ok_or(CipherError::KeysNotInstalled)?;
        check_block_len(block, self.block_size())?;
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Pass-through key schedule for ciphers that expand keys internally.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawKeySchedule;

impl KeyExpander for RawKeySchedule {
    fn expand_key(&self, raw_key: &[u8]) -> Result<RoundKeys, CipherError> {
        if raw_key.is_empty() {
            return Err(CipherError::EmptyRoundKeys);
        }
        Ok(vec![raw_key.to_vec()])
    }
}
