// ## 📂 File: `src/stream/header.rs`

//! stream/header.rs
//! Per-mode file headers.
//!
//! Layout (little-endian where multi-byte):
//! - ECB: none.
//! - CBC, PCBC, CFB, OFB, CTR: the raw IV, one block.
//! - RandomDelta: `u64` block count, then `count` delta blocks.
//!
//! The payload that follows is exactly the buffer-mode ciphertext.

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::constants::DELTA_COUNT_LEN;
use crate::modes::CipherMode;
use crate::random::DeltaStream;
use crate::types::StreamError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header truncated: need {need} bytes, have {have}")]
    Truncated { need: u64, have: u64 },

    #[error("delta count {header} disagrees with payload of {payload} blocks")]
    DeltaCountMismatch { header: u64, payload: u64 },
}

/// Encoded header length for `mode` over `blocks` payload blocks.
pub fn header_len(mode: CipherMode, block_size: usize, blocks: u64) -> u64 {
    match mode {
        CipherMode::Ecb => 0,
        CipherMode::RandomDelta => DELTA_COUNT_LEN as u64 + blocks * block_size as u64,
        _ => block_size as u64,
    }
}

pub fn write_iv<W: Write>(w: &mut W, iv: &[u8]) -> io::Result<usize> {
    w.write_all(iv)?;
    Ok(iv.len())
}

/// Encoded RandomDelta header, piece by piece: the `u64` LE count first, then
/// deltas `chunk_blocks` at a time so the whole sequence is never resident.
pub struct DeltaHeaderChunks<'a> {
    stream: &'a mut DeltaStream,
    count: Option<u64>,
    left: u64,
    block_size: usize,
    chunk_blocks: usize,
}

pub fn delta_header_chunks(
    stream: &mut DeltaStream,
    count: u64,
    block_size: usize,
    chunk_blocks: usize,
) -> DeltaHeaderChunks<'_> {
    DeltaHeaderChunks { stream, count: Some(count), left: count, block_size, chunk_blocks: chunk_blocks.max(1) }
}

impl Iterator for DeltaHeaderChunks<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if let Some(count) = self.count.take() {
            let mut raw = vec![0u8; DELTA_COUNT_LEN];
            LittleEndian::write_u64(&mut raw, count);
            return Some(raw);
        }
        if self.left == 0 {
            return None;
        }
        let n = self.left.min(self.chunk_blocks as u64);
        self.left -= n;
        Some(self.stream.next_blocks(n as usize, self.block_size))
    }
}

/// Write the RandomDelta header, drawing `count` deltas from `stream`.
pub fn write_delta_header<W: Write>(
    w: &mut W,
    stream: &mut DeltaStream,
    count: u64,
    block_size: usize,
    chunk_blocks: usize,
) -> io::Result<usize> {
    let mut written = 0;
    for chunk in delta_header_chunks(stream, count, block_size, chunk_blocks) {
        w.write_all(&chunk)?;
        written += chunk.len();
    }
    Ok(written)
}

/// Read the IV block. A short read is a header error; any other I/O failure is passed through.
pub fn read_iv<R: Read + ?Sized>(r: &mut R, block_size: usize) -> Result<Vec<u8>, StreamError> {
    read_header_bytes(r, block_size)
}

pub fn read_delta_count<R: Read + ?Sized>(r: &mut R) -> Result<u64, StreamError> {
    let raw = read_header_bytes(r, DELTA_COUNT_LEN)?;
    Ok(LittleEndian::read_u64(&raw))
}

/// Payload blocks of a RandomDelta file, checked against its header count.
///
/// `file_len` is the full encrypted file length, header included.
pub fn delta_payload_blocks(file_len: u64, count: u64, block_size: usize) -> Result<u64, HeaderError> {
    let need = count
        .checked_mul(block_size as u64)
        .and_then(|d| d.checked_add(DELTA_COUNT_LEN as u64))
        .ok_or(HeaderError::Truncated { need: u64::MAX, have: file_len })?;
    if file_len < need {
        return Err(HeaderError::Truncated { need, have: file_len });
    }
    let payload = file_len - need;
    let payload_blocks = payload / block_size as u64;
    if payload % block_size as u64 != 0 || payload_blocks != count {
        return Err(HeaderError::DeltaCountMismatch { header: count, payload: payload_blocks });
    }
    Ok(payload_blocks)
}

/// Read exactly `len` header bytes.
///
/// EOF before `len` bytes is `HeaderError::Truncated`. `Interrupted` is retried;
/// every other error surfaces as `StreamError::Io`.
pub fn read_header_bytes<R: Read + ?Sized>(r: &mut R, len: usize) -> Result<Vec<u8>, StreamError> {
    let mut buf = vec![0u8; len];
    let mut off = 0;
    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if off < len {
        return Err(HeaderError::Truncated { need: len as u64, have: off as u64 }.into());
    }
    Ok(buf)
}
