// ## 📂 File: `src/utils.rs`

//! Bit-buffer helpers shared by padding, modes and the streaming engine.
//!
//! Everything here operates on plain byte slices. Block-size agreement is the
//! caller's contract; the helpers check it with `debug_assert!` only where a
//! mismatch would be a bug in this crate rather than bad input.

use crate::constants::{ALLOWED_CHUNK_BLOCKS, MAX_CHUNK_BYTES};

/// XOR `mask` into `dst` in place.
#[inline]
pub fn xor_in_place(dst: &mut [u8], mask: &[u8]) {
    debug_assert_eq!(dst.len(), mask.len(), "xor_in_place length mismatch");
    for (d, m) in dst.iter_mut().zip(mask) {
        *d ^= *m;
    }
}

/// Add `delta` to a big-endian counter occupying the whole block, wrapping on overflow.
///
/// The counter may be any width; `delta` is folded in from the least significant byte.
pub fn add_to_counter(counter: &mut [u8], delta: u64) {
    let mut carry = delta as u128;
    for byte in counter.iter_mut().rev() {
        if carry == 0 {
            break;
        }
        let sum = *byte as u128 + (carry & 0xFF);
        *byte = sum as u8;
        carry = (carry >> 8) + (sum >> 8);
    }
}

/// Snap a requested chunk size (in blocks) to the nearest allowed value at or above it,
/// then clamp so one chunk never exceeds `MAX_CHUNK_BYTES`.
pub fn best_chunk_blocks(requested: usize, block_size: usize) -> usize {
    let max_blocks = (MAX_CHUNK_BYTES / block_size.max(1)).max(1);

    let snapped = ALLOWED_CHUNK_BLOCKS
        .iter()
        .copied()
        .find(|&allowed| requested <= allowed)
        .unwrap_or(requested);

    snapped.clamp(1, max_blocks)
}

/// Short hex preview for log lines.
pub fn hex_preview(bytes: &[u8]) -> String {
    const PREVIEW: usize = 8;
    if bytes.len() <= PREVIEW {
        hex::encode(bytes)
    } else {
        format!("{}..", hex::encode(&bytes[..PREVIEW]))
    }
}
