// ## 📂 File: `src/padding/encode.rs`

use crate::padding::types::{check_block_size, PaddingError, PaddingScheme};
use crate::random::RandomSource;

/// Bytes to append to `data_len` bytes of input.
///
/// Zeros adds nothing to aligned non-empty input and pads empty input to one
/// full block. Marker schemes always add `1..=block_size` bytes.
pub fn pad_suffix(
    scheme: PaddingScheme,
    data_len: usize,
    block_size: usize,
    rng: &mut dyn RandomSource,
) -> Result<Vec<u8>, PaddingError> {
    check_block_size(block_size)?;
    let rem = data_len % block_size;

    if scheme == PaddingScheme::Zeros {
        let n = if data_len == 0 {
            block_size
        } else if rem == 0 {
            0
        } else {
            block_size - rem
        };
        return Ok(vec![0u8; n]);
    }

    let n = block_size - rem;
    // 256 truncates to 0x00; decode maps it back.
    let count_byte = n as u8;
    let mut suffix = vec![0u8; n];
    match scheme {
        PaddingScheme::Pkcs7 => suffix.fill(count_byte),
        PaddingScheme::Iso10126 => rng.fill(&mut suffix[..n - 1]),
        _ => {}
    }
    suffix[n - 1] = count_byte;
    Ok(suffix)
}

/// Length of the padded output for `data_len` bytes of input.
pub fn padded_len(scheme: PaddingScheme, data_len: usize, block_size: usize) -> Result<usize, PaddingError> {
    check_block_size(block_size)?;
    let rem = data_len % block_size;
    let added = match scheme {
        PaddingScheme::Zeros if data_len == 0 => block_size,
        PaddingScheme::Zeros if rem == 0 => 0,
        _ => block_size - rem,
    };
    Ok(data_len + added)
}

/// Pad `data` to a multiple of `block_size`.
pub fn apply(
    scheme: PaddingScheme,
    data: &[u8],
    block_size: usize,
    rng: &mut dyn RandomSource,
) -> Result<Vec<u8>, PaddingError> {
    let suffix = pad_suffix(scheme, data.len(), block_size, rng)?;
    let mut out = Vec::with_capacity(data.len() + suffix.len());
    out.extend_from_slice(data);
    out.extend_from_slice(&suffix);
    Ok(out)
}
