// ## 📂 File: `src/padding/decode.rs`

use tracing::warn;

use crate::padding::types::{check_block_size, PaddingError, PaddingScheme, UnpadPolicy};

/// Strip padding from `padded`.
///
/// Alignment and block-size violations always fail. A marker that does not
/// validate fails under `Strict` and returns the input unchanged under `Lenient`.
pub fn remove(
    scheme: PaddingScheme,
    padded: &[u8],
    block_size: usize,
    policy: UnpadPolicy,
) -> Result<Vec<u8>, PaddingError> {
    check_block_size(block_size)?;
    if padded.len() % block_size != 0 {
        return Err(PaddingError::NotAligned { len: padded.len(), block_size });
    }

    match strip(scheme, padded, block_size) {
        Ok(keep) => Ok(padded[..keep].to_vec()),
        Err(reason) => match policy {
            UnpadPolicy::Strict => Err(PaddingError::Corrupt { scheme, reason }),
            UnpadPolicy::Lenient => {
                warn!(?scheme, reason, len = padded.len(), "padding did not validate; keeping input");
                Ok(padded.to_vec())
            }
        },
    }
}

/// Number of leading bytes to keep, or the reason the marker is invalid.
fn strip(scheme: PaddingScheme, padded: &[u8], block_size: usize) -> Result<usize, &'static str> {
    if scheme == PaddingScheme::Zeros {
        let keep = padded.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        return Ok(keep);
    }

    let last = *padded.last().ok_or("empty input")?;
    let count = match last as usize {
        0 if block_size == 256 => 256,
        n => n,
    };
    if count == 0 || count > block_size || count > padded.len() {
        return Err("pad count out of range");
    }

    let keep = padded.len() - count;
    let body = &padded[keep..padded.len() - 1];
    match scheme {
        PaddingScheme::AnsiX923 if body.iter().any(|&b| b != 0) => Err("non-zero filler byte"),
        PaddingScheme::Pkcs7 if body.iter().any(|&b| b != last) => Err("pad byte differs from count"),
        _ => Ok(keep),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padding::encode::apply;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn full_256_block_count_wraps_to_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        let data = vec![9u8; 256];
        let padded = apply(PaddingScheme::Pkcs7, &data, 256, &mut rng).unwrap();
        assert_eq!(padded.len(), 512);
        assert_eq!(padded[511], 0);
        let back = remove(PaddingScheme::Pkcs7, &padded, 256, UnpadPolicy::Strict).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn zero_count_rejected_below_256() {
        let padded = [1u8, 2, 3, 0];
        let err = remove(PaddingScheme::AnsiX923, &padded, 4, UnpadPolicy::Strict).unwrap_err();
        assert!(matches!(err, PaddingError::Corrupt { .. }));
    }
}
