use rand_core::{OsRng, RngCore};

use crate::error::CryptoError;

/// Fills a fixed-size array from the operating system's random source.
///
/// Unlike `fill_bytes`, a failing source is reported instead of panicking, so
/// callers can surface missing entropy as a typed error.
pub fn try_random_bytes_fixed<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
    Ok(buf)
}
