//! Block-substitution mode.
//!
//! Plaintext is padded to `block_size = byte_length(n) - 1` bytes per block
//! so every block value stays below `n`. Ciphertext blocks are a full
//! `byte_length(n)` bytes wide because `c` can be anywhere in `[0, n)`.
//! Identical plaintext blocks encrypt to identical ciphertext blocks.

use crate::arith::{byte_length, to_fixed_be};
use crate::cipher::padding::{pad, unpad};
use crate::cipher::transform_block;
use crate::error::{PngCryptError, Result};
use num_bigint::BigUint;

/// Plaintext block width for modulus `n`
pub fn block_size(n: &BigUint) -> Result<usize> {
    match byte_length(n) {
        0 | 1 => Err(PngCryptError::ModulusTooSmall),
        width => Ok(width - 1),
    }
}

/// Pad, split and raise each block to `e` mod `n`
pub fn encrypt(data: &[u8], e: &BigUint, n: &BigUint) -> Result<Vec<u8>> {
    let block = block_size(n)?;
    let padded = pad(data, block)?;
    substitute(&padded, block, byte_length(n), e, n)
}

/// Raise each ciphertext block to `d` mod `n`, rejoin and strip padding
pub fn decrypt(data: &[u8], d: &BigUint, n: &BigUint) -> Result<Vec<u8>> {
    let block = block_size(n)?;
    let width = byte_length(n);
    if data.is_empty() || data.len() % width != 0 {
        return Err(PngCryptError::PayloadTooShort {
            len: data.len(),
            block: width,
        });
    }
    let plain = substitute(data, width, block, d, n)?;
    unpad(plain, block)
}

/// Map every `in_width`-byte block through the primitive into `out_width` bytes.
/// `data.len()` must be a multiple of `in_width`.
fn substitute(
    data: &[u8],
    in_width: usize,
    out_width: usize,
    exponent: &BigUint,
    n: &BigUint,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / in_width * out_width);

    for chunk in data.chunks(in_width) {
        let value = BigUint::from_bytes_be(chunk);
        if &value >= n {
            return Err(PngCryptError::BlockOutOfRange);
        }
        let mapped = transform_block(&value, exponent, n);
        let bytes = to_fixed_be(&mapped, out_width).ok_or(PngCryptError::BlockOutOfRange)?;
        out.extend_from_slice(&bytes);
    }

    Ok(out)
}
