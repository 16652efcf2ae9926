//! Counter mode.
//!
//! Keystream block `k` for a record whose counter is `c` is
//! `(c + k)^e mod n`, written as `byte_length(n)` big-endian bytes. The
//! payload is XORed with the keystream truncated to its length, so the
//! same function both encrypts and decrypts and only the public half of
//! the key is involved.

use crate::arith::{byte_length, to_fixed_be};
use crate::cipher::block::block_size;
use crate::cipher::transform_block;
use crate::error::{PngCryptError, Result};
use num_bigint::BigUint;

/// Generate exactly `len` keystream bytes starting at `counter`
pub fn keystream(counter: u64, len: usize, e: &BigUint, n: &BigUint) -> Result<Vec<u8>> {
    block_size(n)?;
    let width = byte_length(n);
    let mut stream = Vec::with_capacity(len + width);
    let mut value = BigUint::from(counter);

    while stream.len() < len {
        let encrypted = transform_block(&value, e, n);
        let bytes = to_fixed_be(&encrypted, width).ok_or(PngCryptError::BlockOutOfRange)?;
        stream.extend_from_slice(&bytes);
        value += 1u32;
    }

    stream.truncate(len);
    Ok(stream)
}

/// XOR `data` with the keystream for `counter`
pub fn apply_keystream(data: &[u8], counter: u64, e: &BigUint, n: &BigUint) -> Result<Vec<u8>> {
    let stream = keystream(counter, data.len(), e, n)?;
    Ok(data.iter().zip(stream.iter()).map(|(a, b)| a ^ b).collect())
}
