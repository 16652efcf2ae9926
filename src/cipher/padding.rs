use crate::error::{PngCryptError, Result};

/// Largest block size a single pad byte can describe
pub const MAX_PAD_BLOCK: usize = u8::MAX as usize;

/// Append `block_size - len % block_size` bytes, each holding that count.
/// A payload already aligned gains one whole block of padding.
pub fn pad(data: &[u8], block_size: usize) -> Result<Vec<u8>> {
    if block_size == 0 || block_size > MAX_PAD_BLOCK {
        return Err(PngCryptError::UnsupportedBlockSize(block_size));
    }

    let pad_len = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    Ok(padded)
}

/// Strip padding added by [`pad`].
/// Every pad byte is checked, so a wrong-key decryption is reported
/// instead of silently trimming the wrong number of bytes.
pub fn unpad(mut data: Vec<u8>, block_size: usize) -> Result<Vec<u8>> {
    if block_size == 0 || block_size > MAX_PAD_BLOCK {
        return Err(PngCryptError::UnsupportedBlockSize(block_size));
    }
    if data.is_empty() || data.len() % block_size != 0 {
        return Err(PngCryptError::PayloadTooShort {
            len: data.len(),
            block: block_size,
        });
    }

    let pad_len = data[data.len() - 1] as usize;
    if pad_len == 0 || pad_len > block_size || pad_len > data.len() {
        return Err(PngCryptError::InvalidPadding(format!(
            "pad length {} outside 1..={}",
            pad_len, block_size
        )));
    }

    let body_len = data.len() - pad_len;
    if data[body_len..].iter().any(|&b| b as usize != pad_len) {
        return Err(PngCryptError::InvalidPadding(
            "inconsistent pad bytes".into(),
        ));
    }

    data.truncate(body_len);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pad_partial_block() {
        let padded = pad(b"abcde", 4).unwrap();
        assert_eq!(padded, b"abcde\x03\x03\x03");
    }

    #[test]
    fn test_pad_aligned_adds_full_block() {
        let padded = pad(b"abcd", 4).unwrap();
        assert_eq!(padded, b"abcd\x04\x04\x04\x04");
    }

    #[test]
    fn test_pad_empty() {
        assert_eq!(pad(b"", 3).unwrap(), vec![3, 3, 3]);
    }

    #[test]
    fn test_unpad_rejects_bad_count() {
        assert!(matches!(
            unpad(vec![1, 2, 3, 0], 4),
            Err(PngCryptError::InvalidPadding(_))
        ));
        assert!(matches!(
            unpad(vec![1, 2, 3, 9], 4),
            Err(PngCryptError::InvalidPadding(_))
        ));
    }

    #[test]
    fn test_unpad_rejects_mixed_pad_bytes() {
        assert!(matches!(
            unpad(vec![1, 2, 1, 2], 4),
            Err(PngCryptError::InvalidPadding(_))
        ));
    }

    #[test]
    fn test_unpad_rejects_unaligned_or_empty() {
        assert!(matches!(
            unpad(vec![], 4),
            Err(PngCryptError::PayloadTooShort { .. })
        ));
        assert!(matches!(
            unpad(vec![1, 1, 1], 4),
            Err(PngCryptError::PayloadTooShort { .. })
        ));
    }

    #[test]
    fn test_block_size_limits() {
        assert!(pad(b"x", 0).is_err());
        assert!(pad(b"x", 256).is_err());
        assert!(pad(b"x", 255).is_ok());
    }

    proptest! {
        #[test]
        fn prop_pad_unpad_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..512), block in 1usize..=255) {
            let padded = pad(&data, block).unwrap();
            prop_assert_eq!(padded.len() % block, 0);
            prop_assert!(padded.len() > data.len());
            prop_assert!(padded.len() - data.len() <= block);
            prop_assert_eq!(unpad(padded, block).unwrap(), data);
        }
    }
}
