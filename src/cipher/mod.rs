pub mod block;
pub mod counter;
pub mod padding;

pub use block::block_size;
pub use counter::{apply_keystream, keystream};
pub use padding::{pad, unpad, MAX_PAD_BLOCK};

use crate::arith::mod_pow;
use crate::config::CipherMode;
use crate::error::{PngCryptError, Result};
use crate::keys::{KeyPair, PrivateKey, PublicKey};
use num_bigint::BigUint;
use std::fmt;

/// The single primitive both modes are built on
pub fn transform_block(value: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    mod_pow(value, exponent, modulus)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => write!(f, "encrypt"),
            Direction::Decrypt => write!(f, "decrypt"),
        }
    }
}

/// Borrowed key material offered to a pass
#[derive(Debug, Clone, Copy)]
pub enum CipherKey<'a> {
    Public(&'a PublicKey),
    Private(&'a PrivateKey),
    Pair(&'a KeyPair),
}

impl<'a> CipherKey<'a> {
    pub fn public(&self) -> Option<&'a PublicKey> {
        match *self {
            CipherKey::Public(key) => Some(key),
            CipherKey::Pair(pair) => Some(&pair.public),
            CipherKey::Private(_) => None,
        }
    }

    pub fn private(&self) -> Option<&'a PrivateKey> {
        match *self {
            CipherKey::Private(key) => Some(key),
            CipherKey::Pair(pair) => Some(&pair.private),
            CipherKey::Public(_) => None,
        }
    }
}

impl<'a> From<&'a PublicKey> for CipherKey<'a> {
    fn from(key: &'a PublicKey) -> Self {
        CipherKey::Public(key)
    }
}

impl<'a> From<&'a PrivateKey> for CipherKey<'a> {
    fn from(key: &'a PrivateKey) -> Self {
        CipherKey::Private(key)
    }
}

impl<'a> From<&'a KeyPair> for CipherKey<'a> {
    fn from(pair: &'a KeyPair) -> Self {
        CipherKey::Pair(pair)
    }
}

/// Mode, key half and counter for one pass over a container.
///
/// Block mode encrypts with `e` and decrypts with `d`. Counter mode uses `e`
/// in both directions.
#[derive(Debug, Clone)]
pub struct CipherContext<'a> {
    mode: CipherMode,
    direction: Direction,
    exponent: &'a BigUint,
    modulus: &'a BigUint,
    counter: u64,
}

impl<'a> CipherContext<'a> {
    pub fn new(mode: CipherMode, direction: Direction, key: CipherKey<'a>) -> Result<Self> {
        let (exponent, modulus) = match (mode, direction) {
            (CipherMode::Ecb, Direction::Decrypt) => {
                let key = key.private().ok_or(PngCryptError::MissingKey(
                    "block mode decryption needs the private key",
                ))?;
                (&key.d, &key.n)
            }
            _ => {
                let key = key
                    .public()
                    .ok_or(PngCryptError::MissingKey("this mode needs the public key"))?;
                (&key.e, &key.n)
            }
        };

        let block = block_size(modulus)?;
        if mode == CipherMode::Ecb && block > MAX_PAD_BLOCK {
            return Err(PngCryptError::UnsupportedBlockSize(block));
        }

        Ok(Self {
            mode,
            direction,
            exponent,
            modulus,
            counter: 0,
        })
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Counter value the next payload will use
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Move to the next record's counter value
    pub fn advance(&mut self) {
        self.counter += 1;
    }

    /// Transform one payload. Does not touch the counter.
    pub fn apply(&self, payload: &[u8]) -> Result<Vec<u8>> {
        tracing::debug!(
            mode = ?self.mode,
            direction = %self.direction,
            counter = self.counter,
            len = payload.len(),
            "cipher payload"
        );
        match (self.mode, self.direction) {
            (CipherMode::Ecb, Direction::Encrypt) => {
                block::encrypt(payload, self.exponent, self.modulus)
            }
            (CipherMode::Ecb, Direction::Decrypt) => {
                block::decrypt(payload, self.exponent, self.modulus)
            }
            (CipherMode::Ctr, _) => {
                apply_keystream(payload, self.counter, self.exponent, self.modulus)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::test_key_pair;

    #[test]
    fn test_block_mode_context_roundtrip() {
        let keys = test_key_pair();
        let enc = CipherContext::new(CipherMode::Ecb, Direction::Encrypt, (&keys.public).into())
            .unwrap();
        let dec = CipherContext::new(CipherMode::Ecb, Direction::Decrypt, (&keys.private).into())
            .unwrap();

        let data = b"block substitution through the shared context".to_vec();
        let ct = enc.apply(&data).unwrap();
        assert_eq!(dec.apply(&ct).unwrap(), data);
    }

    #[test]
    fn test_block_mode_decrypt_requires_private_key() {
        let keys = test_key_pair();
        let result =
            CipherContext::new(CipherMode::Ecb, Direction::Decrypt, (&keys.public).into());
        assert!(matches!(result, Err(PngCryptError::MissingKey(_))));
    }

    #[test]
    fn test_counter_mode_needs_only_public_key() {
        let keys = test_key_pair();
        let public = CipherKey::Public(&keys.public);
        let mut enc = CipherContext::new(CipherMode::Ctr, Direction::Encrypt, public).unwrap();
        let mut dec = CipherContext::new(CipherMode::Ctr, Direction::Decrypt, public).unwrap();

        let data: Vec<u8> = (0..400).map(|i| (i % 251) as u8).collect();
        enc.advance();
        dec.advance();
        let ct = enc.apply(&data).unwrap();
        assert_eq!(dec.apply(&ct).unwrap(), data);

        let private_only =
            CipherContext::new(CipherMode::Ctr, Direction::Decrypt, (&keys.private).into());
        assert!(matches!(private_only, Err(PngCryptError::MissingKey(_))));
    }

    #[test]
    fn test_counter_changes_keystream() {
        let keys = test_key_pair();
        let mut ctx = CipherContext::new(CipherMode::Ctr, Direction::Encrypt, keys.into()).unwrap();
        let data = vec![0u8; 200];

        ctx.advance();
        let first = ctx.apply(&data).unwrap();
        ctx.advance();
        assert_eq!(ctx.counter(), 2);
        let second = ctx.apply(&data).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_block_mode_rejects_oversized_modulus_up_front() {
        // 2101-bit modulus: 263 bytes wide, 262-byte plaintext blocks
        let n = (BigUint::from(1u32) << 2100u32) + 1u32;
        let key = PublicKey::new(BigUint::from(65_537u32), n).unwrap();

        let result = CipherContext::new(CipherMode::Ecb, Direction::Encrypt, (&key).into());
        assert!(matches!(result, Err(PngCryptError::UnsupportedBlockSize(262))));

        let ctr = CipherContext::new(CipherMode::Ctr, Direction::Encrypt, (&key).into());
        assert!(ctr.is_ok());
    }

    #[test]
    fn test_context_rejects_tiny_modulus() {
        let key = PublicKey::new(BigUint::from(3u32), BigUint::from(33u32)).unwrap();
        let result = CipherContext::new(CipherMode::Ctr, Direction::Encrypt, (&key).into());
        assert!(matches!(result, Err(PngCryptError::ModulusTooSmall)));
    }
}
