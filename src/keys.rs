//! RSA key material: generation, fingerprints and the JSON key file.
//!
//! Keys live in memory as plain `(exponent, modulus)` pairs and are always
//! passed explicitly. The key file is a CLI convenience layered on top.

use crate::arith::{gcd, mod_inverse, random_prime};
use crate::config::ExponentPolicy;
use crate::error::{PngCryptError, Result};
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Fixed public exponent (F4)
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

/// Smallest modulus size that still leaves a one-byte plaintext block
pub const MIN_KEY_BITS: usize = 16;

/// Key file format version
const KEY_FILE_VERSION: u32 = 1;

/// Public half `(e, n)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub e: BigUint,
    pub n: BigUint,
}

/// Private half `(d, n)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pub d: BigUint,
    pub n: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl PublicKey {
    pub fn new(e: BigUint, n: BigUint) -> Result<Self> {
        if e.is_zero() || n <= BigUint::one() {
            return Err(PngCryptError::InvalidKeyFile(
                "public key needs e > 0 and n > 1".into(),
            ));
        }
        Ok(Self { e, n })
    }

    /// Modulus size in bits
    pub fn bits(&self) -> u64 {
        self.n.bits()
    }

    /// Short hex identifier: first 8 bytes of SHA-256(e || n)
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.e.to_bytes_be());
        hasher.update(self.n.to_bytes_be());
        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }
}

impl PrivateKey {
    pub fn new(d: BigUint, n: BigUint) -> Result<Self> {
        if d.is_zero() || n <= BigUint::one() {
            return Err(PngCryptError::InvalidKeyFile(
                "private key needs d > 0 and n > 1".into(),
            ));
        }
        Ok(Self { d, n })
    }
}

/// Generate a key pair from the operating system RNG
pub fn generate_keys(bits: usize, policy: ExponentPolicy) -> Result<KeyPair> {
    generate_keys_with_rng(bits, policy, &mut OsRng)
}

/// Generate a key pair with `bits`-bit modulus from two `bits/2`-bit primes
pub fn generate_keys_with_rng<R: Rng + ?Sized>(
    bits: usize,
    policy: ExponentPolicy,
    rng: &mut R,
) -> Result<KeyPair> {
    if bits < MIN_KEY_BITS || bits % 2 != 0 {
        return Err(PngCryptError::InvalidKeySize(bits));
    }

    let half = bits / 2;
    let p = random_prime(half, rng)?;
    let mut q = random_prime(half, rng)?;
    while q == p {
        q = random_prime(half, rng)?;
    }

    let n = &p * &q;
    let phi = (&p - 1u32) * (&q - 1u32);

    let e = match policy {
        ExponentPolicy::Fixed => BigUint::from(DEFAULT_PUBLIC_EXPONENT),
        ExponentPolicy::Random => random_coprime(&phi, rng),
    };

    let d = mod_inverse(&e, &phi).map_err(|_| {
        PngCryptError::KeyGeneration(format!("public exponent {} is not invertible mod phi", e))
    })?;

    let public = PublicKey { e, n: n.clone() };
    tracing::info!(
        bits = public.bits(),
        fingerprint = %public.fingerprint(),
        "generated key pair"
    );

    Ok(KeyPair {
        public,
        private: PrivateKey { d, n },
    })
}

/// Uniform value in [2, phi - 1] with gcd(value, phi) == 1
fn random_coprime<R: Rng + ?Sized>(phi: &BigUint, rng: &mut R) -> BigUint {
    let low = BigUint::from(2u32);
    loop {
        let candidate = rng.gen_biguint_range(&low, phi);
        if gcd(&candidate, phi).is_one() {
            return candidate;
        }
    }
}

/// On-disk key representation. Integers are big-endian lowercase hex.
/// Public key files leave `d` out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFile {
    pub version: u32,
    pub bits: u64,
    pub e: String,
    pub n: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl KeyFile {
    pub fn from_pair(pair: &KeyPair) -> Self {
        Self {
            d: Some(encode_int(&pair.private.d)),
            ..Self::from_public(&pair.public)
        }
    }

    pub fn from_public(key: &PublicKey) -> Self {
        Self {
            version: KEY_FILE_VERSION,
            bits: key.bits(),
            e: encode_int(&key.e),
            n: encode_int(&key.n),
            d: None,
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        if self.version != KEY_FILE_VERSION {
            return Err(PngCryptError::InvalidKeyFile(format!(
                "unsupported version {}",
                self.version
            )));
        }
        PublicKey::new(decode_int("e", &self.e)?, decode_int("n", &self.n)?)
    }

    /// Private half, if the file carries `d`
    pub fn private_key(&self) -> Result<Option<PrivateKey>> {
        match &self.d {
            Some(d) => {
                let n = decode_int("n", &self.n)?;
                Ok(Some(PrivateKey::new(decode_int("d", d)?, n)?))
            }
            None => Ok(None),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

pub fn read_key_file(path: &Path) -> Result<KeyFile> {
    KeyFile::from_bytes(&std::fs::read(path)?)
}

pub fn write_key_file(path: &Path, key: &KeyFile) -> Result<()> {
    std::fs::write(path, key.to_bytes()?)?;
    Ok(())
}

fn encode_int(value: &BigUint) -> String {
    hex::encode(value.to_bytes_be())
}

fn decode_int(field: &str, text: &str) -> Result<BigUint> {
    let text = text.trim();
    let padded;
    let even = if text.len() % 2 == 1 {
        padded = format!("0{}", text);
        padded.as_str()
    } else {
        text
    };
    let bytes = hex::decode(even)
        .map_err(|e| PngCryptError::InvalidKeyFile(format!("field {}: {}", field, e)))?;
    if bytes.is_empty() {
        return Err(PngCryptError::InvalidKeyFile(format!("field {} is empty", field)));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

/// Shared 512-bit key pair for unit tests
#[cfg(test)]
pub(crate) fn test_key_pair() -> &'static KeyPair {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::OnceLock;

    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        generate_keys_with_rng(512, ExponentPolicy::Fixed, &mut rng).unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::mod_pow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_generated_key_invariants() {
        let keys = test_key_pair();
        assert_eq!(keys.public.n, keys.private.n);
        assert_eq!(keys.public.e, BigUint::from(DEFAULT_PUBLIC_EXPONENT));
        assert_eq!(keys.public.bits(), 512);

        for m in [0u64, 1, 2, 255, 65_536, u64::MAX] {
            let m = BigUint::from(m);
            let c = mod_pow(&m, &keys.public.e, &keys.public.n);
            assert_eq!(mod_pow(&c, &keys.private.d, &keys.private.n), m);
        }
    }

    #[test]
    fn test_modulus_has_requested_bits() {
        let mut rng = StdRng::seed_from_u64(17);
        for bits in [MIN_KEY_BITS, 64, 256] {
            for _ in 0..20 {
                let keys = generate_keys_with_rng(bits, ExponentPolicy::Fixed, &mut rng).unwrap();
                assert_eq!(keys.public.bits(), bits as u64);
            }
        }
    }

    #[test]
    fn test_random_exponent_policy() {
        let mut rng = StdRng::seed_from_u64(99);
        let keys = generate_keys_with_rng(128, ExponentPolicy::Random, &mut rng).unwrap();
        assert!(keys.public.e >= BigUint::from(2u32));
        assert!(keys.public.e < keys.public.n);

        let m = BigUint::from(0xC0FFEEu32);
        let c = mod_pow(&m, &keys.public.e, &keys.public.n);
        assert_eq!(mod_pow(&c, &keys.private.d, &keys.private.n), m);
    }

    #[test]
    fn test_small_keys_still_roundtrip() {
        let mut rng = StdRng::seed_from_u64(3);
        let keys = generate_keys_with_rng(MIN_KEY_BITS, ExponentPolicy::Random, &mut rng).unwrap();
        for m in 0u32..200 {
            let m = BigUint::from(m);
            let c = mod_pow(&m, &keys.public.e, &keys.public.n);
            assert_eq!(mod_pow(&c, &keys.private.d, &keys.private.n), m);
        }
    }

    #[test]
    fn test_invalid_key_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generate_keys_with_rng(8, ExponentPolicy::Fixed, &mut rng),
            Err(PngCryptError::InvalidKeySize(8))
        ));
        assert!(matches!(
            generate_keys_with_rng(513, ExponentPolicy::Fixed, &mut rng),
            Err(PngCryptError::InvalidKeySize(513))
        ));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let keys = test_key_pair();
        let fp = keys.public.fingerprint();
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, keys.public.clone().fingerprint());
    }

    #[test]
    fn test_key_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.key");
        let keys = test_key_pair();

        write_key_file(&path, &KeyFile::from_pair(keys)).unwrap();
        let loaded = read_key_file(&path).unwrap();
        assert_eq!(loaded.public_key().unwrap(), keys.public);
        assert_eq!(loaded.private_key().unwrap().unwrap(), keys.private);
    }

    #[test]
    fn test_public_key_file_has_no_private_half() {
        let keys = test_key_pair();
        let file = KeyFile::from_public(&keys.public);
        let json = String::from_utf8(file.to_bytes().unwrap()).unwrap();
        assert!(!json.contains("\"d\""));
        assert!(file.private_key().unwrap().is_none());
    }

    #[test]
    fn test_key_file_rejects_bad_hex() {
        let file = KeyFile {
            version: 1,
            bits: 16,
            e: "xyz".into(),
            n: "ff01".into(),
            d: None,
        };
        assert!(matches!(
            file.public_key(),
            Err(PngCryptError::InvalidKeyFile(_))
        ));
    }

    #[test]
    fn test_key_file_accepts_odd_length_hex() {
        let file = KeyFile {
            version: 1,
            bits: 12,
            e: "3".into(),
            n: "d0b".into(),
            d: None,
        };
        let key = file.public_key().unwrap();
        assert_eq!(key.e, BigUint::from(3u32));
        assert_eq!(key.n, BigUint::from(0xd0bu32));
    }
}
