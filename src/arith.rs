//! Unbounded integer arithmetic for the RSA primitive.
//!
//! Everything here works on [`BigUint`]; signed values only appear inside
//! the extended Euclidean algorithm.

use crate::error::{PngCryptError, Result};
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

/// Miller-Rabin rounds used by [`random_prime`]. Error bound is 4^-40.
pub const MILLER_RABIN_ROUNDS: usize = 40;

const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97,
];

/// Compute `base^exponent mod modulus` by left-to-right square-and-multiply.
///
/// A modulus of zero or one yields zero.
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    if modulus <= &BigUint::one() {
        return BigUint::zero();
    }

    let base = base % modulus;
    let mut result = BigUint::one();

    for i in (0..exponent.bits()).rev() {
        result = (&result * &result) % modulus;
        if exponent.bit(i) {
            result = (&result * &base) % modulus;
        }
    }

    result
}

/// Greatest common divisor
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

/// Modular inverse of `a` modulo `m` via the extended Euclidean algorithm
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    if m.is_zero() {
        return Err(PngCryptError::NoInverse);
    }

    let modulus = BigInt::from(m.clone());
    let (mut old_r, mut r) = (BigInt::from(a % m), modulus.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return Err(PngCryptError::NoInverse);
    }

    old_s
        .mod_floor(&modulus)
        .to_biguint()
        .ok_or(PngCryptError::NoInverse)
}

/// Miller-Rabin probable-prime test with `rounds` random witnesses.
/// Values up to 97 are decided exactly by trial division.
pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    for &p in SMALL_PRIMES.iter() {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }
    if *n < BigUint::from(2u32) {
        return false;
    }

    // n - 1 = d * 2^s with d odd
    let one = BigUint::one();
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;
    let two = BigUint::from(2u32);
    let upper = n - &one;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &upper);
        let mut x = mod_pow(&a, &d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Draw a random prime with exactly `bit_length` bits.
/// The top two bits are set, so the product of two such primes has exactly
/// twice as many bits.
pub fn random_prime<R: Rng + ?Sized>(bit_length: usize, rng: &mut R) -> Result<BigUint> {
    if bit_length < 2 {
        return Err(PngCryptError::KeyGeneration(format!(
            "cannot draw a {}-bit prime",
            bit_length
        )));
    }

    let top = (bit_length - 1) as u64;
    loop {
        let mut candidate = rng.gen_biguint(bit_length as u64);
        candidate.set_bit(top, true);
        candidate.set_bit(top - 1, true);
        candidate.set_bit(0, true);
        if is_probable_prime(&candidate, MILLER_RABIN_ROUNDS, rng) {
            return Ok(candidate);
        }
    }
}

/// Number of bytes needed to hold any value below `n`
pub fn byte_length(n: &BigUint) -> usize {
    ((n.bits() + 7) / 8) as usize
}

/// Big-endian encoding left-padded to exactly `width` bytes.
/// Returns `None` when the value needs more than `width` bytes.
pub fn to_fixed_be(value: &BigUint, width: usize) -> Option<Vec<u8>> {
    if value.is_zero() {
        return Some(vec![0u8; width]);
    }
    let bytes = value.to_bytes_be();
    if bytes.len() > width {
        return None;
    }
    let mut out = vec![0u8; width - bytes.len()];
    out.extend_from_slice(&bytes);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_mod_pow_small() {
        assert_eq!(mod_pow(&big(3), &big(5), &big(7)), big(5));
        assert_eq!(mod_pow(&big(4), &big(13), &big(497)), big(445));
    }

    #[test]
    fn test_mod_pow_zero_exponent() {
        assert_eq!(mod_pow(&big(123), &big(0), &big(11)), big(1));
        assert_eq!(mod_pow(&big(0), &big(0), &big(11)), big(1));
    }

    #[test]
    fn test_mod_pow_large_base() {
        let base = BigUint::from(u64::MAX) * BigUint::from(u64::MAX) + 17u32;
        let modulus = big(1_000_003);
        let expected = base.modpow(&big(65537), &modulus);
        assert_eq!(mod_pow(&base, &big(65537), &modulus), expected);
    }

    #[test]
    fn test_mod_pow_trivial_modulus() {
        assert_eq!(mod_pow(&big(5), &big(3), &big(1)), big(0));
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(mod_inverse(&big(3), &big(11)).unwrap(), big(4));
        assert_eq!(mod_inverse(&big(17), &big(3120)).unwrap(), big(2753));
        let inv = mod_inverse(&big(65537), &big(3_233_160)).unwrap();
        assert_eq!((inv * big(65537)) % big(3_233_160), big(1));
    }

    #[test]
    fn test_mod_inverse_not_coprime() {
        assert!(matches!(
            mod_inverse(&big(6), &big(9)),
            Err(PngCryptError::NoInverse)
        ));
        assert!(matches!(
            mod_inverse(&big(0), &big(9)),
            Err(PngCryptError::NoInverse)
        ));
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(&big(48), &big(18)), big(6));
        assert_eq!(gcd(&big(17), &big(5)), big(1));
    }

    #[test]
    fn test_is_probable_prime() {
        let mut rng = StdRng::seed_from_u64(7);
        for p in [2u64, 3, 5, 97, 101, 7919, 1_000_003, 2_147_483_647] {
            assert!(is_probable_prime(&big(p), 20, &mut rng), "{} is prime", p);
        }
        // 561 and 41041 are Carmichael numbers
        for c in [0u64, 1, 4, 100, 561, 41041, 1_000_001] {
            assert!(!is_probable_prime(&big(c), 20, &mut rng), "{} is composite", c);
        }
    }

    #[test]
    fn test_random_prime_bit_length() {
        let mut rng = StdRng::seed_from_u64(42);
        for bits in [8usize, 16, 64, 128] {
            let p = random_prime(bits, &mut rng).unwrap();
            assert_eq!(p.bits(), bits as u64);
            assert!(p.bit(bits as u64 - 2));
            assert!(p.bit(0));
        }
    }

    #[test]
    fn test_random_prime_rejects_tiny_lengths() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_prime(1, &mut rng).is_err());
    }

    #[test]
    fn test_fixed_width_encoding() {
        assert_eq!(to_fixed_be(&big(0), 3).unwrap(), vec![0, 0, 0]);
        assert_eq!(to_fixed_be(&big(0x0102), 4).unwrap(), vec![0, 0, 1, 2]);
        assert!(to_fixed_be(&big(0x010203), 2).is_none());
        assert_eq!(byte_length(&big(255)), 1);
        assert_eq!(byte_length(&big(256)), 2);
    }
}
