//! pngcrypt - RSA encryption of PNG image data
//!
//! Rewrites a PNG in place: every `IDAT` chunk is inflated, run through an
//! RSA-based cipher mode, deflated again and given a fresh length and CRC.
//! All other chunks are copied byte for byte, so the result is still a
//! well-formed PNG whose pixels are scrambled.
//!
//! ## Transform Pipeline
//!
//! ```text
//! Input → Split chunks → [IDAT] Inflate → Cipher → Deflate → Length + CRC → Output
//! ```
//!
//! - **Block mode (ECB)**: PKCS#7-padded blocks of `byte_length(n) - 1`
//!   bytes, each raised to `e` (or `d`) mod `n`
//! - **Counter mode (CTR)**: keystream of `(counter + k)^e mod n` blocks
//!   XORed onto the payload; the counter advances once per `IDAT` chunk
//!
//! This is textbook RSA with no hybrid construction. It demonstrates the
//! modes; it does not protect anything.
//!
//! ## Example
//!
//! ```no_run
//! use pngcrypt::cipher::CipherKey;
//! use pngcrypt::config::{CipherMode, ExponentPolicy, TransformOptions};
//! use pngcrypt::keys::generate_keys;
//! use pngcrypt::transform::{decrypt_png, encrypt_png};
//!
//! let keys = generate_keys(1024, ExponentPolicy::Fixed).unwrap();
//! let options = TransformOptions {
//!     mode: CipherMode::Ctr,
//!     ..Default::default()
//! };
//!
//! let original = std::fs::read("image.png").unwrap();
//! let encrypted = encrypt_png(&original, &keys.public, &options).unwrap();
//! let decrypted = decrypt_png(&encrypted.bytes, CipherKey::Public(&keys.public), &options).unwrap();
//! std::fs::write("roundtrip.png", decrypted.bytes).unwrap();
//! ```

pub mod arith;
pub mod cipher;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod png;
pub mod transform;

pub use error::{PngCryptError, Result};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use png::{parse_png, Chunk, PngFile};
pub use transform::{decrypt_png, encrypt_png, transform_png, TransformOutput, TransformReport};
