use crate::error::{PngCryptError, Result};
use serde::{Deserialize, Serialize};

/// Cipher mode applied to target chunk payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// Independent block substitution, no chaining
    #[default]
    Ecb,
    /// Keystream from encrypted counter values, XORed onto the payload
    Ctr,
}

impl std::str::FromStr for CipherMode {
    type Err = PngCryptError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ecb" | "block" => Ok(Self::Ecb),
            "ctr" | "counter" => Ok(Self::Ctr),
            _ => Err(PngCryptError::UnsupportedAlgorithm(format!("mode: {}", s))),
        }
    }
}

impl std::fmt::Display for CipherMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ecb => write!(f, "ecb"),
            Self::Ctr => write!(f, "ctr"),
        }
    }
}

/// Whether the payload is inflated before the cipher and deflated after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodecPolicy {
    /// Decode the zlib stream, cipher the raw image bytes, re-encode
    #[default]
    Zlib,
    /// Cipher the stored chunk bytes as they are
    Raw,
}

impl std::str::FromStr for CodecPolicy {
    type Err = PngCryptError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "zlib" => Ok(Self::Zlib),
            "raw" | "none" => Ok(Self::Raw),
            _ => Err(PngCryptError::UnsupportedAlgorithm(format!("codec: {}", s))),
        }
    }
}

/// What to do with a target chunk whose payload fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodecFailurePolicy {
    /// Fail the whole pass
    #[default]
    Abort,
    /// Copy the chunk through unchanged and log a warning
    Skip,
}

impl std::str::FromStr for CodecFailurePolicy {
    type Err = PngCryptError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            _ => Err(PngCryptError::UnsupportedAlgorithm(format!(
                "codec failure policy: {}",
                s
            ))),
        }
    }
}

/// How the public exponent is chosen during key generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExponentPolicy {
    /// e = 65537
    #[default]
    Fixed,
    /// e drawn uniformly from [2, phi - 1] until coprime to phi
    Random,
}

impl std::str::FromStr for ExponentPolicy {
    type Err = PngCryptError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fixed" | "65537" => Ok(Self::Fixed),
            "random" => Ok(Self::Random),
            _ => Err(PngCryptError::UnsupportedAlgorithm(format!("exponent: {}", s))),
        }
    }
}

/// Chunk type whose payload carries the compressed image data
pub const IMAGE_DATA_TYPE: [u8; 4] = *b"IDAT";

/// Default zlib level, same as `zlib.compress` with no level argument
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Options for one encrypt or decrypt pass over a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub mode: CipherMode,
    pub codec: CodecPolicy,
    /// zlib level (0-9) used when re-encoding
    pub level: u32,
    pub on_codec_error: CodecFailurePolicy,
    /// Chunk type selected for the transform
    pub target: [u8; 4],
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            mode: CipherMode::default(),
            codec: CodecPolicy::default(),
            level: DEFAULT_COMPRESSION_LEVEL,
            on_codec_error: CodecFailurePolicy::default(),
            target: IMAGE_DATA_TYPE,
        }
    }
}
