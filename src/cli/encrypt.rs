use crate::config::{CipherMode, CodecFailurePolicy, CodecPolicy, TransformOptions};
use crate::error::Result;
use crate::keys::read_key_file;
use crate::transform::{encrypt_png, TransformReport};
use std::path::{Path, PathBuf};

/// Options shared by the encrypt and decrypt commands
#[derive(Debug, Clone)]
pub struct CryptOptions {
    /// Key file written by `keygen`
    pub key: PathBuf,
    pub mode: CipherMode,
    pub codec: CodecPolicy,
    pub level: u32,
    pub on_codec_error: CodecFailurePolicy,
}

impl Default for CryptOptions {
    fn default() -> Self {
        let transform = TransformOptions::default();
        Self {
            key: PathBuf::new(),
            mode: transform.mode,
            codec: transform.codec,
            level: transform.level,
            on_codec_error: transform.on_codec_error,
        }
    }
}

impl CryptOptions {
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            mode: self.mode,
            codec: self.codec,
            level: self.level,
            on_codec_error: self.on_codec_error,
            ..Default::default()
        }
    }
}

/// Encrypt the image data of `input` into `output`.
/// Nothing is written unless the whole pass succeeds.
pub fn encrypt_file(input: &Path, output: &Path, options: &CryptOptions) -> Result<TransformReport> {
    let public = read_key_file(&options.key)?.public_key()?;
    tracing::info!(key = %public.fingerprint(), input = %input.display(), "encrypting");

    let data = std::fs::read(input)?;
    let result = encrypt_png(&data, &public, &options.transform_options())?;
    std::fs::write(output, &result.bytes)?;
    Ok(result.report)
}
