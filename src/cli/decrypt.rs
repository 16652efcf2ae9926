use crate::cipher::CipherKey;
use crate::cli::encrypt::CryptOptions;
use crate::error::Result;
use crate::keys::{read_key_file, KeyPair};
use crate::transform::{decrypt_png, TransformReport};
use std::path::Path;

/// Decrypt the image data of `input` into `output`.
/// Block mode needs a `.key` file; counter mode also accepts a `.pub` file.
pub fn decrypt_file(input: &Path, output: &Path, options: &CryptOptions) -> Result<TransformReport> {
    let key_file = read_key_file(&options.key)?;
    let public = key_file.public_key()?;
    let pair = key_file.private_key()?.map(|private| KeyPair {
        public: public.clone(),
        private,
    });
    let key = match &pair {
        Some(pair) => CipherKey::Pair(pair),
        None => CipherKey::Public(&public),
    };
    tracing::info!(key = %public.fingerprint(), input = %input.display(), "decrypting");

    let data = std::fs::read(input)?;
    let result = decrypt_png(&data, key, &options.transform_options())?;
    std::fs::write(output, &result.bytes)?;
    Ok(result.report)
}
