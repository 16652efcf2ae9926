use crate::config::ExponentPolicy;
use crate::error::Result;
use crate::keys::{generate_keys, write_key_file, KeyFile};
use std::path::{Path, PathBuf};

/// Options for the keygen command
#[derive(Debug, Clone)]
pub struct KeygenOptions {
    /// Modulus size in bits
    pub bits: usize,
    pub exponent: ExponentPolicy,
}

impl Default for KeygenOptions {
    fn default() -> Self {
        Self {
            bits: 1024,
            exponent: ExponentPolicy::default(),
        }
    }
}

/// Where the key halves were written
#[derive(Debug, Clone)]
pub struct KeygenSummary {
    pub private_path: PathBuf,
    pub public_path: PathBuf,
    pub bits: u64,
    pub fingerprint: String,
}

/// `<stem>.key` holds the full pair, `<stem>.pub` only `(e, n)`
pub fn key_paths(stem: &Path) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut os = stem.as_os_str().to_os_string();
        os.push(suffix);
        PathBuf::from(os)
    };
    (with_suffix(".key"), with_suffix(".pub"))
}

/// Generate a key pair and write both key files
pub fn generate_key_files(stem: &Path, options: &KeygenOptions) -> Result<KeygenSummary> {
    let pair = generate_keys(options.bits, options.exponent)?;
    let (private_path, public_path) = key_paths(stem);

    write_key_file(&private_path, &KeyFile::from_pair(&pair))?;
    write_key_file(&public_path, &KeyFile::from_public(&pair.public))?;

    Ok(KeygenSummary {
        private_path,
        public_path,
        bits: pair.public.bits(),
        fingerprint: pair.public.fingerprint(),
    })
}
