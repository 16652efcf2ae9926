use thiserror::Error;

#[derive(Error, Debug)]
pub enum PngCryptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("No modular inverse exists")]
    NoInverse,

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key size: {0} bits. Must be even and at least 16")]
    InvalidKeySize(usize),

    #[error("Invalid key file: {0}")]
    InvalidKeyFile(String),

    #[error("Missing key: {0}")]
    MissingKey(&'static str),

    #[error("Payload too short: {len} bytes is not a whole number of {block}-byte blocks")]
    PayloadTooShort { len: usize, block: usize },

    #[error("Invalid padding: {0}")]
    InvalidPadding(String),

    #[error("Modulus too small to hold a single plaintext byte")]
    ModulusTooSmall,

    #[error("Unsupported block size: {0} bytes. Block mode needs a block size of at most 255")]
    UnsupportedBlockSize(usize),

    #[error("Block value out of range for the key modulus")]
    BlockOutOfRange,

    #[error("Chunk too large: {0} bytes does not fit a u32 length field")]
    ChunkTooLarge(usize),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, PngCryptError>;
