use crate::config::CodecPolicy;
use crate::error::{PngCryptError, Result};
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

/// Compression collaborator wrapped around target chunk payloads.
///
/// Implementations only borrow their input and keep no state between calls.
pub trait PayloadCodec {
    /// Undo the stored encoding. Malformed input is a `Codec` error.
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Re-apply the stored encoding. Does not fail for in-memory buffers.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// zlib streams, as stored in PNG image data
#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    pub level: u32,
}

impl PayloadCodec for ZlibCodec {
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        inflate_zlib(data)
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level.min(9)));
        encoder
            .write_all(data)
            .map_err(|e| PngCryptError::Codec(format!("zlib: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| PngCryptError::Codec(format!("zlib: {}", e)))
    }
}

/// Identity codec for ciphering stored bytes directly
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PayloadCodec for Passthrough {
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// Codec selected by a policy
pub fn codec_for(policy: CodecPolicy, level: u32) -> Box<dyn PayloadCodec> {
    match policy {
        CodecPolicy::Zlib => Box::new(ZlibCodec { level }),
        CodecPolicy::Raw => Box::new(Passthrough),
    }
}

/// Inflate a complete zlib stream. A stream that ends early is an error,
/// not a short result.
fn inflate_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(64));

    loop {
        let consumed = inflater.total_in() as usize;
        let produced = out.len();
        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| PngCryptError::Codec(format!("zlib: {}", e)))?;

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                if out.len() == out.capacity() {
                    out.reserve(out.capacity().max(4096));
                    continue;
                }
                let progressed =
                    inflater.total_in() as usize != consumed || out.len() != produced;
                if !progressed {
                    return Err(PngCryptError::Codec(
                        "zlib: truncated stream".into(),
                    ));
                }
            }
        }
    }
}
