//! Container transform pipeline.
//!
//! ```text
//! signature → chunk → [target?] decode → cipher → encode → new length + CRC → emit
//!                   → [other]   copy verbatim (stored CRC kept)
//! ```
//!
//! Output is built in memory and only returned once every chunk succeeded,
//! so a malformed container never yields partial output.

use crate::cipher::{CipherContext, CipherKey, Direction};
use crate::codec::{codec_for, PayloadCodec};
use crate::config::{CipherMode, CodecFailurePolicy, TransformOptions};
use crate::error::{PngCryptError, Result};
use crate::keys::PublicKey;
use crate::png::{Chunk, ChunkReader, PNG_SIGNATURE};

/// Counts from one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformReport {
    pub direction: Direction,
    pub mode: CipherMode,
    /// Chunks read, target or not
    pub records: usize,
    /// Target chunks rewritten
    pub transformed: usize,
    /// Target chunks copied through after a decode failure
    pub skipped: usize,
    pub bytes_in: usize,
    pub bytes_out: usize,
}

impl TransformReport {
    fn new(direction: Direction, mode: CipherMode, bytes_in: usize) -> Self {
        Self {
            direction,
            mode,
            records: 0,
            transformed: 0,
            skipped: 0,
            bytes_in,
            bytes_out: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    pub report: TransformReport,
}

/// Encrypt the target chunks of a PNG buffer
pub fn encrypt_png(
    data: &[u8],
    key: &PublicKey,
    options: &TransformOptions,
) -> Result<TransformOutput> {
    transform_png(data, Direction::Encrypt, CipherKey::Public(key), options)
}

/// Decrypt the target chunks of a PNG buffer.
/// Block mode needs the private half, counter mode the public half.
pub fn decrypt_png(
    data: &[u8],
    key: CipherKey<'_>,
    options: &TransformOptions,
) -> Result<TransformOutput> {
    transform_png(data, Direction::Decrypt, key, options)
}

/// Run one pass over `data`. The counter starts at zero and advances once
/// per target chunk, skipped or not, so both directions stay aligned.
pub fn transform_png(
    data: &[u8],
    direction: Direction,
    key: CipherKey<'_>,
    options: &TransformOptions,
) -> Result<TransformOutput> {
    let mut ctx = CipherContext::new(options.mode, direction, key)?;
    let codec = codec_for(options.codec, options.level);
    let mut report = TransformReport::new(ctx.direction(), ctx.mode(), data.len());

    let mut out = Vec::with_capacity(data.len() + data.len() / 8);
    out.extend_from_slice(&PNG_SIGNATURE);

    for (index, raw) in ChunkReader::new(data).enumerate() {
        let raw = raw?;
        report.records += 1;
        tracing::debug!(
            index,
            chunk = %String::from_utf8_lossy(&raw.chunk_type),
            len = raw.data.len(),
            "read chunk"
        );

        if raw.chunk_type != options.target {
            raw.write_to(&mut out);
            continue;
        }

        let decoded = match codec.decode(raw.data) {
            Ok(decoded) => Some(decoded),
            Err(PngCryptError::Codec(reason))
                if options.on_codec_error == CodecFailurePolicy::Skip =>
            {
                tracing::warn!(
                    index,
                    offset = raw.offset,
                    %reason,
                    "payload did not decode, copying chunk through unchanged"
                );
                None
            }
            Err(e) => return Err(e),
        };

        match decoded {
            Some(decoded) => {
                let payload = cipher_payload(&ctx, codec.as_ref(), &decoded)?;
                Chunk::new(raw.chunk_type, payload).write_to(&mut out)?;
                report.transformed += 1;
            }
            None => {
                raw.write_to(&mut out);
                report.skipped += 1;
            }
        }
        ctx.advance();
    }

    report.bytes_out = out.len();
    tracing::info!(
        direction = %report.direction,
        mode = %report.mode,
        records = report.records,
        transformed = report.transformed,
        skipped = report.skipped,
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        "transform pass complete"
    );

    Ok(TransformOutput { bytes: out, report })
}

fn cipher_payload(
    ctx: &CipherContext<'_>,
    codec: &dyn PayloadCodec,
    decoded: &[u8],
) -> Result<Vec<u8>> {
    let ciphered = ctx.apply(decoded)?;
    codec.encode(&ciphered)
}
