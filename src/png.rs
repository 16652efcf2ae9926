//! PNG container layout: signature followed by length-prefixed chunks.
//!
//! ```text
//! [89 50 4E 47 0D 0A 1A 0A]
//! [length: u32 BE][type: 4][data: length][crc32(type || data): u32 BE] ...
//! ```

use crate::error::{PngCryptError, Result};
use crc32fast::Hasher;

/// Fixed 8-byte PNG signature
pub const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// Terminating chunk type
pub const END_TYPE: [u8; 4] = *b"IEND";

/// Length, type and CRC fields around every chunk payload
pub const CHUNK_OVERHEAD: usize = 12;

/// One chunk. `crc` is whatever was stored (or computed by [`Chunk::new`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_type: [u8; 4],
    pub data: Vec<u8>,
    pub crc: u32,
}

impl Chunk {
    /// Build a chunk with a freshly computed CRC
    pub fn new(chunk_type: [u8; 4], data: Vec<u8>) -> Self {
        let crc = chunk_crc(&chunk_type, &data);
        Self {
            chunk_type,
            data,
            crc,
        }
    }

    /// Type tag as text, lossy for non-ASCII tags
    pub fn type_name(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).into_owned()
    }

    pub fn crc_is_valid(&self) -> bool {
        self.crc == chunk_crc(&self.chunk_type, &self.data)
    }

    /// Bytes this chunk occupies in the file
    pub fn encoded_len(&self) -> usize {
        CHUNK_OVERHEAD + self.data.len()
    }

    /// Append the chunk in file layout. Fails if the payload outgrew a u32.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = u32::try_from(self.data.len())
            .map_err(|_| PngCryptError::ChunkTooLarge(self.data.len()))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.chunk_type);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.crc.to_be_bytes());
        Ok(())
    }
}

/// CRC-32 over type tag and payload
pub fn chunk_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

/// A parsed container: the signature is implied, chunks keep file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PngFile {
    pub chunks: Vec<Chunk>,
}

impl PngFile {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    /// Serialize signature and chunks
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let size = PNG_SIGNATURE.len() + self.chunks.iter().map(Chunk::encoded_len).sum::<usize>();
        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&PNG_SIGNATURE);
        for chunk in &self.chunks {
            chunk.write_to(&mut out)?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    ExpectSignature,
    ReadHeader,
    ReadPayload { len: usize, chunk_type: [u8; 4] },
    Done,
}

/// Walks a container buffer chunk by chunk without copying it.
///
/// Yields `Err(MalformedContainer)` once and then stops if the signature is
/// wrong or a header promises more bytes than remain.
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    state: ReadState,
    seen_end: bool,
}

/// A chunk borrowed from the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// Offset of the length field in the input
    pub offset: usize,
    pub chunk_type: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl<'a> RawChunk<'a> {
    pub fn to_chunk(&self) -> Chunk {
        Chunk {
            chunk_type: self.chunk_type,
            data: self.data.to_vec(),
            crc: self.crc,
        }
    }

    /// Re-emit exactly the bytes this chunk was read from
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.chunk_type);
        out.extend_from_slice(self.data);
        out.extend_from_slice(&self.crc.to_be_bytes());
    }
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            state: ReadState::ExpectSignature,
            seen_end: false,
        }
    }

    fn reject(&mut self, reason: String) -> Option<Result<RawChunk<'a>>> {
        self.state = ReadState::Done;
        Some(Err(PngCryptError::MalformedContainer(reason)))
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<RawChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                ReadState::Done => return None,
                ReadState::ExpectSignature => {
                    if !self.data.starts_with(&PNG_SIGNATURE) {
                        return self.reject("missing PNG signature".into());
                    }
                    self.pos = PNG_SIGNATURE.len();
                    self.state = ReadState::ReadHeader;
                }
                ReadState::ReadHeader => {
                    if self.remaining() == 0 {
                        self.state = ReadState::Done;
                        return None;
                    }
                    if self.remaining() < 8 {
                        let reason = format!(
                            "truncated chunk header at offset {} ({} bytes left)",
                            self.pos,
                            self.remaining()
                        );
                        return self.reject(reason);
                    }
                    let header = &self.data[self.pos..self.pos + 8];
                    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
                    let chunk_type = [header[4], header[5], header[6], header[7]];
                    self.state = ReadState::ReadPayload {
                        len: len as usize,
                        chunk_type,
                    };
                }
                ReadState::ReadPayload { len, chunk_type } => {
                    let offset = self.pos;
                    let available = self.remaining() - 8;
                    if len > available || available - len < 4 {
                        let reason = format!(
                            "chunk {} at offset {} declares {} bytes but only {} remain",
                            String::from_utf8_lossy(&chunk_type),
                            offset,
                            len,
                            available.saturating_sub(4)
                        );
                        return self.reject(reason);
                    }
                    let start = offset + 8;
                    let data = &self.data[start..start + len];
                    let crc_at = start + len;
                    let crc = u32::from_be_bytes([
                        self.data[crc_at],
                        self.data[crc_at + 1],
                        self.data[crc_at + 2],
                        self.data[crc_at + 3],
                    ]);
                    self.pos = crc_at + 4;
                    self.state = ReadState::ReadHeader;

                    if self.seen_end {
                        tracing::warn!(
                            chunk = %String::from_utf8_lossy(&chunk_type),
                            offset,
                            "chunk found after IEND"
                        );
                    }
                    if chunk_type == END_TYPE {
                        self.seen_end = true;
                    }

                    return Some(Ok(RawChunk {
                        offset,
                        chunk_type,
                        data,
                        crc,
                    }));
                }
            }
        }
    }
}

/// Parse a whole container. Any malformed chunk rejects the whole buffer.
pub fn parse_png(data: &[u8]) -> Result<PngFile> {
    let chunks = ChunkReader::new(data)
        .map(|raw| raw.map(|c| c.to_chunk()))
        .collect::<Result<Vec<_>>>()?;
    Ok(PngFile { chunks })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PngFile {
        PngFile::new(vec![
            Chunk::new(*b"IHDR", vec![0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]),
            Chunk::new(*b"IDAT", vec![1, 2, 3, 4, 5]),
            Chunk::new(END_TYPE, Vec::new()),
        ])
    }

    #[test]
    fn test_known_crc() {
        // CRC of an empty IEND chunk is fixed by the format
        assert_eq!(chunk_crc(&END_TYPE, &[]), 0xAE42_6082);
    }

    #[test]
    fn test_serialize_parse_roundtrip() {
        let png = sample();
        let bytes = png.to_bytes().unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        assert_eq!(bytes.len(), 8 + 12 * 3 + 13 + 5);

        let parsed = parse_png(&bytes).unwrap();
        assert_eq!(parsed, png);
        assert!(parsed.chunks.iter().all(Chunk::crc_is_valid));
        assert_eq!(parsed.chunks[2].chunk_type, END_TYPE);
    }

    #[test]
    fn test_layout_is_big_endian() {
        let mut out = Vec::new();
        Chunk::new(*b"tEXt", vec![0xAA; 258]).write_to(&mut out).unwrap();
        assert_eq!(&out[..4], &[0, 0, 1, 2]);
        assert_eq!(&out[4..8], b"tEXt");
        let crc = chunk_crc(b"tEXt", &[0xAA; 258]);
        assert_eq!(&out[out.len() - 4..], &crc.to_be_bytes());
    }

    #[test]
    fn test_bad_signature_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[1] = b'X';
        assert!(matches!(
            parse_png(&bytes),
            Err(PngCryptError::MalformedContainer(_))
        ));
        assert!(parse_png(b"").is_err());
    }

    #[test]
    fn test_overrunning_length_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        // IDAT length field sits after signature + IHDR chunk
        let idat_len_at = 8 + 12 + 13;
        bytes[idat_len_at..idat_len_at + 4].copy_from_slice(&0xFFFF_FF00u32.to_be_bytes());
        assert!(matches!(
            parse_png(&bytes),
            Err(PngCryptError::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_truncated_header_and_crc_rejected() {
        let bytes = sample().to_bytes().unwrap();
        // Cut inside the final chunk's CRC
        assert!(parse_png(&bytes[..bytes.len() - 2]).is_err());
        // Leave a dangling partial header
        let mut dangling = bytes.clone();
        dangling.extend_from_slice(&[0, 0, 0]);
        assert!(parse_png(&dangling).is_err());
    }

    #[test]
    fn test_signature_only_is_empty_container() {
        let parsed = parse_png(&PNG_SIGNATURE).unwrap();
        assert!(parsed.chunks.is_empty());
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = ChunkReader::new(b"not a png");
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_stored_crc_kept_verbatim() {
        let mut png = sample();
        png.chunks[0].crc ^= 1;
        let parsed = parse_png(&png.to_bytes().unwrap()).unwrap();
        assert!(!parsed.chunks[0].crc_is_valid());
        assert_eq!(parsed.chunks[0].crc, png.chunks[0].crc);
    }
}
