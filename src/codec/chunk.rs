//! Provides low-level chunk reading and writing for the PNG container.
//!
//! A container is an 8-byte signature followed by chunks laid out as
//! `length (u32 BE) | type (4 bytes) | data | crc32 (u32 BE)`.
//! Checksums are written on output but never verified on input.
//!
//! # Examples
//! ```
//! use glimpse_items::codec::chunk::{write_chunk, SIGNATURE};
//!
//! let mut out = SIGNATURE.to_vec();
//! write_chunk(&mut out, *b"IEND", &[]);
//! assert_eq!(out.len(), 8 + 12);
//! ```

use super::{CodecError, RawImage};

/// The 8-byte PNG signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub const IHDR: [u8; 4] = *b"IHDR";
pub const IDAT: [u8; 4] = *b"IDAT";
pub const IEND: [u8; 4] = *b"IEND";
pub const PLTE: [u8; 4] = *b"PLTE";
pub const TRNS: [u8; 4] = *b"tRNS";

/// A single chunk: its four-byte type tag and raw data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub kind: [u8; 4],
    pub data: Vec<u8>,
}

impl Chunk {
    /// Returns the chunk type as text (lossy for non-ASCII tags).
    pub fn kind_str(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }
}

/// Header fields carried by the `IHDR` chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl ImageHeader {
    /// Parses the 13-byte `IHDR` payload.
    pub fn parse(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() != 13 {
            return Err(CodecError::Malformed(format!(
                "IHDR length {} (expected 13)",
                data.len()
            )));
        }
        Ok(Self {
            width: read_u32(&data[0..4]),
            height: read_u32(&data[4..8]),
            bit_depth: data[8],
            color_type: data[9],
            compression_method: data[10],
            filter_method: data[11],
            interlace_method: data[12],
        })
    }

    /// Serializes the header back into a 13-byte `IHDR` payload.
    pub fn to_bytes(&self) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.color_type;
        out[10] = self.compression_method;
        out[11] = self.filter_method;
        out[12] = self.interlace_method;
        out
    }
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Parses a whole container into its header, chunk list, and concatenated
/// image data.
///
/// # Errors
/// Returns [`CodecError::Malformed`] for a bad signature, a chunk running past
/// the end of the buffer, a missing `IHDR`, or a missing `IEND`.
///
/// # Examples
/// ```
/// use glimpse_items::codec::chunk::parse_container;
///
/// assert!(parse_container(b"definitely not a png").is_err());
/// ```
pub fn parse_container(bytes: &[u8]) -> Result<RawImage, CodecError> {
    if bytes.len() < SIGNATURE.len() || bytes[..SIGNATURE.len()] != SIGNATURE {
        return Err(CodecError::Malformed("bad signature".to_string()));
    }

    let mut pos = SIGNATURE.len();
    let mut header: Option<ImageHeader> = None;
    let mut chunks = Vec::new();
    let mut data = Vec::new();
    let mut ended = false;

    while pos < bytes.len() {
        if bytes.len() - pos < 8 {
            return Err(CodecError::Malformed(format!(
                "truncated chunk header at offset {}",
                pos
            )));
        }
        let length = read_u32(&bytes[pos..pos + 4]) as usize;
        let kind = [bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]];
        let body_start = pos + 8;
        let body_end = body_start
            .checked_add(length)
            .filter(|end| end.checked_add(4).is_some_and(|e| e <= bytes.len()))
            .ok_or_else(|| {
                CodecError::Malformed(format!(
                    "chunk {} length {} overruns buffer",
                    String::from_utf8_lossy(&kind),
                    length
                ))
            })?;
        let body = &bytes[body_start..body_end];
        // crc occupies bytes[body_end..body_end + 4]; read past, not verified.
        pos = body_end + 4;

        match kind {
            IHDR => header = Some(ImageHeader::parse(body)?),
            IDAT => data.extend_from_slice(body),
            _ => {}
        }
        chunks.push(Chunk {
            kind,
            data: body.to_vec(),
        });

        if kind == IEND {
            ended = true;
            break;
        }
    }

    let header = header.ok_or_else(|| CodecError::Malformed("missing IHDR".to_string()))?;
    if !ended {
        return Err(CodecError::Malformed("missing IEND".to_string()));
    }

    Ok(RawImage {
        header,
        chunks,
        data,
    })
}

/// Appends one chunk (length, type, data, crc32) to `out`.
pub fn write_chunk(out: &mut Vec<u8>, kind: [u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&kind);
    out.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&kind);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}
