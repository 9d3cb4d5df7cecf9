//! Provides a self-contained PNG codec for item textures.
//!
//! Decoding handles the color types and bit depths the asset pipeline
//! emits (gray, gray+alpha, truecolor, truecolor+alpha, palette) with all
//! five scanline filters. Encoding always writes 8-bit RGBA with filter
//! type None in a single `IDAT` chunk. Only deflate itself comes from a
//! library (`flate2`).
//!
//! # Examples
//! ```
//! use glimpse_items::codec::{self, RgbaImage};
//!
//! let image = RgbaImage::from_raw(1, 1, vec![255, 0, 0, 255]).unwrap();
//! let png = codec::encode_rgba(&image).unwrap();
//! assert_eq!(codec::decode(&png).unwrap(), image);
//! ```

pub mod chunk;
pub mod filter;
pub mod pixels;

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

use self::chunk::{write_chunk, Chunk, ImageHeader, IDAT, IEND, IHDR, PLTE, SIGNATURE, TRNS};
use self::pixels::{RowLayout, COLOR_RGBA};

/// Errors produced while decoding or encoding images.
///
/// # Examples
/// ```
/// use glimpse_items::codec::CodecError;
///
/// let err = CodecError::Unsupported("interlace method 1".to_string());
/// assert_eq!(err.to_string(), "Unsupported image format: interlace method 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A structurally valid container using an unhandled combination.
    #[error("Unsupported image format: {0}")]
    Unsupported(String),
    /// Truncated or corrupt data.
    #[error("Malformed image data: {0}")]
    Malformed(String),
    /// An in-memory image whose buffer does not match its dimensions.
    #[error("Invalid image buffer: {0}")]
    InvalidImage(String),
}

/// A parsed container: header, every chunk in file order, and the
/// concatenated `IDAT` payload (still compressed).
#[derive(Clone, Debug)]
pub struct RawImage {
    pub header: ImageHeader,
    pub chunks: Vec<Chunk>,
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Returns the data of the first chunk with the given type.
    pub fn chunk(&self, kind: [u8; 4]) -> Option<&[u8]> {
        self.chunks
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.data.as_slice())
    }

    /// Inflates and unfilters the image data into bare rows.
    ///
    /// # Errors
    /// Returns an error for unsupported headers, bad zlib streams, or short
    /// or badly filtered scanline data.
    pub fn scanlines(&self) -> Result<(RowLayout, Vec<u8>), CodecError> {
        let layout = RowLayout::for_header(&self.header)?;
        let inflated = inflate(&self.data)?;
        let rows = filter::unfilter(
            &inflated,
            layout.stride,
            layout.bpp,
            self.header.height as usize,
        )?;
        Ok((layout, rows))
    }
}

/// An 8-bit straight-alpha RGBA image stored row-major.
///
/// # Examples
/// ```
/// use glimpse_items::codec::RgbaImage;
///
/// let image = RgbaImage::new(2, 2);
/// assert_eq!(image.pixel(1, 1), [0, 0, 0, 0]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Creates a fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wraps an existing buffer, returning None if its length is wrong.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Returns the pixel at (x, y). Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Decodes a PNG buffer to RGBA.
///
/// # Errors
/// See [`decode_raw`].
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, CodecError> {
    let raw = chunk::parse_container(bytes)?;
    decode_raw(&raw)
}

/// Decodes an already-parsed container to RGBA.
///
/// # Errors
/// Returns [`CodecError::Unsupported`] for headers outside the supported
/// set and [`CodecError::Malformed`] for corrupt data.
pub fn decode_raw(raw: &RawImage) -> Result<RgbaImage, CodecError> {
    let (layout, rows) = raw.scanlines()?;
    let pixels = pixels::expand_to_rgba(
        &raw.header,
        layout,
        &rows,
        raw.chunk(PLTE),
        raw.chunk(TRNS),
    )?;
    Ok(RgbaImage {
        width: raw.header.width,
        height: raw.header.height,
        pixels,
    })
}

/// Encodes an RGBA image as an 8-bit truecolor+alpha PNG.
///
/// # Errors
/// Returns [`CodecError::InvalidImage`] if the buffer length does not match
/// the dimensions or a dimension is zero.
pub fn encode_rgba(image: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    if image.width == 0 || image.height == 0 {
        return Err(CodecError::InvalidImage(format!(
            "zero dimension {}x{}",
            image.width, image.height
        )));
    }
    let stride = image.width as usize * 4;
    if image.pixels.len() != stride * image.height as usize {
        return Err(CodecError::InvalidImage(format!(
            "{} bytes for {}x{} RGBA",
            image.pixels.len(),
            image.width,
            image.height
        )));
    }

    let header = ImageHeader {
        width: image.width,
        height: image.height,
        bit_depth: 8,
        color_type: COLOR_RGBA,
        compression_method: 0,
        filter_method: 0,
        interlace_method: 0,
    };
    let compressed = deflate(&filter::filter_none(&image.pixels, stride))?;

    let mut out = SIGNATURE.to_vec();
    write_chunk(&mut out, IHDR, &header.to_bytes());
    write_chunk(&mut out, IDAT, &compressed);
    write_chunk(&mut out, IEND, &[]);
    Ok(out)
}

/// Rebuilds a container with a new height and replacement compressed data.
///
/// Every original chunk is kept in order except `IHDR` (rewritten with the
/// new height) and `IDAT` (the first occurrence is replaced by `data`, the
/// rest are dropped).
pub fn rebuild_with_data(raw: &RawImage, height: u32, data: &[u8]) -> Vec<u8> {
    let header = ImageHeader {
        height,
        ..raw.header
    };

    let mut out = SIGNATURE.to_vec();
    let mut wrote_data = false;
    for chunk in &raw.chunks {
        match chunk.kind {
            IHDR => write_chunk(&mut out, IHDR, &header.to_bytes()),
            IDAT => {
                if !wrote_data {
                    write_chunk(&mut out, IDAT, data);
                    wrote_data = true;
                }
            }
            kind => write_chunk(&mut out, kind, &chunk.data),
        }
    }
    out
}

/// Inflates a zlib stream.
///
/// # Errors
/// Returns [`CodecError::Malformed`] if the stream is corrupt.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::Malformed(format!("zlib: {}", e)))?;
    Ok(out)
}

/// Compresses bytes into a zlib stream.
///
/// # Errors
/// Returns [`CodecError::InvalidImage`] if the compressor fails.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let zlib_error = |e: std::io::Error| CodecError::InvalidImage(format!("zlib: {}", e));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(zlib_error)?;
    encoder.finish().map_err(zlib_error)
}
