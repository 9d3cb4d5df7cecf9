//! Provides scanline layout and color-type expansion to 8-bit RGBA.

use super::chunk::ImageHeader;
use super::CodecError;

pub const COLOR_GRAY: u8 = 0;
pub const COLOR_RGB: u8 = 2;
pub const COLOR_PALETTE: u8 = 3;
pub const COLOR_GRAY_ALPHA: u8 = 4;
pub const COLOR_RGBA: u8 = 6;

/// Byte geometry of one unfiltered scanline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowLayout {
    /// Bytes per row, excluding the filter-type byte.
    pub stride: usize,
    /// Filter distance in bytes (bytes per complete pixel, at least 1).
    pub bpp: usize,
    /// Samples per pixel.
    pub channels: usize,
}

impl RowLayout {
    /// Validates the header and computes the row layout.
    ///
    /// # Errors
    /// Returns [`CodecError::Unsupported`] for non-zero compression, filter or
    /// interlace methods and for color type / bit depth pairs outside the
    /// supported set, and [`CodecError::Malformed`] for zero dimensions.
    pub fn for_header(header: &ImageHeader) -> Result<Self, CodecError> {
        if header.compression_method != 0 {
            return Err(CodecError::Unsupported(format!(
                "compression method {}",
                header.compression_method
            )));
        }
        if header.filter_method != 0 {
            return Err(CodecError::Unsupported(format!(
                "filter method {}",
                header.filter_method
            )));
        }
        if header.interlace_method != 0 {
            return Err(CodecError::Unsupported(format!(
                "interlace method {}",
                header.interlace_method
            )));
        }
        if header.width == 0 || header.height == 0 {
            return Err(CodecError::Malformed(format!(
                "zero dimension {}x{}",
                header.width, header.height
            )));
        }

        let depth = header.bit_depth;
        let channels = match (header.color_type, depth) {
            (COLOR_GRAY, 1 | 2 | 4 | 8 | 16) => 1,
            (COLOR_RGB, 8 | 16) => 3,
            (COLOR_PALETTE, 1 | 2 | 4 | 8) => 1,
            (COLOR_GRAY_ALPHA, 8 | 16) => 2,
            (COLOR_RGBA, 8 | 16) => 4,
            (color_type, depth) => {
                return Err(CodecError::Unsupported(format!(
                    "color type {} at bit depth {}",
                    color_type, depth
                )))
            }
        };

        let bits_per_pixel = channels * depth as usize;
        let stride = (header.width as usize)
            .checked_mul(bits_per_pixel)
            .map(|bits| bits.div_ceil(8))
            .ok_or_else(|| CodecError::Malformed("row width overflow".to_string()))?;

        Ok(Self {
            stride,
            bpp: (bits_per_pixel / 8).max(1),
            channels,
        })
    }
}

/// Reads the raw (unscaled) value of sample `channel` of pixel `x` in `row`.
#[inline]
fn raw_sample(row: &[u8], x: usize, channel: usize, channels: usize, depth: u8) -> u16 {
    let index = x * channels + channel;
    match depth {
        16 => u16::from_be_bytes([row[index * 2], row[index * 2 + 1]]),
        8 => row[index] as u16,
        _ => {
            // Sub-byte samples are packed most-significant-bit first.
            let bit = index * depth as usize;
            let shift = 8 - depth as usize - (bit % 8);
            let mask = (1u16 << depth) - 1;
            (row[bit / 8] as u16 >> shift) & mask
        }
    }
}

/// Scales a raw sample of the given depth to 8 bits.
#[inline]
fn to_u8(value: u16, depth: u8) -> u8 {
    match depth {
        16 => (value >> 8) as u8,
        8 => value as u8,
        _ => {
            let max = (1u16 << depth) - 1;
            (value * 255 / max) as u8
        }
    }
}

/// Expands unfiltered scanlines to straight-alpha RGBA.
///
/// `palette` is the `PLTE` payload and `transparency` the `tRNS` payload,
/// when present.
///
/// # Errors
/// Returns [`CodecError::Malformed`] when a palette image has no palette or
/// references an index beyond it.
pub fn expand_to_rgba(
    header: &ImageHeader,
    layout: RowLayout,
    rows: &[u8],
    palette: Option<&[u8]>,
    transparency: Option<&[u8]>,
) -> Result<Vec<u8>, CodecError> {
    let width = header.width as usize;
    let height = header.height as usize;
    let depth = header.bit_depth;
    let channels = layout.channels;
    let mut out = Vec::with_capacity(width * height * 4);

    let palette = if header.color_type == COLOR_PALETTE {
        let palette = palette
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CodecError::Malformed("palette image without PLTE".to_string()))?;
        Some(palette)
    } else {
        None
    };

    // Single-color transparency key for gray / truecolor images.
    let key: Option<[u16; 3]> = match (header.color_type, transparency) {
        (COLOR_GRAY, Some(t)) if t.len() >= 2 => {
            let g = u16::from_be_bytes([t[0], t[1]]);
            Some([g, g, g])
        }
        (COLOR_RGB, Some(t)) if t.len() >= 6 => Some([
            u16::from_be_bytes([t[0], t[1]]),
            u16::from_be_bytes([t[2], t[3]]),
            u16::from_be_bytes([t[4], t[5]]),
        ]),
        _ => None,
    };

    for y in 0..height {
        let row = &rows[y * layout.stride..(y + 1) * layout.stride];
        for x in 0..width {
            let sample = |c: usize| raw_sample(row, x, c, channels, depth);
            let rgba = match header.color_type {
                COLOR_GRAY => {
                    let g = sample(0);
                    let a = if key.is_some_and(|k| k[0] == g) { 0 } else { 255 };
                    let g = to_u8(g, depth);
                    [g, g, g, a]
                }
                COLOR_GRAY_ALPHA => {
                    let g = to_u8(sample(0), depth);
                    [g, g, g, to_u8(sample(1), depth)]
                }
                COLOR_RGB => {
                    let raw = [sample(0), sample(1), sample(2)];
                    let a = if key == Some(raw) { 0 } else { 255 };
                    [to_u8(raw[0], depth), to_u8(raw[1], depth), to_u8(raw[2], depth), a]
                }
                COLOR_RGBA => [
                    to_u8(sample(0), depth),
                    to_u8(sample(1), depth),
                    to_u8(sample(2), depth),
                    to_u8(sample(3), depth),
                ],
                _ => {
                    let index = sample(0) as usize;
                    let entry = palette
                        .and_then(|p| p.get(index * 3..index * 3 + 3))
                        .ok_or_else(|| {
                            CodecError::Malformed(format!("palette index {} out of range", index))
                        })?;
                    let a = transparency
                        .and_then(|t| t.get(index))
                        .copied()
                        .unwrap_or(255);
                    [entry[0], entry[1], entry[2], a]
                }
            };
            out.extend_from_slice(&rgba);
        }
    }

    Ok(out)
}
