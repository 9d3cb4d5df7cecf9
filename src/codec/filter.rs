//! Provides scanline filtering: reversal of the five PNG filter types and
//! the filter-type-None encoding used on output.

use super::CodecError;

/// Per-row filter type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Sub),
            2 => Some(Self::Up),
            3 => Some(Self::Average),
            4 => Some(Self::Paeth),
            _ => None,
        }
    }
}

/// The Paeth predictor over left (`a`), up (`b`) and upper-left (`c`).
///
/// Ties prefer `a`, then `b`, then `c`.
///
/// # Examples
/// ```
/// use glimpse_items::codec::filter::paeth;
///
/// assert_eq!(paeth(0, 0, 0), 0);
/// assert_eq!(paeth(10, 20, 10), 20);
/// ```
#[inline]
pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reverses per-row filtering, returning `height` rows of `stride` bytes
/// each with the filter-type bytes removed.
///
/// `bpp` is the filter distance in bytes (at least 1).
///
/// # Errors
/// Returns [`CodecError::Malformed`] if the stream is shorter than
/// `height * (stride + 1)` or a row carries an unknown filter type.
pub fn unfilter(data: &[u8], stride: usize, bpp: usize, height: usize) -> Result<Vec<u8>, CodecError> {
    let row_len = stride + 1;
    let needed = row_len
        .checked_mul(height)
        .ok_or_else(|| CodecError::Malformed("image dimensions overflow".to_string()))?;
    if data.len() < needed {
        return Err(CodecError::Malformed(format!(
            "image data holds {} bytes, {} required",
            data.len(),
            needed
        )));
    }

    let bpp = bpp.max(1);
    let mut out = vec![0u8; stride * height];

    for y in 0..height {
        let src = &data[y * row_len..(y + 1) * row_len];
        let filter = FilterType::from_byte(src[0]).ok_or_else(|| {
            CodecError::Malformed(format!("unknown filter type {} on row {}", src[0], y))
        })?;
        let src = &src[1..];

        let (done, rest) = out.split_at_mut(y * stride);
        let prev: Option<&[u8]> = if y == 0 {
            None
        } else {
            Some(&done[(y - 1) * stride..])
        };
        let row = &mut rest[..stride];

        for x in 0..stride {
            let left = if x >= bpp { row[x - bpp] } else { 0 };
            let up = prev.map_or(0, |p| p[x]);
            let upper_left = match prev {
                Some(p) if x >= bpp => p[x - bpp],
                _ => 0,
            };
            let predicted = match filter {
                FilterType::None => 0,
                FilterType::Sub => left,
                FilterType::Up => up,
                FilterType::Average => ((left as u16 + up as u16) / 2) as u8,
                FilterType::Paeth => paeth(left, up, upper_left),
            };
            row[x] = src[x].wrapping_add(predicted);
        }
    }

    Ok(out)
}

/// Prefixes every `stride`-byte row with filter type None.
pub fn filter_none(rows: &[u8], stride: usize) -> Vec<u8> {
    if stride == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(rows.len() + rows.len() / stride);
    for row in rows.chunks(stride) {
        out.push(FilterType::None as u8);
        out.extend_from_slice(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paeth_zero() {
        assert_eq!(paeth(0, 0, 0), 0);
    }

    #[test]
    fn test_paeth_tie_breaks() {
        // p = 10 + 10 - 10 = 10; every distance is 0, left wins.
        assert_eq!(paeth(10, 10, 10), 10);
        // p = 5 + 9 - 5 = 9; pa = 4, pb = 0, pc = 4.
        assert_eq!(paeth(5, 9, 5), 9);
        // p = 7 + 3 - 1 = 9; pa = 2, pb = 6, pc = 8.
        assert_eq!(paeth(7, 3, 1), 7);
        // p = 3 + 7 - 9 = 1; pa = 2, pb = 6, pc = 8.
        assert_eq!(paeth(3, 7, 9), 3);
        // p = 10 + 2 - 8 = 4; pa = 6, pb = 2, pc = 4.
        assert_eq!(paeth(10, 2, 8), 2);
        // p = 4 + 8 - 2 = 10; pa = 6, pb = 2, pc = 8: up wins.
        assert_eq!(paeth(4, 8, 2), 8);
        // p = 6 + 6 - 4 = 8; pa = pb = 2, pc = 4: left wins the tie.
        assert_eq!(paeth(6, 6, 4), 6);
        // p = 0 + 10 - 12 = -2; pa = 2, pb = 12, pc = 14.
        assert_eq!(paeth(0, 10, 12), 0);
        // p = 100 + 0 - 60 = 40; pa = 60, pb = 40, pc = 20: upper-left wins.
        assert_eq!(paeth(100, 0, 60), 60);
    }

    #[test]
    fn test_unfilter_each_type() {
        // Two rows, 3 bytes each, bpp 1.
        let data = [
            1, 10, 5, 5, // Sub: 10, 15, 20
            2, 1, 1, 1, // Up: 11, 16, 21
        ];
        let out = unfilter(&data, 3, 1, 2).unwrap();
        assert_eq!(out, vec![10, 15, 20, 11, 16, 21]);

        let data = [
            0, 10, 20, 30, // None
            3, 5, 5, 5, // Average: (0+10)/2+5=10, (10+20)/2+5=20, (20+30)/2+5=30
        ];
        let out = unfilter(&data, 3, 1, 2).unwrap();
        assert_eq!(out, vec![10, 20, 30, 10, 20, 30]);

        let data = [
            0, 10, 20, 30, // None
            4, 0, 0, 0, // Paeth: x0 -> paeth(0,10,0)=10; x1 -> paeth(10,20,10)=20; x2 -> paeth(20,30,20)=30
        ];
        let out = unfilter(&data, 3, 1, 2).unwrap();
        assert_eq!(out, vec![10, 20, 30, 10, 20, 30]);
    }

    #[test]
    fn test_unfilter_wraps() {
        let data = [1, 200, 100];
        let out = unfilter(&data, 2, 1, 1).unwrap();
        assert_eq!(out, vec![200, 44]);
    }

    #[test]
    fn test_unfilter_rejects_short_and_unknown() {
        assert!(matches!(
            unfilter(&[0, 1, 2], 3, 1, 1),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            unfilter(&[5, 1, 2, 3], 3, 1, 1),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_filter_none_then_unfilter() {
        let rows = [1u8, 2, 3, 4, 5, 6];
        let filtered = filter_none(&rows, 3);
        assert_eq!(filtered, vec![0, 1, 2, 3, 0, 4, 5, 6]);
        assert_eq!(unfilter(&filtered, 3, 1, 2).unwrap(), rows.to_vec());
    }
}
