//! Provides single-frame extraction for animated frame-strip textures.
//!
//! Animated textures stack their frames vertically and declare the frame
//! size in a `.png.mcmeta` sidecar. Only that strict vertical-strip layout
//! is cropped; anything else is left exactly as it was.
//!
//! # Examples
//! ```
//! use glimpse_items::animation::{first_frame_or_original, AnimationMeta};
//!
//! let meta = AnimationMeta::parse(br#"{"animation":{"frames":[2]}}"#).unwrap();
//! let not_png = b"not a png";
//! assert_eq!(&*first_frame_or_original(not_png, &meta), not_png);
//! ```

use std::borrow::Cow;

use serde::Deserialize;

use crate::codec::{self, chunk, filter, CodecError};

#[derive(Deserialize)]
struct McMeta {
    animation: Option<AnimationMeta>,
}

/// The `animation` section of a texture sidecar.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AnimationMeta {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub frames: Vec<FrameRef>,
}

/// A frame entry: either a bare index or `{"index": n, "time": t}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FrameRef {
    Index(u32),
    Timed {
        index: u32,
        #[serde(default)]
        time: Option<u32>,
    },
}

impl FrameRef {
    pub fn index(&self) -> u32 {
        match self {
            FrameRef::Index(index) => *index,
            FrameRef::Timed { index, .. } => *index,
        }
    }
}

impl AnimationMeta {
    /// Parses a sidecar document, returning None if it is not valid JSON or
    /// has no `animation` section.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice::<McMeta>(bytes).ok()?.animation
    }

    /// Returns the frame to keep, clamped to `[0, frame_count - 1]`.
    fn first_frame(&self, frame_count: u32) -> u32 {
        self.frames
            .first()
            .map(FrameRef::index)
            .unwrap_or(0)
            .min(frame_count.saturating_sub(1))
    }
}

/// Crops a vertical frame strip down to its first referenced frame.
///
/// Returns `Ok(None)` when the image is not a strip this function handles:
/// the frame width must equal the image width and the frame height must be
/// positive, below the image height, and fit at least twice. Missing sidecar
/// sizes default to the image width (square frames).
///
/// # Errors
/// Returns a [`CodecError`] if the image cannot be parsed, inflated,
/// unfiltered, or recompressed.
pub fn crop_first_frame(png: &[u8], meta: &AnimationMeta) -> Result<Option<Vec<u8>>, CodecError> {
    let raw = chunk::parse_container(png)?;
    let (image_width, image_height) = (raw.width(), raw.height());

    let frame_width = meta.width.unwrap_or(image_width);
    let frame_height = meta.height.unwrap_or(image_width);
    if frame_width != image_width || frame_height == 0 || frame_height >= image_height {
        return Ok(None);
    }

    let frame_count = image_height / frame_height;
    if frame_count <= 1 {
        return Ok(None);
    }

    let (layout, rows) = raw.scanlines()?;
    let frame = meta.first_frame(frame_count) as usize;
    let row_bytes = layout.stride * frame_height as usize;
    let start = frame * row_bytes;
    let frame_rows = &rows[start..start + row_bytes];

    let compressed = codec::deflate(&filter::filter_none(frame_rows, layout.stride))?;
    Ok(Some(codec::rebuild_with_data(&raw, frame_height, &compressed)))
}

/// Like [`crop_first_frame`], but falls back to the original bytes whenever
/// the strip cannot be cropped.
pub fn first_frame_or_original<'a>(png: &'a [u8], meta: &AnimationMeta) -> Cow<'a, [u8]> {
    match crop_first_frame(png, meta) {
        Ok(Some(cropped)) => Cow::Owned(cropped),
        Ok(None) => Cow::Borrowed(png),
        Err(err) => {
            tracing::debug!("keeping uncropped animated texture: {}", err);
            Cow::Borrowed(png)
        }
    }
}
