//! Provides rendering and batch configuration.
//!
//! # Examples
//! ```
//! use glimpse_items::config::{RenderConfig, RenderView};
//!
//! let config = RenderConfig {
//!     output_size: 4,
//!     supersample: 0,
//!     ..RenderConfig::default()
//! }
//! .normalized();
//! assert_eq!(config.output_size, 16);
//! assert_eq!(config.supersample, 1);
//! assert_eq!(config.view, RenderView::Front);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_SIZE: u32 = 128;
pub const MIN_OUTPUT_SIZE: u32 = 16;
pub const MAX_OUTPUT_SIZE: u32 = 2048;
pub const DEFAULT_SUPERSAMPLE: u32 = 2;
pub const MAX_SUPERSAMPLE: u32 = 8;
pub const DEFAULT_CONCURRENCY: usize = 24;

/// Which side of a block model faces the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderView {
    /// Shows the up, east, and south faces.
    #[default]
    Front,
    /// Shows the up, west, and north faces.
    Back,
}

impl fmt::Display for RenderView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderView::Front => write!(f, "front"),
            RenderView::Back => write!(f, "back"),
        }
    }
}

impl FromStr for RenderView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(RenderView::Front),
            "back" => Ok(RenderView::Back),
            other => Err(format!("unknown render view '{}' (expected front or back)", other)),
        }
    }
}

/// Options for one batch run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Edge length of rendered sprites in pixels.
    #[serde(rename = "outputSpriteSize")]
    pub output_size: u32,
    /// Samples per output pixel along each axis.
    #[serde(rename = "supersampleFactor")]
    pub supersample: u32,
    #[serde(rename = "renderView")]
    pub view: RenderView,
    /// Items resolved concurrently.
    #[serde(rename = "concurrencyLimit")]
    pub concurrency: usize,
    /// Stop after this many items (sorted by id).
    pub item_limit: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_size: DEFAULT_OUTPUT_SIZE,
            supersample: DEFAULT_SUPERSAMPLE,
            view: RenderView::Front,
            concurrency: DEFAULT_CONCURRENCY,
            item_limit: None,
        }
    }
}

impl RenderConfig {
    /// Clamps every option into its valid range.
    pub fn normalized(self) -> Self {
        Self {
            output_size: self.output_size.clamp(MIN_OUTPUT_SIZE, MAX_OUTPUT_SIZE),
            supersample: self.supersample.clamp(1, MAX_SUPERSAMPLE),
            concurrency: self.concurrency.max(1),
            ..self
        }
    }

    /// Edge length of the supersampled accumulation buffer.
    pub fn buffer_size(&self) -> u32 {
        self.output_size.saturating_mul(self.supersample)
    }
}
