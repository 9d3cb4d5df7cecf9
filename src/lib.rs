//! Provides item sprite resolution for unpacked Minecraft-style content roots.
//!
//! Each item's declarative model definition is walked for texture and model
//! candidates. Flat textures are decoded by a built-in PNG codec, block
//! models are software-rasterized to an isometric sprite, and the results
//! are written out as one RGBA PNG per item plus a JSON index.
//!
//! # Build
//! ```text
//! cargo build --release
//! ```
//!
//! # Examples
//! ```no_run
//! use std::sync::Arc;
//!
//! use glimpse_items::assets::{items, ContentRoot};
//! use glimpse_items::config::RenderConfig;
//! use glimpse_items::pipeline::{self, AssetContext};
//!
//! # async fn run() -> Result<(), glimpse_items::assets::AssetError> {
//! let root = ContentRoot::open("client-assets")?;
//! let items = items::load_item_index(&root, None).await?;
//! let context = Arc::new(AssetContext::new(root, RenderConfig::default()));
//! let results = pipeline::run_batch(context, items).await?;
//! println!("{} items", results.len());
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod assets;
pub mod cache;
pub mod codec;
pub mod config;
pub mod geometry;
pub mod mapper;
pub mod output;
pub mod pipeline;
pub mod renderer;

pub use assets::{AssetError, AssetReference, ContentRoot};
pub use codec::{CodecError, RgbaImage};
pub use config::{RenderConfig, RenderView};
pub use pipeline::{AssetContext, ItemOutcome, ItemResult};
