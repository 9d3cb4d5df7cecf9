//! Provides content-root access and asset reference resolution.
//!
//! The content root is an unpacked resource tree of the form
//! `assets/<namespace>/{models,textures,items}/...`. This module turns
//! identifiers into paths, parses model and item documents, and resolves
//! model inheritance and texture aliases.
//!
//! # Examples
//! ```
//! use glimpse_items::assets::AssetReference;
//!
//! let texture = AssetReference::parse("minecraft:item/apple");
//! assert_eq!(texture.texture_path(), "minecraft/textures/item/apple.png");
//! ```

pub mod items;
pub mod model;
pub mod reference;
pub mod root;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use model::{CuboidElement, ElementFace, ModelDefinition, ResolvedModel, TextureMap};
pub use reference::{AssetReference, DEFAULT_NAMESPACE};
pub use root::ContentRoot;

/// Errors that abort a batch run.
///
/// Missing files are not errors; they surface as `None`.
///
/// # Examples
/// ```
/// use glimpse_items::assets::AssetError;
///
/// let err = AssetError::Configuration("no content root".to_string());
/// assert_eq!(err.to_string(), "Configuration error: no content root");
/// ```
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The content root was never set up.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// An I/O failure other than file-not-found.
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
}
