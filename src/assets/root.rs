//! Provides read-only access to an unpacked content root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::AssetError;

/// A directory containing `assets/<namespace>/...`.
///
/// # Examples
/// ```
/// use glimpse_items::assets::ContentRoot;
///
/// assert!(ContentRoot::open("does/not/exist").is_err());
/// ```
#[derive(Clone, Debug)]
pub struct ContentRoot {
    assets: PathBuf,
}

impl ContentRoot {
    /// Opens a content root.
    ///
    /// # Errors
    /// Returns [`AssetError::Configuration`] if `<root>/assets` is not a
    /// directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, AssetError> {
        let assets = root.as_ref().join("assets");
        if !assets.is_dir() {
            return Err(AssetError::Configuration(format!(
                "content root {} has no assets directory",
                root.as_ref().display()
            )));
        }
        Ok(Self { assets })
    }

    /// Absolute path of a file relative to `assets/`.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.assets.join(relative)
    }

    /// Reads a file relative to `assets/`; a missing file is `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`AssetError::Io`] for any failure other than not-found.
    pub async fn read(&self, relative: &str) -> Result<Option<Vec<u8>>, AssetError> {
        let path = self.path(relative);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AssetError::Io {
                path,
                source: Arc::new(e),
            }),
        }
    }

    /// Lists the `.json` files directly inside a directory relative to
    /// `assets/`, sorted by name. A missing directory yields an empty list.
    ///
    /// # Errors
    /// Returns [`AssetError::Io`] if the directory exists but cannot be read.
    pub async fn list_json(&self, relative_dir: &str) -> Result<Vec<PathBuf>, AssetError> {
        let dir = self.path(relative_dir);
        let io_error = |e: std::io::Error| AssetError::Io {
            path: dir.clone(),
            source: Arc::new(e),
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
