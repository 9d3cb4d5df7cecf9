//! Provides namespaced asset references and their content-root paths.

use std::fmt;
use std::str::FromStr;

/// The namespace applied when an identifier has none.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A `namespace:path` asset identifier.
///
/// # Examples
/// ```
/// use glimpse_items::assets::AssetReference;
///
/// let r = AssetReference::parse("block/stone");
/// assert_eq!(r.namespace, "minecraft");
/// assert_eq!(r.model_path(), "minecraft/models/block/stone.json");
/// assert_eq!(r.to_string(), "minecraft:block/stone");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetReference {
    pub namespace: String,
    pub path: String,
}

impl AssetReference {
    /// Parses a raw identifier, defaulting the namespace and stripping
    /// leading slashes from the path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (namespace, path) = match raw.split_once(':') {
            Some((ns, path)) if !ns.is_empty() => (ns, path),
            Some((_, path)) => (DEFAULT_NAMESPACE, path),
            None => (DEFAULT_NAMESPACE, raw),
        };
        Self {
            namespace: namespace.to_string(),
            path: path.trim_start_matches('/').to_string(),
        }
    }

    pub fn new(namespace: &str, path: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            path: path.trim_start_matches('/').to_string(),
        }
    }

    /// Path of the model document relative to `assets/`.
    pub fn model_path(&self) -> String {
        self.document_path("models", ".json")
    }

    /// Path of the texture image relative to `assets/`.
    pub fn texture_path(&self) -> String {
        self.document_path("textures", ".png")
    }

    /// Path of the texture's animation sidecar relative to `assets/`.
    pub fn texture_meta_path(&self) -> String {
        format!("{}.mcmeta", self.texture_path())
    }

    fn document_path(&self, dir: &str, extension: &str) -> String {
        let path = self
            .path
            .strip_prefix(dir)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.path);
        let path = path.strip_suffix(extension).unwrap_or(path);
        format!("{}/{}/{}{}", self.namespace, dir, path, extension)
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for AssetReference {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespaces() {
        let r = AssetReference::parse("create:item/wrench");
        assert_eq!(r, AssetReference::new("create", "item/wrench"));

        let r = AssetReference::parse("item/apple");
        assert_eq!(r.namespace, DEFAULT_NAMESPACE);
        assert_eq!(r.path, "item/apple");

        let r = AssetReference::parse(":item/apple");
        assert_eq!(r.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_leading_slashes_stripped() {
        let r = AssetReference::parse("minecraft://block/dirt");
        assert_eq!(r.path, "block/dirt");
        assert_eq!(AssetReference::parse("/item/stick").path, "item/stick");
    }

    #[test]
    fn test_paths_normalize_existing_dir_and_extension() {
        let r = AssetReference::parse("textures/item/apple.png");
        assert_eq!(r.texture_path(), "minecraft/textures/item/apple.png");
        let r = AssetReference::parse("models/block/stone.json");
        assert_eq!(r.model_path(), "minecraft/models/block/stone.json");
        let r = AssetReference::parse("item/clock_00");
        assert_eq!(r.texture_meta_path(), "minecraft/textures/item/clock_00.png.mcmeta");
    }
}
