//! Provides block/item model documents, inheritance, and texture aliases.
//!
//! Models inherit from a `parent`. Texture maps merge key by key (the child
//! wins); element lists never merge: the nearest model that declares any
//! elements supplies all of them.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::{AssetError, AssetReference};
use crate::geometry::{FaceDirection, Vec3, DEFAULT_UV};

/// Keys tried first, in order, when picking a model's representative texture.
pub const PREFERRED_TEXTURE_KEYS: [&str; 11] = [
    "layer0", "layer1", "layer2", "all", "front", "top", "side", "back", "end", "bottom",
    "particle",
];

/// Failure to follow a `#alias` chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasError {
    #[error("texture alias cycle through #{0}")]
    Cycle(String),
    #[error("texture alias #{0} has no target")]
    Dangling(String),
}

/// An insertion-ordered alias → value texture map.
///
/// # Examples
/// ```
/// use glimpse_items::assets::model::TextureMap;
///
/// let mut map = TextureMap::default();
/// map.insert("side", "block/stone");
/// map.insert("top", "#side");
/// assert_eq!(map.resolve_alias("top").unwrap(), "block/stone");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureMap {
    entries: Vec<(String, String)>,
}

impl TextureMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets a key, overwriting in place or appending a new entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a texture value: a literal reference is returned as-is and a
    /// `#key` value is followed through the map until it reaches a literal.
    ///
    /// # Errors
    /// Returns [`AliasError::Cycle`] if a key repeats and
    /// [`AliasError::Dangling`] if a key is absent or empty.
    pub fn resolve_value(&self, value: &str) -> Result<String, AliasError> {
        let mut visited = HashSet::new();
        let mut current = value;
        while let Some(key) = current.strip_prefix('#') {
            if !visited.insert(key) {
                return Err(AliasError::Cycle(key.to_string()));
            }
            current = self
                .get(key)
                .ok_or_else(|| AliasError::Dangling(key.to_string()))?;
        }
        if current.is_empty() {
            return Err(AliasError::Dangling(value.trim_start_matches('#').to_string()));
        }
        Ok(current.to_string())
    }

    /// Resolves the alias chain starting at `key`.
    ///
    /// # Errors
    /// See [`TextureMap::resolve_value`].
    pub fn resolve_alias(&self, key: &str) -> Result<String, AliasError> {
        self.resolve_value(&format!("#{}", key))
    }

    /// Every texture reference reachable from the map, ordered by the
    /// preferred-key heuristic, then remaining keys in insertion order.
    /// Keys whose alias chain fails are skipped; duplicates are dropped.
    pub fn texture_candidates(&self) -> Vec<String> {
        let preferred = PREFERRED_TEXTURE_KEYS
            .iter()
            .copied()
            .filter(|key| self.get(key).is_some());
        let remaining = self
            .keys()
            .filter(|key| !PREFERRED_TEXTURE_KEYS.contains(key));

        let mut seen = HashSet::new();
        preferred
            .chain(remaining)
            .filter_map(|key| self.resolve_alias(key).ok())
            .filter(|texture| seen.insert(texture.clone()))
            .collect()
    }

    /// The first texture chosen by [`TextureMap::texture_candidates`].
    pub fn representative_texture(&self) -> Option<String> {
        self.texture_candidates().into_iter().next()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TextureMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TextureMap::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// One textured face of an element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementFace {
    pub direction: FaceDirection,
    /// A `#alias` or literal texture reference.
    pub texture: String,
    /// `(u1, v1, u2, v2)` in 0–16 texture space.
    pub uv: [f32; 4],
}

/// An axis-aligned box with up to six textured faces.
#[derive(Clone, Debug, PartialEq)]
pub struct CuboidElement {
    pub from: Vec3,
    pub to: Vec3,
    pub faces: Vec<ElementFace>,
}

impl CuboidElement {
    pub fn face(&self, direction: FaceDirection) -> Option<&ElementFace> {
        self.faces.iter().find(|f| f.direction == direction)
    }
}

/// A single model document as stored on disk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelDefinition {
    pub parent: Option<AssetReference>,
    pub textures: TextureMap,
    pub elements: Vec<CuboidElement>,
}

// ---- Model JSON structure ----

#[derive(Deserialize)]
struct ModelDocument {
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    textures: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    elements: Vec<ElementDocument>,
}

#[derive(Deserialize)]
struct ElementDocument {
    #[serde(default)]
    from: [f32; 3],
    #[serde(default)]
    to: [f32; 3],
    #[serde(default)]
    faces: FacesDocument,
}

#[derive(Deserialize, Default)]
struct FacesDocument {
    north: Option<FaceDocument>,
    south: Option<FaceDocument>,
    east: Option<FaceDocument>,
    west: Option<FaceDocument>,
    up: Option<FaceDocument>,
    down: Option<FaceDocument>,
}

#[derive(Deserialize)]
struct FaceDocument {
    #[serde(default)]
    uv: Option<[f32; 4]>,
    #[serde(default)]
    texture: Option<String>,
}

impl ModelDefinition {
    /// Parses a model document.
    ///
    /// Non-string texture values and faces without a texture are ignored.
    ///
    /// # Errors
    /// Returns the JSON error if the document is not a model object.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let doc: ModelDocument = serde_json::from_slice(bytes)?;

        let textures = doc
            .textures
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
            .collect();

        let elements = doc
            .elements
            .into_iter()
            .map(|element| {
                let FacesDocument {
                    north,
                    south,
                    east,
                    west,
                    up,
                    down,
                } = element.faces;
                let faces = [
                    (FaceDirection::North, north),
                    (FaceDirection::South, south),
                    (FaceDirection::East, east),
                    (FaceDirection::West, west),
                    (FaceDirection::Up, up),
                    (FaceDirection::Down, down),
                ]
                .into_iter()
                .filter_map(|(direction, face)| {
                    let face = face?;
                    Some(ElementFace {
                        direction,
                        texture: face.texture.filter(|t| !t.is_empty())?,
                        uv: face.uv.unwrap_or(DEFAULT_UV),
                    })
                })
                .collect();
                CuboidElement {
                    from: element.from,
                    to: element.to,
                    faces,
                }
            })
            .collect();

        Ok(Self {
            parent: doc
                .parent
                .filter(|p| !p.is_empty())
                .map(|p| AssetReference::parse(&p)),
            textures,
            elements,
        })
    }
}

/// A model with its inheritance chain applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedModel {
    pub textures: TextureMap,
    pub elements: Vec<CuboidElement>,
}

impl ResolvedModel {
    /// Merges a chain ordered child first, root last.
    pub fn merge(chain: &[Arc<ModelDefinition>]) -> Self {
        let mut textures = TextureMap::default();
        for definition in chain.iter().rev() {
            for (key, value) in &definition.textures.entries {
                textures.insert(key.as_str(), value.as_str());
            }
        }
        let elements = chain
            .iter()
            .find(|definition| !definition.elements.is_empty())
            .map(|definition| definition.elements.clone())
            .unwrap_or_default();
        Self { textures, elements }
    }
}

/// Walks the parent chain from `start`, loading each document with `load`.
///
/// Returns `Ok(None)` when `start` itself does not exist. A missing parent
/// ends the chain. An inheritance cycle yields an empty model.
///
/// # Errors
/// Propagates fatal [`AssetError`]s from `load`.
pub async fn resolve_model<F, Fut>(
    start: &AssetReference,
    mut load: F,
) -> Result<Option<ResolvedModel>, AssetError>
where
    F: FnMut(AssetReference) -> Fut,
    Fut: Future<Output = Result<Option<Arc<ModelDefinition>>, AssetError>>,
{
    let mut visited = HashSet::new();
    let mut chain: Vec<Arc<ModelDefinition>> = Vec::new();
    let mut next = Some(start.clone());

    while let Some(reference) = next.take() {
        if !visited.insert(reference.clone()) {
            tracing::debug!("model inheritance cycle at {} (from {})", reference, start);
            return Ok(Some(ResolvedModel::default()));
        }
        match load(reference.clone()).await? {
            Some(definition) => {
                next = definition.parent.clone();
                chain.push(definition);
            }
            None if chain.is_empty() => return Ok(None),
            None => tracing::debug!("parent model {} not found (from {})", reference, start),
        }
    }

    Ok(Some(ResolvedModel::merge(&chain)))
}
