//! Provides the on-disk layout of a finished batch.
//!
//! ```text
//! <out>/textures/<id>.png   one sprite per resolved item
//! <out>/items.json          every item record, sorted by id
//! <out>/manifest.json       resolved/unresolved counts
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::codec::{self, CodecError};
use crate::config::{RenderConfig, RenderView};
use crate::pipeline::ItemResult;

/// Directory under the output root that holds the sprites.
pub const TEXTURES_DIR: &str = "textures";
/// Maximum number of unresolved ids listed in the manifest.
pub const UNRESOLVED_SAMPLE: usize = 20;

const RESERVED_KEYS: [&str; 4] = ["id", "texturePath", "sourceTexture", "sourceModel"];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode sprite for {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: CodecError,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of `items.json`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: String,
    /// Sprite path relative to the output root; null when unresolved.
    pub texture_path: Option<String>,
    pub source_texture: Option<String>,
    pub source_model: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Summary written to `manifest.json`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub unresolved_sample: Vec<String>,
    pub render_view: RenderView,
    pub output_sprite_size: u32,
}

/// Builds the record for one item, flattening its metadata object.
///
/// Metadata keys that collide with the record's own fields are dropped.
pub fn item_record(result: &ItemResult, metadata: Option<&Value>) -> ItemRecord {
    let metadata = match metadata {
        Some(Value::Object(fields)) => fields
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        Some(other) => {
            tracing::warn!("ignoring non-object metadata for {}: {}", result.id, other);
            Map::new()
        }
        None => Map::new(),
    };

    let outcome = result.outcome.as_ref();
    ItemRecord {
        id: result.id.clone(),
        texture_path: outcome.map(|_| format!("{}/{}.png", TEXTURES_DIR, sprite_stem(&result.id))),
        source_texture: outcome.and_then(|o| o.source_texture.clone()),
        source_model: outcome.and_then(|o| o.source_model.clone()),
        metadata,
    }
}

/// File stem for an item id; a namespace separator becomes `_`.
fn sprite_stem(id: &str) -> String {
    id.replace([':', '/', '\\'], "_")
}

pub fn manifest(results: &[ItemResult], config: &RenderConfig) -> Manifest {
    let unresolved: Vec<&str> = results
        .iter()
        .filter(|r| r.outcome.is_none())
        .map(|r| r.id.as_str())
        .collect();
    Manifest {
        total: results.len(),
        resolved: results.len() - unresolved.len(),
        unresolved: unresolved.len(),
        unresolved_sample: unresolved
            .iter()
            .take(UNRESOLVED_SAMPLE)
            .map(|id| id.to_string())
            .collect(),
        render_view: config.view,
        output_sprite_size: config.output_size,
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    fs::write(path, bytes).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes sprites, `items.json`, and `manifest.json` under `out_dir`.
///
/// `metadata` maps item ids to records from the metadata extractor.
///
/// # Errors
/// Returns [`OutputError`] if a file cannot be written or a sprite cannot
/// be encoded.
pub fn write_batch(
    out_dir: &Path,
    results: &[ItemResult],
    metadata: &Map<String, Value>,
    config: &RenderConfig,
) -> Result<Manifest, OutputError> {
    let textures_dir = out_dir.join(TEXTURES_DIR);
    fs::create_dir_all(&textures_dir).map_err(|source| OutputError::Io {
        path: textures_dir.clone(),
        source,
    })?;

    let mut records = Vec::with_capacity(results.len());
    for result in results {
        let record = item_record(result, metadata.get(&result.id));
        if let (Some(outcome), Some(relative)) = (&result.outcome, &record.texture_path) {
            let png = codec::encode_rgba(&outcome.image).map_err(|source| OutputError::Encode {
                id: result.id.clone(),
                source,
            })?;
            write_file(&out_dir.join(relative), &png)?;
        }
        records.push(record);
    }

    write_file(&out_dir.join("items.json"), &serde_json::to_vec_pretty(&records)?)?;

    let manifest = manifest(results, config);
    write_file(&out_dir.join("manifest.json"), &serde_json::to_vec_pretty(&manifest)?)?;
    tracing::info!(
        "wrote {} sprites to {} ({} unresolved)",
        manifest.resolved,
        out_dir.display(),
        manifest.unresolved
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RgbaImage;
    use crate::pipeline::ItemOutcome;
    use serde_json::json;
    use std::sync::Arc;

    fn resolved(id: &str) -> ItemResult {
        ItemResult {
            id: id.to_string(),
            outcome: Some(ItemOutcome {
                image: Arc::new(RgbaImage::new(2, 2)),
                source_texture: Some(format!("minecraft:item/{}", id)),
                source_model: None,
            }),
        }
    }

    fn unresolved(id: &str) -> ItemResult {
        ItemResult {
            id: id.to_string(),
            outcome: None,
        }
    }

    #[test]
    fn test_record_serialization() {
        let metadata = json!({"kind": "item", "maxStackSize": 64, "id": "clobbered"});
        let record = item_record(&resolved("apple"), Some(&metadata));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "apple",
                "texturePath": "textures/apple.png",
                "sourceTexture": "minecraft:item/apple",
                "sourceModel": null,
                "kind": "item",
                "maxStackSize": 64
            })
        );
    }

    #[test]
    fn test_unresolved_record_has_null_path() {
        let record = item_record(&unresolved("ghost"), None);
        assert!(record.texture_path.is_none());
        assert!(record.source_texture.is_none());
    }

    #[test]
    fn test_manifest_counts() {
        let mut results = vec![resolved("a")];
        results.extend((0..25).map(|i| unresolved(&format!("missing_{:02}", i))));
        let manifest = manifest(&results, &RenderConfig::default());
        assert_eq!(manifest.total, 26);
        assert_eq!(manifest.resolved, 1);
        assert_eq!(manifest.unresolved, 25);
        assert_eq!(manifest.unresolved_sample.len(), UNRESOLVED_SAMPLE);
        assert_eq!(manifest.unresolved_sample[0], "missing_00");

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["renderView"], "front");
        assert_eq!(value["outputSpriteSize"], 128);
    }

    #[test]
    fn test_write_batch_layout() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![resolved("apple"), unresolved("ghost")];
        let manifest = write_batch(dir.path(), &results, &Map::new(), &RenderConfig::default()).unwrap();
        assert_eq!(manifest.resolved, 1);

        let png = fs::read(dir.path().join("textures/apple.png")).unwrap();
        assert_eq!(codec::decode(&png).unwrap(), RgbaImage::new(2, 2));
        assert!(!dir.path().join("textures/ghost.png").exists());

        let items: Value = serde_json::from_slice(&fs::read(dir.path().join("items.json")).unwrap()).unwrap();
        assert_eq!(items[1]["id"], "ghost");
        assert_eq!(items[1]["texturePath"], Value::Null);
    }

    #[test]
    fn test_sprite_stem() {
        assert_eq!(sprite_stem("mod:thing"), "mod_thing");
    }
}
