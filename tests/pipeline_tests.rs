//! Integration tests for item resolution over a throwaway content root.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use glimpse_items::assets::items::{self, ItemDefinition};
use glimpse_items::codec::{self, RgbaImage};
use glimpse_items::config::{RenderConfig, RenderView};
use glimpse_items::{output, pipeline, AssetContext, AssetError, ContentRoot};

const ORANGE: [u8; 4] = [200, 100, 50, 255];

fn write(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join("assets").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn write_json(root: &Path, relative: &str, value: Value) {
    write(root, relative, &serde_json::to_vec(&value).unwrap());
}

/// A `width`-wide image made of horizontal bands, one color per band.
fn banded_png(width: u32, bands: &[[u8; 4]]) -> Vec<u8> {
    let height = width * bands.len() as u32;
    let mut image = RgbaImage::new(width, height);
    for (i, px) in image.pixels.chunks_exact_mut(4).enumerate() {
        let y = i as u32 / width;
        px.copy_from_slice(&bands[(y / width) as usize]);
    }
    codec::encode_rgba(&image).unwrap()
}

fn model_item(model: &str) -> Value {
    json!({"model": {"type": "minecraft:model", "model": model}})
}

/// Content root with a flat item, a full block, an animated item, and
/// an item with nothing behind it.
fn content_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_json(
        root,
        "minecraft/models/item/apple.json",
        json!({"parent": "minecraft:item/generated", "textures": {"layer0": "minecraft:item/apple"}}),
    );
    write(root, "minecraft/textures/item/apple.png", &banded_png(16, &[[255, 0, 0, 255]]));

    let faces: Map<String, Value> = ["north", "south", "east", "west", "up", "down"]
        .iter()
        .map(|face| (face.to_string(), json!({"texture": "#all"})))
        .collect();
    write_json(
        root,
        "minecraft/models/block/cube_all.json",
        json!({
            "textures": {"particle": "#all"},
            "elements": [{"from": [0, 0, 0], "to": [16, 16, 16], "faces": faces}]
        }),
    );
    write_json(
        root,
        "minecraft/models/block/pumpkin.json",
        json!({"parent": "block/cube_all", "textures": {"all": "block/pumpkin"}}),
    );
    write(root, "minecraft/textures/block/pumpkin.png", &banded_png(16, &[ORANGE]));

    write_json(
        root,
        "minecraft/models/item/clock.json",
        json!({"parent": "item/generated", "textures": {"layer0": "item/clock"}}),
    );
    write(
        root,
        "minecraft/textures/item/clock.png",
        &banded_png(16, &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]]),
    );
    write(
        root,
        "minecraft/textures/item/clock.png.mcmeta",
        br#"{"animation": {"frametime": 2, "frames": [{"index": 1, "time": 4}, 2, 0]}}"#,
    );

    write_json(root, "minecraft/items/apple.json", model_item("item/apple"));
    write_json(root, "minecraft/items/pumpkin.json", model_item("block/pumpkin"));
    write_json(root, "minecraft/items/clock.json", model_item("item/clock"));
    write_json(root, "minecraft/items/ghost.json", model_item("item/ghost"));
    dir
}

async fn run(dir: &Path, config: RenderConfig) -> Vec<pipeline::ItemResult> {
    let root = ContentRoot::open(dir).unwrap();
    let items = items::load_item_index(&root, config.item_limit).await.unwrap();
    let context = Arc::new(AssetContext::new(root, config));
    pipeline::run_batch(context, items).await.unwrap()
}

#[tokio::test]
async fn test_batch_results_sorted_by_id() {
    let dir = content_root();
    let results = run(dir.path(), RenderConfig::default()).await;
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["apple", "clock", "ghost", "pumpkin"]);
    assert!(results[2].outcome.is_none());
}

#[tokio::test]
async fn test_flat_item_uses_layer0() {
    let dir = content_root();
    let results = run(dir.path(), RenderConfig::default()).await;
    let apple = results[0].outcome.as_ref().unwrap();
    assert_eq!(apple.source_texture.as_deref(), Some("minecraft:item/apple"));
    assert_eq!(apple.source_model.as_deref(), Some("minecraft:item/apple"));
    assert_eq!((apple.image.width, apple.image.height), (16, 16));
}

#[tokio::test]
async fn test_block_item_is_rendered() {
    let dir = content_root();
    for view in [RenderView::Front, RenderView::Back] {
        let config = RenderConfig {
            view,
            ..RenderConfig::default()
        };
        let results = run(dir.path(), config).await;
        let pumpkin = results[3].outcome.as_ref().unwrap();
        assert_eq!(pumpkin.source_model.as_deref(), Some("minecraft:block/pumpkin"));
        assert!(pumpkin.source_texture.is_none());
        assert_eq!((pumpkin.image.width, pumpkin.image.height), (128, 128));
        assert_eq!(pumpkin.image.pixel(64, 64), ORANGE);
        assert_eq!(pumpkin.image.pixel(0, 0)[3], 0);
    }
}

#[tokio::test]
async fn test_animated_texture_cropped_to_first_listed_frame() {
    let dir = content_root();
    let results = run(dir.path(), RenderConfig::default()).await;
    let clock = results[1].outcome.as_ref().unwrap();
    assert_eq!((clock.image.width, clock.image.height), (16, 16));
    assert_eq!(clock.image.pixel(8, 8), [0, 255, 0, 255]);
}

#[tokio::test]
async fn test_item_limit_truncates_sorted_index() {
    let dir = content_root();
    let config = RenderConfig {
        item_limit: Some(2),
        ..RenderConfig::default()
    };
    let results = run(dir.path(), config).await;
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["apple", "clock"]);
}

#[tokio::test]
async fn test_combined_index_preferred() {
    let dir = content_root();
    write_json(
        dir.path(),
        "minecraft/items/_all.json",
        json!({"zeta": model_item("item/apple"), "alpha": {}}),
    );
    write(dir.path(), "minecraft/textures/item/alpha.png", &banded_png(4, &[ORANGE]));

    let results = run(dir.path(), RenderConfig::default()).await;
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "zeta"]);
    let alpha = results[0].outcome.as_ref().unwrap();
    assert_eq!(alpha.source_texture.as_deref(), Some("minecraft:item/alpha"));
}

#[tokio::test]
async fn test_write_batch_outputs() {
    let dir = content_root();
    let out = tempfile::tempdir().unwrap();
    let config = RenderConfig {
        output_size: 32,
        ..RenderConfig::default()
    };
    let results = run(dir.path(), config.clone()).await;

    let mut metadata = Map::new();
    metadata.insert("apple".to_string(), json!({"kind": "food", "nutrition": 4}));
    let manifest = output::write_batch(out.path(), &results, &metadata, &config).unwrap();
    assert_eq!(manifest.total, 4);
    assert_eq!(manifest.resolved, 3);
    assert_eq!(manifest.unresolved_sample, vec!["ghost".to_string()]);

    let sprite = codec::decode(&fs::read(out.path().join("textures/pumpkin.png")).unwrap()).unwrap();
    assert_eq!((sprite.width, sprite.height), (32, 32));

    let records: Value = serde_json::from_slice(&fs::read(out.path().join("items.json")).unwrap()).unwrap();
    assert_eq!(records[0]["id"], "apple");
    assert_eq!(records[0]["texturePath"], "textures/apple.png");
    assert_eq!(records[0]["nutrition"], 4);
    assert_eq!(records[2]["texturePath"], Value::Null);

    let manifest: Value =
        serde_json::from_slice(&fs::read(out.path().join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["unresolved"], 1);
    assert_eq!(manifest["outputSpriteSize"], 32);
}

#[test]
fn test_missing_content_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        ContentRoot::open(dir.path()),
        Err(AssetError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_unknown_definition_shapes_fall_back() {
    let dir = content_root();
    let root = ContentRoot::open(dir.path()).unwrap();
    let context = AssetContext::new(root, RenderConfig::default());
    let item = ItemDefinition {
        id: "apple".to_string(),
        definition: json!({"model": {"type": "minecraft:bundle/selected_item"}}),
    };
    let outcome = context.resolve_item(&item).await.unwrap().unwrap();
    assert_eq!(outcome.source_texture.as_deref(), Some("minecraft:item/apple"));
}

#[tokio::test]
async fn test_unexpected_io_error_aborts_batch() {
    let dir = content_root();
    fs::create_dir_all(dir.path().join("assets/minecraft/textures/item/broken.png")).unwrap();
    write_json(
        dir.path(),
        "minecraft/items/broken.json",
        json!({"model": {"type": "model", "model": "item/nothing", "texture": "item/broken"}}),
    );

    let root = ContentRoot::open(dir.path()).unwrap();
    let items = items::load_item_index(&root, None).await.unwrap();
    let context = Arc::new(AssetContext::new(root, RenderConfig::default()));
    let result = pipeline::run_batch(context, items).await;
    assert!(matches!(result, Err(AssetError::Io { .. })), "{:?}", result);
}
