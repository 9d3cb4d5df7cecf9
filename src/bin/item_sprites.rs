//! Provides the `item-sprites` tool for rendering every item of a content root.
//!
//! Usage: `item-sprites --assets <content_root> --out <dir> [options]`
//!
//! Writes `textures/<id>.png`, `items.json`, and `manifest.json` into the
//! output directory. Set `RUST_LOG=debug` to see why individual items did
//! not resolve.
//!
//! # Examples
//! ```text
//! item-sprites --assets ./client --out ./sprites --size 64 --view back
//! ```

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use glimpse_items::assets::items;
use glimpse_items::config::{
    RenderConfig, RenderView, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_SIZE, DEFAULT_SUPERSAMPLE,
};
use glimpse_items::{output, pipeline, AssetContext, ContentRoot};

#[derive(Parser, Debug)]
#[command(name = "item-sprites", version, about = "Render item sprites from a content root")]
struct Args {
    /// Directory containing `assets/<namespace>/...`
    #[arg(long, env = "CONTENT_ROOT")]
    assets: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "sprites")]
    out: PathBuf,

    /// JSON object of item id to metadata record, merged into items.json
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Sprite edge length in pixels (minimum 16)
    #[arg(long, env = "SPRITE_SIZE", default_value_t = DEFAULT_OUTPUT_SIZE)]
    size: u32,

    /// Supersampling factor per axis
    #[arg(long, env = "SPRITE_SUPERSAMPLE", default_value_t = DEFAULT_SUPERSAMPLE)]
    supersample: u32,

    /// Which side of block models to show: front or back
    #[arg(long, env = "SPRITE_VIEW", default_value = "front")]
    view: RenderView,

    /// Items resolved concurrently
    #[arg(long, env = "SPRITE_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Only process the first N items by id
    #[arg(long, env = "SPRITE_ITEM_LIMIT")]
    limit: Option<usize>,
}

impl Args {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            output_size: self.size,
            supersample: self.supersample,
            view: self.view,
            concurrency: self.concurrency,
            item_limit: self.limit,
        }
        .normalized()
    }
}

fn read_metadata(path: &Path) -> Result<Map<String, Value>, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("invalid metadata {}: {}", path.display(), e))
}

async fn run(args: Args) -> Result<(), String> {
    let config = args.render_config();
    let metadata = match &args.metadata {
        Some(path) => read_metadata(path)?,
        None => Map::new(),
    };

    let root = ContentRoot::open(&args.assets).map_err(|e| e.to_string())?;
    let items = items::load_item_index(&root, config.item_limit)
        .await
        .map_err(|e| e.to_string())?;

    let context = Arc::new(AssetContext::new(root, config.clone()));
    let results = pipeline::run_batch(context, items)
        .await
        .map_err(|e| e.to_string())?;

    let manifest =
        output::write_batch(&args.out, &results, &metadata, &config).map_err(|e| e.to_string())?;
    eprintln!(
        "Saved {} of {} sprites to {}",
        manifest.resolved,
        manifest.total,
        args.out.display()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
