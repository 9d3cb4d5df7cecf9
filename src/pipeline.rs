//! Provides the per-item sprite resolution pipeline.
//!
//! For each item the pipeline walks its candidates in order: a texture
//! candidate is loaded directly; a model candidate is rendered, then
//! falls back to the model's own flat textures. When nothing resolves,
//! `<namespace>:item/<id>` is tried as a texture and then as a model.
//!
//! Every lookup goes through the caches of one [`AssetContext`], which
//! lives for a single batch run.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::animation::{self, AnimationMeta};
use crate::assets::items::{extract_candidates, CandidateKind, ItemDefinition, ModelNode};
use crate::assets::{model, AssetError, AssetReference, ContentRoot, ModelDefinition, ResolvedModel};
use crate::cache::MemoCache;
use crate::codec::{self, RgbaImage};
use crate::config::RenderConfig;
use crate::mapper::try_map_bounded;
use crate::renderer;

type Lookup<T> = Result<Option<Arc<T>>, AssetError>;

/// Caches and settings shared by every item of one batch run.
pub struct AssetContext {
    root: ContentRoot,
    config: RenderConfig,
    models: MemoCache<AssetReference, Lookup<ModelDefinition>>,
    resolved: MemoCache<AssetReference, Lookup<ResolvedModel>>,
    textures: MemoCache<AssetReference, Lookup<RgbaImage>>,
    renders: MemoCache<AssetReference, Lookup<RgbaImage>>,
}

/// A resolved sprite and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemOutcome {
    pub image: Arc<RgbaImage>,
    /// The texture used directly, if the sprite is a flat texture.
    pub source_texture: Option<String>,
    /// The model the sprite was rendered from or whose texture was used.
    pub source_model: Option<String>,
}

/// The result for one item; `outcome` is `None` when nothing resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemResult {
    pub id: String,
    pub outcome: Option<ItemOutcome>,
}

impl AssetContext {
    pub fn new(root: ContentRoot, config: RenderConfig) -> Self {
        Self {
            root,
            config: config.normalized(),
            models: MemoCache::new(),
            resolved: MemoCache::new(),
            textures: MemoCache::new(),
            renders: MemoCache::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Loads one model document without following its parents.
    pub async fn load_model(&self, reference: &AssetReference) -> Lookup<ModelDefinition> {
        self.models
            .get(reference.clone(), move || self.read_model(reference))
            .await
    }

    /// Loads a model with its inheritance chain merged.
    pub async fn resolve_model(&self, reference: &AssetReference) -> Lookup<ResolvedModel> {
        self.resolved
            .get(reference.clone(), move || self.merge_model(reference))
            .await
    }

    /// Loads and decodes a texture, cropping animated strips to one frame.
    ///
    /// Missing, malformed, and unsupported images all resolve to `None`.
    pub async fn load_texture(&self, reference: &AssetReference) -> Lookup<RgbaImage> {
        self.textures
            .get(reference.clone(), move || self.read_texture(reference))
            .await
    }

    /// Renders a block model to a sprite.
    pub async fn render_model(&self, reference: &AssetReference) -> Lookup<RgbaImage> {
        self.renders
            .get(reference.clone(), move || self.draw_model(reference))
            .await
    }

    async fn read_model(&self, reference: &AssetReference) -> Lookup<ModelDefinition> {
        let Some(bytes) = self.root.read(&reference.model_path()).await? else {
            return Ok(None);
        };
        match ModelDefinition::parse(&bytes) {
            Ok(definition) => Ok(Some(Arc::new(definition))),
            Err(e) => {
                tracing::debug!("unreadable model {}: {}", reference, e);
                Ok(None)
            }
        }
    }

    async fn merge_model(&self, reference: &AssetReference) -> Lookup<ResolvedModel> {
        let resolved =
            model::resolve_model(reference, move |r| async move { self.load_model(&r).await }).await?;
        Ok(resolved.map(Arc::new))
    }

    async fn read_texture(&self, reference: &AssetReference) -> Lookup<RgbaImage> {
        let Some(png) = self.root.read(&reference.texture_path()).await? else {
            return Ok(None);
        };
        let meta = self
            .root
            .read(&reference.texture_meta_path())
            .await?
            .and_then(|bytes| AnimationMeta::parse(&bytes));
        let png = match &meta {
            Some(meta) => animation::first_frame_or_original(&png, meta),
            None => Cow::Borrowed(png.as_slice()),
        };
        match codec::decode(&png) {
            Ok(image) => Ok(Some(Arc::new(image))),
            Err(e) => {
                tracing::debug!("cannot decode texture {}: {}", reference, e);
                Ok(None)
            }
        }
    }

    async fn draw_model(&self, reference: &AssetReference) -> Lookup<RgbaImage> {
        let Some(resolved) = self.resolve_model(reference).await? else {
            return Ok(None);
        };
        if resolved.elements.is_empty() {
            return Ok(None);
        }

        let mut textures = HashMap::new();
        for texture in renderer::required_textures(&resolved, self.config.view) {
            if let Some(image) = self.load_texture(&texture).await? {
                textures.insert(texture, image);
            }
        }

        let image = renderer::render_model(&resolved, &textures, &self.config);
        if image.is_none() {
            tracing::debug!("render of {} drew nothing", reference);
        }
        Ok(image.map(Arc::new))
    }

    async fn try_texture(&self, reference: &AssetReference) -> Result<Option<ItemOutcome>, AssetError> {
        Ok(self.load_texture(reference).await?.map(|image| ItemOutcome {
            image,
            source_texture: Some(reference.to_string()),
            source_model: None,
        }))
    }

    /// Renders the model, or else uses the first of its textures that loads.
    async fn try_model(&self, reference: &AssetReference) -> Result<Option<ItemOutcome>, AssetError> {
        if let Some(image) = self.render_model(reference).await? {
            return Ok(Some(ItemOutcome {
                image,
                source_texture: None,
                source_model: Some(reference.to_string()),
            }));
        }

        let Some(resolved) = self.resolve_model(reference).await? else {
            return Ok(None);
        };
        for texture in resolved.textures.texture_candidates() {
            let texture = AssetReference::parse(&texture);
            if let Some(image) = self.load_texture(&texture).await? {
                return Ok(Some(ItemOutcome {
                    image,
                    source_texture: Some(texture.to_string()),
                    source_model: Some(reference.to_string()),
                }));
            }
        }
        Ok(None)
    }

    /// Resolves a sprite for one item.
    ///
    /// # Errors
    /// Only fatal [`AssetError`]s are returned; an item that resolves to
    /// nothing is `Ok(None)`.
    pub async fn resolve_item(&self, item: &ItemDefinition) -> Result<Option<ItemOutcome>, AssetError> {
        let candidates = extract_candidates(&ModelNode::parse(&item.definition));
        if candidates.is_empty() {
            tracing::warn!("item {} has no model or texture candidates", item.id);
        }

        for candidate in &candidates {
            let reference = AssetReference::parse(&candidate.reference);
            let outcome = match candidate.kind {
                CandidateKind::Texture => self.try_texture(&reference).await?,
                CandidateKind::Model => self.try_model(&reference).await?,
            };
            if outcome.is_some() {
                return Ok(outcome);
            }
        }

        let id = AssetReference::parse(&item.id);
        let fallback = AssetReference::new(&id.namespace, &format!("item/{}", id.path));
        if let Some(outcome) = self.try_texture(&fallback).await? {
            return Ok(Some(outcome));
        }
        let outcome = self.try_model(&fallback).await?;
        if outcome.is_none() {
            tracing::debug!("no sprite for {}", item.id);
        }
        Ok(outcome)
    }
}

/// Resolves every item under the configured concurrency limit.
///
/// Results are in the same order as `items`.
///
/// # Errors
/// Returns the first fatal [`AssetError`] any item hit; no further items
/// are started after it.
pub async fn run_batch(
    context: Arc<AssetContext>,
    items: Vec<ItemDefinition>,
) -> Result<Vec<ItemResult>, AssetError> {
    let total = items.len();
    let limit = context.config.concurrency;
    tracing::info!("resolving {} items with {} workers", total, limit);

    let results = try_map_bounded(items, limit, move |item| {
        let context = Arc::clone(&context);
        let item = item.clone();
        async move {
            let outcome = context.resolve_item(&item).await?;
            Ok::<_, AssetError>(ItemResult {
                id: item.id,
                outcome,
            })
        }
    })
    .await?;

    let resolved = results.iter().filter(|r| r.outcome.is_some()).count();
    tracing::info!("resolved {} of {} items", resolved, total);
    Ok(results)
}
