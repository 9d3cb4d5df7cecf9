//! Provides item model definitions and texture/model candidate extraction.
//!
//! An item definition is a tree of dispatch nodes (`condition`, `select`,
//! `range_dispatch`, `composite`, ...) whose leaves name models or
//! textures. Parsing produces a typed [`ModelNode`] tree with children
//! already in traversal order; [`extract_candidates`] then walks it
//! depth-first.
//!
//! # Examples
//! ```
//! use serde_json::json;
//!
//! use glimpse_items::assets::items::{extract_candidates, Candidate, ModelNode};
//!
//! let tree = json!({"model": {"type": "minecraft:model", "model": "item/apple"}});
//! let candidates = extract_candidates(&ModelNode::parse(&tree));
//! assert_eq!(candidates, vec![Candidate::model("item/apple")]);
//! ```

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::{AssetError, ContentRoot};

/// Item definitions live here, one `<id>.json` per item.
pub const ITEMS_DIR: &str = "minecraft/items";
/// Optional combined index of every item definition.
pub const ITEMS_INDEX: &str = "minecraft/items/_all.json";

/// Whether a candidate names a model or a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Model,
    Texture,
}

/// A plausible model or texture reference for an item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub reference: String,
}

impl Candidate {
    pub fn model(reference: impl Into<String>) -> Self {
        Self {
            kind: CandidateKind::Model,
            reference: reference.into(),
        }
    }

    pub fn texture(reference: impl Into<String>) -> Self {
        Self {
            kind: CandidateKind::Texture,
            reference: reference.into(),
        }
    }
}

/// The dispatch kind of a definition node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// `{"type": "model", "model": "<ref>"}`
    Model(String),
    /// `{"type": "special", "base": "<ref>", "model": {...}}`
    Special(String),
    /// `{"type": "condition", "on_true": ..., "on_false": ...}`
    Condition,
    /// `{"type": "select", "cases": [...], "fallback": ...}`
    Select,
    /// `{"type": "range_dispatch", "entries": [...], "fallback": ...}`
    RangeDispatch,
    /// `{"type": "composite", "models": [...]}`
    Composite,
    /// Any other object or array; children are visited in key order.
    Container,
}

/// Order in which child keys are visited on every node, before any other
/// key.
pub const CHILD_KEY_PRIORITY: [&str; 7] = [
    "fallback", "on_false", "model", "on_true", "cases", "entries", "models",
];

impl NodeKind {
    fn classify(object: &Map<String, Value>) -> Self {
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map(|t| t.strip_prefix("minecraft:").unwrap_or(t));
        let string_field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match kind {
            Some("model") => string_field("model").map_or(NodeKind::Container, NodeKind::Model),
            Some("special") => string_field("base").map_or(NodeKind::Container, NodeKind::Special),
            Some("condition") => NodeKind::Condition,
            Some("select") => NodeKind::Select,
            Some("range_dispatch") => NodeKind::RangeDispatch,
            Some("composite") => NodeKind::Composite,
            _ => NodeKind::Container,
        }
    }
}

/// A parsed item-definition node.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelNode {
    pub kind: NodeKind,
    /// A `texture` field on the node, if any.
    pub texture: Option<String>,
    /// Child nodes in traversal order.
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    fn empty() -> Self {
        Self {
            kind: NodeKind::Container,
            texture: None,
            children: Vec::new(),
        }
    }

    /// Parses a JSON definition tree.
    ///
    /// Unrecognized shapes parse to containers, and scalars contribute no
    /// children, so a malformed tree yields fewer candidates rather than
    /// an error.
    pub fn parse(value: &Value) -> Self {
        match value {
            Value::Object(object) => Self::parse_object(object),
            Value::Array(items) => Self {
                children: items.iter().filter_map(Self::parse_child).collect(),
                ..Self::empty()
            },
            _ => Self::empty(),
        }
    }

    fn parse_child(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) | Value::Array(_) => Some(Self::parse(value)),
            _ => None,
        }
    }

    fn parse_object(object: &Map<String, Value>) -> Self {
        let kind = NodeKind::classify(object);

        let ordered = CHILD_KEY_PRIORITY.iter().filter_map(|key| object.get(*key));
        let rest = object
            .iter()
            .filter(|(key, _)| !CHILD_KEY_PRIORITY.contains(&key.as_str()))
            .map(|(_, value)| value);
        let children = ordered.chain(rest).filter_map(Self::parse_child).collect();

        Self {
            kind,
            texture: object
                .get("texture")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            children,
        }
    }
}

/// Walks a definition tree depth-first and returns its candidates in first
/// seen order, deduplicated by kind and reference.
pub fn extract_candidates(root: &ModelNode) -> Vec<Candidate> {
    fn visit(node: &ModelNode, seen: &mut HashSet<Candidate>, out: &mut Vec<Candidate>) {
        let own = match &node.kind {
            NodeKind::Model(reference) | NodeKind::Special(reference) => {
                Some(Candidate::model(reference.as_str()))
            }
            _ => None,
        };
        let texture = node.texture.as_deref().map(Candidate::texture);
        for candidate in own.into_iter().chain(texture) {
            if seen.insert(candidate.clone()) {
                out.push(candidate);
            }
        }
        for child in &node.children {
            visit(child, seen, out);
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    visit(root, &mut seen, &mut out);
    out
}

/// One item from the content root's item definitions.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemDefinition {
    pub id: String,
    pub definition: Value,
}

/// Loads every item definition, sorted by id and truncated to `limit`.
///
/// Reads `minecraft/items/_all.json` (an object of id to definition) if it
/// exists, otherwise each `minecraft/items/*.json` file, using the file stem
/// as the id. Unparseable files are skipped with a warning.
///
/// # Errors
/// Returns [`AssetError::Io`] for unreadable files or directories.
pub async fn load_item_index(
    root: &ContentRoot,
    limit: Option<usize>,
) -> Result<Vec<ItemDefinition>, AssetError> {
    let mut items = Vec::new();

    if let Some(bytes) = root.read(ITEMS_INDEX).await? {
        match serde_json::from_slice::<Map<String, Value>>(&bytes) {
            Ok(all) => items.extend(
                all.into_iter()
                    .map(|(id, definition)| ItemDefinition { id, definition }),
            ),
            Err(e) => tracing::warn!("ignoring unreadable {}: {}", ITEMS_INDEX, e),
        }
    } else {
        for path in root.list_json(ITEMS_DIR).await? {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if id.starts_with('_') {
                continue;
            }
            let bytes = tokio::fs::read(&path).await.map_err(|e| AssetError::Io {
                path: path.clone(),
                source: std::sync::Arc::new(e),
            })?;
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(definition) => items.push(ItemDefinition { id, definition }),
                Err(e) => tracing::warn!("ignoring unreadable item {}: {}", path.display(), e),
            }
        }
    }

    items.sort_by(|a, b| a.id.cmp(&b.id));
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidates(value: Value) -> Vec<Candidate> {
        extract_candidates(&ModelNode::parse(&value))
    }

    #[test]
    fn test_model_and_special_nodes() {
        let found = candidates(json!({
            "model": {
                "type": "minecraft:special",
                "base": "item/chest",
                "model": {"type": "minecraft:chest", "texture": "entity/chest/normal"}
            }
        }));
        assert_eq!(
            found,
            vec![
                Candidate::model("item/chest"),
                Candidate::texture("entity/chest/normal"),
            ]
        );
    }

    #[test]
    fn test_condition_visits_on_false_first() {
        let found = candidates(json!({
            "model": {
                "type": "condition",
                "property": "using_item",
                "on_true": {"type": "model", "model": "item/bow_pulling"},
                "on_false": {"type": "model", "model": "item/bow"}
            }
        }));
        assert_eq!(
            found,
            vec![Candidate::model("item/bow"), Candidate::model("item/bow_pulling")]
        );
    }

    #[test]
    fn test_select_fallback_before_cases() {
        let found = candidates(json!({
            "model": {
                "type": "select",
                "cases": [
                    {"when": "a", "model": {"type": "model", "model": "item/case_a"}},
                    {"when": ["b", "c"], "model": {"type": "model", "model": "item/case_b"}}
                ],
                "fallback": {"type": "model", "model": "item/default"}
            }
        }));
        assert_eq!(
            found,
            vec![
                Candidate::model("item/default"),
                Candidate::model("item/case_a"),
                Candidate::model("item/case_b"),
            ]
        );
    }

    #[test]
    fn test_range_dispatch_and_composite() {
        let found = candidates(json!({
            "model": {
                "type": "range_dispatch",
                "entries": [
                    {"threshold": 0.5, "model": {"type": "composite", "models": [
                        {"type": "model", "model": "item/half"},
                        {"type": "model", "model": "item/overlay"}
                    ]}}
                ],
                "fallback": {"type": "model", "model": "item/empty"}
            }
        }));
        assert_eq!(
            found,
            vec![
                Candidate::model("item/empty"),
                Candidate::model("item/half"),
                Candidate::model("item/overlay"),
            ]
        );
    }

    #[test]
    fn test_unknown_keys_visited_after_priority_keys() {
        let found = candidates(json!({
            "extra": {"texture": "item/extra"},
            "models": [{"type": "model", "model": "item/second"}],
            "fallback": {"type": "model", "model": "item/first"}
        }));
        assert_eq!(
            found,
            vec![
                Candidate::model("item/first"),
                Candidate::model("item/second"),
                Candidate::texture("item/extra"),
            ]
        );
    }

    #[test]
    fn test_deduplicates_by_kind_and_reference() {
        let found = candidates(json!({
            "model": {
                "type": "condition",
                "on_false": {"type": "model", "model": "item/x", "texture": "item/x"},
                "on_true": {"type": "model", "model": "item/x"}
            }
        }));
        assert_eq!(found, vec![Candidate::model("item/x"), Candidate::texture("item/x")]);
    }

    #[test]
    fn test_malformed_shapes_fail_closed() {
        assert!(candidates(json!("item/apple")).is_empty());
        assert!(candidates(json!({"model": {"type": "model", "model": 7}})).is_empty());
        assert!(candidates(json!({"model": {"type": "special"}})).is_empty());
        assert!(candidates(json!(null)).is_empty());
    }

    #[test]
    fn test_condition_with_model_key_keeps_fixed_order() {
        let found = candidates(json!({
            "type": "condition",
            "on_true": {"type": "model", "model": "item/a"},
            "model": {"type": "model", "model": "item/b"},
            "on_false": {"type": "model", "model": "item/c"}
        }));
        assert_eq!(
            found,
            vec![
                Candidate::model("item/c"),
                Candidate::model("item/b"),
                Candidate::model("item/a"),
            ]
        );
    }

    #[test]
    fn test_special_visits_fallback_before_model() {
        let found = candidates(json!({
            "type": "special",
            "base": "item/base",
            "model": {"type": "model", "model": "item/inner"},
            "fallback": {"type": "model", "model": "item/fb"}
        }));
        assert_eq!(
            found,
            vec![
                Candidate::model("item/base"),
                Candidate::model("item/fb"),
                Candidate::model("item/inner"),
            ]
        );
    }
}
