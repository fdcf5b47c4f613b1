//! Node translators: project one node-selector result item into a node.

use std::sync::Arc;

use serde_json::{Map, Value};
use stratus_core::FxHashMap;

/// A translated node before containment defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeItem {
    pub id: String,
    pub parent: Option<String>,
    pub metadata: Map<String, Value>,
}

impl NodeItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            metadata: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Attach a categorized facet (`identity`, `location`, `tags`,
    /// `attributes`, ...). Facets are carried into node metadata as-is.
    pub fn with_facet(mut self, name: &str, facet: Value) -> Self {
        self.metadata.insert(name.to_string(), facet);
        self
    }
}

pub trait NodeTranslator: Send + Sync {
    /// `None` skips the item.
    fn translate(&self, item: &Value) -> Option<NodeItem>;
}

impl<F> NodeTranslator for F
where
    F: Fn(&Value) -> Option<NodeItem> + Send + Sync,
{
    fn translate(&self, item: &Value) -> Option<NodeItem> {
        self(item)
    }
}

/// Reads `{id, parent?, ...}`; every other field becomes metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl NodeTranslator for DefaultTranslator {
    fn translate(&self, item: &Value) -> Option<NodeItem> {
        let object = item.as_object()?;
        let id = object.get("id")?.as_str()?;
        if id.is_empty() {
            return None;
        }
        let parent = object
            .get("parent")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        let metadata = object
            .iter()
            .filter(|(k, v)| k.as_str() != "id" && k.as_str() != "parent" && !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(NodeItem {
            id: id.to_string(),
            parent,
            metadata,
        })
    }
}

/// Translators registered per service key, falling back to [`DefaultTranslator`].
#[derive(Clone, Default)]
pub struct TranslatorSet {
    by_service: FxHashMap<String, Arc<dyn NodeTranslator>>,
}

impl TranslatorSet {
    pub fn register(&mut self, service_key: impl Into<String>, translator: Arc<dyn NodeTranslator>) {
        self.by_service.insert(service_key.into(), translator);
    }

    pub fn translate(&self, service_key: &str, item: &Value) -> Option<NodeItem> {
        match self.by_service.get(service_key) {
            Some(translator) => translator.translate(item),
            None => DefaultTranslator.translate(item),
        }
    }
}
