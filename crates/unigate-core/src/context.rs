//! The per-request evaluation context and dotted-path resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transient, per-request context a policy condition is evaluated against.
///
/// The context is a single generic JSON document. By convention the web
/// layer assembles it as `{"user": {...}, "context": {...}}`, where `user`
/// carries the authenticated principal's attributes (`id`, `role`,
/// `department`, ...) and `context` carries request-derived facts (body
/// fields, path params, server-computed booleans). Nothing in this crate
/// depends on that shape: condition field paths are resolved against
/// whatever document the caller supplies.
///
/// Constructed fresh per access check and discarded after the decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationContext {
    root: Value,
}

impl EvaluationContext {
    /// Wraps an already-assembled context document.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Builds the conventional two-part document from the subject's
    /// attributes and the request facts.
    pub fn from_parts(user: Value, request: Value) -> Self {
        let mut root = serde_json::Map::new();
        root.insert("user".to_string(), user);
        root.insert("context".to_string(), request);
        Self {
            root: Value::Object(root),
        }
    }

    /// The underlying context document.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resolves a dotted path (e.g. `"user.id"`, `"context.body.takenBy"`)
    /// into the context document.
    ///
    /// Each segment indexes an object by key; a numeric segment also indexes
    /// an array by position. A missing key, an out-of-range index, or a
    /// traversal into a scalar resolves to `None` — the distinguished
    /// "undefined" value. Resolution never fails loudly.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}
