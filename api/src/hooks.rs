//! Named extension points fired around resolver steps.
//!
//! Every listener receives the mutable payload and may rewrite it in place before the resolver
//! continues. Dispatching an event nobody listens to is a no-op.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type Listener = Arc<dyn Fn(&mut Value) + Send + Sync>;

pub const SEARCH_TEXT_BEFORE: &str = "prepare_mssearch_search_text_before";
pub const SEARCH_ARGS_AFTER: &str = "prepare_mssearch_resolver_args_after";
pub const PRODUCT_RESULT_RETURN_BEFORE: &str = "product_resolver_result_return_before";
pub const CATEGORY_RESULT_RETURN_BEFORE: &str = "category_resolver_result_return_before";

/// `prepare_<entity>_resolver_result_before`, payload: the raw document.
pub fn result_before(entity: &str) -> String {
    format!("prepare_{}_resolver_result_before", entity)
}

/// `prepare_<entity>_resolver_result_after`, payload: the flattened field map.
pub fn result_after(entity: &str) -> String {
    format!("prepare_{}_resolver_result_after", entity)
}

#[derive(Clone, Default)]
pub struct EventHooks {
    listeners: HashMap<String, Vec<Listener>>,
}

impl std::fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut events: Vec<_> = self
            .listeners
            .iter()
            .map(|(name, listeners)| (name.as_str(), listeners.len()))
            .collect();
        events.sort();
        f.debug_struct("EventHooks").field("events", &events).finish()
    }
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, event: &str, listener: F) -> &mut Self
    where
        F: Fn(&mut Value) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(Arc::new(listener));
        self
    }

    /// Runs the listeners of `event` in registration order.
    pub fn dispatch(&self, event: &str, payload: &mut Value) {
        if let Some(listeners) = self.listeners.get(event) {
            tracing::trace!(event, listeners = listeners.len(), "dispatching hook");
            for listener in listeners {
                listener(payload);
            }
        }
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners
            .get(event)
            .is_some_and(|listeners| !listeners.is_empty())
    }
}

/// Listener for [`PRODUCT_RESULT_RETURN_BEFORE`]: replaces a JSON-encoded `media_gallery`
/// string on every item with the decoded structure. Items whose gallery does not decode are
/// left untouched.
pub fn decode_media_gallery(items: &mut Value) {
    let Some(items) = items.as_array_mut() else {
        return;
    };
    for item in items.iter_mut() {
        let Some(object) = item.as_object_mut() else {
            continue;
        };
        let decoded = match object.get("media_gallery") {
            Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded).ok(),
            _ => None,
        };
        if let Some(gallery) = decoded.filter(|g| !g.is_null()) {
            object.insert("media_gallery".to_string(), gallery);
        }
    }
}
