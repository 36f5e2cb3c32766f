//! GraphQL operations: argument decoding, query construction, engine call and output shaping.
//!
//! [`CatalogResolver`] is built once with its collaborators and shared by every request. All
//! request-scoped state lives in the [`RequestContext`] handed to each call.

mod args;
mod attributes;
mod categories;
mod cms;
mod products;
mod search;

pub use args::{
    AttributesArgs, CategoriesArgs, CategoryListArgs, CmsBlockArgs, CmsPageArgs, ProductsArgs,
    SearchArgs, SortArg,
};

use crate::attributes::AttributeDataProvider;
use crate::config::ResolverConfig;
use crate::error::{ResolverError, ResolverResult};
use crate::fields::{AttributeFieldResolver, MappedFieldResolver};
use crate::filters::{FilterOutcome, FilterTranslator};
use crate::hooks::EventHooks;
use crate::projection::QueryFields;
use crate::search::{SearchClient, SearchQuery, SearchResponse};
use crate::search_terms::{NoopSearchTermTracker, SearchTermTracker, TrackedQuery};
use crate::store::StoreContext;
use catalog_common::{Document, Dropped, EntityType, FilterExpression, QueryField};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const PRODUCT_OBJECT_TYPE: &str = "product";
pub const CATEGORY_OBJECT_TYPE: &str = "category";
pub const CMS_PAGE_OBJECT_TYPE: &str = "cms_page";
pub const CMS_BLOCK_OBJECT_TYPE: &str = "cms_block";
pub const SEARCH_TERM_OBJECT_TYPE: &str = "search_term";

/// Per-request state shared between the operations of one GraphQL request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Arguments derived by `search`, used by a following `products` call that has neither
    /// `search` nor `filter` of its own.
    pub search_args: Option<Map<String, Value>>,
    /// Query recorded by `search`, whose result count `products` reports back.
    pub tracked_query: Option<TrackedQuery>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct CatalogResolver {
    config: Arc<ResolverConfig>,
    store: Arc<dyn StoreContext>,
    fields: Arc<dyn AttributeFieldResolver>,
    client: Arc<dyn SearchClient>,
    hooks: EventHooks,
    tracker: Arc<dyn SearchTermTracker>,
    attributes: Option<AttributeDataProvider>,
}

impl CatalogResolver {
    pub fn new(
        config: ResolverConfig,
        store: Arc<dyn StoreContext>,
        client: Arc<dyn SearchClient>,
    ) -> Self {
        let fields = Arc::new(MappedFieldResolver::from_config(&config));
        Self {
            config: Arc::new(config),
            store,
            fields,
            client,
            hooks: EventHooks::new(),
            tracker: Arc::new(NoopSearchTermTracker),
            attributes: None,
        }
    }

    pub fn with_field_resolver(mut self, fields: Arc<dyn AttributeFieldResolver>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_hooks(mut self, hooks: EventHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn SearchTermTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_attribute_provider(mut self, provider: AttributeDataProvider) -> Self {
        self.attributes = Some(provider);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn hooks_mut(&mut self) -> &mut EventHooks {
        &mut self.hooks
    }

    fn store_id(&self) -> i64 {
        self.store.current_store_id()
    }

    /// Physical field of a structural attribute such as `id` or `level`. Falls back to a string
    /// field of the same name so that scoping filters are never silently lost.
    fn field(&self, code: &str, entity: EntityType) -> QueryField {
        self.fields
            .resolve_field(code, None, entity)
            .unwrap_or_else(|| QueryField::string(code))
    }

    /// New query scoped to the current store and the given document type.
    fn scoped_query(&self, entity: EntityType, object_type: &str) -> SearchQuery {
        let mut query = self.client.new_query();
        query
            .add_filter(FilterExpression::eq(
                "store_id",
                self.field("store_id", entity),
                self.store_id(),
            ))
            .add_filter(FilterExpression::eq(
                "object_type",
                self.field("object_type", entity),
                object_type,
            ));
        query
    }

    fn translate_filter(&self, filter: &Map<String, Value>, entity: EntityType) -> FilterOutcome {
        FilterTranslator::new(&self.config, self.fields.as_ref(), entity).translate(filter)
    }

    /// Physical field name to attribute code for every requested field that resolves.
    fn physical_fields(
        &self,
        fields: &QueryFields,
        entity: EntityType,
    ) -> IndexMap<String, String> {
        let mut mapping = IndexMap::new();
        for code in fields.iter() {
            match self.fields.resolve_field(code, None, entity) {
                Some(field) => {
                    mapping.insert(field.name, code.to_string());
                }
                None => tracing::debug!(code, "requested field has no physical field"),
            }
        }
        mapping
    }

    async fn execute(&self, query: &SearchQuery) -> ResolverResult<SearchResponse> {
        self.client.execute(query).await.map_err(|e| {
            tracing::error!(
                filters = ?query.filter_clauses(),
                "Search engine request failed: {:#}",
                e
            );
            ResolverError::Upstream(e)
        })
    }
}

/// Renames physical fields back to the attribute codes they were requested as.
fn rename_to_codes(document: &Document, mapping: &IndexMap<String, String>) -> Document {
    let fields = document
        .fields()
        .iter()
        .map(|(name, value)| {
            let code = mapping.get(name).cloned().unwrap_or_else(|| name.clone());
            (code, value.clone())
        })
        .collect();
    Document::from_fields(fields)
}

fn debug_info(engine: Option<&Value>, dropped: &[Dropped]) -> Value {
    json!({
        "query": engine.cloned().unwrap_or(Value::Null),
        "dropped": dropped,
    })
}

#[cfg(test)]
mod tests;
