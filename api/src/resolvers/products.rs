use super::args::{parse_args, ProductsArgs};
use super::{debug_info, rename_to_codes, CatalogResolver, RequestContext, PRODUCT_OBJECT_TYPE};
use crate::error::{ResolverError, ResolverResult};
use crate::hooks::PRODUCT_RESULT_RETURN_BEFORE;
use crate::projection::{
    document_attributes, project_facets, project_stats, QueryFields, ResultProjector,
};
use crate::search::SortDirection;
use crate::search_terms::alternative_search_texts;
use catalog_common::{normalize_search_text, sanitize_filter_token, Dropped, EntityType};
use serde_json::{json, Value};

const ENTITY: &str = "msproduct";

impl CatalogResolver {
    /// `products(search, filter, sort, pageSize, currentPage, debug)`.
    ///
    /// `selection` is the requested output shape, e.g.
    /// `{"items": {"sku": {}, "name": {}}, "facets": {"code": {}}}`.
    pub async fn products(
        &self,
        ctx: &mut RequestContext,
        args: &Value,
        selection: &Value,
    ) -> ResolverResult<Value> {
        let args = merge_search_args(args, ctx)?;
        let args: ProductsArgs = parse_args(&args)?;
        let search_text = args
            .search_text()
            .map(normalize_search_text)
            .filter(|text| !text.is_empty());
        if search_text.is_none() && args.filter.is_none() {
            return Err(ResolverError::invalid_input(
                "'search' or 'filter' input argument is required.",
            ));
        }

        let items_selection = selection.get("items").unwrap_or(&Value::Null);
        let items_fields = QueryFields::from_selection(items_selection);
        let wants_ids = selection.get("items_ids").is_some();
        let wants_attributes = items_fields.has_nested("attributes");
        let ids_only = wants_ids
            || (items_fields.len() == 1
                && items_fields.contains("sku")
                && items_fields.nested_len() == 0);

        let id_type = self.id_type_code(&args);
        let max_page_size = if ids_only {
            self.config.page_sizes.ids_only
        } else if search_text.is_some() {
            self.config.page_sizes.search
        } else {
            self.config.page_sizes.default
        };
        let page_size = args
            .page_size
            .map_or(max_page_size, |size| size.min(max_page_size));

        let mut query = self.scoped_query(EntityType::Product, PRODUCT_OBJECT_TYPE);
        let mut fields = items_fields.clone();
        if ids_only {
            fields.insert(&id_type);
        }
        let mapping = self.physical_fields(&fields, EntityType::Product);
        // `attributes` lists every stored field, so nothing is narrowed.
        if !wants_attributes {
            query.add_fields_to_select(mapping.keys());
        }

        if let Some(text) = &search_text {
            query.set_query_text(text);
        }

        let mut dropped = Vec::new();
        if let Some(filter) = &args.filter {
            let outcome = self.translate_filter(filter, EntityType::Product);
            for expression in outcome.expressions {
                query.add_filter(expression);
            }
            dropped.extend(outcome.dropped);
        }

        match self.sort_field(&args, &mut dropped) {
            Some((field, direction)) => {
                query.add_sort(&field, direction);
            }
            None if search_text.is_some() => {
                let field = self.field("score", EntityType::Product);
                query.add_sort(&field.name, SortDirection::Desc);
            }
            None => {}
        }

        if selection.get("facets").is_some() {
            for facet in &self.config.facet_fields {
                query.add_facet(facet);
            }
        }
        if selection.get("stats").is_some() {
            for stat in &self.config.stat_fields {
                query.add_stat(stat);
            }
        }
        query
            .set_page_size(page_size)
            .set_current_page(args.current_page.unwrap_or(1))
            .set_debug(args.debug);

        tracing::debug!(
            store_id = self.store_id(),
            filters = ?query.filter_clauses(),
            page_size,
            ids_only,
            "products query"
        );
        let response = self.execute(&query).await?;

        let projector = ResultProjector::new(&self.hooks, ENTITY);
        let mut items = Vec::with_capacity(response.documents().len());
        let mut items_ids = Vec::new();
        for document in response.documents() {
            let document = rename_to_codes(document, &mapping);
            if let Some(id) = document.get_string(&id_type) {
                items_ids.push(id);
            }
            let mut item = projector.project(&document, &items_fields);
            if wants_attributes {
                let attributes = document_attributes(&document, &self.config.attributes_to_skip);
                item.insert("attributes".to_string(), json!(attributes));
            }
            items.push(Value::Object(item));
        }
        let mut items = Value::Array(items);
        self.hooks.dispatch(PRODUCT_RESULT_RETURN_BEFORE, &mut items);

        let total = response.total_found();
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size as u64)
        };
        let mut result = json!({
            "total_count": total,
            "items": items,
            "items_ids": items_ids,
            "page_info": {
                "page_size": page_size,
                "current_page": query.current_page(),
                "total_pages": total_pages,
            },
            "facets": project_facets(response.facets(), &self.config),
            "stats": project_stats(response.stats(), &self.config.stat_fields),
        });

        if let Some(text) = &search_text {
            if !response.suggestions.is_empty() {
                result["alternative_search_texts"] =
                    json!(alternative_search_texts(text, &response.suggestions));
            }
            if let Some(tracked) = &ctx.tracked_query {
                if let Err(e) = self
                    .tracker
                    .record_num_results(tracked, total, self.store_id())
                    .await
                {
                    tracing::error!(
                        query = %tracked.query_text,
                        "Failed to record search term results: {:#}",
                        e
                    );
                }
            }
        }
        if args.debug {
            result["debug_info"] = debug_info(response.debug_info(), &dropped);
        }
        Ok(result)
    }

    /// Physical sort field and direction of the `sort` argument. A `sort_by` that does not
    /// resolve to a queryable field is dropped.
    fn sort_field(
        &self,
        args: &ProductsArgs,
        dropped: &mut Vec<Dropped>,
    ) -> Option<(String, SortDirection)> {
        let sort = args.sort.as_ref().filter(|sort| !sort.sort_by.is_empty())?;
        let code = sanitize_filter_token(self.config.sort_attribute(&sort.sort_by));
        let Some(field) = self
            .fields
            .resolve_field(&code, None, EntityType::Product)
        else {
            tracing::debug!(sort_by = %sort.sort_by, "sort field dropped");
            dropped.push(Dropped::new(
                "sort.sort_by",
                format!("No sortable field for `{}`", sort.sort_by),
            ));
            return None;
        };
        let direction = sort
            .sort_order
            .as_deref()
            .and_then(|order| order.parse::<SortDirection>().ok())
            .unwrap_or(SortDirection::Asc);
        Some((field.name, direction))
    }

    /// Attribute code of the identifier reported in `items_ids`, from the `id_type` filter key.
    fn id_type_code(&self, args: &ProductsArgs) -> String {
        args.filter
            .as_ref()
            .and_then(|filter| filter.get("id_type"))
            .and_then(Value::as_str)
            .and_then(|id_type| self.config.id_types.get(id_type))
            .or_else(|| self.config.id_types.get("SKU"))
            .cloned()
            .unwrap_or_else(|| "sku".to_string())
    }
}

/// Arguments stored by a preceding `search` fill in when the call has no search or filter.
fn merge_search_args(args: &Value, ctx: &mut RequestContext) -> ResolverResult<Value> {
    let mut merged = match args {
        Value::Object(map) => map.clone(),
        Value::Null => Default::default(),
        _ => {
            return Err(ResolverError::invalid_input(
                "Malformed arguments: expected an object",
            ))
        }
    };
    if merged.contains_key("search") || merged.contains_key("filter") {
        return Ok(Value::Object(merged));
    }
    if let Some(derived) = ctx.search_args.take() {
        for (key, value) in derived {
            merged.entry(key).or_insert(value);
        }
    }
    Ok(Value::Object(merged))
}
