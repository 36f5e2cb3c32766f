use super::args::{parse_args, SearchArgs};
use super::{CatalogResolver, RequestContext, SEARCH_TERM_OBJECT_TYPE};
use crate::error::{ResolverError, ResolverResult};
use crate::hooks::{SEARCH_ARGS_AFTER, SEARCH_TEXT_BEFORE};
use crate::search_terms::{sanitize_canonical_url, TrackedQuery};
use catalog_common::{normalize_search_text, Document, EntityType, FilterExpression, QueryField};
use serde_json::{json, Map, Value};

impl CatalogResolver {
    /// `search(query, autosuggest)`.
    ///
    /// Resolves the query against the search-term index. A term with a redirect answers with
    /// the redirect payload. Otherwise the derived `products` arguments are stored on `ctx` and
    /// whatever the `prepare_mssearch_resolver_args_after` listeners put under `return` is
    /// answered (an empty object by default).
    pub async fn search(&self, ctx: &mut RequestContext, args: &Value) -> ResolverResult<Value> {
        let parsed: SearchArgs = parse_args(args)?;
        let Some(raw) = parsed.query.as_deref() else {
            return Err(ResolverError::invalid_input(
                "'query' input argument is required.",
            ));
        };

        let original_text = normalize_search_text(raw);
        if original_text.is_empty() {
            return Ok(json!({}));
        }
        let mut payload = json!({"text": original_text, "original_text": original_text});
        self.hooks.dispatch(SEARCH_TEXT_BEFORE, &mut payload);
        let text = payload["text"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| original_text.clone());

        let term = self.search_term(&text).await?;
        let term_text = term
            .as_ref()
            .and_then(|doc| doc.get_string("query_text"))
            .filter(|query_text| !query_text.is_empty());

        if !parsed.autosuggest {
            let tracked = TrackedQuery::prepare(
                term_text.as_deref().unwrap_or(&text),
                &self.config.search_terms,
            );
            if !tracked.query_text.is_empty() {
                if let Err(e) = self.tracker.record_query(&tracked, self.store_id()).await {
                    tracing::error!(
                        query = %tracked.query_text,
                        "Failed to record search term: {:#}",
                        e
                    );
                }
            }
            ctx.tracked_query = Some(tracked);

            let redirect = term
                .as_ref()
                .and_then(|doc| doc.get_string("redirect"))
                .and_then(|url| sanitize_canonical_url(Some(&url)));
            if let Some(canonical_url) = redirect {
                tracing::debug!(%text, %canonical_url, "search term redirects");
                let mut derived = object_args(args);
                derived.insert("redirect".to_string(), Value::Bool(true));
                ctx.search_args = Some(derived);
                return Ok(json!({
                    "redirect": {
                        "type": "REDIRECT",
                        "id": 301,
                        "canonical_url": canonical_url,
                    }
                }));
            }
        }

        let final_text = term_text.unwrap_or_else(|| text.clone());
        let mut payload = json!({
            "search_text": final_text,
            "original_search_text": original_text,
            "args": {"search": final_text},
            "return": {},
            "search_term": term.map_or(Value::Null, |doc| Value::Object(doc.into_fields())),
        });
        self.hooks.dispatch(SEARCH_ARGS_AFTER, &mut payload);

        let mut derived = object_args(args);
        if let Some(Value::Object(overrides)) = payload.get_mut("args").map(Value::take) {
            derived.extend(overrides);
        }
        ctx.search_args = Some(derived);

        match payload.get_mut("return").map(Value::take) {
            Some(ret @ Value::Object(_)) => Ok(ret),
            _ => Ok(json!({})),
        }
    }

    /// First search-term document of the current store whose `query_text` equals `text`.
    async fn search_term(&self, text: &str) -> ResolverResult<Option<Document>> {
        let mut query = self.scoped_query(EntityType::Product, SEARCH_TERM_OBJECT_TYPE);
        query
            .add_filter(FilterExpression::eq(
                "query_text",
                QueryField::string("query_text"),
                text,
            ))
            .set_page_size(1);
        let response = self.execute(&query).await?;
        Ok(response.first_document().cloned())
    }
}

fn object_args(args: &Value) -> Map<String, Value> {
    match args {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}
