use super::*;
use crate::attributes::{
    AttributeMetadataCache, AttributeOption, AttributeRepository, InMemoryAttributeCache,
};
use crate::hooks;
use crate::search::InMemorySearchClient;
use crate::store::FixedStore;
use async_trait::async_trait;
use std::sync::Mutex;

fn fixture() -> InMemorySearchClient {
    let docs = json!([
        {"id": 1, "store_id": 1, "object_type": "product", "sku": "ABC-1", "name": "Red shirt",
         "color": "red", "price": 10.0, "qty": 5, "category_ids": ["4", "7"],
         "url": "https://shop.example.com/red-shirt.html"},
        {"id": 2, "store_id": 1, "object_type": "product", "sku": "ABC-2", "name": "Blue shirt",
         "color": "blue", "price": 25.5, "qty": 0, "category_ids": ["4"]},
        {"id": 3, "store_id": 1, "object_type": "product", "sku": "XYZ-3", "name": "Red trousers",
         "color": "red", "price": 40.0, "qty": 12, "category_ids": ["8"]},
        {"id": 4, "store_id": 2, "object_type": "product", "sku": "XYZ-4", "name": "Red socks",
         "color": "red", "price": 3.0},

        {"id": 10, "store_id": 1, "object_type": "category", "parent_id": 2, "level": 2,
         "position": 1, "name": "Women"},
        {"id": 11, "store_id": 1, "object_type": "category", "parent_id": 10, "level": 3,
         "position": 2, "name": "Tops"},
        {"id": 12, "store_id": 1, "object_type": "category", "parent_id": 10, "level": 3,
         "position": 1, "name": "Dresses"},
        {"id": 13, "store_id": 1, "object_type": "category", "parent_id": 99, "level": 3,
         "position": 1, "name": "Orphan"},
        {"id": 20, "store_id": 1, "object_type": "category", "parent_id": 2, "level": 2,
         "position": 0, "name": "Men"},

        {"id": 5, "store_id": 1, "object_type": "cms_page", "title": "About us",
         "url": "https://shop.example.com/about-us", "content": "<p>Hi</p>"},
        {"id": 1, "store_id": 1, "object_type": "cms_block", "identifier": "footer",
         "is_active": true, "content": "Footer"},
        {"id": 2, "store_id": 1, "object_type": "cms_block", "identifier": "header",
         "is_active": false, "content": "Header"},

        {"id": 1, "store_id": 1, "object_type": "search_term", "query_text": "shirt"},
        {"id": 2, "store_id": 1, "object_type": "search_term", "query_text": "sale",
         "redirect": "sale.html"}
    ]);
    InMemorySearchClient::from_json(&docs.to_string()).unwrap()
}

/// Wraps the in-memory client and keeps every executed query.
struct RecordingClient {
    inner: InMemorySearchClient,
    queries: Mutex<Vec<SearchQuery>>,
}

impl RecordingClient {
    fn new(inner: InMemorySearchClient) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    fn last(&self) -> SearchQuery {
        self.queries.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl SearchClient for RecordingClient {
    async fn execute(&self, query: &SearchQuery) -> anyhow::Result<SearchResponse> {
        self.queries.lock().unwrap().push(query.clone());
        self.inner.execute(query).await
    }
}

struct FailingClient;

#[async_trait]
impl SearchClient for FailingClient {
    async fn execute(&self, _query: &SearchQuery) -> anyhow::Result<SearchResponse> {
        anyhow::bail!("connection refused")
    }
}

#[derive(Default)]
struct RecordingTracker {
    queries: Mutex<Vec<String>>,
    results: Mutex<Vec<(String, u64)>>,
    fail: bool,
}

#[async_trait]
impl SearchTermTracker for RecordingTracker {
    async fn record_query(&self, query: &TrackedQuery, _store_id: i64) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("tracking table locked");
        }
        self.queries.lock().unwrap().push(query.query_text.clone());
        Ok(())
    }

    async fn record_num_results(
        &self,
        query: &TrackedQuery,
        num_results: u64,
        _store_id: i64,
    ) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap()
            .push((query.query_text.clone(), num_results));
        Ok(())
    }
}

fn resolver() -> (CatalogResolver, Arc<RecordingClient>) {
    resolver_with(ResolverConfig::default())
}

fn resolver_with(config: ResolverConfig) -> (CatalogResolver, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::new(fixture()));
    let resolver = CatalogResolver::new(config, Arc::new(FixedStore(1)), client.clone());
    (resolver, client)
}

fn skus(result: &Value) -> Vec<&str> {
    result["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["sku"].as_str())
        .collect()
}

fn ids(items: &Value) -> Vec<i64> {
    items
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["id"].as_i64())
        .collect()
}

#[tokio::test]
async fn test_products_without_search_or_filter_is_rejected_before_engine_call() {
    let (resolver, client) = resolver();
    let mut ctx = RequestContext::new();

    let err = resolver
        .products(&mut ctx, &json!({"pageSize": 5}), &json!({"items": {"sku": {}}}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidInput(_)));
    assert!(err.is_user_error());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_products_sku_filter_keeps_hyphen() {
    let (resolver, client) = resolver();
    let mut ctx = RequestContext::new();

    let result = resolver
        .products(
            &mut ctx,
            &json!({"filter": {"sku": {"eq": "ABC-1"}}}),
            &json!({"items": {"sku": {}, "name": {}, "url": {}}}),
        )
        .await
        .unwrap();

    assert_eq!(result["total_count"], 1);
    assert_eq!(result["items"][0]["name"], "Red shirt");
    assert_eq!(result["items"][0]["url"], "/red-shirt.html");
    let clauses = client.last().filter_clauses();
    assert!(clauses.contains(&"store_id:1".to_string()));
    assert!(clauses.contains(&"object_type:product".to_string()));
    assert!(clauses.contains(&"sku:ABC-1".to_string()));
}

#[tokio::test]
async fn test_products_paging_and_page_info() {
    let (resolver, _) = resolver();
    let mut ctx = RequestContext::new();

    let result = resolver
        .products(
            &mut ctx,
            &json!({
                "filter": {"color": {"eq": "red"}},
                "sort": {"sort_by": "price", "sort_order": "DESC"},
                "pageSize": 1,
                "currentPage": 2
            }),
            &json!({"items": {"sku": {}, "name": {}}}),
        )
        .await
        .unwrap();

    assert_eq!(result["total_count"], 2);
    assert_eq!(skus(&result), vec!["ABC-1"]);
    assert_eq!(
        result["page_info"],
        json!({"page_size": 1, "current_page": 2, "total_pages": 2})
    );
}

#[tokio::test]
async fn test_products_page_size_is_capped() {
    let mut config = ResolverConfig::default();
    config.page_sizes.default = 2;
    let client = Arc::new(RecordingClient::new(fixture()));
    let resolver = CatalogResolver::new(config, Arc::new(FixedStore(1)), client.clone());

    let result = resolver
        .products(
            &mut RequestContext::new(),
            &json!({"filter": {"category_ids": {"eq": "4"}}, "pageSize": 500}),
            &json!({"items": {"sku": {}, "name": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(result["page_info"]["page_size"], 2);
    assert_eq!(client.last().page_size(), 2);
}

#[tokio::test]
async fn test_products_ids_only_mode() {
    let (resolver, client) = resolver();
    let mut ctx = RequestContext::new();

    let result = resolver
        .products(
            &mut ctx,
            &json!({"filter": {"color": {"eq": "red"}, "id_type": "ID"}}),
            &json!({"items": {"sku": {}, "__typename": {}}, "items_ids": {}}),
        )
        .await
        .unwrap();

    assert_eq!(result["items_ids"], json!(["1", "3"]));
    assert_eq!(skus(&result), vec!["ABC-1", "XYZ-3"]);
    let query = client.last();
    assert_eq!(query.page_size(), 10_000);
    assert_eq!(query.fields(), ["sku", "id"]);
}

#[tokio::test]
async fn test_products_search_mode_sorts_by_score() {
    let (resolver, client) = resolver();
    let mut ctx = RequestContext::new();

    let result = resolver
        .products(
            &mut ctx,
            &json!({"search": "  Shirt!  "}),
            &json!({"items": {"sku": {}}}),
        )
        .await
        .unwrap();

    assert_eq!(result["total_count"], 2);
    let query = client.last();
    assert_eq!(query.query_text(), Some("shirt"));
    assert_eq!(query.sort_clause(), "score desc");
}

#[tokio::test]
async fn test_products_unknown_sort_field_is_dropped() {
    let mut config = ResolverConfig::default();
    config.allow_unmapped = false;
    let (resolver, client) = resolver_with(config);

    let result = resolver
        .products(
            &mut RequestContext::new(),
            &json!({
                "search": "shirt",
                "sort": {"sort_by": "name desc, bogus", "sort_order": "ASC"},
                "debug": true
            }),
            &json!({"items": {"sku": {}}}),
        )
        .await
        .unwrap();

    assert_eq!(client.last().sort_clause(), "score desc");
    let dropped = result["debug_info"]["dropped"].as_array().unwrap();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0]["key"], "sort.sort_by");

    let (resolver, client) = self::resolver();
    resolver
        .products(
            &mut RequestContext::new(),
            &json!({"filter": {"color": {"eq": "red"}}, "sort": {"sort_by": "na:me"}}),
            &json!({"items": {"sku": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(client.last().sort_clause(), "name asc");
}

#[tokio::test]
async fn test_products_facets_stats_and_attributes() {
    let mut config = ResolverConfig::default();
    config.attributes_to_skip = vec!["store_id".to_string(), "object_type".to_string()];
    let resolver = CatalogResolver::new(config, Arc::new(FixedStore(1)), Arc::new(fixture()));

    let result = resolver
        .products(
            &mut RequestContext::new(),
            &json!({"filter": {"color": {"eq": "red"}}}),
            &json!({
                "items": {"sku": {}, "attributes": {"attribute_code": {}, "value": {}}},
                "facets": {"code": {}},
                "stats": {"code": {}}
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        result["facets"],
        json!([{"code": "category_ids", "values": [
            {"value_id": "4", "count": 1},
            {"value_id": "7", "count": 1},
            {"value_id": "8", "count": 1}
        ]}])
    );
    assert_eq!(result["stats"][0]["code"], "price");
    assert_eq!(result["stats"][0]["values"]["min"], 10.0);
    assert_eq!(result["stats"][0]["values"]["max"], 40.0);

    let attributes = result["items"][0]["attributes"].as_array().unwrap();
    assert!(attributes.contains(&json!({"attribute_code": "category_ids", "value": "4, 7"})));
    assert!(!attributes
        .iter()
        .any(|attribute| attribute["attribute_code"] == "store_id"));
}

#[tokio::test]
async fn test_products_debug_lists_dropped_entries() {
    let (resolver, _) = resolver();

    let result = resolver
        .products(
            &mut RequestContext::new(),
            &json!({"filter": {"qty": {"gt": "many"}, "color": {"eq": "blue"}}, "debug": true}),
            &json!({"items": {"sku": {}, "name": {}}}),
        )
        .await
        .unwrap();

    assert_eq!(skus(&result), vec!["ABC-2"]);
    let debug = &result["debug_info"];
    assert_eq!(debug["dropped"][0]["key"], "qty.gt");
    assert_eq!(debug["query"]["code"], 200);
}

#[tokio::test]
async fn test_products_without_debug_has_no_debug_info() {
    let (resolver, _) = resolver();
    let result = resolver
        .products(
            &mut RequestContext::new(),
            &json!({"filter": {"qty": {"gt": 4}}}),
            &json!({"items": {"sku": {}, "name": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(skus(&result), vec!["ABC-1", "XYZ-3"]);
    assert!(result.get("debug_info").is_none());
}

#[tokio::test]
async fn test_products_upstream_failure_propagates() {
    let resolver = CatalogResolver::new(
        ResolverConfig::default(),
        Arc::new(FixedStore(1)),
        Arc::new(FailingClient),
    );

    let err = resolver
        .products(
            &mut RequestContext::new(),
            &json!({"search": "shirt"}),
            &json!({"items": {"sku": {}}}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::Upstream(_)));
    assert!(!err.is_user_error());
}

#[tokio::test]
async fn test_products_hooks_rewrite_items() {
    let (mut resolver, _) = resolver();
    resolver
        .hooks_mut()
        .register(&hooks::result_after("msproduct"), |item| {
            item["badge"] = json!("new");
        })
        .register(hooks::PRODUCT_RESULT_RETURN_BEFORE, |items| {
            if let Some(items) = items.as_array_mut() {
                items.truncate(1);
            }
        });

    let result = resolver
        .products(
            &mut RequestContext::new(),
            &json!({"filter": {"color": {"eq": "red"}}}),
            &json!({"items": {"sku": {}, "name": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(result["items"], json!([{"sku": "ABC-1", "name": "Red shirt", "badge": "new"}]));
}

#[tokio::test]
async fn test_products_alternative_search_texts() {
    let client = fixture().with_suggestions("shrit", &["shirt"]);
    let resolver = CatalogResolver::new(
        ResolverConfig::default(),
        Arc::new(FixedStore(1)),
        Arc::new(client),
    );

    let result = resolver
        .products(
            &mut RequestContext::new(),
            &json!({"search": "shrit"}),
            &json!({"items": {"sku": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(result["total_count"], 0);
    assert_eq!(result["alternative_search_texts"], json!(["shirt"]));
}

#[tokio::test]
async fn test_search_feeds_products_and_tracks_term() {
    let tracker = Arc::new(RecordingTracker::default());
    let (resolver, _) = resolver();
    let resolver = resolver.with_tracker(tracker.clone());
    let mut ctx = RequestContext::new();

    let answer = resolver
        .search(&mut ctx, &json!({"query": "Shirt"}))
        .await
        .unwrap();
    assert_eq!(answer, json!({}));
    assert_eq!(ctx.search_args.as_ref().unwrap()["search"], "shirt");

    let result = resolver
        .products(&mut ctx, &Value::Null, &json!({"items": {"sku": {}}}))
        .await
        .unwrap();
    assert_eq!(skus(&result), vec!["ABC-1", "ABC-2"]);
    assert!(ctx.search_args.is_none());
    assert_eq!(*tracker.queries.lock().unwrap(), vec!["shirt".to_string()]);
    assert_eq!(
        *tracker.results.lock().unwrap(),
        vec![("shirt".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_search_redirect() {
    let (resolver, _) = resolver();
    let mut ctx = RequestContext::new();

    let answer = resolver
        .search(&mut ctx, &json!({"query": "sale"}))
        .await
        .unwrap();
    assert_eq!(
        answer,
        json!({"redirect": {"type": "REDIRECT", "id": 301, "canonical_url": "/sale.html"}})
    );
    assert_eq!(ctx.search_args.as_ref().unwrap()["redirect"], true);
}

#[tokio::test]
async fn test_search_autosuggest_skips_redirect_and_tracking() {
    let tracker = Arc::new(RecordingTracker::default());
    let (resolver, _) = resolver();
    let resolver = resolver.with_tracker(tracker.clone());
    let mut ctx = RequestContext::new();

    let answer = resolver
        .search(&mut ctx, &json!({"query": "sale", "autosuggest": true}))
        .await
        .unwrap();
    assert_eq!(answer, json!({}));
    assert!(ctx.tracked_query.is_none());
    assert!(tracker.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_tracking_failure_is_not_fatal() {
    let tracker = Arc::new(RecordingTracker {
        fail: true,
        ..RecordingTracker::default()
    });
    let (resolver, _) = resolver();
    let resolver = resolver.with_tracker(tracker);
    let mut ctx = RequestContext::new();

    let answer = resolver
        .search(&mut ctx, &json!({"query": "trousers"}))
        .await
        .unwrap();
    assert_eq!(answer, json!({}));
    assert_eq!(ctx.search_args.as_ref().unwrap()["search"], "trousers");
}

#[tokio::test]
async fn test_search_input_validation() {
    let (resolver, client) = resolver();
    let mut ctx = RequestContext::new();

    let err = resolver.search(&mut ctx, &json!({})).await.unwrap_err();
    assert!(matches!(err, ResolverError::InvalidInput(_)));

    let answer = resolver
        .search(&mut ctx, &json!({"query": " !! "}))
        .await
        .unwrap();
    assert_eq!(answer, json!({}));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_search_hooks_rewrite_text_and_return() {
    let (mut resolver, _) = resolver();
    resolver
        .hooks_mut()
        .register(hooks::SEARCH_TEXT_BEFORE, |payload| {
            payload["text"] = json!("trousers");
        })
        .register(hooks::SEARCH_ARGS_AFTER, |payload| {
            payload["return"]["suggested"] = payload["search_text"].clone();
            payload["args"]["pageSize"] = json!(3);
        });
    let mut ctx = RequestContext::new();

    let answer = resolver
        .search(&mut ctx, &json!({"query": "pants"}))
        .await
        .unwrap();
    assert_eq!(answer, json!({"suggested": "trousers"}));
    let args = ctx.search_args.unwrap();
    assert_eq!(args["search"], "trousers");
    assert_eq!(args["pageSize"], 3);
}

#[tokio::test]
async fn test_categories_requires_ids_or_levels() {
    let (resolver, client) = resolver();
    let err = resolver
        .categories(&json!({"levels": [], "children": true}), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidInput(_)));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_categories_out_of_range_ids_are_ignored() {
    let (resolver, client) = resolver();
    let err = resolver
        .categories(&json!({"ids": [2147483648_i64]}), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidInput(_)));
    assert_eq!(client.calls(), 0);

    let result = resolver
        .categories(
            &json!({"ids": [20, 2147483647_i64]}),
            &json!({"items": {"id": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(ids(&result["items"]), vec![20]);
    let filters = client.last().filter_clauses();
    assert!(filters.iter().all(|clause| !clause.contains("2147483647")));
}

#[tokio::test]
async fn test_categories_levels_build_tree() {
    let (resolver, _) = resolver();

    let result = resolver
        .categories(
            &json!({"levels": [2, 3], "debug": true}),
            &json!({"items": {"id": {}, "name": {}, "children": {"id": {}}}}),
        )
        .await
        .unwrap();

    let items = &result["items"];
    assert_eq!(ids(items), vec![20, 10]);
    assert_eq!(items[1]["name"], "Women");
    assert_eq!(ids(&items[1]["children"]), vec![12, 11]);
    assert_eq!(items[0]["children"], json!([]));

    let dropped = result["debug_info"]["dropped"].as_array().unwrap();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0]["key"], "13");
}

#[tokio::test]
async fn test_categories_children_of_ids() {
    let (resolver, client) = resolver();

    let result = resolver
        .categories(
            &json!({"ids": [10, 20], "children": true}),
            &json!({"items": {"id": {}, "name": {}}}),
        )
        .await
        .unwrap();

    assert_eq!(client.calls(), 2);
    let items = &result["items"];
    assert_eq!(ids(items), vec![10, 20]);
    assert_eq!(items[0]["name"], "Women");
    assert_eq!(ids(&items[0]["children"]), vec![12, 11]);
    assert_eq!(items[1]["children"], json!([]));
}

#[tokio::test]
async fn test_categories_by_ids_flat() {
    let (resolver, _) = resolver();

    let result = resolver
        .categories(
            &json!({"ids": [11, 20, 12]}),
            &json!({"items": {"id": {}, "name": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(ids(&result["items"]), vec![20, 12, 11]);
    assert!(result.get("debug_info").is_none());
}

#[tokio::test]
async fn test_category_list_depth_and_debug() {
    let (mut resolver, _) = resolver();
    resolver
        .hooks_mut()
        .register(hooks::CATEGORY_RESULT_RETURN_BEFORE, |result| {
            result["hooked"] = json!(true);
        });

    let result = resolver
        .category_list(
            &json!({"depth": 2, "debug": true}),
            &json!({"items": {"id": {}, "name": {}}}),
        )
        .await
        .unwrap();

    assert_eq!(ids(&result["items"]), vec![20, 10]);
    assert_eq!(result["debug_info"]["code"], 200);
    assert_eq!(result["debug_info"]["message"], "OK");
    assert!(result["debug_info"]["fq"]
        .as_array()
        .unwrap()
        .contains(&json!("level:[* TO 2]")));
    assert_eq!(result["hooked"], true);
}

#[tokio::test]
async fn test_cms_page() {
    let (resolver, _) = resolver();

    let page = resolver
        .cms_page(&json!({"id": 5}), &json!(["title", "url"]))
        .await
        .unwrap();
    assert_eq!(page, json!({"title": "About us", "url": "/about-us"}));

    let err = resolver
        .cms_page(&json!({"id": 404}), &json!(["title"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::NotFound(_)));

    let err = resolver.cms_page(&json!({}), &json!(["title"])).await.unwrap_err();
    assert!(matches!(err, ResolverError::InvalidInput(_)));
}

#[tokio::test]
async fn test_cms_block_returns_active_blocks_only() {
    let (resolver, _) = resolver();

    let result = resolver
        .cms_block(
            &json!({"identifiers": ["footer", "header"]}),
            &json!({"items": {"identifier": {}, "content": {}}}),
        )
        .await
        .unwrap();
    assert_eq!(
        result,
        json!({"items": [{"identifier": "footer", "content": "Footer"}]})
    );

    let err = resolver
        .cms_block(&json!({}), &json!({"items": {"content": {}}}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidInput(_)));
}

struct ColorRepository;

#[async_trait]
impl AttributeRepository for ColorRepository {
    async fn load_attributes(
        &self,
        codes: &[String],
        _store_id: i64,
    ) -> anyhow::Result<Vec<crate::attributes::AttributeMetadata>> {
        Ok(codes
            .iter()
            .filter(|code| *code == "color")
            .map(|code| crate::attributes::AttributeMetadata {
                attribute_code: code.clone(),
                attribute_id: 93,
                attribute_label: "Color".to_string(),
                backend_type: "int".to_string(),
                frontend_input: "select".to_string(),
                position: 2,
                ..Default::default()
            })
            .collect())
    }

    async fn load_options(&self, _code: &str, _store_id: i64) -> anyhow::Result<Vec<AttributeOption>> {
        Ok(vec![AttributeOption {
            value: "49".to_string(),
            label: "Red".to_string(),
        }])
    }
}

fn attribute_resolver_with(config: ResolverConfig) -> CatalogResolver {
    let cache: Arc<dyn AttributeMetadataCache> = Arc::new(InMemoryAttributeCache::new());
    let provider = AttributeDataProvider::from_config(Arc::new(ColorRepository), cache, &config);
    let (resolver, _) = resolver_with(config);
    resolver.with_attribute_provider(provider)
}

fn attribute_resolver() -> CatalogResolver {
    attribute_resolver_with(ResolverConfig::default())
}

#[tokio::test]
async fn test_attribute_types_from_config() {
    let mut config = ResolverConfig::default();
    config
        .attribute_types
        .insert("color".to_string(), "swatch".to_string());
    let resolver = attribute_resolver_with(config);

    let result = resolver
        .attributes(&json!({"attributeCodes": ["color"]}))
        .await
        .unwrap();
    assert_eq!(result["attributes"][0]["attribute_type"], "swatch");
    assert_eq!(result["attributes"][0]["attribute_options"], json!([]));
}

#[tokio::test]
async fn test_attributes_known_and_unknown_codes() {
    let resolver = attribute_resolver();

    let result = resolver
        .attributes(&json!({"attributeCodes": ["color", "flavour"]}))
        .await
        .unwrap();
    let attributes = &result["attributes"];
    assert_eq!(attributes[0]["attribute_id"], 93);
    assert_eq!(attributes[0]["attribute_type"], "select");
    assert_eq!(
        attributes[0]["attribute_options"],
        json!([{"value": "49", "label": "Red"}])
    );
    assert_eq!(
        attributes[1],
        json!({
            "attribute_code": "flavour",
            "attribute_id": 0,
            "attribute_label": "",
            "backend_type": "",
            "frontend_input": "",
            "attribute_type": "",
            "attribute_options": [],
            "position": 0
        })
    );
}

#[tokio::test]
async fn test_attributes_errors() {
    let with_provider = attribute_resolver();

    let err = with_provider
        .attributes(&json!({"attributeCodes": ["flavour"]}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::NotFound(_)));

    let err = with_provider.attributes(&json!({})).await.unwrap_err();
    assert!(matches!(err, ResolverError::InvalidInput(_)));

    let (bare, _) = resolver();
    let err = bare
        .attributes(&json!({"attributeCodes": ["color"]}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::Upstream(_)));
}

#[tokio::test]
async fn test_attribute_options_prefers_inline_options() {
    let resolver = attribute_resolver();

    let inline = resolver
        .attribute_options(&json!({
            "attribute_code": "color",
            "attribute_options": [{"value": "1", "label": "Blue"}]
        }))
        .await
        .unwrap();
    assert_eq!(inline, json!([{"value": "1", "label": "Blue"}]));

    let loaded = resolver
        .attribute_options(&json!({"attribute_code": "color"}))
        .await
        .unwrap();
    assert_eq!(loaded, json!([{"value": "49", "label": "Red"}]));
}

#[test]
fn test_rename_to_codes() {
    let mapping = IndexMap::from([("color_s".to_string(), "color".to_string())]);
    let document = Document::new().with_field("color_s", "red").with_field("id", 1);
    let renamed = rename_to_codes(&document, &mapping);
    assert_eq!(renamed.get_string("color").as_deref(), Some("red"));
    assert_eq!(renamed.get_string("id").as_deref(), Some("1"));
    assert!(renamed.get("color_s").is_none());
}
