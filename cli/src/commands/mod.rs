use crate::argparse::{CategoriesArgs, Commands, ProductsArgs, TranslateArgs};
use crate::error::CliError;
use catalog_common::{escape_query_syntax, normalize_search_text};
use catalog_graphql::fields::MappedFieldResolver;
use catalog_graphql::filters::FilterTranslator;
use catalog_graphql::{
    CatalogResolver, FixedStore, InMemorySearchClient, RequestContext, ResolverConfig,
};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Runs one command and returns what it prints.
pub async fn handle_command(
    command: Commands,
    config: ResolverConfig,
    store_id: i64,
) -> Result<Value, CliError> {
    match command {
        Commands::Normalize(args) => Ok(Value::String(normalize_search_text(&args.text))),
        Commands::Escape(args) => Ok(Value::String(escape_query_syntax(&args.text))),
        Commands::Translate(args) => handle_translate_command(args, &config),
        Commands::Products(args) => handle_products_command(args, config, store_id).await,
        Commands::Categories(args) => handle_categories_command(args, config, store_id).await,
    }
}

pub fn handle_translate_command(
    args: TranslateArgs,
    config: &ResolverConfig,
) -> Result<Value, CliError> {
    let filter = parse_object("--filter", &args.filter)?;
    let fields = MappedFieldResolver::from_config(config);
    let outcome = FilterTranslator::new(config, &fields, args.entity).translate(&filter);
    tracing::info!(
        expressions = outcome.expressions.len(),
        dropped = outcome.dropped.len(),
        "filter translated"
    );
    let clauses: Vec<String> = outcome
        .expressions
        .iter()
        .map(|expression| expression.to_query_clause())
        .collect();
    Ok(json!({ "clauses": clauses, "dropped": outcome.dropped }))
}

pub async fn handle_products_command(
    args: ProductsArgs,
    config: ResolverConfig,
    store_id: i64,
) -> Result<Value, CliError> {
    let resolver = load_resolver(&args.docs, config, store_id)?;

    let mut query = Map::new();
    if let Some(search) = args.search {
        query.insert("search".to_string(), Value::String(search));
    }
    if let Some(filter) = &args.filter {
        query.insert("filter".to_string(), Value::Object(parse_object("--filter", filter)?));
    }
    if let Some(page_size) = args.page_size {
        query.insert("pageSize".to_string(), json!(page_size));
    }
    if let Some(current_page) = args.current_page {
        query.insert("currentPage".to_string(), json!(current_page));
    }
    query.insert("debug".to_string(), Value::Bool(args.debug));

    let mut selection = json!({
        "items": selection_of(&args.fields),
        "page_info": {"page_size": {}, "current_page": {}, "total_pages": {}},
    });
    if args.aggregations {
        selection["facets"] = json!({"code": {}, "values": {}});
        selection["stats"] = json!({"code": {}, "values": {}});
    }

    let mut ctx = RequestContext::new();
    let result = resolver
        .products(&mut ctx, &Value::Object(query), &selection)
        .await?;
    Ok(result)
}

pub async fn handle_categories_command(
    args: CategoriesArgs,
    config: ResolverConfig,
    store_id: i64,
) -> Result<Value, CliError> {
    let resolver = load_resolver(&args.docs, config, store_id)?;

    let mut query = json!({ "children": args.children, "debug": args.debug });
    if !args.levels.is_empty() {
        query["levels"] = json!(args.levels);
    }
    if !args.ids.is_empty() {
        query["ids"] = json!(args.ids);
    }
    let selection = json!({ "items": selection_of(&args.fields) });

    Ok(resolver.categories(&query, &selection).await?)
}

fn load_resolver(
    docs: &Path,
    config: ResolverConfig,
    store_id: i64,
) -> Result<CatalogResolver, CliError> {
    let client = std::fs::read_to_string(docs)
        .map_err(anyhow::Error::from)
        .and_then(|json| InMemorySearchClient::from_json(&json))
        .map_err(|e| CliError::DocumentsLoad(docs.to_path_buf(), e))?;
    tracing::debug!(
        documents = client.documents().len(),
        path = %docs.display(),
        "documents loaded"
    );
    Ok(CatalogResolver::new(
        config,
        Arc::new(FixedStore(store_id)),
        Arc::new(client),
    ))
}

fn parse_object(what: &str, json: &str) -> Result<Map<String, Value>, CliError> {
    serde_json::from_str(json).map_err(|e| CliError::InvalidJson(what.to_string(), e))
}

fn selection_of(fields: &[String]) -> Value {
    let fields: Map<String, Value> = fields
        .iter()
        .map(|field| field.trim())
        .filter(|field| !field.is_empty())
        .map(|field| (field.to_string(), json!({})))
        .collect();
    Value::Object(fields)
}
