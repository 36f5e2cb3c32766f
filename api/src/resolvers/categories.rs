use super::args::{parse_args, CategoriesArgs, CategoryListArgs};
use super::{debug_info, rename_to_codes, CatalogResolver, CATEGORY_OBJECT_TYPE};
use crate::categories::{group_by_parent, sort_by_level, CategoryTree};
use crate::error::{ResolverError, ResolverResult};
use crate::hooks::CATEGORY_RESULT_RETURN_BEFORE;
use crate::projection::{QueryFields, ResultProjector};
use crate::search::{SearchQuery, SortDirection};
use catalog_common::{
    sanitize_id_list, Bound, Document, Dropped, EntityType, ExpressionValue, FilterExpression,
    Operator,
};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

const ENTITY: &str = "mscategory";

/// Fields the tree and grouping logic reads, whatever the selection asks for.
const STRUCTURAL_FIELDS: [&str; 4] = ["id", "parent_id", "level", "position"];

impl CatalogResolver {
    /// `categories(ids, levels, children, filter, debug)`.
    ///
    /// With `levels`, every category on those levels is returned as a tree. With `ids` only,
    /// the categories themselves are returned flat, or with `children` set, each requested id
    /// with its direct children.
    pub async fn categories(&self, args: &Value, selection: &Value) -> ResolverResult<Value> {
        let args: CategoriesArgs = parse_args(args)?;
        let levels = args.levels.clone().filter(|levels| !levels.is_empty());
        let ids = args
            .ids
            .as_deref()
            .map(sanitize_id_list)
            .filter(|ids| !ids.is_empty());

        let items_selection = selection.get("items").unwrap_or(&Value::Null);
        let fields = QueryFields::from_selection(items_selection);
        let mapping = self.category_mapping(&fields);
        let mut dropped = Vec::new();

        let (items, engine_debug): (Vec<Value>, Option<Value>) = match (levels, ids) {
            (Some(levels), _) => {
                let mut query = self.category_query(&fields, &args, &mut dropped);
                query
                    .add_filter(self.int_filter("level", &levels))
                    .set_page_size(self.config.page_sizes.category_levels);
                let (documents, engine_debug) = self.fetch_categories(&query, &mapping).await?;

                let root_parent_max = self.config.root_parent_max;
                let tree = CategoryTree::assemble(documents, &levels, root_parent_max);
                dropped.extend_from_slice(tree.dropped());
                tracing::debug!(
                    nodes = tree.len(),
                    dropped = tree.dropped().len(),
                    "category tree"
                );
                let projector = ResultProjector::new(&self.hooks, ENTITY);
                let project = |doc: &Document| projector.project(doc, &fields);
                let items = tree
                    .roots()
                    .iter()
                    .map(|node| node.to_value(&project))
                    .collect();
                (items, engine_debug)
            }
            (None, Some(ids)) if args.children => {
                let mut query = self.category_query(&fields, &args, &mut dropped);
                query
                    .add_filter(self.int_filter("parent_id", &ids))
                    .set_page_size(self.config.page_sizes.category_children);
                let (children, engine_debug) = self.fetch_categories(&query, &mapping).await?;

                // The user filter narrows the children only.
                let unfiltered = CategoriesArgs::default();
                let mut parent_query = self.category_query(&fields, &unfiltered, &mut dropped);
                parent_query
                    .add_filter(self.int_filter("id", &ids))
                    .set_page_size(ids.len());
                let (parents, _) = self.fetch_categories(&parent_query, &mapping).await?;

                let items = self.attach_children(&parents, &children, &ids, &fields);
                (items, engine_debug)
            }
            (None, Some(ids)) => {
                let mut query = self.category_query(&fields, &args, &mut dropped);
                query
                    .add_filter(self.int_filter("id", &ids))
                    .set_page_size(ids.len().max(self.config.page_sizes.default));
                let (mut documents, engine_debug) =
                    self.fetch_categories(&query, &mapping).await?;

                sort_by_level(&mut documents);
                let projector = ResultProjector::new(&self.hooks, ENTITY);
                let items = documents
                    .iter()
                    .map(|doc| Value::Object(projector.project(doc, &fields)))
                    .collect();
                (items, engine_debug)
            }
            (None, None) => {
                return Err(ResolverError::invalid_input(
                    "'ids' or 'levels' input argument is required.",
                ))
            }
        };

        let mut result = json!({ "items": Value::Array(items) });
        if args.debug {
            result["debug_info"] = debug_info(engine_debug.as_ref(), &dropped);
        }
        Ok(result)
    }

    /// `categoryList(depth, debug)`: every category down to `depth` as a flat list ordered by
    /// level and position.
    pub async fn category_list(&self, args: &Value, selection: &Value) -> ResolverResult<Value> {
        let args: CategoryListArgs = parse_args(args)?;
        let depth = args.depth.unwrap_or(self.config.category_list_depth);
        let items_selection = selection.get("items").unwrap_or(&Value::Null);
        let fields = QueryFields::from_selection(items_selection);

        let unfiltered = CategoriesArgs::default();
        let mut query = self.category_query(&fields, &unfiltered, &mut Vec::new());
        query
            .add_filter(FilterExpression::new(
                "level",
                self.field("level", EntityType::Category),
                Operator::Range,
                ExpressionValue::Range {
                    from: Bound::Unbounded,
                    to: Bound::value(depth),
                },
            ))
            .set_page_size(self.config.page_sizes.category_list)
            .set_debug(args.debug);
        let response = self.execute(&query).await?;

        let mapping = self.category_mapping(&fields);
        let mut documents: Vec<Document> = response
            .documents()
            .iter()
            .map(|doc| rename_to_codes(doc, &mapping))
            .collect();
        sort_by_level(&mut documents);

        let projector = ResultProjector::new(&self.hooks, ENTITY);
        let items: Vec<Value> = documents
            .iter()
            .map(|doc| Value::Object(projector.project(doc, &fields)))
            .collect();
        tracing::info!(depth, categories = items.len(), "category list resolved");

        let mut debug = Map::new();
        if args.debug {
            if let Some(Value::Object(engine)) = response.debug_info() {
                if let Some(Value::Object(params)) = engine.get("params") {
                    debug.extend(params.clone());
                }
                for key in ["code", "message", "uri"] {
                    if let Some(value) = engine.get(key) {
                        debug.insert(key.to_string(), value.clone());
                    }
                }
            }
        }

        let mut result = json!({ "items": items, "debug_info": debug });
        self.hooks.dispatch(CATEGORY_RESULT_RETURN_BEFORE, &mut result);
        Ok(result)
    }

    /// Store and type scoped category query selecting `fields` plus the structural fields,
    /// sorted by level then position, with the translated `filter` applied.
    fn category_query(
        &self,
        fields: &QueryFields,
        args: &CategoriesArgs,
        dropped: &mut Vec<Dropped>,
    ) -> SearchQuery {
        let mut query = self.scoped_query(EntityType::Category, CATEGORY_OBJECT_TYPE);
        if !fields.is_empty() {
            query.add_fields_to_select(self.category_mapping(fields).keys());
        }
        let level = self.field("level", EntityType::Category);
        let position = self.field("position", EntityType::Category);
        query
            .add_sort(&level.name, SortDirection::Asc)
            .add_sort(&position.name, SortDirection::Asc);

        if let Some(filter) = &args.filter {
            let outcome = self.translate_filter(filter, EntityType::Category);
            for expression in outcome.expressions {
                query.add_filter(expression);
            }
            dropped.extend(outcome.dropped);
        }
        query.set_debug(args.debug);
        query
    }

    fn category_mapping(&self, fields: &QueryFields) -> IndexMap<String, String> {
        let mut all = fields.clone();
        for name in STRUCTURAL_FIELDS {
            all.insert(name);
        }
        self.physical_fields(&all, EntityType::Category)
    }

    fn int_filter(&self, code: &str, values: &[i64]) -> FilterExpression {
        let field = self.field(code, EntityType::Category);
        match values {
            [single] => FilterExpression::eq(code, field, single),
            many => FilterExpression::new(
                code,
                field,
                Operator::In,
                ExpressionValue::List(many.iter().map(i64::to_string).collect()),
            ),
        }
    }

    /// Runs a category query, returning documents keyed by attribute code.
    async fn fetch_categories(
        &self,
        query: &SearchQuery,
        mapping: &IndexMap<String, String>,
    ) -> ResolverResult<(Vec<Document>, Option<Value>)> {
        let response = self.execute(query).await?;
        let documents = response
            .documents()
            .iter()
            .map(|doc| rename_to_codes(doc, mapping))
            .collect();
        Ok((documents, response.debug_info().cloned()))
    }

    /// One entry per requested parent id, in request order: the parent's own fields when it
    /// was found, and its direct children ordered by position.
    fn attach_children(
        &self,
        parents: &[Document],
        children: &[Document],
        parent_ids: &[i64],
        fields: &QueryFields,
    ) -> Vec<Value> {
        let projector = ResultProjector::new(&self.hooks, ENTITY);
        let groups = group_by_parent(children, parent_ids);
        groups
            .into_iter()
            .map(|(parent_id, children)| {
                let parent = parents
                    .iter()
                    .find(|doc| doc.get_string("id").as_deref() == Some(&parent_id.to_string()));
                let mut entry = parent
                    .map(|doc| projector.project(doc, fields))
                    .unwrap_or_default();
                entry.insert("id".to_string(), json!(parent_id));
                let children = children
                    .iter()
                    .map(|doc| Value::Object(projector.project(doc, fields)))
                    .collect();
                entry.insert("children".to_string(), Value::Array(children));
                Value::Object(entry)
            })
            .collect()
    }
}
