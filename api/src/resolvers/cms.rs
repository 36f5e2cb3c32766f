use super::args::{parse_args, CmsBlockArgs, CmsPageArgs};
use super::{rename_to_codes, CatalogResolver, CMS_BLOCK_OBJECT_TYPE, CMS_PAGE_OBJECT_TYPE};
use crate::error::{ResolverError, ResolverResult};
use crate::projection::{QueryFields, ResultProjector};
use catalog_common::{EntityType, ExpressionValue, FilterExpression, Operator};
use serde_json::{json, Value};

impl CatalogResolver {
    /// `cmsPage(id)`: the page's fields restricted to `selection`.
    pub async fn cms_page(&self, args: &Value, selection: &Value) -> ResolverResult<Value> {
        let args: CmsPageArgs = parse_args(args)?;
        let id = args
            .id
            .ok_or_else(|| ResolverError::invalid_input("Page id should be specified"))?;

        let fields = QueryFields::from_selection(selection);
        let mapping = self.physical_fields(&fields, EntityType::CmsPage);
        let mut query = self.scoped_query(EntityType::CmsPage, CMS_PAGE_OBJECT_TYPE);
        query
            .add_filter(FilterExpression::eq(
                "id",
                self.field("id", EntityType::CmsPage),
                id,
            ))
            .add_fields_to_select(mapping.keys())
            .set_page_size(1);
        let response = self.execute(&query).await?;

        let page = response
            .first_document()
            .ok_or_else(|| ResolverError::not_found(format!("CMS page with id {}", id)))?;
        let projector = ResultProjector::new(&self.hooks, "mscmspage");
        let page = projector.project(&rename_to_codes(page, &mapping), &fields);
        Ok(Value::Object(page))
    }

    /// `cmsBlock(identifiers)`: active blocks with the given identifiers, in engine order.
    pub async fn cms_block(&self, args: &Value, selection: &Value) -> ResolverResult<Value> {
        let args: CmsBlockArgs = parse_args(args)?;
        let identifiers: Vec<String> = args
            .identifiers
            .ok_or_else(|| ResolverError::invalid_input("Block identifiers should be specified"))?
            .into_iter()
            .map(|identifier| identifier.trim().to_string())
            .filter(|identifier| !identifier.is_empty())
            .collect();
        if identifiers.is_empty() {
            return Ok(json!({ "items": [] }));
        }

        let items_selection = selection.get("items").unwrap_or(&Value::Null);
        let fields = QueryFields::from_selection(items_selection);
        let mapping = self.physical_fields(&fields, EntityType::CmsBlock);
        let identifier_field = self.field("identifier", EntityType::CmsBlock);
        let identifier_filter = match identifiers.as_slice() {
            [single] => FilterExpression::eq("identifier", identifier_field, single),
            _ => FilterExpression::new(
                "identifier",
                identifier_field,
                Operator::In,
                ExpressionValue::List(identifiers.clone()),
            ),
        };

        let mut query = self.scoped_query(EntityType::CmsBlock, CMS_BLOCK_OBJECT_TYPE);
        query
            .add_filter(identifier_filter)
            .add_filter(FilterExpression::eq(
                "is_active",
                self.field("is_active", EntityType::CmsBlock),
                "true",
            ))
            .add_fields_to_select(mapping.keys())
            .set_page_size(identifiers.len());
        let response = self.execute(&query).await?;

        let projector = ResultProjector::new(&self.hooks, "mscmsblock");
        let items: Vec<Value> = response
            .documents()
            .iter()
            .map(|doc| Value::Object(projector.project(&rename_to_codes(doc, &mapping), &fields)))
            .collect();
        tracing::debug!(
            requested = identifiers.len(),
            found = items.len(),
            "cms blocks resolved"
        );
        Ok(json!({ "items": items }))
    }
}
