use crate::config::ResolverConfig;
use catalog_common::{sanitize_filter_token, EntityType, ExpressionValue, FieldType, QueryField};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Maps a business attribute code to the physical field the index stores it in.
///
/// Implementations must be side-effect free. `None` means the code has no queryable field and
/// callers skip it.
pub trait AttributeFieldResolver: Send + Sync {
    fn resolve_field(
        &self,
        attribute_code: &str,
        value: Option<&ExpressionValue>,
        entity: EntityType,
    ) -> Option<QueryField>;
}

/// Resolver backed by the static field tables of [`ResolverConfig`].
#[derive(Debug, Clone)]
pub struct MappedFieldResolver {
    common: IndexMap<String, QueryField>,
    per_entity: HashMap<EntityType, IndexMap<String, QueryField>>,
    allow_unmapped: bool,
}

impl MappedFieldResolver {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            common: config.common_fields.clone(),
            per_entity: config.fields.clone(),
            allow_unmapped: config.allow_unmapped,
        }
    }
}

impl AttributeFieldResolver for MappedFieldResolver {
    fn resolve_field(
        &self,
        attribute_code: &str,
        value: Option<&ExpressionValue>,
        entity: EntityType,
    ) -> Option<QueryField> {
        if attribute_code.is_empty() || sanitize_filter_token(attribute_code) != attribute_code {
            return None;
        }
        if let Some(field) = self
            .per_entity
            .get(&entity)
            .and_then(|fields| fields.get(attribute_code))
            .or_else(|| self.common.get(attribute_code))
        {
            return Some(field.clone());
        }
        if !self.allow_unmapped {
            return None;
        }
        // Ranges only make sense on numeric fields.
        let field_type = match value {
            Some(ExpressionValue::Range { .. }) => FieldType::Float,
            _ => FieldType::String,
        };
        Some(QueryField::new(attribute_code, field_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::Bound;

    #[test]
    fn test_entity_fields_take_precedence() {
        let mut config = ResolverConfig::default();
        config.fields.insert(
            EntityType::Category,
            IndexMap::from([("id".to_string(), QueryField::string("category_id"))]),
        );
        let resolver = MappedFieldResolver::from_config(&config);
        let category_id = resolver
            .resolve_field("id", None, EntityType::Category)
            .unwrap();
        assert_eq!(category_id.name, "category_id");
        let product_id = resolver
            .resolve_field("id", None, EntityType::Product)
            .unwrap();
        assert_eq!(product_id.field_type, FieldType::Int);
    }

    #[test]
    fn test_unmapped_codes() {
        let mut config = ResolverConfig::default();
        let resolver = MappedFieldResolver::from_config(&config);
        let range = ExpressionValue::Range {
            from: Bound::value(1),
            to: Bound::Unbounded,
        };
        let width = resolver
            .resolve_field("width", Some(&range), EntityType::Product)
            .unwrap();
        assert_eq!(width.field_type, FieldType::Float);
        assert_eq!(
            resolver
                .resolve_field("color", None, EntityType::Product)
                .unwrap()
                .field_type,
            FieldType::String
        );
        assert!(resolver
            .resolve_field("bad code", None, EntityType::Product)
            .is_none());
        assert!(resolver.resolve_field("", None, EntityType::Product).is_none());

        config.allow_unmapped = false;
        let strict = MappedFieldResolver::from_config(&config);
        assert!(strict
            .resolve_field("color", None, EntityType::Product)
            .is_none());
        assert!(strict
            .resolve_field("price", None, EntityType::Product)
            .is_some());
    }
}
