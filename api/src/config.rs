use anyhow::{Context, Result};
use catalog_common::{EntityType, FieldType, QueryField, Sanitizer};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    /// Upper bound when only product identifiers are selected.
    pub ids_only: usize,
    pub search: usize,
    pub default: usize,
    pub category_levels: usize,
    pub category_children: usize,
    pub category_list: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            ids_only: 10_000,
            search: 3_000,
            default: 100,
            category_levels: 1_000,
            category_children: 100,
            category_list: 99_999,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchTermConfig {
    pub min_query_length: usize,
    pub max_query_length: usize,
}

impl Default for SearchTermConfig {
    fn default() -> Self {
        Self {
            min_query_length: 3,
            max_query_length: 128,
        }
    }
}

/// Immutable resolver settings, built once and shared by every request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub page_sizes: PageSizes,
    pub category_list_depth: i64,
    /// Categories whose parent id is at or below this value hang directly under the store root.
    pub root_parent_max: i64,
    /// GraphQL `id_type` enum value to attribute code.
    pub id_types: IndexMap<String, String>,
    /// GraphQL `sort_by` value to attribute code.
    pub sort_mapping: HashMap<String, String>,
    /// Fields known for every entity type, keyed by attribute code.
    pub common_fields: IndexMap<String, QueryField>,
    /// Entity specific fields, taking precedence over `common_fields`.
    pub fields: HashMap<EntityType, IndexMap<String, QueryField>>,
    /// Unknown attribute codes resolve to a string field of the same name.
    pub allow_unmapped: bool,
    pub sanitizers: HashMap<String, Sanitizer>,
    pub facet_fields: Vec<String>,
    pub stat_fields: Vec<String>,
    pub facet_suffixes: Vec<String>,
    pub attributes_to_skip: Vec<String>,
    pub search_terms: SearchTermConfig,
    pub attribute_cache_ttl_secs: u64,
    /// Attribute code to attribute type, overriding the backend/frontend derivation.
    pub attribute_types: HashMap<String, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let id_types = [("ID", "id"), ("SKU", "sku"), ("GID", "gid")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let common_fields = [
            ("id", QueryField::new("id", FieldType::Int)),
            ("store_id", QueryField::new("store_id", FieldType::Int)),
            ("object_type", QueryField::string("object_type")),
            ("level", QueryField::new("level", FieldType::Int)),
            ("position", QueryField::new("position", FieldType::Int)),
            ("parent_id", QueryField::new("parent_id", FieldType::Int)),
            ("price", QueryField::new("price", FieldType::Float)),
            ("score", QueryField::new("score", FieldType::Float)),
            ("is_active", QueryField::new("is_active", FieldType::Bool)),
            (
                "category_ids",
                QueryField::new("category_ids", FieldType::Int).multivalued(),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let sanitizers = [
            ("id", Sanitizer::Digits),
            ("store_id", Sanitizer::Digits),
            ("level", Sanitizer::Digits),
            ("parent_id", Sanitizer::Digits),
            ("category_ids", Sanitizer::Numeric),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let attribute_types = [("price", "range"), ("category", "multiselect")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            page_sizes: PageSizes::default(),
            category_list_depth: 5,
            root_parent_max: 2,
            id_types,
            sort_mapping: HashMap::from([("relevance".to_string(), "score".to_string())]),
            common_fields,
            fields: HashMap::new(),
            allow_unmapped: true,
            sanitizers,
            facet_fields: vec!["category_ids".to_string()],
            stat_fields: vec!["price".to_string()],
            facet_suffixes: vec!["_facet".to_string(), "_f".to_string()],
            attributes_to_skip: Vec::new(),
            search_terms: SearchTermConfig::default(),
            attribute_cache_ttl_secs: 86_400,
            attribute_types,
        }
    }
}

impl ResolverConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).context("Failed to parse resolver config")
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resolver config {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    /// Loads `.env`, then the YAML file named by `CATALOG_CONFIG` (if any), then the
    /// `CATALOG_*_PAGE_SIZE` overrides.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = match std::env::var("CATALOG_CONFIG") {
            Ok(path) => Self::from_yaml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        if let Some(size) = env_usize("CATALOG_MAX_PAGE_SIZE")? {
            config.page_sizes.default = size;
        }
        if let Some(size) = env_usize("CATALOG_SEARCH_PAGE_SIZE")? {
            config.page_sizes.search = size;
        }
        if let Some(size) = env_usize("CATALOG_IDS_PAGE_SIZE")? {
            config.page_sizes.ids_only = size;
        }
        Ok(config)
    }

    pub fn sanitizer_for(&self, attribute_code: &str) -> Sanitizer {
        self.sanitizers
            .get(attribute_code)
            .copied()
            .unwrap_or_default()
    }

    /// Maps a GraphQL sort value to an attribute code; unmapped values are used as is.
    pub fn sort_attribute<'a>(&'a self, sort_by: &'a str) -> &'a str {
        self.sort_mapping
            .get(sort_by)
            .map(String::as_str)
            .unwrap_or(sort_by)
    }

    /// Strips a facet field suffix such as `_facet` to get back the attribute code.
    pub fn facet_code<'a>(&self, field: &'a str) -> &'a str {
        self.facet_suffixes
            .iter()
            .find_map(|suffix| field.strip_suffix(suffix.as_str()))
            .filter(|code| !code.is_empty())
            .unwrap_or(field)
    }
}

fn env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .with_context(|| format!("{} must be a positive integer, got {}", name, value)),
        Err(_) => Ok(None),
    }
}
