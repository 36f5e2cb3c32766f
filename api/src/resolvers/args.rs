use crate::error::{ResolverError, ResolverResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SortArg {
    pub sort_by: String,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductsArgs {
    pub search: Option<String>,
    pub filter: Option<Map<String, Value>>,
    pub sort: Option<SortArg>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
    #[serde(rename = "currentPage")]
    pub current_page: Option<usize>,
    pub debug: bool,
}

impl ProductsArgs {
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CategoriesArgs {
    pub ids: Option<Vec<i64>>,
    pub levels: Option<Vec<i64>>,
    pub children: bool,
    pub filter: Option<Map<String, Value>>,
    pub debug: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CategoryListArgs {
    pub depth: Option<i64>,
    pub debug: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchArgs {
    pub query: Option<String>,
    pub autosuggest: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CmsPageArgs {
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CmsBlockArgs {
    pub identifiers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttributesArgs {
    #[serde(rename = "attributeCodes")]
    pub attribute_codes: Option<Vec<String>>,
}

/// Decodes GraphQL arguments; a missing argument object decodes to the defaults.
pub(crate) fn parse_args<T>(args: &Value) -> ResolverResult<T>
where
    T: DeserializeOwned + Default,
{
    match args {
        Value::Null => Ok(T::default()),
        other => serde_json::from_value(other.clone()).map_err(ResolverError::from),
    }
}
