//! Reshaping of engine documents, facets and stats into GraphQL output values.

use crate::config::ResolverConfig;
use crate::hooks::{self, EventHooks};
use crate::search::StatValues;
use catalog_common::{value_to_display, Document};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value};

/// Fields whose values are URLs reduced to their path.
pub const URL_FIELDS: [&str; 3] = ["url", "url_path", "image"];

const TYPENAME: &str = "__typename";

/// Requested output fields of one selection level, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFields {
    leaves: IndexSet<String>,
    nested: IndexSet<String>,
}

impl QueryFields {
    /// Accepts a list of field names or an object keyed by field name. Object entries with a
    /// non-empty sub-selection are nested fields and are not projected directly.
    pub fn from_selection(selection: &Value) -> Self {
        let mut fields = Self::default();
        match selection {
            Value::Array(names) => {
                for name in names.iter().filter_map(Value::as_str) {
                    fields.insert_leaf(name);
                }
            }
            Value::Object(entries) => {
                for (name, sub) in entries {
                    match sub {
                        Value::Object(inner) if !inner.is_empty() => {
                            fields.nested.insert(name.clone());
                        }
                        Value::Array(inner) if !inner.is_empty() => {
                            fields.nested.insert(name.clone());
                        }
                        _ => fields.insert_leaf(name),
                    }
                }
            }
            _ => {}
        }
        fields
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = Self::default();
        for name in names {
            fields.insert_leaf(name.as_ref());
        }
        fields
    }

    fn insert_leaf(&mut self, name: &str) {
        if !name.is_empty() && name != TYPENAME {
            self.leaves.insert(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.leaves.contains(name)
    }

    pub fn has_nested(&self, name: &str) -> bool {
        self.nested.contains(name)
    }

    pub fn nested_len(&self) -> usize {
        self.nested.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.leaves.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn insert(&mut self, name: &str) {
        self.insert_leaf(name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value_id: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub code: String,
    pub values: Vec<FacetValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    pub code: String,
    pub values: StatValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeValue {
    pub attribute_code: String,
    pub value: String,
}

/// Projects documents of one entity type, firing the `prepare_<entity>_resolver_result_*`
/// hooks around the flattening.
pub struct ResultProjector<'a> {
    hooks: &'a EventHooks,
    before_event: String,
    after_event: String,
}

impl<'a> ResultProjector<'a> {
    pub fn new(hooks: &'a EventHooks, entity: &str) -> Self {
        Self {
            hooks,
            before_event: hooks::result_before(entity),
            after_event: hooks::result_after(entity),
        }
    }

    /// Flat field map restricted to `fields`; no fields means every field of the document.
    pub fn project(&self, document: &Document, fields: &QueryFields) -> Map<String, Value> {
        let mut raw = Value::Object(document.fields().clone());
        self.hooks.dispatch(&self.before_event, &mut raw);
        let raw = match raw {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let mut flat = Map::new();
        if fields.is_empty() {
            for (name, value) in &raw {
                flat.insert(name.clone(), flatten_field(name, Some(value)));
            }
        } else {
            for name in fields.iter() {
                flat.insert(name.to_string(), flatten_field(name, raw.get(name)));
            }
        }

        let mut flat = Value::Object(flat);
        self.hooks.dispatch(&self.after_event, &mut flat);
        match flat {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn flatten_field(name: &str, value: Option<&Value>) -> Value {
    if URL_FIELDS.contains(&name) {
        let url = value.and_then(value_to_display).unwrap_or_default();
        return Value::String(url_path(&url));
    }
    match value {
        Some(list @ Value::Array(_)) => value_to_display(list).map_or(Value::Null, Value::String),
        Some(value) => value.clone(),
        None => Value::Null,
    }
}

/// Decoded path component of an absolute or relative URL, empty for blank input.
pub fn url_path(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let parsed = match url::Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            url::Url::parse("http://localhost/").and_then(|base| base.join(raw))
        }
        Err(err) => Err(err),
    };
    match parsed {
        Ok(url) if url.cannot_be_a_base() => String::new(),
        Ok(url) => percent_encoding::percent_decode_str(url.path())
            .decode_utf8_lossy()
            .into_owned(),
        Err(_) => String::new(),
    }
}

/// Drops buckets with an empty value or a zero count, and facets left without buckets.
pub fn project_facets(
    facets: &IndexMap<String, IndexMap<String, u64>>,
    config: &ResolverConfig,
) -> Vec<Facet> {
    facets
        .iter()
        .filter_map(|(field, buckets)| {
            let values: Vec<FacetValue> = buckets
                .iter()
                .filter(|(value, count)| !value.is_empty() && **count > 0)
                .map(|(value, count)| FacetValue {
                    value_id: value.clone(),
                    count: *count,
                })
                .collect();
            (!values.is_empty()).then(|| Facet {
                code: config.facet_code(field).to_string(),
                values,
            })
        })
        .collect()
}

/// One entry per requested stat field the engine answered.
pub fn project_stats(stats: &IndexMap<String, StatValues>, requested: &[String]) -> Vec<Stat> {
    requested
        .iter()
        .filter_map(|code| {
            stats.get(code).map(|values| Stat {
                code: code.clone(),
                values: values.clone(),
            })
        })
        .collect()
}

/// Every displayable field of a product as `{attribute_code, value}`, minus `skip`.
pub fn document_attributes(document: &Document, skip: &[String]) -> Vec<AttributeValue> {
    document
        .fields()
        .iter()
        .filter(|(code, _)| !skip.iter().any(|s| s == *code))
        .filter_map(|(code, value)| {
            value_to_display(value).map(|value| AttributeValue {
                attribute_code: code.clone(),
                value,
            })
        })
        .collect()
}
