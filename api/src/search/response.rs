use catalog_common::Document;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spell-check correction proposed for one word of the full-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellSuggestion {
    pub word: String,
    /// How often the misspelled word itself occurs in the index.
    pub original_frequency: u64,
    /// Best alternative first.
    pub alternatives: Vec<String>,
}

/// Numeric aggregate of one stat field over the whole result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatValues {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
    pub count: u64,
}

impl StatValues {
    pub fn push(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
        self.sum += value;
        self.count += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub total_found: u64,
    pub documents: Vec<Document>,
    /// Facet field to value to count, in engine order.
    pub facets: IndexMap<String, IndexMap<String, u64>>,
    pub stats: IndexMap<String, StatValues>,
    pub debug_info: Option<Value>,
    pub suggestions: Vec<SpellSuggestion>,
}

impl SearchResponse {
    pub fn total_found(&self) -> u64 {
        self.total_found
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn facets(&self) -> &IndexMap<String, IndexMap<String, u64>> {
        &self.facets
    }

    pub fn stats(&self) -> &IndexMap<String, StatValues> {
        &self.stats
    }

    pub fn debug_info(&self) -> Option<&Value> {
        self.debug_info.as_ref()
    }

    pub fn first_document(&self) -> Option<&Document> {
        self.documents.first()
    }
}
