use super::query::{SearchQuery, SortDirection};
use super::response::{SearchResponse, SpellSuggestion, StatValues};
use super::SearchClient;
use async_trait::async_trait;
use catalog_common::{
    value_as_f64, value_to_display, Bound, Document, ExpressionValue, FilterExpression, Operator,
};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;

/// Search client answering queries from a fixed set of documents held in memory.
///
/// Full-text matching is token based: every query token must occur, case-insensitively, in one
/// of the document's string values. Facets honour the "excluded" flag of a filter the same way a
/// tagged multi-select facet would.
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchClient {
    documents: Vec<Document>,
    suggestions: IndexMap<String, Vec<String>>,
}

impl InMemorySearchClient {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            suggestions: IndexMap::new(),
        }
    }

    /// Loads documents from a JSON array of objects.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let documents: Vec<Document> = serde_json::from_str(json)?;
        Ok(Self::new(documents))
    }

    /// Alternatives proposed for `word` when a full-text query containing it matches nothing.
    pub fn with_suggestions(mut self, word: &str, alternatives: &[&str]) -> Self {
        self.suggestions.insert(
            word.to_lowercase(),
            alternatives.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn search(&self, query: &SearchQuery) -> SearchResponse {
        let tokens = query_tokens(query.query_text());
        let mut matched: Vec<(f64, &Document)> = self
            .documents
            .iter()
            .filter(|doc| matches_groups(doc, query, None))
            .filter_map(|doc| text_score(doc, &tokens).map(|score| (score, doc)))
            .collect();

        sort_matches(&mut matched, query);

        let facets = query
            .facets()
            .iter()
            .map(|field| (field.clone(), self.facet_counts(field, query, &tokens)))
            .collect();

        let mut stats: IndexMap<String, StatValues> = IndexMap::new();
        for field in query.stats() {
            let entry = stats.entry(field.clone()).or_default();
            for (_, doc) in &matched {
                for value in field_values(doc, field) {
                    if let Some(number) = value_as_f64(value) {
                        entry.push(number);
                    }
                }
            }
        }

        let total_found = matched.len() as u64;
        let documents = matched
            .iter()
            .skip(query.offset())
            .take(query.page_size())
            .map(|(score, doc)| select_fields(doc, *score, query.fields()))
            .collect();

        let suggestions = if total_found == 0 {
            self.spell_suggestions(&tokens)
        } else {
            Vec::new()
        };

        let debug_info = query.debug().then(|| {
            json!({
                "params": {
                    "q": query.query_text().unwrap_or("*:*"),
                    "fq": query.filter_clauses(),
                    "sort": query.sort_clause(),
                    "start": query.offset(),
                    "rows": query.page_size(),
                    "fl": query.fields(),
                    "facet.field": query.facets(),
                    "stats.field": query.stats(),
                },
                "code": 200,
                "message": "OK",
                "uri": "memory:///select",
                "numFound": total_found,
            })
        });

        tracing::debug!(
            total_found,
            filters = query.filter_groups().len(),
            "in-memory search executed"
        );

        SearchResponse {
            total_found,
            documents,
            facets,
            stats,
            debug_info,
            suggestions,
        }
    }

    fn spell_suggestions(&self, tokens: &[String]) -> Vec<SpellSuggestion> {
        tokens
            .iter()
            .filter_map(|token| {
                self.suggestions.get(token).map(|alternatives| SpellSuggestion {
                    word: token.clone(),
                    original_frequency: self
                        .documents
                        .iter()
                        .filter(|doc| text_score(doc, std::slice::from_ref(token)).is_some())
                        .count() as u64,
                    alternatives: alternatives.clone(),
                })
            })
            .collect()
    }

    fn facet_counts(
        &self,
        field: &str,
        query: &SearchQuery,
        tokens: &[String],
    ) -> IndexMap<String, u64> {
        let mut counts: IndexMap<String, u64> = IndexMap::new();
        let docs = self
            .documents
            .iter()
            .filter(|doc| matches_groups(doc, query, Some(field)))
            .filter(|doc| text_score(doc, tokens).is_some());
        for doc in docs {
            for value in field_values(doc, field) {
                if let Some(text) = value_to_display(value) {
                    *counts.entry(text).or_default() += 1;
                }
            }
        }
        counts.sort_by(|ka, a, kb, b| b.cmp(a).then_with(|| ka.cmp(kb)));
        counts
    }
}

#[async_trait]
impl SearchClient for InMemorySearchClient {
    async fn execute(&self, query: &SearchQuery) -> anyhow::Result<SearchResponse> {
        Ok(self.search(query))
    }
}

fn query_tokens(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };
    if text == "*" || text == "*:*" {
        return Vec::new();
    }
    text.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| !matches!(c, '\\' | '"'))
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Number of token hits, `None` when a token is missing. No tokens matches everything.
fn text_score(doc: &Document, tokens: &[String]) -> Option<f64> {
    if tokens.is_empty() {
        return Some(1.0);
    }
    let haystack = doc
        .fields()
        .values()
        .filter_map(value_to_display)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut score = 0.0;
    for token in tokens {
        let hits = haystack.matches(token.as_str()).count();
        if hits == 0 {
            return None;
        }
        score += hits as f64;
    }
    Some(score)
}

/// `skip_field` leaves out excluded filters on that field, used when counting its facet.
fn matches_groups(doc: &Document, query: &SearchQuery, skip_field: Option<&str>) -> bool {
    query.filter_groups().iter().all(|group| {
        let active: Vec<&FilterExpression> = group
            .iter()
            .filter(|expr| !(expr.excluded && Some(expr.field.name.as_str()) == skip_field))
            .collect();
        active.is_empty() || active.iter().any(|expr| matches_expression(doc, expr))
    })
}

fn matches_expression(doc: &Document, expr: &FilterExpression) -> bool {
    let values = field_values(doc, &expr.field.name);
    values.into_iter().any(|value| {
        let Some(text) = value_to_display(value) else {
            return false;
        };
        match (&expr.operator, &expr.value) {
            (_, ExpressionValue::Range { from, to }) => in_range(&text, from, to),
            (Operator::Gt, ExpressionValue::Scalar(v)) => compare(&text, v) == Ordering::Greater,
            (Operator::Lt, ExpressionValue::Scalar(v)) => compare(&text, v) == Ordering::Less,
            (Operator::Gteq, ExpressionValue::Scalar(v)) => compare(&text, v) != Ordering::Less,
            (Operator::Lteq, ExpressionValue::Scalar(v)) => {
                compare(&text, v) != Ordering::Greater
            }
            (_, ExpressionValue::Scalar(v)) => compare(&text, v) == Ordering::Equal,
            (_, ExpressionValue::List(list)) => {
                list.iter().any(|v| compare(&text, v) == Ordering::Equal)
            }
        }
    })
}

fn in_range(text: &str, from: &Bound, to: &Bound) -> bool {
    let Some(value) = finite(text) else {
        return false;
    };
    let above = match from {
        Bound::Unbounded => true,
        Bound::Value(v) => finite(v).is_some_and(|from| value >= from),
    };
    let below = match to {
        Bound::Unbounded => true,
        Bound::Value(v) => finite(v).is_some_and(|to| value <= to),
    };
    above && below
}

/// `NaN` and the infinities are text, not numbers.
fn finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Numeric when both sides parse, otherwise case-insensitive text comparison.
fn compare(a: &str, b: &str) -> Ordering {
    match (finite(a), finite(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

fn field_values<'a>(doc: &'a Document, field: &str) -> Vec<&'a Value> {
    match doc.get(field) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(value) => vec![value],
    }
}

fn sort_matches(matched: &mut [(f64, &Document)], query: &SearchQuery) {
    if query.sorts().is_empty() {
        return;
    }
    matched.sort_by(|(score_a, a), (score_b, b)| {
        for sort in query.sorts() {
            let ordering = if sort.field == "score" {
                score_a.partial_cmp(score_b).unwrap_or(Ordering::Equal)
            } else {
                match (a.get_string(&sort.field), b.get_string(&sort.field)) {
                    (Some(x), Some(y)) => compare(&x, &y),
                    // Documents without the field go last in either direction.
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            };
            let ordering = match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn select_fields(doc: &Document, score: f64, fields: &[String]) -> Document {
    if fields.is_empty() {
        return doc.clone();
    }
    let mut selected = Map::new();
    for field in fields {
        if field == "score" {
            selected.insert(field.clone(), json!(score));
        } else if let Some(value) = doc.get(field) {
            selected.insert(field.clone(), value.clone());
        }
    }
    Document::from_fields(selected)
}
