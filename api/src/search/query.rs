use catalog_common::FilterExpression;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: &str, direction: SortDirection) -> Self {
        Self {
            field: field.to_string(),
            direction,
        }
    }
}

/// Expressions OR-ed together. Groups are AND-ed with each other.
pub type FilterGroup = Vec<FilterExpression>;

/// Engine-independent query description handed to a [`super::SearchClient`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    query_text: Option<String>,
    filter_groups: Vec<FilterGroup>,
    fields: Vec<String>,
    sorts: Vec<Sort>,
    page_size: usize,
    current_page: usize,
    facets: Vec<String>,
    stats: Vec<String>,
    debug: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query_text: None,
            filter_groups: Vec::new(),
            fields: Vec::new(),
            sorts: Vec::new(),
            page_size: 10,
            current_page: 1,
            facets: Vec::new(),
            stats: Vec::new(),
            debug: false,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: FilterExpression) -> &mut Self {
        self.filter_groups.push(vec![filter]);
        self
    }

    /// Adds groups of alternatives. Empty groups are ignored.
    pub fn add_filters(&mut self, groups: impl IntoIterator<Item = FilterGroup>) -> &mut Self {
        self.filter_groups
            .extend(groups.into_iter().filter(|group| !group.is_empty()));
        self
    }

    /// Adds output fields, keeping the first occurrence of duplicates. No fields means all.
    pub fn add_fields_to_select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in fields {
            let field = field.as_ref();
            if !field.is_empty() && !self.fields.iter().any(|f| f == field) {
                self.fields.push(field.to_string());
            }
        }
        self
    }

    pub fn set_sort(&mut self, sorts: Vec<Sort>) -> &mut Self {
        self.sorts = sorts;
        self
    }

    pub fn add_sort(&mut self, field: &str, direction: SortDirection) -> &mut Self {
        self.sorts.push(Sort::new(field, direction));
        self
    }

    pub fn set_page_size(&mut self, page_size: usize) -> &mut Self {
        self.page_size = page_size;
        self
    }

    /// One-based; zero is treated as the first page.
    pub fn set_current_page(&mut self, current_page: usize) -> &mut Self {
        self.current_page = current_page.max(1);
        self
    }

    pub fn add_facet(&mut self, field: &str) -> &mut Self {
        if !self.facets.iter().any(|f| f == field) {
            self.facets.push(field.to_string());
        }
        self
    }

    pub fn add_stat(&mut self, field: &str) -> &mut Self {
        if !self.stats.iter().any(|f| f == field) {
            self.stats.push(field.to_string());
        }
        self
    }

    /// Full-text part of the query. Blank text clears it.
    pub fn set_query_text(&mut self, text: &str) -> &mut Self {
        let text = text.trim();
        self.query_text = (!text.is_empty()).then(|| text.to_string());
        self
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query_text.as_deref()
    }

    pub fn filter_groups(&self) -> &[FilterGroup] {
        &self.filter_groups
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn offset(&self) -> usize {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
    }

    pub fn facets(&self) -> &[String] {
        &self.facets
    }

    pub fn stats(&self) -> &[String] {
        &self.stats
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Filter clauses in the engine's query syntax, one per group.
    pub fn filter_clauses(&self) -> Vec<String> {
        self.filter_groups
            .iter()
            .map(|group| match group.as_slice() {
                [single] => single.to_query_clause(),
                many => format!(
                    "({})",
                    many.iter()
                        .map(FilterExpression::to_query_clause)
                        .collect::<Vec<_>>()
                        .join(" OR ")
                ),
            })
            .collect()
    }

    pub fn sort_clause(&self) -> String {
        self.sorts
            .iter()
            .map(|sort| format!("{} {}", sort.field, sort.direction))
            .collect::<Vec<_>>()
            .join(",")
    }
}
