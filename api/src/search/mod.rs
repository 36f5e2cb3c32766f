mod memory;
mod query;
mod response;

pub use memory::InMemorySearchClient;
pub use query::{FilterGroup, SearchQuery, Sort, SortDirection};
pub use response::{SearchResponse, SpellSuggestion, StatValues};

use async_trait::async_trait;

/// Executes queries against the search engine.
///
/// Failures are returned as errors and never as an empty response, so that a broken engine
/// can be told apart from a query without hits.
#[async_trait]
pub trait SearchClient: Send + Sync {
    fn new_query(&self) -> SearchQuery {
        SearchQuery::new()
    }

    async fn execute(&self, query: &SearchQuery) -> anyhow::Result<SearchResponse>;
}

#[cfg(test)]
mod tests;
