//! Catalog GraphQL resolvers over a search engine.
//!
//! GraphQL arguments are translated into filter expressions ([`filters`]), run through a
//! [`search::SearchClient`], and the returned documents are reshaped into GraphQL values
//! ([`projection`], [`categories`]). [`resolvers::CatalogResolver`] ties the pieces together per
//! operation.

pub mod attributes;
pub mod categories;
pub mod config;
pub mod error;
pub mod fields;
pub mod filters;
pub mod hooks;
pub mod projection;
pub mod resolvers;
pub mod search;
pub mod search_terms;
pub mod store;

pub use config::ResolverConfig;
pub use error::{ResolverError, ResolverResult};
pub use resolvers::{CatalogResolver, RequestContext};
pub use search::{InMemorySearchClient, SearchClient, SearchQuery, SearchResponse};
pub use store::{FixedStore, StoreContext};
