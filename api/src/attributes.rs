//! Attribute metadata lookup with a per-code, per-store cache in front of the repository.

use crate::config::ResolverConfig;
use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

pub const ATTRIBUTE_CACHE_PREFIX: &str = "catalog_attribute";
pub const OPTION_CACHE_PREFIX: &str = "catalog_attribute_options";

pub const TYPE_SELECT: &str = "select";
pub const TYPE_RANGE: &str = "range";
pub const TYPE_MULTISELECT: &str = "multiselect";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeMetadata {
    pub attribute_code: String,
    pub attribute_id: i64,
    pub attribute_label: String,
    pub backend_type: String,
    pub frontend_input: String,
    pub attribute_type: String,
    pub attribute_options: Vec<AttributeOption>,
    pub position: i64,
}

impl AttributeMetadata {
    /// Zeroed entry returned for codes the repository does not know.
    pub fn unknown(code: &str) -> Self {
        Self {
            attribute_code: code.to_string(),
            ..Self::default()
        }
    }
}

/// Byte cache shared across requests. Entries expire after their TTL.
pub trait AttributeMetadataCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

/// Source of truth for attribute metadata.
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    /// Metadata for the given codes. Unknown codes are simply absent from the result.
    async fn load_attributes(
        &self,
        codes: &[String],
        store_id: i64,
    ) -> Result<Vec<AttributeMetadata>>;

    async fn load_options(&self, code: &str, store_id: i64) -> Result<Vec<AttributeOption>>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAttributeCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryAttributeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttributeMetadataCache for InMemoryAttributeCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire cache lock - possible poisoning"))?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire cache lock - possible poisoning"))?;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}

/// Attribute type from a code override, else from the backend type and frontend input.
/// Unknown combinations have no type.
pub fn attribute_type(
    code: &str,
    backend_type: &str,
    frontend_input: &str,
    overrides: &HashMap<String, String>,
) -> String {
    if let Some(kind) = overrides.get(code) {
        return kind.clone();
    }
    match (backend_type, frontend_input) {
        ("int", "select") => TYPE_SELECT.to_string(),
        ("decimal", "number") => TYPE_RANGE.to_string(),
        ("varchar", "multiselect") => TYPE_MULTISELECT.to_string(),
        _ => String::new(),
    }
}

pub struct AttributeDataProvider {
    repository: Arc<dyn AttributeRepository>,
    cache: Arc<dyn AttributeMetadataCache>,
    ttl: Duration,
    type_overrides: HashMap<String, String>,
}

impl AttributeDataProvider {
    pub fn new(
        repository: Arc<dyn AttributeRepository>,
        cache: Arc<dyn AttributeMetadataCache>,
        ttl: Duration,
        type_overrides: HashMap<String, String>,
    ) -> Self {
        Self {
            repository,
            cache,
            ttl,
            type_overrides,
        }
    }

    /// Provider using the cache TTL and attribute type overrides of `config`.
    pub fn from_config(
        repository: Arc<dyn AttributeRepository>,
        cache: Arc<dyn AttributeMetadataCache>,
        config: &ResolverConfig,
    ) -> Self {
        Self::new(
            repository,
            cache,
            Duration::from_secs(config.attribute_cache_ttl_secs),
            config.attribute_types.clone(),
        )
    }

    /// Metadata keyed by code, cached entries first, then the repository batch.
    pub async fn attributes(
        &self,
        codes: &[String],
        store_id: i64,
    ) -> Result<IndexMap<String, AttributeMetadata>> {
        let mut found = IndexMap::new();
        let mut misses = Vec::new();
        for code in codes {
            let key = cache_key(ATTRIBUTE_CACHE_PREFIX, code, store_id);
            match self.cached::<AttributeMetadata>(&key) {
                Some(attribute) => {
                    found.insert(code.clone(), attribute);
                }
                None => misses.push(code.clone()),
            }
        }

        if !misses.is_empty() {
            tracing::debug!(misses = misses.len(), store_id, "loading attributes");
            for mut attribute in self.repository.load_attributes(&misses, store_id).await? {
                attribute.attribute_type = attribute_type(
                    &attribute.attribute_code,
                    &attribute.backend_type,
                    &attribute.frontend_input,
                    &self.type_overrides,
                );
                let key = cache_key(ATTRIBUTE_CACHE_PREFIX, &attribute.attribute_code, store_id);
                self.store(&key, &attribute);
                found.insert(attribute.attribute_code.clone(), attribute);
            }
        }
        Ok(found)
    }

    /// Options inlined on the attribute win, then the cache, then the repository.
    pub async fn options(
        &self,
        attribute: &AttributeMetadata,
        store_id: i64,
    ) -> Result<Vec<AttributeOption>> {
        if !attribute.attribute_options.is_empty() {
            return Ok(attribute.attribute_options.clone());
        }
        let key = cache_key(OPTION_CACHE_PREFIX, &attribute.attribute_code, store_id);
        if let Some(options) = self.cached::<Vec<AttributeOption>>(&key) {
            if !options.is_empty() {
                return Ok(options);
            }
        }
        let options = self
            .repository
            .load_options(&attribute.attribute_code, store_id)
            .await?;
        self.store(&key, &options);
        Ok(options)
    }

    /// Unreadable or undecodable entries count as misses.
    fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Ignoring undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Attribute cache read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_vec(value)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| self.cache.put(key, bytes, self.ttl));
        if let Err(e) = result {
            tracing::warn!("Attribute cache write failed for {}: {:#}", key, e);
        }
    }
}

pub fn cache_key(prefix: &str, code: &str, store_id: i64) -> String {
    format!("{}:{}:{}", prefix, code, store_id)
}
