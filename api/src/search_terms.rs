use crate::config::SearchTermConfig;
use crate::search::SpellSuggestion;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Shopper query as it is recorded for popularity statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedQuery {
    pub query_text: String,
    pub is_query_text_exceeded: bool,
    pub is_query_text_short: bool,
}

impl TrackedQuery {
    /// Cleans the raw text, truncates it to `max_query_length` characters and flags queries
    /// outside the configured length window.
    pub fn prepare(raw: &str, config: &SearchTermConfig) -> Self {
        let raw = clean_query_text(raw);
        let length = raw.chars().count();
        let is_query_text_exceeded = length > config.max_query_length;
        let query_text = if is_query_text_exceeded {
            raw.chars().take(config.max_query_length).collect()
        } else {
            raw
        };
        Self {
            query_text,
            is_query_text_exceeded,
            is_query_text_short: length < config.min_query_length,
        }
    }
}

/// Records search-term popularity and result counts. Failures are not fatal to a request.
#[async_trait]
pub trait SearchTermTracker: Send + Sync {
    async fn record_query(&self, query: &TrackedQuery, store_id: i64) -> Result<()>;

    async fn record_num_results(
        &self,
        query: &TrackedQuery,
        num_results: u64,
        store_id: i64,
    ) -> Result<()>;
}

/// Tracker that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSearchTermTracker;

#[async_trait]
impl SearchTermTracker for NoopSearchTermTracker {
    async fn record_query(&self, _query: &TrackedQuery, _store_id: i64) -> Result<()> {
        Ok(())
    }

    async fn record_num_results(
        &self,
        _query: &TrackedQuery,
        _num_results: u64,
        _store_id: i64,
    ) -> Result<()> {
        Ok(())
    }
}

/// Trims and drops control characters.
pub fn clean_query_text(raw: &str) -> String {
    raw.trim().chars().filter(|c| !c.is_control()).collect()
}

/// Absolute http(s) URLs are kept, anything else becomes a root-relative path.
pub fn sanitize_canonical_url(url: Option<&str>) -> Option<String> {
    let url = url.map(str::trim).filter(|url| !url.is_empty())?;
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(url.to_string())
    } else {
        Some(format!("/{}", url.trim_start_matches('/')))
    }
}

/// Every rewrite of `original` obtained by applying the alternatives of misspelled words,
/// alone and combined with the rewrites found so far. Words that do occur in the index are
/// left alone.
pub fn alternative_search_texts(original: &str, suggestions: &[SpellSuggestion]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for suggestion in suggestions {
        if suggestion.original_frequency > 0 || suggestion.word.is_empty() {
            continue;
        }
        for alternative in &suggestion.alternatives {
            let mut candidates = vec![original.replace(&suggestion.word, alternative)];
            candidates.extend(
                result
                    .iter()
                    .map(|text| text.replace(&suggestion.word, alternative)),
            );
            for candidate in candidates {
                if !result.contains(&candidate) {
                    result.push(candidate);
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SearchTermConfig {
        SearchTermConfig {
            min_query_length: 3,
            max_query_length: 5,
        }
    }

    fn suggestion(word: &str, frequency: u64, alternatives: &[&str]) -> SpellSuggestion {
        SpellSuggestion {
            word: word.to_string(),
            original_frequency: frequency,
            alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_prepare_flags_and_truncates() {
        let long = TrackedQuery::prepare("  żółwiki\n", &config());
        assert_eq!(long.query_text, "żółwi");
        assert!(long.is_query_text_exceeded);
        assert!(!long.is_query_text_short);

        let short = TrackedQuery::prepare("ab", &config());
        assert_eq!(short.query_text, "ab");
        assert!(short.is_query_text_short);
        assert!(!short.is_query_text_exceeded);
    }

    #[test]
    fn test_sanitize_canonical_url() {
        assert_eq!(
            sanitize_canonical_url(Some("HTTPS://shop.example.com/sale")),
            Some("HTTPS://shop.example.com/sale".to_string())
        );
        assert_eq!(
            sanitize_canonical_url(Some("//sale.html")),
            Some("/sale.html".to_string())
        );
        assert_eq!(
            sanitize_canonical_url(Some("sale.html")),
            Some("/sale.html".to_string())
        );
        assert_eq!(sanitize_canonical_url(Some("  ")), None);
        assert_eq!(sanitize_canonical_url(None), None);
    }

    #[test]
    fn test_alternative_search_texts_combine() {
        let suggestions = vec![
            suggestion("rde", 0, &["red", "rode"]),
            suggestion("shrit", 0, &["shirt"]),
            suggestion("cotton", 4, &["cottons"]),
        ];
        assert_eq!(
            alternative_search_texts("rde shrit cotton", &suggestions),
            vec![
                "red shrit cotton",
                "rode shrit cotton",
                "rde shirt cotton",
                "red shirt cotton",
                "rode shirt cotton",
            ]
        );
        assert!(alternative_search_texts("x", &[]).is_empty());
    }
}
