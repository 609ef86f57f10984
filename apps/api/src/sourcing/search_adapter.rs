//! Candidate Search Adapter — provider query construction, the one-shot
//! degraded retry for over-long queries, and the profile-URL post-filter.

use tracing::{info, warn};

use crate::models::candidate::CandidateDocument;
use crate::search::{CandidateSearch, SearchError, SearchHit};

/// Result bound requested from the provider (and the scoring batch cap).
pub const MAX_RESULTS: u32 = 10;

/// Only results whose URL contains this marker are individual profiles.
const PROFILE_URL_MARKER: &str = "linkedin.com/in/";

/// Word count for the degraded query rebuilt from the original description.
const DEGRADED_QUERY_WORDS: usize = 10;

const FALLBACK_TITLE: &str = "Unknown Candidate";

/// Searches for candidate profiles matching the condensed query.
///
/// If the provider rejects the query as too long, the query is rebuilt from
/// the first few words of the *original* description and retried exactly
/// once; a second failure propagates. An empty result set is a valid
/// terminal state, not an error.
pub async fn search_candidates(
    search: &dyn CandidateSearch,
    condensed_query: &str,
    original_description: &str,
) -> Result<Vec<CandidateDocument>, SearchError> {
    let query = build_provider_query(condensed_query);

    let hits = match search.search(&query, MAX_RESULTS).await {
        Ok(hits) => hits,
        Err(SearchError::QueryTooLong(message)) => {
            warn!("Provider rejected query as too long, degrading: {message}");
            let degraded = build_provider_query(&degraded_query(original_description));
            search.search(&degraded, MAX_RESULTS).await?
        }
        Err(e) => return Err(e),
    };

    let total = hits.len();
    let documents = filter_profiles(hits);
    info!(
        "Search returned {} results, {} matched the profile pattern",
        total,
        documents.len()
    );

    Ok(documents)
}

/// Combines the profile-site restriction with negative keyword exclusions
/// that suppress job postings, company pages, and articles.
fn build_provider_query(query: &str) -> String {
    format!(
        "site:linkedin.com/in {query} \
         -intitle:'job description' -intitle:'career' -intitle:'company' \
         -intitle:'blog' -intitle:'article' -intitle:'jobs'"
    )
}

/// First ~10 whitespace-delimited words of the original description.
fn degraded_query(description: &str) -> String {
    description
        .split_whitespace()
        .take(DEGRADED_QUERY_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps only results whose URL matches the profile-path pattern,
/// case-insensitively. Everything else is dropped silently.
fn filter_profiles(hits: Vec<SearchHit>) -> Vec<CandidateDocument> {
    hits.into_iter()
        .filter(|hit| hit.url.to_lowercase().contains(PROFILE_URL_MARKER))
        .map(|hit| CandidateDocument {
            title: hit
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            url: hit.url,
            content: hit.content,
            image: hit.image,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: Some(format!("Profile at {url}")),
            url: url.to_string(),
            content: None,
            image: None,
        }
    }

    /// Records queries and plays back a scripted sequence of responses.
    struct ScriptedSearch {
        queries: Mutex<Vec<String>>,
        responses: Mutex<Vec<Result<Vec<SearchHit>, SearchError>>>,
    }

    impl ScriptedSearch {
        fn new(responses: Vec<Result<Vec<SearchHit>, SearchError>>) -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl CandidateSearch for ScriptedSearch {
        async fn search(
            &self,
            query: &str,
            _max_results: u32,
        ) -> Result<Vec<SearchHit>, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            self.responses.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_non_profile_urls_are_filtered_out() {
        let search = ScriptedSearch::new(vec![Ok(vec![
            hit("https://www.linkedin.com/in/alice"),
            hit("https://www.linkedin.com/jobs/view/12345"),
            hit("https://example.com/blog/hiring"),
            hit("https://LinkedIn.com/IN/bob"),
        ])]);

        let documents = search_candidates(&search, "rust engineer", "rust engineer")
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert!(documents
            .iter()
            .all(|d| d.url.to_lowercase().contains(PROFILE_URL_MARKER)));
    }

    #[tokio::test]
    async fn test_provider_query_includes_site_restriction_and_exclusions() {
        let search = ScriptedSearch::new(vec![Ok(vec![])]);
        search_candidates(&search, "rust engineer", "rust engineer")
            .await
            .unwrap();

        let queries = search.queries.lock().unwrap();
        assert!(queries[0].starts_with("site:linkedin.com/in rust engineer"));
        assert!(queries[0].contains("-intitle:'jobs'"));
    }

    #[tokio::test]
    async fn test_query_too_long_retries_once_with_degraded_query() {
        let search = ScriptedSearch::new(vec![
            Err(SearchError::QueryTooLong("query too long".to_string())),
            Ok(vec![hit("https://linkedin.com/in/carol")]),
        ]);

        let original = "one two three four five six seven eight nine ten eleven twelve";
        let documents = search_candidates(&search, "some condensed query", original)
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        let queries = search.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        // Degraded query is rebuilt from the first 10 words of the original
        assert!(queries[1].contains("one two three four five six seven eight nine ten"));
        assert!(!queries[1].contains("eleven"));
    }

    #[tokio::test]
    async fn test_second_failure_propagates() {
        let search = ScriptedSearch::new(vec![
            Err(SearchError::QueryTooLong("query too long".to_string())),
            Err(SearchError::Provider {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);

        let result = search_candidates(&search, "condensed", "original description").await;
        assert!(matches!(result, Err(SearchError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_other_errors_propagate_without_retry() {
        let search = ScriptedSearch::new(vec![Err(SearchError::Provider {
            status: 401,
            message: "bad key".to_string(),
        })]);

        let result = search_candidates(&search, "condensed", "original").await;
        assert!(result.is_err());
        assert_eq!(search.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_matches_is_ok_empty_not_error() {
        let search = ScriptedSearch::new(vec![Ok(vec![hit("https://example.com/article")])]);
        let documents = search_candidates(&search, "q", "q").await.unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_missing_title_gets_placeholder() {
        let search = ScriptedSearch::new(vec![Ok(vec![SearchHit {
            title: None,
            url: "https://linkedin.com/in/dave".to_string(),
            content: None,
            image: None,
        }])]);
        let documents = search_candidates(&search, "q", "q").await.unwrap();
        assert_eq!(documents[0].title, FALLBACK_TITLE);
    }
}
