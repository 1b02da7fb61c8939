//! Scholarly search client.
//!
//! The pipeline consumes search results through the [`SearchProvider`] trait.
//! [`SerpApiClient`] implements it against SerpApi's Google Scholar engine;
//! [`StaticSearchProvider`] serves canned responses for tests and dry runs.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scholardigest_shared::{Result, ScholarDigestError, SearchConfig, SearchResponse};
use tracing::{debug, info, instrument};
use url::Url;

/// Default timeout in seconds for search requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sort-by-date flag sent alongside a recency cutoff.
const SORT_BY_DATE: &str = "2";

// ---------------------------------------------------------------------------
// Request / trait
// ---------------------------------------------------------------------------

/// One search call: a term plus provider parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
    pub language: String,
    pub result_count: u32,
    /// Only return results published in or after this year.
    pub recency_cutoff_year: Option<i32>,
}

impl SearchRequest {
    /// Build a request for `term` using the configured language and count.
    pub fn from_config(term: &str, config: &SearchConfig, recency_cutoff_year: Option<i32>) -> Self {
        Self {
            term: term.to_string(),
            language: config.language.clone(),
            result_count: config.num_results,
            recency_cutoff_year,
        }
    }
}

/// A scholarly search backend returning ranked result lists.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search. A response without `organic_results` means no results.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;
}

// ---------------------------------------------------------------------------
// SerpApi client
// ---------------------------------------------------------------------------

/// SerpApi-backed search client.
pub struct SerpApiClient {
    client: Client,
    endpoint: Url,
    engine: String,
    api_key: String,
}

impl SerpApiClient {
    /// Create a client from the `[search]` config section and a resolved key.
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            ScholarDigestError::config(format!("invalid search base_url '{}': {e}", config.base_url))
        })?;
        let endpoint = base
            .join("search")
            .map_err(|e| ScholarDigestError::config(format!("invalid search endpoint: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ScholarDigestError::Search(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            engine: config.engine.clone(),
            api_key: api_key.into(),
        })
    }

    /// Query parameters for a request, in the order SerpApi documents them.
    fn query_params(&self, request: &SearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", self.engine.clone()),
            ("q", request.term.clone()),
            ("hl", request.language.clone()),
            ("api_key", self.api_key.clone()),
            ("num", request.result_count.to_string()),
        ];

        if let Some(year) = request.recency_cutoff_year {
            params.push(("scisbd", SORT_BY_DATE.to_string()));
            params.push(("as_ylo", year.to_string()));
        }

        params
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    #[instrument(skip_all, fields(term = %request.term))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        info!(
            cutoff_year = ?request.recency_cutoff_year,
            count = request.result_count,
            "querying search provider"
        );

        let response = self
            .client
            .get(self.endpoint.as_str())
            .query(&self.query_params(request))
            .send()
            .await
            .map_err(|e| ScholarDigestError::Search(format!("{}: {e}", request.term)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScholarDigestError::Search(format!(
                "{}: HTTP {status}",
                request.term
            )));
        }

        let body = response.text().await.map_err(|e| {
            ScholarDigestError::Search(format!("{}: failed to read body: {e}", request.term))
        })?;

        parse_response(&body)
    }
}

/// Decode a provider body.
///
/// SerpApi reports an empty result set as `{"error": "..."}` with HTTP 200;
/// that is treated the same as a missing `organic_results` key. Bodies that
/// do not decode are `Parse` errors.
fn parse_response(body: &str) -> Result<SearchResponse> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ScholarDigestError::parse(format!("invalid search response JSON: {e}")))?;

    if value.get("organic_results").is_none() {
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            debug!(%message, "provider reported no results");
        }
        return Ok(SearchResponse::default());
    }

    serde_json::from_value(value)
        .map_err(|e| ScholarDigestError::parse(format!("unexpected search response shape: {e}")))
}

// ---------------------------------------------------------------------------
// Static provider
// ---------------------------------------------------------------------------

/// Serves pre-parsed responses keyed by search term.
///
/// Terms without a registered response yield an empty response. Every
/// request is recorded so callers can assert on what was searched.
#[derive(Default)]
pub struct StaticSearchProvider {
    responses: HashMap<String, String>,
    requests: RwLock<Vec<SearchRequest>>,
}

impl StaticSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw JSON body for `term`.
    pub fn with_response(mut self, term: &str, json: impl Into<String>) -> Self {
        self.responses.insert(term.to_string(), json.into());
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for StaticSearchProvider {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        if let Ok(mut log) = self.requests.write() {
            log.push(request.clone());
        }

        match self.responses.get(&request.term) {
            Some(body) => parse_response(body),
            None => Ok(SearchResponse::default()),
        }
    }
}
