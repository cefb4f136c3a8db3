use std::env;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ErrorBody, SearchArgs, SearchRequest, SearchResult, SourceEntry, SourcedView};

const API_BASE: &str = "https://api.linkup.so/v1";

#[derive(Debug, thiserror::Error)]
pub enum LinkupError {
    #[error("LINKUP_API_KEY not set. Add it to the environment or to a .env file")]
    ApiKeyNotSet,

    #[error("Linkup rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("Linkup rejected the API key: {0}")]
    Unauthorized(String),

    #[error("Linkup API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Malformed Linkup response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Web search restricted to the official-domain allow-list.
/// Implemented by `LinkupClient` for production; mock implementations used in tests.
pub trait WebSearch {
    async fn search(&self, args: &SearchArgs) -> Result<SearchResult, LinkupError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone, Debug)]
pub struct LinkupClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl LinkupClient {
    pub fn from_env(http: Client) -> Result<Self, LinkupError> {
        let api_key = env::var("LINKUP_API_KEY").map_err(|_| LinkupError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(LinkupError::ApiKeyNotSet);
        }
        Ok(Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            base_url: base_url.to_string(),
        }
    }
}

impl WebSearch for LinkupClient {
    async fn search(&self, args: &SearchArgs) -> Result<SearchResult, LinkupError> {
        let url = format!("{}/search", self.base_url);

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(&SearchRequest::restricted(args))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .and_then(|err| err.message)
                .unwrap_or_else(|| {
                    let end = text.floor_char_boundary(200);
                    format!("HTTP {status}: {}", &text[..end])
                });
            let err = match status.as_u16() {
                429 => LinkupError::RateLimited,
                401 | 403 => LinkupError::Unauthorized(message),
                code => LinkupError::Api { code, message },
            };
            debug!(error = %err, "Linkup API error");
            return Err(err);
        }

        let text = response.text().await?;
        let raw: serde_json::Value = serde_json::from_str(&text).map_err(LinkupError::Decode)?;
        let result = into_search_result(raw);
        debug!(query = %args.query, sources = result.sources.len(), "linkup search complete");
        Ok(result)
    }
}

/// Keeps the raw body and pulls out whatever `sources` it carries. A body that
/// does not fit the sourced-answer shape yields no sources rather than an
/// error, and each malformed entry is skipped on its own.
pub fn into_search_result(raw: serde_json::Value) -> SearchResult {
    let view = match serde_json::from_value::<SourcedView>(raw.clone()) {
        Ok(view) => view,
        Err(e) => {
            warn!(error = %e, "search response has no usable sources");
            SourcedView::default()
        }
    };
    let sources = view
        .sources
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            serde_json::from_value::<SourceEntry>(entry)
                .inspect_err(|e| debug!(error = %e, "skipping malformed source entry"))
                .ok()
        })
        .collect();
    SearchResult { raw, sources }
}
