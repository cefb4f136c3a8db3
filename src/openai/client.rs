use std::env;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ApiError, ErrorBody, ResponsesRequest, ResponsesResponse, Verbosity};

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-5-nano";

#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("OPENAI_API_KEY not set. Add it to the environment or to a .env file")]
    ApiKeyNotSet,

    #[error("OpenAI rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("OpenAI quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("OpenAI rejected the API key: {0}")]
    Unauthorized(String),

    #[error("OpenAI API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Malformed OpenAI response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One call to a text-completion endpoint.
/// Implemented by `OpenAiClient` for production; mock implementations used in tests.
pub trait CompletionClient {
    fn model(&self) -> &str;

    fn verbosity(&self) -> Verbosity {
        Verbosity::Medium
    }

    async fn complete(&self, request: &ResponsesRequest) -> Result<ResponsesResponse, OpenAiError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    verbosity: Verbosity,
    base_url: String,
}

impl OpenAiClient {
    /// Reads `OPENAI_API_KEY`, plus optional `OPENAI_MODEL` and `OPENAI_VERBOSITY`.
    pub fn from_env(http: Client) -> Result<Self, OpenAiError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| OpenAiError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(OpenAiError::ApiKeyNotSet);
        }
        let model = env::var("OPENAI_MODEL")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let verbosity = match env::var("OPENAI_VERBOSITY") {
            Ok(v) => Verbosity::parse(&v).unwrap_or_else(|| {
                warn!(value = %v, "unknown OPENAI_VERBOSITY, using medium");
                Verbosity::Medium
            }),
            Err(_) => Verbosity::Medium,
        };
        Ok(Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            model,
            verbosity,
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            verbosity: Verbosity::Medium,
            base_url: base_url.to_string(),
        }
    }
}

impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    async fn complete(&self, request: &ResponsesRequest) -> Result<ResponsesResponse, OpenAiError> {
        let url = format!("{}/responses", self.base_url);

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ErrorBody>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(status.as_u16(), err);
                debug!(error = %classified, "OpenAI API error");
                return Err(classified);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                debug!("OpenAI API rate limited");
                return Err(OpenAiError::RateLimited);
            }
            let end = text.floor_char_boundary(200);
            debug!(status = %status, "OpenAI API error (no structured body)");
            return Err(OpenAiError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let text = response.text().await?;
        let body: ResponsesResponse = serde_json::from_str(&text).map_err(OpenAiError::Decode)?;
        debug!(model = %request.model, items = body.output.len(), "completion received");

        if let Some(err) = &body.error {
            let classified = classify_api_error(status.as_u16(), err);
            debug!(error = %classified, "OpenAI API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

fn classify_api_error(status: u16, err: &ApiError) -> OpenAiError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match (status, err.code.as_deref()) {
        (_, Some("insufficient_quota")) => OpenAiError::QuotaExhausted(message),
        (429, _) => OpenAiError::RateLimited,
        (401, _) | (_, Some("invalid_api_key")) => OpenAiError::Unauthorized(message),
        (code, _) => OpenAiError::Api { code, message },
    }
}
