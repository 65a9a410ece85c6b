//! Shared HTTP plumbing for provider adapters.
//!
//! Maps transport and status errors into [`ProviderFailure`] the same way for
//! every adapter, so the orchestrator can classify them uniformly.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ProviderFailure;

/// Default request timeout for adapters constructed without one.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// HTTP client bound to one provider id.
#[derive(Clone, Debug)]
pub struct ProviderHttp {
    client: Client,
    provider: &'static str,
}

impl ProviderHttp {
    pub fn new(provider: &'static str) -> Self {
        Self::with_headers(provider, DEFAULT_HTTP_TIMEOUT, &[])
    }

    /// Client with a timeout and extra default headers (Referer and friends).
    pub fn with_headers(
        provider: &'static str,
        timeout: Duration,
        headers: &[(&'static str, &'static str)],
    ) -> Self {
        let mut defaults = HeaderMap::new();
        defaults.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        for (name, value) in headers {
            defaults.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(defaults)
            .build()
            .unwrap_or_else(|e| {
                warn!("{}: failed to build HTTP client ({}), using defaults", provider, e);
                Client::new()
            });

        Self { client, provider }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// GET `url` with query parameters and decode the body as JSON.
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ProviderFailure> {
        let body = self.send(self.get(url).query(query)).await?;
        parse_json(self.provider, &body)
    }

    /// GET `url` with query parameters and return the raw body.
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, ProviderFailure> {
        self.send(self.get(url).query(query)).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json(&self, url: &str, payload: &Value) -> Result<Value, ProviderFailure> {
        let body = self.send(self.post(url).json(payload)).await?;
        parse_json(self.provider, &body)
    }

    /// Send a request and return its non-empty body.
    pub async fn send(&self, request: RequestBuilder) -> Result<String, ProviderFailure> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!("{} responded with HTTP {}", self.provider, status);

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        if let Some(failure) = classify_status(self.provider, status, retry_after) {
            warn!("{} request failed: {}", self.provider, failure);
            return Err(failure);
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if body.trim().is_empty() {
            return Err(ProviderFailure::EmptyResponse {
                provider: self.provider.to_string(),
            });
        }
        Ok(body)
    }

    fn transport_error(&self, error: reqwest::Error) -> ProviderFailure {
        if error.is_timeout() {
            ProviderFailure::Timeout {
                provider: self.provider.to_string(),
            }
        } else if error.is_decode() || error.is_body() {
            ProviderFailure::ParseError {
                provider: self.provider.to_string(),
                message: format!("Failed to read response: {}", error),
            }
        } else {
            ProviderFailure::Network {
                provider: self.provider.to_string(),
                message: format!("Request failed: {}", error),
            }
        }
    }
}

/// Map an HTTP status to a failure; `None` for success.
pub fn classify_status(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
) -> Option<ProviderFailure> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        // Most free tiers answer quota exhaustion with 403; Binance bans with 418
        StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN | StatusCode::IM_A_TEAPOT => {
            ProviderFailure::RateLimited {
                provider: provider.to_string(),
                retry_after,
            }
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderFailure::Timeout {
            provider: provider.to_string(),
        },
        // Unknown symbol on most REST APIs
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => ProviderFailure::EmptyResponse {
            provider: provider.to_string(),
        },
        other => ProviderFailure::Network {
            provider: provider.to_string(),
            message: format!("HTTP {}", other),
        },
    })
}

/// Decode a JSON body.
pub fn parse_json(provider: &str, body: &str) -> Result<Value, ProviderFailure> {
    if body.trim().is_empty() {
        return Err(ProviderFailure::EmptyResponse {
            provider: provider.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| ProviderFailure::ParseError {
        provider: provider.to_string(),
        message: format!("Invalid JSON: {}", e),
    })
}

/// Shorthand for a payload-shape failure.
pub fn parse_error(provider: &str, message: impl Into<String>) -> ProviderFailure {
    ProviderFailure::ParseError {
        provider: provider.to_string(),
        message: message.into(),
    }
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
