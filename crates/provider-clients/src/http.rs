use std::time::Duration;

use maven_core::ProviderError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Shared transport settings for every provider client
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Whole-request deadline
    pub timeout: Duration,
    /// Extra attempts after an HTTP 429
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl HttpSettings {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub(crate) fn build_client(&self) -> Client {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}

pub(crate) fn map_reqwest_error(e: reqwest::Error, settings: &HttpSettings) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(settings.timeout.as_secs())
    } else {
        ProviderError::Http(e.to_string())
    }
}

/// Send a request, retrying on HTTP 429 with a fixed backoff.
pub(crate) async fn send_with_retry(
    client: &Client,
    builder: RequestBuilder,
    settings: &HttpSettings,
    provider: &str,
) -> Result<Response, ProviderError> {
    let request = builder
        .build()
        .map_err(|e| ProviderError::Http(e.to_string()))?;

    for attempt in 0..=settings.max_retries {
        let req_clone = request
            .try_clone()
            .ok_or_else(|| ProviderError::Http("Cannot clone request".to_string()))?;
        let response = client
            .execute(req_clone)
            .await
            .map_err(|e| map_reqwest_error(e, settings))?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        if attempt < settings.max_retries {
            tracing::warn!(
                "{} 429 rate limited, waiting {:.1}s before retry {}/{}",
                provider,
                settings.retry_backoff.as_secs_f64(),
                attempt + 1,
                settings.max_retries
            );
            tokio::time::sleep(settings.retry_backoff).await;
        }
    }

    Err(ProviderError::RateLimited(format!(
        "{} after {} retries",
        provider, settings.max_retries
    )))
}

/// Turn a non-success status into a `ProviderError`, consuming the body for context.
pub(crate) async fn error_for_status(response: Response, subject: &str) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(subject.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(body),
        _ => ProviderError::Api(format!("HTTP {}: {}", status, truncate(&body, 300))),
    }
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
    settings: &HttpSettings,
) -> Result<T, ProviderError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_reqwest_error(e, settings))?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
