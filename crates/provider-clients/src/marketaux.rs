use async_trait::async_trait;
use chrono::{DateTime, Utc};
use maven_core::{NewsArticle, NewsProvider, ProviderError};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{error_for_status, read_json, send_with_retry, HttpSettings};

const BASE_URL: &str = "https://api.marketaux.com";

/// MarketAux news search
#[derive(Clone)]
pub struct MarketAuxClient {
    api_token: String,
    client: Client,
    base_url: String,
    settings: HttpSettings,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    data: Option<Vec<NewsResult>>,
    error: Option<NewsError>,
}

#[derive(Debug, Deserialize)]
struct NewsError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    title: String,
    published_at: String,
    url: String,
    description: Option<String>,
}

impl MarketAuxClient {
    pub fn new(api_token: String, settings: HttpSettings) -> Self {
        Self::with_base_url(api_token, BASE_URL, settings)
    }

    pub fn with_base_url(api_token: String, base_url: impl Into<String>, settings: HttpSettings) -> Self {
        Self {
            api_token,
            client: settings.build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        }
    }
}

#[async_trait]
impl NewsProvider for MarketAuxClient {
    async fn search_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
        let url = format!("{}/v1/news/all", self.base_url);

        let response = send_with_retry(
            &self.client,
            self.client.get(&url).query(&[
                ("api_token", self.api_token.clone()),
                ("symbols", symbol.to_string()),
                ("limit", limit.to_string()),
            ]),
            &self.settings,
            "MarketAux",
        )
        .await?;

        if !response.status().is_success() {
            return Err(error_for_status(response, symbol).await);
        }

        let news: NewsResponse = read_json(response, &self.settings).await?;
        if let Some(err) = news.error {
            return Err(ProviderError::Api(format!(
                "MarketAux {}: {}",
                err.code.unwrap_or_default(),
                err.message.unwrap_or_default()
            )));
        }

        // MarketAux omits `data` when nothing matched
        let data = news.data.unwrap_or_default();

        Ok(data
            .into_iter()
            .filter_map(|r| {
                let published_at = match DateTime::parse_from_rfc3339(&r.published_at) {
                    Ok(dt) => dt.with_timezone(&Utc),
                    Err(e) => {
                        tracing::warn!(
                            "Skipping MarketAux article '{}' with bad published_at '{}': {}",
                            r.title,
                            r.published_at,
                            e
                        );
                        return None;
                    }
                };
                Some(NewsArticle {
                    title: r.title,
                    published_at,
                    url: r.url,
                    description: r.description.filter(|d| !d.trim().is_empty()),
                })
            })
            .take(limit)
            .collect())
    }
}
