use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{ChatTurn, FinancialStatements, NewsArticle, PriceSeries, ProviderError, Quote};

/// Source of historical prices and live quotes
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily closes for `symbol` between `start` and `end` inclusive. May be empty.
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError>;

    /// Latest quote, or `ProviderError::NotFound` if the provider has none.
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, ProviderError>;
}

/// Source of annual financial statements
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn get_annual_statements(&self, symbol: &str) -> Result<FinancialStatements, ProviderError>;
}

/// Source of news headlines
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn search_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError>;
}

/// Conversational language model. The caller owns the session history.
#[async_trait]
pub trait ConversationalAssistant: Send + Sync {
    async fn send_message(&self, history: &[ChatTurn], text: &str) -> Result<String, ProviderError>;
}

/// Image understanding model
#[async_trait]
pub trait VisionAssistant: Send + Sync {
    async fn analyze(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, ProviderError>;
}
