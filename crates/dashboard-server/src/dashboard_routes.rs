//! Stock Dashboard Routes
//!
//! One request renders the whole page: price chart, pricing table with
//! return/risk statistics, annual fundamentals and recent news. Each part is
//! an independent `Section`.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use maven_core::{
    normalize_symbol, DateRange, FinancialStatements, NewsArticle, PriceSeries, ProviderError,
};
use return_stats::{summarize, PricingSummary, StatsError};
use serde::{Deserialize, Serialize};

use crate::section::{missing_key, Section};
use crate::{ApiResponse, AppError, AppState};

pub const NO_CHART_DATA: &str = "No data found. Please check the ticker symbol and date range.";
pub const NO_PRICING_DATA: &str = "No pricing data available.";
pub const NO_NEWS: &str = "No news found.";

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub symbol: String,
    pub range: DateRange,
    pub chart: Section<PriceSeries>,
    pub pricing: Section<PricingSummary>,
    pub fundamentals: Section<FinancialStatements>,
    pub news: Section<Vec<NewsArticle>>,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard/:symbol", get(get_dashboard))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    // Input is checked before any provider is contacted
    let symbol = normalize_symbol(&symbol).map_err(AppError::bad_request)?;
    let range = DateRange::parse(query.start.as_deref(), query.end.as_deref())
        .map_err(AppError::bad_request)?;

    tracing::info!("Dashboard for {} ({} to {})", symbol, range.start, range.end);

    let (history, fundamentals, news) = tokio::join!(
        state.market.get_history(&symbol, range.start, range.end),
        fundamentals_section(&state, &symbol),
        news_section(&state, &symbol),
    );

    let (chart, pricing) = match history {
        Ok(series) => {
            let pricing = pricing_section(&series, &state);
            (chart_section(series), pricing)
        }
        Err(e) => {
            tracing::warn!("Price history for {} failed: {}", symbol, e);
            let message = format!("Error fetching stock data: {}", e);
            (Section::error(message.clone()), Section::error(message))
        }
    };

    Ok(Json(ApiResponse::success(DashboardResponse {
        symbol,
        range,
        chart,
        pricing,
        fundamentals,
        news,
    })))
}

fn chart_section(series: PriceSeries) -> Section<PriceSeries> {
    if series.is_empty() {
        Section::warning(NO_CHART_DATA)
    } else {
        Section::ready(series)
    }
}

fn pricing_section(series: &PriceSeries, state: &AppState) -> Section<PricingSummary> {
    match summarize(series, state.zero_volatility) {
        Ok(summary) => Section::ready(summary),
        Err(StatsError::InsufficientData { needed, got }) => {
            tracing::debug!("{}: {} prices, need {}", series.symbol, got, needed);
            Section::warning(NO_PRICING_DATA)
        }
        Err(e) => Section::error(e.to_string()),
    }
}

async fn fundamentals_section(state: &AppState, symbol: &str) -> Section<FinancialStatements> {
    let Some(provider) = &state.fundamentals else {
        return Section::warning(missing_key("Alpha Vantage", "ALPHA_VANTAGE_API_KEY"));
    };

    match provider.get_annual_statements(symbol).await {
        Ok(statements) => Section::ready(statements),
        Err(ProviderError::RateLimited(msg)) => {
            tracing::warn!("Alpha Vantage rate limited: {}", msg);
            Section::warning(format!("Alpha Vantage rate limit reached: {}", msg))
        }
        Err(e) => {
            tracing::warn!("Fundamentals for {} failed: {}", symbol, e);
            Section::error(format!("Error fetching fundamental data: {}", e))
        }
    }
}

async fn news_section(state: &AppState, symbol: &str) -> Section<Vec<NewsArticle>> {
    let Some(provider) = &state.news else {
        return Section::warning(missing_key("MarketAux", "MARKETAUX_API_KEY"));
    };

    match provider.search_news(symbol, state.news_limit).await {
        Ok(articles) if articles.is_empty() => Section::warning(NO_NEWS),
        Ok(articles) => Section::ready(articles),
        Err(e) => {
            tracing::warn!("News for {} failed: {}", symbol, e);
            Section::error(format!("Error fetching news: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::*;
    use crate::AppState;

    fn full_state(market: Arc<StubMarket>) -> AppState {
        let mut state = AppState::new(market);
        state.fundamentals = Some(Arc::new(StubFundamentals));
        state.news = Some(Arc::new(StubNews::with_articles(3)));
        state
    }

    #[tokio::test]
    async fn test_dashboard_renders_all_sections() {
        let market = Arc::new(StubMarket::with_closes(&[100.0, 102.0, 101.0, 104.0]));
        let (status, _, body) = send(full_state(market), get("/api/dashboard/aapl?start=2024-01-01&end=2024-01-31", None)).await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["symbol"], "AAPL");
        assert_eq!(data["chart"]["status"], "ready");
        assert_eq!(data["chart"]["data"]["points"].as_array().unwrap().len(), 4);

        assert_eq!(data["pricing"]["status"], "ready");
        let annual_return = data["pricing"]["data"]["stats"]["annual_return"].as_f64().unwrap();
        assert!((annual_return - 335.15).abs() < 0.01);
        assert_eq!(data["pricing"]["data"]["points"].as_array().unwrap().len(), 3);

        assert_eq!(data["fundamentals"]["status"], "ready");
        assert_eq!(data["news"]["status"], "ready");
        assert_eq!(data["news"]["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_date_makes_no_provider_call() {
        let market = Arc::new(StubMarket::with_closes(&[100.0, 101.0]));
        let state = full_state(market.clone());

        let (status, _, body) = send(state, get("/api/dashboard/AAPL?start=2024-01-01", None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing end date");
        assert_eq!(market.history_calls(), 0);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let market = Arc::new(StubMarket::with_closes(&[100.0, 101.0]));
        let (status, _, _) = send(
            full_state(market.clone()),
            get("/api/dashboard/AAPL?start=2024-02-01&end=2024-01-01", None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(market.history_calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_symbol_is_rejected() {
        let market = Arc::new(StubMarket::with_closes(&[100.0, 101.0]));
        let (status, _, _) = send(
            full_state(market.clone()),
            get("/api/dashboard/%20?start=2024-01-01&end=2024-01-31", None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(market.history_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_keys_warn_without_blocking_other_sections() {
        let market = Arc::new(StubMarket::with_closes(&[100.0, 102.0]));
        let state = AppState::new(market);

        let (status, _, body) = send(state, get("/api/dashboard/MSFT?start=2024-01-01&end=2024-01-31", None)).await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["chart"]["status"], "ready");
        assert_eq!(data["pricing"]["status"], "ready");
        assert_eq!(data["fundamentals"]["status"], "warning");
        assert_eq!(
            data["fundamentals"]["message"],
            "Alpha Vantage API key is missing. Set ALPHA_VANTAGE_API_KEY in environment variables."
        );
        assert_eq!(data["news"]["status"], "warning");
        assert_eq!(
            data["news"]["message"],
            "MarketAux API key is missing. Set MARKETAUX_API_KEY in environment variables."
        );
    }

    #[tokio::test]
    async fn test_empty_history_warns() {
        let market = Arc::new(StubMarket::with_closes(&[]));
        let (_, _, body) = send(
            full_state(market),
            get("/api/dashboard/ZZZZ?start=2024-01-01&end=2024-01-31", None),
        )
        .await;

        let data = &body["data"];
        assert_eq!(data["chart"]["status"], "warning");
        assert_eq!(data["chart"]["message"], super::NO_CHART_DATA);
        assert_eq!(data["pricing"]["message"], super::NO_PRICING_DATA);
    }

    #[tokio::test]
    async fn test_single_price_has_chart_but_no_pricing() {
        let market = Arc::new(StubMarket::with_closes(&[100.0]));
        let (_, _, body) = send(
            full_state(market),
            get("/api/dashboard/AAPL?start=2024-01-02&end=2024-01-02", None),
        )
        .await;

        assert_eq!(body["data"]["chart"]["status"], "ready");
        assert_eq!(body["data"]["pricing"]["status"], "warning");
    }

    #[tokio::test]
    async fn test_history_failure_is_error_section() {
        let market = Arc::new(StubMarket::failing());
        let (status, _, body) = send(
            full_state(market),
            get("/api/dashboard/AAPL?start=2024-01-01&end=2024-01-31", None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["chart"]["status"], "error");
        assert_eq!(body["data"]["news"]["status"], "ready");
    }

    #[tokio::test]
    async fn test_no_news_warns() {
        let market = Arc::new(StubMarket::with_closes(&[100.0, 101.0]));
        let mut state = full_state(market);
        state.news = Some(Arc::new(StubNews::with_articles(0)));

        let (_, _, body) = send(state, get("/api/dashboard/AAPL?start=2024-01-01&end=2024-01-31", None)).await;
        assert_eq!(
            body["data"]["news"],
            json!({ "status": "warning", "message": "No news found." })
        );
    }
}
