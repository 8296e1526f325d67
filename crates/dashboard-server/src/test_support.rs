//! Stub providers and request helpers shared by the route tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use chrono::{NaiveDate, Utc};
use maven_core::{
    ChatTurn, ConversationalAssistant, FinancialStatements, FundamentalsProvider, MarketDataProvider,
    NewsArticle, NewsProvider, PriceSeries, ProviderError, Quote, StatementLine, StatementTable,
    VisionAssistant,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::session::SESSION_HEADER;
use crate::{build_router, AppState};

pub struct StubMarket {
    closes: Vec<f64>,
    fail: bool,
    history_calls: AtomicUsize,
}

impl StubMarket {
    pub fn with_closes(closes: &[f64]) -> Self {
        Self {
            closes: closes.to_vec(),
            fail: false,
            history_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            closes: Vec::new(),
            fail: true,
            history_calls: AtomicUsize::new(0),
        }
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for StubMarket {
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Http("connection refused".to_string()));
        }
        Ok(PriceSeries::from_closes(symbol, start, &self.closes))
    }

    /// Symbols starting with `X` have no quote
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        if self.fail || symbol.starts_with('X') {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        Ok(Quote {
            symbol: symbol.to_string(),
            last: 101.5,
            open: 100.0,
            high: 102.0,
            low: 99.5,
            close: 101.0,
            volume: 1_000_000,
            as_of: Utc::now(),
        })
    }
}

pub struct StubFundamentals;

#[async_trait]
impl FundamentalsProvider for StubFundamentals {
    async fn get_annual_statements(&self, symbol: &str) -> Result<FinancialStatements, ProviderError> {
        let table = StatementTable {
            periods: vec!["2023-12-31".to_string()],
            lines: vec![StatementLine {
                item: "totalAssets".to_string(),
                values: vec![Some("1000".to_string())],
            }],
        };
        Ok(FinancialStatements {
            symbol: symbol.to_string(),
            balance_sheet: table.clone(),
            income_statement: table.clone(),
            cash_flow: table,
        })
    }
}

pub struct StubNews {
    count: usize,
}

impl StubNews {
    pub fn with_articles(count: usize) -> Self {
        Self { count }
    }
}

#[async_trait]
impl NewsProvider for StubNews {
    async fn search_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
        Ok((0..self.count.min(limit))
            .map(|i| NewsArticle {
                title: format!("{} headline {}", symbol, i),
                published_at: Utc::now(),
                url: format!("https://news.example/{}", i),
                description: None,
            })
            .collect())
    }
}

/// Echoing assistant that records what it was sent
#[derive(Default)]
pub struct StubAssistant {
    pub fail: bool,
    pub seen_history_len: Mutex<Vec<usize>>,
    pub seen_image: Mutex<Option<(usize, String, String)>>,
}

impl StubAssistant {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ConversationalAssistant for StubAssistant {
    async fn send_message(&self, history: &[ChatTurn], text: &str) -> Result<String, ProviderError> {
        if let Ok(mut seen) = self.seen_history_len.lock() {
            seen.push(history.len());
        }
        if self.fail {
            return Err(ProviderError::Api("model unavailable".to_string()));
        }
        Ok(format!("echo: {}", text))
    }
}

#[async_trait]
impl VisionAssistant for StubAssistant {
    async fn analyze(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String, ProviderError> {
        if let Ok(mut seen) = self.seen_image.lock() {
            *seen = Some((image.len(), mime_type.to_string(), prompt.to_string()));
        }
        if self.fail {
            return Err(ProviderError::Api("model unavailable".to_string()));
        }
        Ok("A candlestick chart.".to_string())
    }
}

pub fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, session, Body::empty(), None)
}

pub fn delete(uri: &str, session: Option<&str>) -> Request<Body> {
    request(Method::DELETE, uri, session, Body::empty(), None)
}

pub fn post_json(uri: &str, session: Option<&str>, json: Value) -> Request<Body> {
    request(
        Method::POST,
        uri,
        session,
        Body::from(json.to_string()),
        Some("application/json"),
    )
}

pub fn request(
    method: Method,
    uri: &str,
    session: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder.body(body).unwrap()
}

/// Run one request; returns status, echoed session id and JSON body.
pub async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = build_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let session = response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, session, body)
}
