use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use maven_core::{ClosePrice, MarketDataProvider, PriceSeries, ProviderError, Quote};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::http::{error_for_status, read_json, send_with_retry, HttpSettings};

const BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance chart API: daily history and latest quotes. No key required.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    settings: HttpSettings,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
    #[serde(default)]
    adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn column(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

impl ChartResult {
    fn quotes(&self) -> Option<&QuoteColumns> {
        self.indicators.quote.first()
    }

    /// Exchange-local trading date of bar `i`
    fn date_at(&self, i: usize) -> Option<NaiveDate> {
        let ts = *self.timestamp.get(i)?;
        DateTime::from_timestamp(ts + self.meta.gmtoffset, 0).map(|dt| dt.date_naive())
    }

    /// Closing prices, adjusted when the chart carries an adjclose column.
    fn closes(&self) -> Vec<ClosePrice> {
        let raw = self.quotes().map(|q| q.close.as_slice()).unwrap_or(&[]);
        let adjusted = self
            .indicators
            .adjclose
            .first()
            .map(|a| a.adjclose.as_slice())
            .filter(|a| !a.is_empty());
        let source = adjusted.unwrap_or(raw);

        (0..self.timestamp.len())
            .filter_map(|i| {
                Some(ClosePrice {
                    date: self.date_at(i)?,
                    close: column(source, i)?,
                })
            })
            .collect()
    }
}

impl YahooFinanceClient {
    pub fn new(settings: HttpSettings) -> Self {
        Self::with_base_url(BASE_URL, settings)
    }

    pub fn with_base_url(base_url: impl Into<String>, settings: HttpSettings) -> Self {
        Self {
            client: settings.build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        }
    }

    /// Chart endpoint for `symbol`. The symbol is one percent-encoded path
    /// segment, so `/`, `?` or `#` in it cannot address another resource.
    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Http(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Http(format!("Base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(symbol);
        Ok(url)
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        query: &[(&str, String)],
    ) -> Result<Option<ChartResult>, ProviderError> {
        let url = self.chart_url(symbol)?;
        let response = send_with_retry(
            &self.client,
            self.client.get(url).query(query),
            &self.settings,
            "Yahoo Finance",
        )
        .await?;

        // Yahoo reports unknown symbols as 404 with a JSON error body
        if !response.status().is_success() && response.status().as_u16() != 404 {
            return Err(error_for_status(response, symbol).await);
        }

        let envelope: ChartEnvelope = read_json(response, &self.settings).await?;
        if let Some(err) = envelope.chart.error {
            if err.code.eq_ignore_ascii_case("Not Found") {
                return Ok(None);
            }
            return Err(ProviderError::Api(format!(
                "{}: {}",
                err.code,
                err.description.unwrap_or_default()
            )));
        }

        Ok(envelope.chart.result.and_then(|r| r.into_iter().next()))
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new(HttpSettings::default())
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        // Bars are stamped at the exchange's local open; east of UTC that falls
        // on the previous UTC day, so ask from a day early and filter below
        let period1 = start
            .checked_sub_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc().timestamp());
        // period2 is exclusive; extend by a day so `end` is included
        let period2 = end
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc().timestamp());
        let (Some(period1), Some(period2)) = (period1, period2) else {
            return Err(ProviderError::Api(format!("Unrepresentable date range {}..{}", start, end)));
        };

        tracing::debug!("Fetching {} history {}..{}", symbol, start, end);
        let chart = self
            .fetch_chart(
                symbol,
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                    ("events", "history".to_string()),
                ],
            )
            .await?;

        let points = match chart {
            Some(chart) => chart
                .closes()
                .into_iter()
                .filter(|p| p.date >= start && p.date <= end)
                .collect(),
            None => Vec::new(),
        };

        Ok(PriceSeries::new(symbol, points))
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let chart = self
            .fetch_chart(
                symbol,
                &[("range", "5d".to_string()), ("interval", "1d".to_string())],
            )
            .await?
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

        let cols = chart
            .quotes()
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

        // Latest bar with a close
        let idx = (0..chart.timestamp.len())
            .rev()
            .find(|&i| column(&cols.close, i).is_some())
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

        let close = column(&cols.close, idx).unwrap_or_default();
        let as_of_ts = chart
            .meta
            .regular_market_time
            .unwrap_or(chart.timestamp[idx]);

        Ok(Quote {
            symbol: symbol.to_string(),
            last: chart.meta.regular_market_price.unwrap_or(close),
            open: column(&cols.open, idx).unwrap_or(close),
            high: column(&cols.high, idx).unwrap_or(close),
            low: column(&cols.low, idx).unwrap_or(close),
            close,
            volume: cols.volume.get(idx).copied().flatten().unwrap_or(0),
            as_of: DateTime::from_timestamp(as_of_ts, 0).unwrap_or_else(Utc::now),
        })
    }
}
