use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One closing price on a trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePrice {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered daily closing prices for one symbol.
///
/// Uses the adjusted close when the provider reports one. Entries are in
/// ascending date order and every close is finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<ClosePrice>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<ClosePrice>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    /// Build a series from bare prices, one calendar day apart starting at `start`.
    pub fn from_closes(symbol: impl Into<String>, start: NaiveDate, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .zip(start.iter_days())
            .map(|(&close, date)| ClosePrice { date, close })
            .collect();
        Self::new(symbol, points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}

/// A closing price together with its change from the previous close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    /// Fractional change from the previous close (0.02 = +2%)
    pub pct_change: f64,
}

/// Latest quote snapshot for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub last: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub as_of: DateTime<Utc>,
}

/// News article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub description: Option<String>,
}

/// One row of a financial statement: a line item and its value per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub item: String,
    pub values: Vec<Option<String>>,
}

/// A financial statement laid out with fiscal periods as columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    /// Fiscal date ending of each column, most recent first
    pub periods: Vec<String>,
    pub lines: Vec<StatementLine>,
}

impl StatementTable {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Look up a line item's value for the given period column
    pub fn value(&self, item: &str, period: &str) -> Option<&str> {
        let col = self.periods.iter().position(|p| p == period)?;
        self.lines
            .iter()
            .find(|l| l.item == item)
            .and_then(|l| l.values.get(col))
            .and_then(|v| v.as_deref())
    }
}

/// Annual fundamental statements for a company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub symbol: String,
    pub balance_sheet: StatementTable,
    pub income_statement: StatementTable,
    pub cash_flow: StatementTable,
}

/// Who authored a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}
