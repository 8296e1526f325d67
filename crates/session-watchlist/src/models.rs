//! Watchlist Data Models

use maven_core::Quote;
use serde::{Deserialize, Serialize};

/// Result of adding a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    /// Already tracked; the watchlist is unchanged
    Duplicate,
}

/// Result of removing a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveOutcome {
    Removed,
    /// Not tracked; the watchlist is unchanged
    NotFound,
}

/// Quote attached to a watchlist row, or why there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteStatus {
    Ok { quote: Quote },
    Error { message: String },
}

impl QuoteStatus {
    pub fn error(message: impl Into<String>) -> Self {
        QuoteStatus::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, QuoteStatus::Ok { .. })
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteStatus::Ok { quote } => Some(quote),
            QuoteStatus::Error { .. } => None,
        }
    }
}

/// One symbol of the watchlist listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistRow {
    pub symbol: String,
    #[serde(flatten)]
    pub quote: QuoteStatus,
}
