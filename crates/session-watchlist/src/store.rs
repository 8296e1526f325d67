//! Watchlist Store

use std::sync::Arc;

use maven_core::{normalize_symbol, MarketDataProvider, ValidationError};
use serde::Serialize;

use crate::fan_out::{fetch_quotes, FanOutOptions};
use crate::models::{AddOutcome, RemoveOutcome, WatchlistRow};

/// Ordered set of upper-cased ticker symbols.
///
/// Insertion order is preserved and no symbol appears twice. Symbols are not
/// checked against any exchange; an unknown ticker simply fails its quote
/// lookup later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: &str) -> Result<AddOutcome, ValidationError> {
        let symbol = normalize_symbol(symbol)?;
        if self.symbols.contains(&symbol) {
            tracing::debug!("{} already on watchlist", symbol);
            return Ok(AddOutcome::Duplicate);
        }
        self.symbols.push(symbol);
        Ok(AddOutcome::Added)
    }

    pub fn remove(&mut self, symbol: &str) -> Result<RemoveOutcome, ValidationError> {
        let symbol = normalize_symbol(symbol)?;
        match self.symbols.iter().position(|s| *s == symbol) {
            Some(idx) => {
                // `remove`, not `swap_remove`: order must survive
                self.symbols.remove(idx);
                Ok(RemoveOutcome::Removed)
            }
            None => Ok(RemoveOutcome::NotFound),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        normalize_symbol(symbol)
            .map(|s| self.symbols.contains(&s))
            .unwrap_or(false)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Fetch a quote for every tracked symbol, in insertion order.
    ///
    /// Always returns one row per symbol; failed lookups carry an error marker.
    pub async fn list_with_quotes(
        &self,
        provider: Arc<dyn MarketDataProvider>,
        options: &FanOutOptions,
    ) -> Vec<WatchlistRow> {
        fetch_quotes(self.symbols.clone(), provider, options).await
    }
}
