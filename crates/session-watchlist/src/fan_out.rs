//! Order-preserving quote fan-out.
//!
//! One task per symbol, bounded by a semaphore. Result slots are allocated by
//! index before any task is spawned, so completion order never affects output
//! order and a failed lookup only ever touches its own slot.

use std::sync::Arc;
use std::time::Duration;

use maven_core::{MarketDataProvider, ProviderError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::{QuoteStatus, WatchlistRow};

/// Max concurrent quote lookups
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Per-lookup deadline
pub const DEFAULT_PER_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FanOutOptions {
    pub concurrency: usize,
    pub per_call_timeout: Duration,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            per_call_timeout: DEFAULT_PER_CALL_TIMEOUT,
        }
    }
}

/// Look up a quote for each symbol. Returns exactly one row per input symbol,
/// in input order.
pub async fn fetch_quotes(
    symbols: Vec<String>,
    provider: Arc<dyn MarketDataProvider>,
    options: &FanOutOptions,
) -> Vec<WatchlistRow> {
    if symbols.is_empty() {
        return Vec::new();
    }

    let mut slots: Vec<Option<QuoteStatus>> = vec![None; symbols.len()];
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (idx, symbol) in symbols.iter().cloned().enumerate() {
        let provider = Arc::clone(&provider);
        let semaphore = Arc::clone(&semaphore);
        let deadline = options.per_call_timeout;
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let status = lookup(provider.as_ref(), &symbol, deadline).await;
            (idx, status)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, status)) => slots[idx] = Some(status),
            Err(e) => tracing::error!("Quote lookup task failed: {}", e),
        }
    }

    let failed = slots
        .iter()
        .filter(|s| !matches!(s, Some(QuoteStatus::Ok { .. })))
        .count();
    tracing::debug!("Watchlist quotes: {}/{} ok", symbols.len() - failed, symbols.len());

    symbols
        .into_iter()
        .zip(slots)
        .map(|(symbol, slot)| WatchlistRow {
            symbol,
            quote: slot.unwrap_or_else(|| QuoteStatus::error("Quote lookup aborted")),
        })
        .collect()
}

async fn lookup(provider: &dyn MarketDataProvider, symbol: &str, deadline: Duration) -> QuoteStatus {
    match tokio::time::timeout(deadline, provider.get_latest_quote(symbol)).await {
        Ok(Ok(quote)) => QuoteStatus::Ok { quote },
        Ok(Err(ProviderError::NotFound(_))) => {
            QuoteStatus::error(format!("No quote data found for {}", symbol))
        }
        Ok(Err(e)) => {
            tracing::warn!("Quote lookup for {} failed: {}", symbol, e);
            QuoteStatus::error(e.to_string())
        }
        Err(_) => {
            tracing::warn!("Quote lookup for {} timed out", symbol);
            QuoteStatus::error(ProviderError::Timeout(deadline.as_secs()).to_string())
        }
    }
}
