//! Session Watchlist
//!
//! An ordered set of ticker symbols kept for one user session, and the
//! fan-out that attaches a fresh quote to every tracked symbol.

pub mod fan_out;
pub mod models;
pub mod store;

pub use fan_out::{fetch_quotes, FanOutOptions};
pub use models::{AddOutcome, QuoteStatus, RemoveOutcome, WatchlistRow};
pub use store::Watchlist;
