//! HTTP clients for the dashboard's external collaborators.
//!
//! Each client implements one or more `maven_core` provider traits and parses
//! the upstream payload into the narrow typed structs defined there.

pub mod alpha_vantage;
pub mod gemini;
pub mod http;
pub mod marketaux;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use gemini::GeminiClient;
pub use http::HttpSettings;
pub use marketaux::MarketAuxClient;
pub use yahoo::YahooFinanceClient;
