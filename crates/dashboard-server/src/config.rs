use std::env;
use std::str::FromStr;
use std::time::Duration;

use return_stats::ZeroVolatilityPolicy;
use session_watchlist::fan_out::DEFAULT_CONCURRENCY;

#[derive(Debug, Clone)]
pub struct Config {
    // Credentials. A missing key degrades its dashboard section or bot.
    pub alpha_vantage_api_key: Option<String>,
    pub marketaux_api_key: Option<String>,
    pub google_api_key: Option<String>,

    pub gemini_model: String,
    pub bind_addr: String,
    pub provider_timeout: Duration,
    pub watchlist_concurrency: usize,
    pub news_limit: usize,
    pub zero_volatility: ZeroVolatilityPolicy,
    /// Sessions idle this long are dropped with their watchlist and chat
    pub session_idle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            marketaux_api_key: None,
            google_api_key: None,
            gemini_model: provider_clients::gemini::DEFAULT_MODEL.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            provider_timeout: Duration::from_secs(15),
            watchlist_concurrency: DEFAULT_CONCURRENCY,
            news_limit: 10,
            zero_volatility: ZeroVolatilityPolicy::Zero,
            session_idle: Duration::from_secs(3600),
        }
    }
}

impl Config {
    /// Read configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secret = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let zero_volatility = match lookup("ZERO_VOL_RATIO") {
            Some(raw) => ZeroVolatilityPolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("Invalid ZERO_VOL_RATIO '{}', using zero", raw);
                defaults.zero_volatility
            }),
            None => defaults.zero_volatility,
        };

        let watchlist_concurrency: usize =
            parse_or(&lookup, "WATCHLIST_CONCURRENCY", defaults.watchlist_concurrency);

        Self {
            alpha_vantage_api_key: secret("ALPHA_VANTAGE_API_KEY"),
            marketaux_api_key: secret("MARKETAUX_API_KEY"),
            google_api_key: secret("GOOGLE_API_KEY"),
            gemini_model: lookup("GEMINI_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.gemini_model),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            provider_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )),
            // A zero-permit semaphore would never make progress
            watchlist_concurrency: watchlist_concurrency.max(1),
            news_limit: parse_or(&lookup, "NEWS_LIMIT", defaults.news_limit),
            zero_volatility,
            session_idle: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_IDLE_SECS",
                defaults.session_idle.as_secs(),
            )),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} '{}', falling back to {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert!(config.alpha_vantage_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.provider_timeout, Duration::from_secs(15));
        assert_eq!(config.watchlist_concurrency, 8);
        assert_eq!(config.news_limit, 10);
        assert_eq!(config.zero_volatility, ZeroVolatilityPolicy::Zero);
        assert_eq!(config.session_idle, Duration::from_secs(3600));
    }

    #[test]
    fn test_reads_values() {
        let config = config_from(&[
            ("ALPHA_VANTAGE_API_KEY", "av"),
            ("GOOGLE_API_KEY", "  g  "),
            ("NEWS_LIMIT", "5"),
            ("PROVIDER_TIMEOUT_SECS", "30"),
            ("ZERO_VOL_RATIO", "nan"),
            ("SESSION_IDLE_SECS", "900"),
        ]);
        assert_eq!(config.alpha_vantage_api_key.as_deref(), Some("av"));
        assert_eq!(config.google_api_key.as_deref(), Some("g"));
        assert_eq!(config.news_limit, 5);
        assert_eq!(config.provider_timeout, Duration::from_secs(30));
        assert_eq!(config.zero_volatility, ZeroVolatilityPolicy::Undefined);
        assert_eq!(config.session_idle, Duration::from_secs(900));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config_from(&[("MARKETAUX_API_KEY", "")]);
        assert!(config.marketaux_api_key.is_none());
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config_from(&[
            ("NEWS_LIMIT", "ten"),
            ("WATCHLIST_CONCURRENCY", "0"),
            ("SESSION_IDLE_SECS", "-5"),
        ]);
        assert_eq!(config.news_limit, 10);
        assert_eq!(config.session_idle, Duration::from_secs(3600));
        assert_eq!(config.watchlist_concurrency, 1);
    }
}
