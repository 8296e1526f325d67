//! Money Maven HTTP server.
//!
//! Serves the three views (stock dashboard, chat bot, vision bot) over a JSON
//! API. Per-user state lives in a `SessionContext` keyed by `x-session-id`.

use std::sync::Arc;

use axum::{
    http::{HeaderName, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use maven_core::{
    ConversationalAssistant, FundamentalsProvider, MarketDataProvider, NewsProvider, VisionAssistant,
};
use provider_clients::{AlphaVantageClient, GeminiClient, HttpSettings, MarketAuxClient, YahooFinanceClient};
use return_stats::ZeroVolatilityPolicy;
use serde::Serialize;
use session_watchlist::FanOutOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod chat_routes;
pub mod config;
pub mod dashboard_routes;
pub mod section;
pub mod session;
pub mod session_routes;
pub mod views;
pub mod vision_routes;
pub mod watchlist_routes;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use section::Section;
pub use session::{Session, SessionContext, SessionStore};
pub use views::View;

/// Shared handles for every request. Optional providers are `None` when their
/// credential is not configured.
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<dyn MarketDataProvider>,
    pub fundamentals: Option<Arc<dyn FundamentalsProvider>>,
    pub news: Option<Arc<dyn NewsProvider>>,
    pub chat: Option<Arc<dyn ConversationalAssistant>>,
    pub vision: Option<Arc<dyn VisionAssistant>>,
    pub sessions: Arc<SessionStore>,
    pub fan_out: FanOutOptions,
    pub news_limit: usize,
    pub zero_volatility: ZeroVolatilityPolicy,
}

impl AppState {
    /// State with only a market data provider; everything else unconfigured.
    pub fn new(market: Arc<dyn MarketDataProvider>) -> Self {
        let defaults = Config::default();
        Self {
            market,
            fundamentals: None,
            news: None,
            chat: None,
            vision: None,
            sessions: Arc::new(SessionStore::new()),
            fan_out: FanOutOptions::default(),
            news_limit: defaults.news_limit,
            zero_volatility: defaults.zero_volatility,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let http = HttpSettings::with_timeout(config.provider_timeout);

        let mut state = Self::new(Arc::new(YahooFinanceClient::new(http.clone())));
        state.fan_out = FanOutOptions {
            concurrency: config.watchlist_concurrency,
            ..FanOutOptions::default()
        };
        state.news_limit = config.news_limit;
        state.zero_volatility = config.zero_volatility;

        match &config.alpha_vantage_api_key {
            Some(key) => {
                state.fundamentals = Some(Arc::new(AlphaVantageClient::new(key.clone(), http.clone())));
            }
            None => tracing::warn!("ALPHA_VANTAGE_API_KEY not set, fundamentals disabled"),
        }

        match &config.marketaux_api_key {
            Some(key) => {
                state.news = Some(Arc::new(MarketAuxClient::new(key.clone(), http.clone())));
            }
            None => tracing::warn!("MARKETAUX_API_KEY not set, news disabled"),
        }

        match &config.google_api_key {
            Some(key) => {
                let gemini = Arc::new(GeminiClient::new(key.clone(), config.gemini_model.clone(), http));
                tracing::info!("Gemini model: {}", gemini.model());
                state.chat = Some(gemini.clone());
                state.vision = Some(gemini);
            }
            None => tracing::warn!("GOOGLE_API_KEY not set, chat and vision bots disabled"),
        }

        state
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Handler error. Client errors echo their message; server errors are logged
/// and answered with a generic message.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(error: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!("{}", error))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        (
            self.status,
            Json(serde_json::json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(session::SESSION_HEADER)]);

    // Only routes that read or write per-session state resolve a session
    let per_session = Router::new()
        .merge(watchlist_routes::watchlist_routes())
        .merge(chat_routes::chat_routes())
        .merge(session_routes::session_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ));

    Router::new()
        .merge(views::view_routes())
        .merge(dashboard_routes::dashboard_routes())
        .merge(vision_routes::vision_routes())
        .merge(per_session)
        .route("/health", get(health))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    session_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "money_maven=info,dashboard_server=info,provider_clients=warn".into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    let state = AppState::from_config(&config);
    let sweeper = session::spawn_sweeper(state.sessions.clone(), config.session_idle);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Money Maven listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
