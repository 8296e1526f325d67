//! Watchlist API Routes
//!
//! The session's tracked symbols, each listed with a fresh quote.

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use maven_core::normalize_symbol;
use serde::{Deserialize, Serialize};
use session_watchlist::{AddOutcome, RemoveOutcome, WatchlistRow};

use crate::session::Session;
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct AddSymbolRequest {
    pub symbol: String,
}

/// Result of an add or remove
#[derive(Serialize)]
pub struct MembershipResponse<O> {
    pub symbol: String,
    pub outcome: O,
    pub size: usize,
}

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/api/watchlist", get(list_watchlist).post(add_symbol))
        .route("/api/watchlist/:symbol", delete(remove_symbol))
}

async fn list_watchlist(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<WatchlistRow>>>, AppError> {
    let context = session.context.lock().await;
    let rows = context
        .watchlist
        .list_with_quotes(state.market.clone(), &state.fan_out)
        .await;

    let failed = rows.iter().filter(|r| !r.quote.is_ok()).count();
    if failed > 0 {
        tracing::warn!("{} of {} watchlist quotes unavailable", failed, rows.len());
    }

    Ok(Json(ApiResponse::success(rows)))
}

async fn add_symbol(
    Extension(session): Extension<Session>,
    Json(req): Json<AddSymbolRequest>,
) -> Result<Json<ApiResponse<MembershipResponse<AddOutcome>>>, AppError> {
    let symbol = normalize_symbol(&req.symbol).map_err(AppError::bad_request)?;

    let mut context = session.context.lock().await;
    let outcome = context.watchlist.add(&symbol).map_err(AppError::bad_request)?;
    tracing::info!("Watchlist add {}: {:?}", symbol, outcome);

    Ok(Json(ApiResponse::success(MembershipResponse {
        symbol,
        outcome,
        size: context.watchlist.len(),
    })))
}

async fn remove_symbol(
    Extension(session): Extension<Session>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<MembershipResponse<RemoveOutcome>>>, AppError> {
    let symbol = normalize_symbol(&symbol).map_err(AppError::bad_request)?;

    let mut context = session.context.lock().await;
    let outcome = context.watchlist.remove(&symbol).map_err(AppError::bad_request)?;
    tracing::info!("Watchlist remove {}: {:?}", symbol, outcome);

    Ok(Json(ApiResponse::success(MembershipResponse {
        symbol,
        outcome,
        size: context.watchlist.len(),
    })))
}
