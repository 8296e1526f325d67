use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::Session;
use crate::{ApiResponse, AppError, AppState};

#[derive(Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub watchlist_size: usize,
    pub chat_turns: usize,
}

#[derive(Serialize)]
pub struct SessionEnded {
    pub id: String,
    pub ended: bool,
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/session", get(get_session).delete(end_session))
}

async fn get_session(
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    let context = session.context.lock().await;
    Ok(Json(ApiResponse::success(SessionInfo {
        id: context.id.clone(),
        created_at: context.created_at,
        watchlist_size: context.watchlist.len(),
        chat_turns: context.chat_history.len(),
    })))
}

/// Drop the session with its watchlist and chat history.
async fn end_session(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<SessionEnded>>, AppError> {
    let ended = state.sessions.end(&session.id);
    Ok(Json(ApiResponse::success(SessionEnded {
        id: session.id,
        ended,
    })))
}
