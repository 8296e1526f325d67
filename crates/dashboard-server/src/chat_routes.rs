//! ChatBot Routes
//!
//! A running conversation with the assistant, kept per session.

use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use maven_core::{ChatTurn, ValidationError};
use serde::{Deserialize, Serialize};

use crate::section::{missing_key, Section};
use crate::session::Session;
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub turns: usize,
}

#[derive(Serialize)]
pub struct ClearedHistory {
    pub cleared: usize,
}

pub fn chat_routes() -> Router<AppState> {
    Router::new().route(
        "/api/chat",
        get(get_history).post(send_message).delete(clear_history),
    )
}

async fn send_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<Section<ChatReply>>>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::bad_request(ValidationError::Other(
            "Message must not be empty".to_string(),
        )));
    }

    let Some(assistant) = &state.chat else {
        return Ok(Json(ApiResponse::success(Section::warning(missing_key(
            "Google",
            "GOOGLE_API_KEY",
        )))));
    };

    // Held across the call so a session's messages stay in order
    let mut context = session.context.lock().await;

    let result = assistant.send_message(&context.chat_history, message).await;
    let section = match result {
        Ok(reply) => {
            context.chat_history.push(ChatTurn::user(message));
            context.chat_history.push(ChatTurn::model(reply.clone()));
            Section::ready(ChatReply {
                reply,
                turns: context.chat_history.len(),
            })
        }
        Err(e) => {
            tracing::warn!("Chat failed for session {}: {}", session.id, e);
            Section::error(format!("Error from assistant: {}", e))
        }
    };

    Ok(Json(ApiResponse::success(section)))
}

async fn get_history(
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<ChatTurn>>>, AppError> {
    let context = session.context.lock().await;
    Ok(Json(ApiResponse::success(context.chat_history.clone())))
}

async fn clear_history(
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<ClearedHistory>>, AppError> {
    let mut context = session.context.lock().await;
    let cleared = context.chat_history.len();
    context.chat_history.clear();
    Ok(Json(ApiResponse::success(ClearedHistory { cleared })))
}
