//! VisionBot Routes
//!
//! Upload an image (a chart, a statement screenshot) and get a description.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use maven_core::ValidationError;
use serde::{Deserialize, Serialize};

use crate::section::{missing_key, Section};
use crate::{ApiResponse, AppError, AppState};

pub const DEFAULT_PROMPT: &str = "Describe this image and any financial information it contains.";

/// Accepted uploads: png, jpg/jpeg, webp
pub const ACCEPTED_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Deserialize)]
pub struct VisionQuery {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VisionReply {
    pub description: String,
    pub mime_type: String,
    pub bytes: usize,
}

pub fn vision_routes() -> Router<AppState> {
    Router::new()
        .route("/api/vision", post(analyze_image))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}

fn image_mime_type(headers: &HeaderMap) -> Result<String, ValidationError> {
    let raw = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    // Drop parameters such as `; charset=...`
    let mime = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    let mime = if mime == "image/jpg" { "image/jpeg".to_string() } else { mime };

    if ACCEPTED_TYPES.contains(&mime.as_str()) {
        Ok(mime)
    } else {
        Err(ValidationError::Other(format!(
            "Unsupported image type '{}'. Upload png, jpg, jpeg or webp",
            raw
        )))
    }
}

async fn analyze_image(
    State(state): State<AppState>,
    Query(query): Query<VisionQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<Section<VisionReply>>>, AppError> {
    let mime_type = image_mime_type(&headers).map_err(AppError::bad_request)?;
    if body.is_empty() {
        return Err(AppError::bad_request(ValidationError::Other(
            "Image upload is empty".to_string(),
        )));
    }

    let prompt = query
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROMPT);

    let Some(assistant) = &state.vision else {
        return Ok(Json(ApiResponse::success(Section::warning(missing_key(
            "Google",
            "GOOGLE_API_KEY",
        )))));
    };

    tracing::info!("Analyzing {} image ({} bytes)", mime_type, body.len());

    let section = match assistant.analyze(&body, &mime_type, prompt).await {
        Ok(description) => Section::ready(VisionReply {
            description,
            bytes: body.len(),
            mime_type,
        }),
        Err(e) => {
            tracing::warn!("Image analysis failed: {}", e);
            Section::error(format!("Error from assistant: {}", e))
        }
    };

    Ok(Json(ApiResponse::success(section)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, StatusCode};

    use super::*;
    use crate::test_support::*;

    fn state_with(assistant: Arc<StubAssistant>) -> AppState {
        let mut state = AppState::new(Arc::new(StubMarket::with_closes(&[])));
        state.vision = Some(assistant);
        state
    }

    fn upload(uri: &str, content_type: &str, bytes: &'static [u8]) -> axum::http::Request<Body> {
        request(Method::POST, uri, None, Body::from(bytes), Some(content_type))
    }

    #[tokio::test]
    async fn test_analyze_with_default_prompt() {
        let assistant = Arc::new(StubAssistant::default());
        let (status, _, body) = send(
            state_with(assistant.clone()),
            upload("/api/vision", "image/png", &[0x89, 0x50, 0x4e, 0x47]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ready");
        assert_eq!(body["data"]["data"]["description"], "A candlestick chart.");
        assert_eq!(
            assistant.seen_image.lock().unwrap().clone(),
            Some((4, "image/png".to_string(), DEFAULT_PROMPT.to_string()))
        );
    }

    #[tokio::test]
    async fn test_custom_prompt_and_jpg_alias() {
        let assistant = Arc::new(StubAssistant::default());
        send(
            state_with(assistant.clone()),
            upload("/api/vision?prompt=What%20is%20the%20trend%3F", "image/jpg", b"jpeg"),
        )
        .await;

        let seen = assistant.seen_image.lock().unwrap().clone().unwrap();
        assert_eq!(seen.1, "image/jpeg");
        assert_eq!(seen.2, "What is the trend?");
    }

    #[tokio::test]
    async fn test_rejects_other_content_types() {
        let assistant = Arc::new(StubAssistant::default());
        let (status, _, _) = send(
            state_with(assistant.clone()),
            upload("/api/vision", "application/pdf", b"%PDF"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(assistant.seen_image.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_empty_upload() {
        let (status, _, _) = send(
            state_with(Arc::new(StubAssistant::default())),
            upload("/api/vision", "image/webp", b""),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_key_warns() {
        let state = AppState::new(Arc::new(StubMarket::with_closes(&[])));
        let (_, _, body) = send(state, upload("/api/vision", "image/png", b"png")).await;
        assert_eq!(body["data"]["status"], "warning");
    }

    #[tokio::test]
    async fn test_provider_failure_is_error_section() {
        let (status, _, body) = send(
            state_with(Arc::new(StubAssistant::failing())),
            upload("/api/vision", "image/png", b"png"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "error");
    }
}
