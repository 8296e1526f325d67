//! Google Gemini `generateContent` client for chat and image analysis.

use async_trait::async_trait;
use base64::Engine as _;
use maven_core::{ChatTurn, ConversationalAssistant, ProviderError, VisionAssistant};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{read_json, send_with_retry, HttpSettings};

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Every harm category is left unblocked
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
    settings: HttpSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    safety_settings: Vec<SafetySetting<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct SafetySetting<'a> {
    category: &'a str,
    threshold: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>, settings: HttpSettings) -> Self {
        Self::with_base_url(api_key, model, BASE_URL, settings)
    }

    pub fn with_base_url(
        api_key: String,
        model: impl Into<String>,
        base_url: impl Into<String>,
        settings: HttpSettings,
    ) -> Self {
        Self {
            api_key,
            model: model.into(),
            client: settings.build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, contents: Vec<Content<'_>>) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents,
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        };

        let response = send_with_retry(
            &self.client,
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body),
            &self.settings,
            "Gemini",
        )
        .await?;

        let status = response.status();
        let parsed: GenerateResponse = read_json(response, &self.settings).await?;

        if let Some(err) = parsed.error {
            return Err(ProviderError::Api(format!(
                "Gemini {}: {}",
                err.code.unwrap_or(status.as_u16()),
                err.message.unwrap_or_default()
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Api(format!("Gemini HTTP {}", status)));
        }
        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Api(format!("Prompt blocked: {}", reason)));
        }

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("Gemini returned no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl ConversationalAssistant for GeminiClient {
    async fn send_message(&self, history: &[ChatTurn], text: &str) -> Result<String, ProviderError> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| Content {
                role: turn.role.as_str(),
                parts: vec![Part::Text { text: &turn.text }],
            })
            .collect();
        contents.push(Content {
            role: "user",
            parts: vec![Part::Text { text }],
        });

        tracing::debug!("Gemini chat: {} prior turns", history.len());
        self.generate(contents).await
    }
}

#[async_trait]
impl VisionAssistant for GeminiClient {
    async fn analyze(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String, ProviderError> {
        let contents = vec![Content {
            role: "user",
            parts: vec![
                Part::Text { text: prompt },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type,
                        data: base64::engine::general_purpose::STANDARD.encode(image),
                    },
                },
            ],
        }];

        tracing::debug!("Gemini vision: {} bytes of {}", image.len(), mime_type);
        self.generate(contents).await
    }
}
