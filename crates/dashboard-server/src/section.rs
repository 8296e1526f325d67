use serde::Serialize;

/// One independently rendered part of a view.
///
/// `Warning` covers missing configuration and empty results, `Error` a failed
/// provider call. Neither stops the other sections from rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { data: T },
    Warning { message: String },
    Error { message: String },
}

impl<T> Section<T> {
    pub fn ready(data: T) -> Self {
        Section::Ready { data }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Section::Warning {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Section::Error {
            message: message.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Section::Ready { .. } => None,
            Section::Warning { message } | Section::Error { message } => Some(message),
        }
    }
}

/// Warning shown when a provider credential is not configured
pub fn missing_key(provider: &str, env_var: &str) -> String {
    format!(
        "{} API key is missing. Set {} in environment variables.",
        provider, env_var
    )
}
