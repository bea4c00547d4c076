//! Client-side error taxonomy.

use serde_json::Value;
use thiserror::Error;

use omnicorp_core::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message shown when the backend gives no usable explanation.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response at all (connection refused, DNS, aborted).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered 401. The session layer has already been told.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status outside 5xx (4xx, unfollowed 3xx).
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A 2xx whose body could not be read as the expected payload.
    #[error("unreadable response: {0}")]
    Decode(String),

    /// Local validation refused the payload; nothing was sent.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// The session moved on (logout, another login) while this call ran.
    #[error("session changed: {0}")]
    SessionConflict(String),
}

impl ApiError {
    /// Classify a non-success response from its status and raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| reason(status).to_string());
        match status {
            401 => ApiError::Unauthorized(message),
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Rejected { status, message },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Human-readable message suitable for inline display.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unauthorized(message)
            | ApiError::Rejected { message, .. }
            | ApiError::Server { message, .. } => message.clone(),
            ApiError::Validation(DomainError::Validation(message)) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Extracts the backend's explanation from an error body.
///
/// FastAPI puts it in `detail`, either as a string or as a list of
/// `{ "msg": ... }` validation entries; other handlers use `message` or
/// `error`.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let text = match value.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(entries)) => {
            let msgs: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    };

    text.or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| value.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}

fn reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or(DEFAULT_FAILURE_MESSAGE)
}
