use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {body}")]
    AccessDenied { body: String, detail: Option<String> },

    #[error("Unauthorized - token may be expired")]
    Unauthorized(Option<String>),

    #[error("Resource not found: {body}")]
    NotFound { body: String, detail: Option<String> },

    #[error("Request rejected ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {body}")]
    ServerError { body: String, detail: Option<String> },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape used by the backend: `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Extract a string `detail` from a JSON error body.
    /// Validation errors carry a list there; those are not surfaced.
    fn parse_detail(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = Self::parse_detail(body);
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(detail),
            403 => ApiError::AccessDenied { body: truncated, detail },
            404 => ApiError::NotFound { body: truncated, detail },
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError { body: truncated, detail },
            _ => match detail {
                Some(detail) => ApiError::Rejected { status, detail },
                None => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
            },
        }
    }

    /// Whether this failure should start the token refresh protocol
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Server-provided `detail` message, suitable for showing verbatim.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(detail)
            | ApiError::AccessDenied { detail, .. }
            | ApiError::NotFound { detail, .. }
            | ApiError::ServerError { detail, .. } => detail.as_deref(),
            ApiError::Rejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}
