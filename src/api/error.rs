use thiserror::Error;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Errors produced by the shared request pipeline.
///
/// `Authorization` is the only variant with a global side effect: by the time
/// the caller sees it, the pipeline has already cleared the persisted token
/// and navigated to the login route. `Network` covers timeouts and transport
/// failures and never touches the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Unauthorized ({status})")]
    Authorization { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl ApiError {
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authorization { status } | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Maps transport-level failures, keeping timeouts distinguishable in the message.
pub(crate) fn map_request_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Network("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Trims and truncates HTTP error bodies for user-facing messages.
pub(crate) fn sanitize_body(body: String) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
