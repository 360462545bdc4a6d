/// Fallback shown when the server gives no usable message.
pub const GENERIC_FAILURE: &str = "The operation failed. Please try again.";

/// Errors from the admin REST client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable token in the session, or the server answered 401.
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status without a `success` body.
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The server answered `{"success": false}`.
    #[error("Request rejected: {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Rejected { message: Option<String> },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    /// The configured base URL cannot address API paths.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated(_))
    }

    /// Text suitable for an alert or toast.
    ///
    /// Prefers the server-provided message; falls back to a generic one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthenticated(_) => "Your session has expired. Please log in again.".into(),
            ApiError::Request(_) => "Network error. Please check your connection and try again.".into(),
            ApiError::Status { body, .. } => {
                server_message(body).unwrap_or_else(|| GENERIC_FAILURE.to_string())
            }
            ApiError::Rejected { message } => message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ApiError::Decode(_) | ApiError::InvalidBaseUrl(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Pull `error` or `message` out of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|k| value.get(*k))
        .find_map(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
