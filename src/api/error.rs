use thiserror::Error;

/// Failures talking to the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No credential stored locally; the request was never sent.
    #[error("not signed in")]
    MissingCredential,

    /// The backend answered 401.
    #[error("session expired or unauthorized")]
    Unauthorized,

    /// Any other non-success status, with the server `detail` when present.
    #[error("backend returned {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(String),

    /// The body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid backend url: {0}")]
    Url(String),
}

impl ApiError {
    /// Failures that send the user to the login flow instead of an inline error.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::MissingCredential | ApiError::Unauthorized)
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                detail: Some(d), ..
            } => Some(d.as_str()),
            _ => None,
        }
    }

    /// Server-provided detail, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}
