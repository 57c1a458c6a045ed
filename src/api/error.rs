use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot reach the server: {0}")]
    Unreachable(String),
    #[error("Not authorized{}", detail_suffix(.detail))]
    Unauthorized { detail: Option<String> },
    #[error("HTTP {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Not logged in")]
    NotLoggedIn,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl ApiError {
    /// Server-provided `detail` message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The stored token was rejected and should be forgotten.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. } | ApiError::NotLoggedIn)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }
}
