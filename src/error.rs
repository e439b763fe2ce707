use thiserror::Error;

/// Shown when the API gives no message of its own.
pub const FALLBACK_MESSAGE: &str = "Oops! Something Went Wrong";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Login rejected; carries the API's `error_msg`.
    #[error("{0}")]
    AuthFailure(String),

    #[error("request failed with status {status}")]
    Fetch {
        status: u16,
        message: Option<String>,
    },

    #[error("not logged in")]
    MissingCredential,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Human-readable text for a failure view.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::AuthFailure(msg) => msg.clone(),
            ApiError::Fetch {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}
