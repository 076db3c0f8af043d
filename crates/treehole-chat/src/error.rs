//! Error types for the chat engine

use thiserror::Error;

/// Chat engine error types
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat service error: {0}")]
    Service(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Convert a non-success HTTP response into an [`ChatError::Api`].
pub(crate) async fn response_to_error(response: reqwest::Response) -> ChatError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Truncate error body to prevent leaking large or sensitive responses.
    const MAX_ERROR_BODY: usize = 512;
    let message = if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &body[..end])
    } else {
        body
    };

    ChatError::Api { status, message }
}
