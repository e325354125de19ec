use thiserror::Error;

/// Errors that can occur while talking to the drink menu API or setting up a form
#[derive(Error, Debug)]
pub enum MenuError {
    /// Transport-level failure (connection, timeout, body decoding)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error envelope or a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Access token is missing or malformed
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// A URL could not be built from configuration
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),

    /// No tokio runtime available for background requests
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
