// src/error.rs

//! Unified error handling for the explorer.

use thiserror::Error;

/// Result type alias for explorer operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request failed or the server answered with a non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Success status carrying an error payload
    #[error("Server error: {0}")]
    Server(String),

    /// Missing or invalid field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Action attempted without a logged-in or guest user
    #[error("Sign in or continue as a guest to do that")]
    IdentityRequired,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the failure happened on the way to or from the server.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http(_))
    }

    /// Text suitable for an inline status line.
    ///
    /// Network and server failures show the server's own wording when it
    /// sent one; everything else falls back to the `Display` form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(message) | Self::Server(message) | Self::Validation(message) => {
                message.clone()
            }
            Self::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            Self::Http(_) => "Unable to reach the server".to_string(),
            other => other.to_string(),
        }
    }
}
