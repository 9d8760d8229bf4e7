//! Error handling for the portfolio listings client

use std::fmt;
use thiserror::Error;

/// Message shown when a failed fetch carries no usable text of its own
pub const FETCH_FAILURE_FALLBACK: &str = "Failed to load investment opportunities";

/// Unified error type for the portfolio listings client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// WebSocket transport errors from the realtime connection
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Database query errors reported by the REST service
    #[error("Database error: {0}")]
    Database(String),

    /// Realtime subscription errors
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new realtime error
    pub fn realtime<T: fmt::Display>(msg: T) -> Self {
        Error::Realtime(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Text suitable for showing to a visitor of the listings page.
    ///
    /// Service errors surface their own message; everything else uses its
    /// display form. Blank messages fall back to [`FETCH_FAILURE_FALLBACK`].
    pub fn user_message(&self) -> String {
        let message = match self {
            Error::Database(msg) | Error::General(msg) => msg.clone(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            FETCH_FAILURE_FALLBACK.to_string()
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_service_message() {
        let err = Error::database("relation \"public.deals\" does not exist");
        assert_eq!(err.user_message(), "relation \"public.deals\" does not exist");
    }

    #[test]
    fn test_user_message_falls_back_when_blank() {
        assert_eq!(Error::database("  ").user_message(), FETCH_FAILURE_FALLBACK);
        assert_eq!(Error::general("").user_message(), FETCH_FAILURE_FALLBACK);
    }

    #[test]
    fn test_user_message_uses_display_for_other_kinds() {
        let err = Error::realtime("socket closed");
        assert_eq!(err.user_message(), "Realtime error: socket closed");
    }
}
