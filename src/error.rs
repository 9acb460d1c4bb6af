//! Unified error handling for EatMate.
//!
//! Remote-call failures are caught at the controller boundary and turned
//! into a terminal `failed` state; this type only travels between the API
//! clients and the controllers.

use std::fmt;

/// Generic text shown to the user for any failed remote call.
pub const TRY_AGAIN_MESSAGE: &str = "Something went wrong. Please try again.";

/// Unified error type for EatMate operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EatMateError {
    /// Request could not complete (connect, timeout, TLS).
    Network(String),
    /// Remote service answered with a non-2xx status.
    Api { status: u16, message: String },
    /// Response body could not be decoded.
    ParseError(String),
    /// Criteria could not be turned into a query.
    InvalidQuery(String),
    /// API key not configured for a service.
    ApiKeyMissing(String),
}

impl fmt::Display for EatMateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::ParseError(msg) => write!(f, "Parse error: {}", msg),
            Self::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            Self::ApiKeyMissing(service) => write!(f, "No API key configured for {}", service),
        }
    }
}

impl std::error::Error for EatMateError {}

impl EatMateError {
    /// Get the error type string.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Network(_) => "network_error",
            Self::Api { .. } => "api_error",
            Self::ParseError(_) => "parse_error",
            Self::InvalidQuery(_) => "invalid_query",
            Self::ApiKeyMissing(_) => "configuration_error",
        }
    }

    /// Message for the view layer. Error detail is never exposed upward.
    pub fn user_message(&self) -> &'static str {
        TRY_AGAIN_MESSAGE
    }

    /// Build an `Api` error from a status code and the raw response body.
    ///
    /// Looks for `message` or `error.message` in a JSON body and falls back
    /// to `"API error: <status>"`.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .or_else(|| v.pointer("/error/message").and_then(|m| m.as_str()))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("API error: {}", status));

        Self::Api { status, message }
    }
}

impl From<reqwest::Error> for EatMateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EatMateError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
