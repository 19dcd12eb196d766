//! Client error taxonomy shared by the chat session and history reconciler.
//!
//! DESIGN
//! ======
//! One enum covers local validation, transport failures, and server replies.
//! Payloads are owned strings so errors can be cloned into view state (the
//! chat session keeps its last failure; the reconciler keeps its last poll
//! error) without holding on to `reqwest` internals.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::state::chat::MAX_QUESTION_CHARS;

/// Input rejected before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Trimmed input was empty.
    #[error("empty")]
    Empty,
    /// Input exceeded the question length limit.
    #[error("too_long")]
    TooLong { len: usize, max: usize },
}

/// Errors produced by client operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A chat question is already awaiting its answer.
    #[error("a request is already in flight")]
    Busy,

    /// The server answered with a non-success status.
    #[error("request failed: {message}")]
    RequestFailed { message: String },

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 429 from one of the history fetches.
    #[error("rate limited")]
    RateLimited,

    /// Success status, but the payload did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// HTTP 401. The credential has already been invalidated.
    #[error("unauthorized")]
    Unauthorized,

    /// An authenticated request was attempted with no stored token.
    #[error("missing credential")]
    MissingCredential,

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("config parse failed: {0}")]
    ConfigParse(String),
}

impl ClientError {
    /// Grepable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::Empty) => "E_VALIDATION_EMPTY",
            Self::Validation(ValidationError::TooLong { .. }) => "E_VALIDATION_TOO_LONG",
            Self::Busy => "E_BUSY",
            Self::RequestFailed { .. } => "E_REQUEST_FAILED",
            Self::Network(_) => "E_NETWORK",
            Self::RateLimited => "E_RATE_LIMITED",
            Self::MalformedResponse(_) => "E_MALFORMED_RESPONSE",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::MissingCredential => "E_MISSING_CREDENTIAL",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
        }
    }

    /// Whether repeating the same request later may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Network(_))
    }

    /// Text shown to the user in an error banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::Empty) => "Please enter a question.".to_owned(),
            Self::Validation(ValidationError::TooLong { max, .. }) => {
                format!("Question is too long, please keep it under {max} characters.")
            }
            Self::Busy => "Still waiting for the previous answer.".to_owned(),
            Self::RequestFailed { message } => message.clone(),
            Self::Network(_) => "Could not reach the server.".to_owned(),
            Self::RateLimited => "Too many requests. Please try again in a few minutes.".to_owned(),
            Self::MalformedResponse(_) => "The server returned an invalid response.".to_owned(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_owned(),
            Self::MissingCredential => "You are not logged in.".to_owned(),
            Self::HttpClientBuild(_) | Self::ConfigParse(_) => self.to_string(),
        }
    }
}

/// Convenience constructor for the length check.
#[must_use]
pub fn too_long(len: usize) -> ClientError {
    ClientError::Validation(ValidationError::TooLong { len, max: MAX_QUESTION_CHARS })
}
