//! Nutriscope error types

/// Nutriscope error types
#[derive(Debug, thiserror::Error)]
pub enum NutriscopeError {
    // Client-side validation errors
    #[error("{0}")]
    Validation(String),

    #[error("a submission is already in progress")]
    SubmissionInFlight,

    // Transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    // Server-reported errors
    /// Non-2xx response. `message` is the server-provided message when the body
    /// carried one, otherwise the endpoint's generic fallback.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// 2xx response whose JSON body is flagged with an `error` field.
    #[error("{message}")]
    ServerReported { message: String },

    /// Response decoded but did not match the expected schema.
    #[error("unexpected response: {0}")]
    Schema(String),

    // Session errors
    #[error("session expired, please sign in again")]
    SessionExpired,

    #[error("authentication is not available in this build")]
    AuthUnavailable,

    #[error("session store error: {0}")]
    SessionStore(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification used when presenting an error to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caught before any network call; fix the input and try again.
    Validation,
    /// Network failure, timeout, or abandoned request.
    Transport,
    /// The service answered with an error.
    Server,
    /// Session or credential problem.
    Session,
    /// Local configuration, I/O, or decoding problem.
    Local,
}

impl NutriscopeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::SubmissionInFlight => ErrorKind::Validation,
            Self::Http(_) | Self::Timeout | Self::Cancelled => ErrorKind::Transport,
            Self::Api { .. } | Self::ServerReported { .. } | Self::Schema(_) => ErrorKind::Server,
            Self::SessionExpired | Self::AuthUnavailable | Self::SessionStore(_) => {
                ErrorKind::Session
            }
            Self::Json(_) | Self::Io(_) | Self::Configuration(_) => ErrorKind::Local,
        }
    }

    /// Message to show the user.
    ///
    /// Server-provided and validation messages are surfaced verbatim; transport
    /// and decoding failures collapse to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Api { message, .. } | Self::ServerReported { message } => message.clone(),
            Self::SubmissionInFlight | Self::SessionExpired | Self::AuthUnavailable => {
                self.to_string()
            }
            _ => fallback.to_string(),
        }
    }
}

/// Result type alias for Nutriscope operations
pub type Result<T> = std::result::Result<T, NutriscopeError>;
