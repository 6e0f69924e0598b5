use thiserror::Error;

/// Substring that marks a server failure as a configuration problem.
pub const API_KEY_MARKER: &str = "API key";

/// Unified error type for pdf-translate-client-core
///
/// Every failure is caught at the flow boundary that produced it and turned
/// into a notification or inline status text:
/// - Input validation (wrong file type, unknown language)
/// - Transport failures (HTTP and the progress channel)
/// - Server-reported failures, with configuration problems split out
/// - Client configuration and local I/O
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Input Errors
    // ==========================================================================
    /// Rejected before any network call was made
    #[error("{0}")]
    InvalidInput(String),

    // ==========================================================================
    // Transport Errors
    // ==========================================================================
    /// HTTP request could not be completed
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status; `message` is the server detail or a fallback
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Server response body could not be decoded
    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    /// Progress channel failed to open or broke while in use
    #[error("progress channel error: {0}")]
    Channel(String),

    /// Server reports a missing or invalid API key
    #[error("{0}")]
    Configuration(String),

    // ==========================================================================
    // Client Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Text shown to the user. Server errors surface their detail verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message)
            | Self::Server { message, .. }
            | Self::Configuration(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Upgrade a server error that mentions the API key into a configuration error.
    #[must_use]
    pub fn classify(self) -> Self {
        match self {
            Self::Server { message, .. } if mentions_api_key(&message) => {
                Self::Configuration(message)
            }
            other => other,
        }
    }
}

pub fn mentions_api_key(message: &str) -> bool {
    message.contains(API_KEY_MARKER)
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Channel(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
