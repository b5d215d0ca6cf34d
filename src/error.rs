//! licat error types

/// licat error types
#[derive(Debug, thiserror::Error)]
pub enum LicatError {
    // Transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Lifecycle errors
    /// The explicit `initialize()` call could not populate the catalog.
    #[error("catalog initialization failed: {source}")]
    Initialization {
        #[source]
        source: Box<LicatError>,
    },

    /// The client was closed; no further operations are accepted.
    #[error("client has been closed")]
    Disposed,

    #[error("operation cancelled")]
    Cancelled,
}

impl LicatError {
    /// Whether the error is worth retrying.
    ///
    /// Connection-level failures, rate limiting and server-side errors are
    /// transient. Everything else (decode failures, 4xx, lifecycle errors)
    /// is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Wrap a population failure as an initialization error.
    pub(crate) fn initialization(source: LicatError) -> Self {
        Self::Initialization {
            source: Box::new(source),
        }
    }
}

impl From<reqwest::Error> for LicatError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => LicatError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => LicatError::Decode(err.to_string()),
            None => LicatError::Http(err.to_string()),
        }
    }
}

/// Result type alias for licat operations
pub type Result<T> = std::result::Result<T, LicatError>;
