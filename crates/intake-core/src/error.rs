//! Error types for the flight intake core
//!
//! Provides error handling for:
//! - Remote submission failures
//! - Image extraction failures (five user-facing categories)
//! - History store failures
//! - Configuration loading

use std::path::PathBuf;

/// Fallback shown when the submission endpoint gives no usable message
pub const SUBMIT_FAILURE_FALLBACK: &str =
    "Failed to submit flight information. Please try again.";

/// Top-level intake error
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// Remote submission failed
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),

    /// Image extraction failed
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// History store failed
    #[error("history store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl IntakeError {
    /// Check if the user can reasonably retry the same action
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submit(e) => e.is_retryable(),
            Self::Extract(e) => e.is_retryable(),
            Self::Store(_) | Self::Config(_) => false,
        }
    }
}

/// Remote submission errors
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Endpoint answered with a non-success status
    #[error("endpoint rejected submission with status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message from the response body, when present
        message: Option<String>,
    },

    /// Request never completed (connection, DNS, timeout)
    #[error("transport failure: {0}")]
    Transport(String),

    /// Request could not be built (bad header value, bad URL)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl SubmitError {
    /// Message supplied by the server, if any
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Message to surface to the user: server-supplied or the generic fallback
    #[must_use]
    pub fn user_message(&self) -> String {
        self.server_message()
            .map_or_else(|| SUBMIT_FAILURE_FALLBACK.to_string(), str::to_string)
    }

    /// Transport failures and 5xx answers may succeed on a manual retry
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::InvalidRequest(_) => false,
        }
    }
}

/// Image extraction errors, one per user-facing category
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// API key rejected (401)
    #[error("Invalid API key. Please check your OpenAI API key.")]
    Unauthorized,

    /// Too many requests (429)
    #[error("Rate limit exceeded. Please wait a few minutes and try again.")]
    RateLimited,

    /// Image rejected by the endpoint (400)
    #[error("Image format not supported. Please try a different image.")]
    UnsupportedImage,

    /// Account credits exhausted
    #[error("OpenAI credits exhausted. Please add billing to continue or try again later.")]
    QuotaExhausted,

    /// Anything else, including malformed replies
    #[error("AI analysis failed. Please try again or fill the form manually.")]
    Failed {
        /// Diagnostic detail for logs; never shown to the user
        detail: String,
    },
}

impl ExtractError {
    /// Generic failure with a diagnostic detail
    #[inline]
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed {
            detail: detail.into(),
        }
    }

    /// Categorise a failed extraction call
    ///
    /// Status codes take precedence over the error text, so a 429 carrying a
    /// quota message is still reported as rate limiting.
    #[must_use]
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        match status {
            Some(401) => Self::Unauthorized,
            Some(429) => Self::RateLimited,
            Some(400) => Self::UnsupportedImage,
            _ if message.to_lowercase().contains("quota") => Self::QuotaExhausted,
            Some(status) => Self::failed(format!("status {status}: {message}")),
            None => Self::failed(message),
        }
    }

    /// Rate limits clear on their own; the rest need user action
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Failed { .. })
    }
}

/// History store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("io error on {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored data is not a valid record list
    #[error("corrupt history data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value required for the requested operation is missing
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// A value is present but unusable
    #[error("invalid configuration value for {key}: {reason}")]
    Invalid {
        /// Config key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
