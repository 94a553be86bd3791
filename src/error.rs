//! Unified error type for snapedit.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{SessionError, SessionFailure};

/// Why an edit attempt (or the work around it) did not produce an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCategory {
    /// Missing API key or otherwise unusable configuration. Fatal.
    Config,
    /// The upstream call failed: network, auth, quota, server error.
    Upstream,
    /// The upstream answered, but without a usable image.
    MalformedResponse,
    /// Work that never reached the service: I/O, format conversion,
    /// transitions the session refused.
    Local,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "configuration",
            Self::Upstream => "upstream",
            Self::MalformedResponse => "malformed response",
            Self::Local => "local",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while editing or exporting an image.
#[derive(Debug, Error)]
pub enum EditError {
    /// An API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered successfully but the body held no usable image.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API key configured for the provider.
    #[error("No API key for {provider}. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The provider name.
        provider: String,
        /// The environment variable name.
        env_var: String,
    },

    /// The session refused a transition.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A failure served from a cassette, message and category as recorded.
    #[error("{message}")]
    Replayed {
        /// Category of the original failure.
        category: FailureCategory,
        /// Display text of the original failure.
        message: String,
    },

    /// An edit attempt ended in the session's `Failed` state.
    #[error("Edit failed: {0}")]
    Failed(SessionFailure),
}

impl EditError {
    /// Classify this error into a [`FailureCategory`].
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Api { .. } | Self::Network(_) => FailureCategory::Upstream,
            Self::MalformedResponse(_) => FailureCategory::MalformedResponse,
            Self::Config(_) | Self::InvalidArgument(_) | Self::MissingApiKey { .. } => {
                FailureCategory::Config
            }
            Self::Io(_) | Self::ImageConversion(_) | Self::Session(_) => FailureCategory::Local,
            Self::Failed(failure) => failure.category,
            Self::Replayed { category, .. } => *category,
        }
    }

    /// Whether a retry of the same request could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let api = EditError::Api { status: 403, message: "denied".into() };
        assert_eq!(api.category(), FailureCategory::Upstream);
        assert_eq!(
            EditError::MalformedResponse("no image".into()).category(),
            FailureCategory::MalformedResponse
        );
        let key = EditError::MissingApiKey { provider: "Gemini".into(), env_var: "X".into() };
        assert_eq!(key.category(), FailureCategory::Config);
        assert_eq!(EditError::ImageConversion("bad".into()).category(), FailureCategory::Local);
    }

    #[test]
    fn transient_statuses() {
        assert!(EditError::Api { status: 429, message: String::new() }.is_transient());
        assert!(EditError::Api { status: 503, message: String::new() }.is_transient());
        assert!(!EditError::Api { status: 401, message: String::new() }.is_transient());
        assert!(!EditError::MalformedResponse(String::new()).is_transient());
    }

    #[test]
    fn missing_key_message_names_env_var() {
        let err = EditError::MissingApiKey {
            provider: "Gemini".into(),
            env_var: "GEMINI_API_KEY".into(),
        };
        assert_eq!(
            err.to_string(),
            "No API key for Gemini. Set GEMINI_API_KEY or add it to config file."
        );
    }
}
