use thiserror::Error;

use crate::config::ConfigError;
use crate::context::ContextError;
use crate::domain::DomainError;

/// Errors from a single client operation
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Rate limit wait aborted: {0}")]
    Admission(#[from] ContextError),

    #[error("Request interrupted: {0}")]
    Interrupted(ContextError),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Rejected locally, before anything was sent
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// HTTP status reported by the server, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
