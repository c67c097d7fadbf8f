//! Upstream post source abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::posts::PostCollection;

/// Failure while fetching one tag from the upstream posts API.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("upstream request for tag `{tag}` failed: {message}")]
    Transport { tag: String, message: String },
    #[error("upstream answered tag `{tag}` with status {status}")]
    Status { tag: String, status: u16 },
    #[error("upstream body for tag `{tag}` could not be decoded: {message}")]
    Decode { tag: String, message: String },
}

impl UpstreamError {
    pub fn transport(tag: &str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            tag: tag.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(tag: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            tag: tag.to_string(),
            message: err.to_string(),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Transport { tag, .. }
            | Self::Status { tag, .. }
            | Self::Decode { tag, .. } => tag,
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } => false,
        }
    }
}

/// Fetches the full post set for a single tag.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_tag(&self, tag: &str) -> Result<PostCollection, UpstreamError>;
}
