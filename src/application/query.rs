//! Query pipeline: fan-out, deduplicate, sort.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::cache::TagCache;
use crate::domain::posts::{PostCollection, SortDirection, SortKey};

use super::aggregator::FanOut;
use super::upstream::{PostSource, UpstreamError};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("fan-out worker failed: {0}")]
    Worker(String),
}

impl QueryError {
    pub fn worker(err: impl std::fmt::Display) -> Self {
        Self::Worker(err.to_string())
    }
}

/// Rejected query parameters. Each case has its own stable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryValidationError {
    #[error("Tags parameter is required")]
    TagsRequired,
    #[error("sortBy parameter is invalid")]
    SortByInvalid { value: String },
    #[error("direction parameter is invalid")]
    DirectionInvalid { value: String },
}

impl QueryValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TagsRequired => "tags_required",
            Self::SortByInvalid { .. } => "sort_by_invalid",
            Self::DirectionInvalid { .. } => "direction_invalid",
        }
    }
}

/// A validated posts query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsQuery {
    pub tags: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl PostsQuery {
    /// Validate raw parameters in order: tags, then sort key, then direction.
    pub fn parse(
        tags: Option<&str>,
        sort_by: Option<&str>,
        direction: Option<&str>,
    ) -> Result<Self, QueryValidationError> {
        let tags = match tags {
            Some(tags) if !tags.is_empty() => tags.to_string(),
            _ => return Err(QueryValidationError::TagsRequired),
        };

        let sort_by = sort_by.unwrap_or_default();
        let sort_key =
            SortKey::parse(sort_by).ok_or_else(|| QueryValidationError::SortByInvalid {
                value: sort_by.to_string(),
            })?;

        let direction = direction.unwrap_or_default();
        let direction = SortDirection::parse(direction).ok_or_else(|| {
            QueryValidationError::DirectionInvalid {
                value: direction.to_string(),
            }
        })?;

        Ok(Self {
            tags,
            sort_key,
            direction,
        })
    }
}

/// Runs posts queries against the tag cache and upstream source.
pub struct QueryService {
    fan_out: FanOut,
}

impl QueryService {
    pub fn new(cache: Arc<TagCache>, source: Arc<dyn PostSource>) -> Self {
        Self {
            fan_out: FanOut::new(cache, source),
        }
    }

    pub async fn run(&self, query: &PostsQuery) -> Result<PostCollection, QueryError> {
        self.query(&query.tags, query.sort_key, query.direction)
            .await
    }

    #[instrument(skip(self))]
    pub async fn query(
        &self,
        tags_csv: &str,
        sort_key: SortKey,
        direction: SortDirection,
    ) -> Result<PostCollection, QueryError> {
        let mut posts = self.fan_out.fetch_tags(tags_csv).await?;
        let merged = posts.len();
        posts.deduplicate();
        posts.sort_by(sort_key, direction);
        info!(tags = tags_csv, merged, returned = posts.len(), "posts query served");
        Ok(posts)
    }
}
