//! Concurrent multi-tag fan-out.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use metrics::histogram;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::cache::{TagCache, mutex_lock};
use crate::domain::posts::PostCollection;

use super::query::QueryError;
use super::upstream::{PostSource, UpstreamError};

const SOURCE: &str = "application::aggregator";
const TAG_DELIMITER: char = ',';

pub(crate) const METRIC_FANOUT_MS: &str = "tagfeed_fanout_ms";

/// Split a comma-joined tag list. Tokens are passed through untouched, empty
/// ones included.
pub fn split_tags(tags_csv: &str) -> impl Iterator<Item = &str> {
    tags_csv.split(TAG_DELIMITER)
}

/// Obtains posts for several tags in parallel, through the tag cache.
#[derive(Clone)]
pub struct FanOut {
    cache: Arc<TagCache>,
    source: Arc<dyn PostSource>,
}

impl FanOut {
    pub fn new(cache: Arc<TagCache>, source: Arc<dyn PostSource>) -> Self {
        Self { cache, source }
    }

    /// Merge the posts of every tag in `tags_csv`.
    ///
    /// One task runs per tag. The merged order across tags depends on task
    /// completion and is not stable between calls. The first failing tag
    /// aborts the remaining tasks and is returned.
    #[instrument(skip(self))]
    pub async fn fetch_tags(&self, tags_csv: &str) -> Result<PostCollection, QueryError> {
        let started = Instant::now();
        let merged = Arc::new(Mutex::new(PostCollection::default()));
        let mut workers = JoinSet::new();

        for tag in split_tags(tags_csv) {
            let tag = tag.to_string();
            let cache = Arc::clone(&self.cache);
            let source = Arc::clone(&self.source);
            let merged = Arc::clone(&merged);

            workers.spawn(async move {
                let posts = cache
                    .get_or_populate(&tag, || source.fetch_tag(&tag))
                    .await?;
                mutex_lock(&merged, SOURCE, "append").extend_from(&posts);
                debug!(tag = %tag, posts = posts.len(), "tag merged");
                Ok::<(), UpstreamError>(())
            });
        }

        while let Some(joined) = workers.join_next().await {
            let outcome = match joined {
                Ok(result) => result.map_err(QueryError::from),
                Err(err) => Err(QueryError::worker(err)),
            };
            if let Err(err) = outcome {
                workers.abort_all();
                warn!(error = %err, "fan-out aborted");
                return Err(err);
            }
        }

        histogram!(METRIC_FANOUT_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        let merged = std::mem::take(&mut *mutex_lock(&merged, SOURCE, "collect"));
        Ok(merged)
    }
}
