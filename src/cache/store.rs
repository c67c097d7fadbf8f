//! Tag cache storage.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use metrics::counter;
use tracing::debug;

use crate::domain::posts::PostCollection;

use super::config::CacheConfig;
use super::flight::PopulationLocks;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_TAG_CACHE_HIT: &str = "tagfeed_tag_cache_hit_total";
pub(crate) const METRIC_TAG_CACHE_MISS: &str = "tagfeed_tag_cache_miss_total";

/// Mapping from tag to the posts fetched for it.
///
/// Keys are matched exactly (case-sensitive, no trimming). Stored collections
/// are handed out as shared immutable views; callers copy posts out before
/// deduplicating or sorting.
pub struct TagCache {
    config: CacheConfig,
    entries: RwLock<HashMap<String, Arc<PostCollection>>>,
    populating: PopulationLocks,
}

impl TagCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            populating: PopulationLocks::new(),
        }
    }

    pub fn get(&self, tag: &str) -> Option<Arc<PostCollection>> {
        rw_read(&self.entries, SOURCE, "get").get(tag).cloned()
    }

    /// Store `posts` under `tag`, replacing any previous entry.
    pub fn set(&self, tag: impl Into<String>, posts: PostCollection) {
        self.store(tag.into(), posts);
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached posts for `tag`, running `populate` on a miss and
    /// storing its successful result.
    ///
    /// With `single_flight` enabled, concurrent misses for the same tag wait
    /// on the first caller and reuse what it stored. Without it, each missing
    /// caller populates independently and the last store wins.
    pub async fn get_or_populate<F, Fut, E>(
        &self,
        tag: &str,
        populate: F,
    ) -> Result<Arc<PostCollection>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PostCollection, E>>,
    {
        if let Some(posts) = self.get(tag) {
            counter!(METRIC_TAG_CACHE_HIT).increment(1);
            return Ok(posts);
        }

        if !self.config.single_flight {
            counter!(METRIC_TAG_CACHE_MISS).increment(1);
            let posts = populate().await?;
            return Ok(self.store(tag.to_string(), posts));
        }

        let _guard = self.populating.acquire(tag).await;
        if let Some(posts) = self.get(tag) {
            debug!(tag, "tag populated while waiting");
            counter!(METRIC_TAG_CACHE_HIT).increment(1);
            return Ok(posts);
        }

        counter!(METRIC_TAG_CACHE_MISS).increment(1);
        let posts = populate().await?;
        Ok(self.store(tag.to_string(), posts))
    }

    fn store(&self, tag: String, posts: PostCollection) -> Arc<PostCollection> {
        let posts = Arc::new(posts);
        debug!(tag = %tag, posts = posts.len(), "tag cached");
        rw_write(&self.entries, SOURCE, "store").insert(tag, Arc::clone(&posts));
        posts
    }
}

impl Default for TagCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
