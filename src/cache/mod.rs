//! Per-tag post cache.
//!
//! Entries are populated on first access and live for the rest of the
//! process. Population can run through a per-tag lock so that concurrent
//! first requests for the same tag share one upstream fetch.
//!
//! ```toml
//! [cache]
//! single_flight = true
//! ```

mod config;
mod flight;
mod lock;
mod store;

pub use config::CacheConfig;
pub use flight::{PopulationGuard, PopulationLocks};
pub use store::TagCache;

pub(crate) use lock::mutex_lock;
pub(crate) use store::{METRIC_TAG_CACHE_HIT, METRIC_TAG_CACHE_MISS};
