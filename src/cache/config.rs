//! Cache configuration.

use serde::Deserialize;

/// Tag cache behaviour from the `[cache]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serialize first-time population per tag so concurrent misses share one fetch.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            single_flight: true,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            single_flight: settings.single_flight,
        }
    }
}
