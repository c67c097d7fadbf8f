//! Tracing subscriber setup and metric descriptions.
//!
//! Logs go to stderr so that `tagfeed query` can print its JSON result on
//! stdout untouched.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::aggregator::METRIC_FANOUT_MS;
use crate::cache::{METRIC_TAG_CACHE_HIT, METRIC_TAG_CACHE_MISS};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;
use super::upstream::{METRIC_UPSTREAM_ERROR, METRIC_UPSTREAM_FETCH};

static METRIC_DESCRIPTIONS: Once = Once::new();

const COUNTERS: [(&str, &str); 4] = [
    (METRIC_TAG_CACHE_HIT, "Tag lookups served from the tag cache."),
    (
        METRIC_TAG_CACHE_MISS,
        "Tag lookups that had to populate the tag cache.",
    ),
    (
        METRIC_UPSTREAM_FETCH,
        "Upstream request attempts, retries included.",
    ),
    (METRIC_UPSTREAM_ERROR, "Upstream request attempts that failed."),
];

/// Install the global subscriber: env filter seeded from `logging.level`,
/// span-trace capture for errors, then a compact or JSON formatter.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("subscriber already installed: {err}")))
}

/// Register units and help text with whichever metrics recorder is installed.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for (name, description) in COUNTERS {
            describe_counter!(name, Unit::Count, description);
        }
        describe_histogram!(
            METRIC_FANOUT_MS,
            Unit::Milliseconds,
            "Wall time of a successful multi-tag fan-out."
        );
    });
}
