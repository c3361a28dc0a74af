use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "localizer_cache_primary_hit_total",
            Unit::Count,
            "Total number of primary cache hits."
        );
        describe_counter!(
            "localizer_cache_primary_miss_total",
            Unit::Count,
            "Total number of primary cache misses, expired entries included."
        );
        describe_counter!(
            "localizer_cache_primary_evict_total",
            Unit::Count,
            "Total number of primary cache evictions due to capacity."
        );
        describe_counter!(
            "localizer_cache_primary_expired_total",
            Unit::Count,
            "Total number of primary entries dropped after their TTL."
        );
        describe_counter!(
            "localizer_cache_secondary_hit_total",
            Unit::Count,
            "Total number of secondary store hits."
        );
        describe_counter!(
            "localizer_cache_secondary_miss_total",
            Unit::Count,
            "Total number of secondary store misses."
        );
        describe_counter!(
            "localizer_cache_secondary_error_total",
            Unit::Count,
            "Total number of failed secondary store reads and writes."
        );
        describe_counter!(
            "localizer_admission_rejected_total",
            Unit::Count,
            "Total number of computations rejected by the admission gate."
        );
        describe_histogram!(
            "localizer_origin_compute_ms",
            Unit::Milliseconds,
            "Origin computation latency in milliseconds."
        );
    });
}
