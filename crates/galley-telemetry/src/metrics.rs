//! Dispatch metrics.
//!
//! Galley records through the `metrics` facade and installs no exporter.
//! Every call here is a no-op until the host installs a recorder.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `galley_dispatch_total` | Counter | `outcome` | Dispatched requests |
//! | `galley_dispatch_duration_seconds` | Histogram | `outcome` | Resolve plus chain latency |
//! | `galley_pool_contexts_created_total` | Counter | - | Contexts allocated by the pool |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Dispatch counter name.
pub const DISPATCH_TOTAL: &str = "galley_dispatch_total";

/// Dispatch latency histogram name.
pub const DISPATCH_DURATION_SECONDS: &str = "galley_dispatch_duration_seconds";

/// Pool allocation counter name.
pub const POOL_CONTEXTS_CREATED_TOTAL: &str = "galley_pool_contexts_created_total";

/// Registers descriptions for the standard metrics with the installed
/// recorder. Call after installing one.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total number of dispatched requests by outcome");
    describe_histogram!(
        DISPATCH_DURATION_SECONDS,
        "Time from route resolution to chain completion in seconds"
    );
    describe_counter!(
        POOL_CONTEXTS_CREATED_TOTAL,
        "Dispatch contexts allocated because the pool was empty"
    );
}

/// Records a completed dispatch.
///
/// `outcome` is one of `matched`, `not_found` or `method_not_allowed`.
pub fn record_dispatch(outcome: &'static str, duration: Duration) {
    counter!(DISPATCH_TOTAL, "outcome" => outcome).increment(1);
    histogram!(DISPATCH_DURATION_SECONDS, "outcome" => outcome).record(duration.as_secs_f64());
}

/// Records a pool allocation.
pub fn record_context_created() {
    counter!(POOL_CONTEXTS_CREATED_TOTAL).increment(1);
}
