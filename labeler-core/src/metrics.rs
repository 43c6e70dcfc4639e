//! Prometheus metrics for the node labelers

use once_cell::sync::Lazy;
use prometheus::{opts, register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

/// Topology cycles by outcome (labeled, unavailable, malformed, patch_failed)
static TOPOLOGY_CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("labeler_topology_cycles_total", "Topology labeling cycles by outcome"),
        &["outcome"]
    )
    .expect("Failed to create topology_cycles metric")
});

/// Unix time of the last successful topology patch
static TOPOLOGY_LAST_SUCCESS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(opts!(
        "labeler_topology_last_success_timestamp_seconds",
        "Unix time of the last successful topology label patch"
    ))
    .expect("Failed to create topology_last_success metric")
});

/// Metrics registry wrapper
pub struct MetricsRegistry;

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Self {
        // Force initialization of lazy statics
        let _ = &*TOPOLOGY_CYCLES;
        let _ = &*TOPOLOGY_LAST_SUCCESS;
        Self
    }

    /// Count a topology cycle
    pub fn inc_topology_cycle(&self, outcome: &str) {
        TOPOLOGY_CYCLES.with_label_values(&[outcome]).inc();
    }

    /// Record a successful topology patch at `unix_secs`
    pub fn set_topology_last_success(&self, unix_secs: i64) {
        TOPOLOGY_LAST_SUCCESS.set(unix_secs);
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registry() {
        let registry = MetricsRegistry::new();
        let before = TOPOLOGY_CYCLES.with_label_values(&["test_outcome"]).get();

        registry.inc_topology_cycle("test_outcome");
        registry.set_topology_last_success(1_700_000_000);

        assert_eq!(
            TOPOLOGY_CYCLES.with_label_values(&["test_outcome"]).get(),
            before + 1
        );
        assert_eq!(TOPOLOGY_LAST_SUCCESS.get(), 1_700_000_000);
    }
}
