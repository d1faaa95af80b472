//! # Key Assignment Metrics
//!
//! Prometheus metrics for monitoring key assignment activity.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ccv-01-key-assignment = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `key_assignments_total` - Counter of successful key assignments
//! - `key_assignments_rejected_total` - Counter of rejected assignments (by reason)
//! - `key_assignment_pruned_addresses_total` - Counter of pruned reverse-lookup entries

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total successful key assignments
    pub static ref KEY_ASSIGNMENTS: IntCounter = register_int_counter!(
        "key_assignments_total",
        "Total number of successful consumer key assignments"
    )
    .expect("Failed to create KEY_ASSIGNMENTS metric");

    /// Total rejected assignments, labeled by reason
    pub static ref ASSIGNMENTS_REJECTED: CounterVec = register_counter_vec!(
        "key_assignments_rejected_total",
        "Total number of rejected consumer key assignments",
        &["reason"]
    )
    .expect("Failed to create ASSIGNMENTS_REJECTED metric");

    /// Total pruned reverse-lookup entries
    pub static ref PRUNED_ADDRESSES: IntCounter = register_int_counter!(
        "key_assignment_pruned_addresses_total",
        "Total number of pruned reverse-lookup entries"
    )
    .expect("Failed to create PRUNED_ADDRESSES metric");
}

/// Record a successful key assignment
#[cfg(feature = "metrics")]
pub fn record_assignment() {
    KEY_ASSIGNMENTS.inc();
}

/// Record a rejected key assignment with reason
#[cfg(feature = "metrics")]
pub fn record_assignment_rejected(reason: &str) {
    ASSIGNMENTS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record pruned reverse-lookup entries
#[cfg(feature = "metrics")]
pub fn record_pruned_addresses(count: u64) {
    PRUNED_ADDRESSES.inc_by(count);
}

#[cfg(not(feature = "metrics"))]
pub fn record_assignment() {}

#[cfg(not(feature = "metrics"))]
pub fn record_assignment_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_pruned_addresses(_count: u64) {}
