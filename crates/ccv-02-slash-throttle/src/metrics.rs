//! # Slash Throttle Metrics
//!
//! Prometheus metrics for monitoring throttling behavior.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ccv-02-slash-throttle = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `slash_packets_total` - Counter of slash packets processed (by result)
//! - `slash_meter` - Gauge of the current slash meter value

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_int_gauge, CounterVec, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Slash packets processed, labeled by result
    pub static ref SLASH_PACKETS: CounterVec = register_counter_vec!(
        "slash_packets_total",
        "Total number of slash packets processed",
        &["result"]
    )
    .expect("Failed to create SLASH_PACKETS metric");

    /// Current slash meter value
    pub static ref SLASH_METER: IntGauge = register_int_gauge!(
        "slash_meter",
        "Current slash meter value"
    )
    .expect("Failed to create SLASH_METER metric");
}

/// Record a processed slash packet with its result
#[cfg(feature = "metrics")]
pub fn record_slash_packet(result: &str) {
    SLASH_PACKETS.with_label_values(&[result]).inc();
}

/// Update the slash meter gauge
#[cfg(feature = "metrics")]
pub fn set_slash_meter(value: i64) {
    SLASH_METER.set(value);
}

#[cfg(not(feature = "metrics"))]
pub fn record_slash_packet(_result: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_slash_meter(_value: i64) {}
