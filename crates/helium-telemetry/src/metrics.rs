//! Prometheus metrics for the Helium market maker.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error that must surface at
//! startup. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, register_int_gauge, CounterVec,
    Encoder, Gauge, IntCounter, IntGauge, TextEncoder,
};

use crate::error::TelemetryResult;

/// Order requests handed to the transport.
/// Labels: side (buy/sell), purpose (quote/cycle/flatten)
pub static ORDERS_REQUESTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helium_orders_requested_total",
        "Total order requests handed to the transport",
        &["side", "purpose"]
    )
    .unwrap()
});

/// Cancel requests handed to the transport.
pub static CANCELS_REQUESTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "helium_cancels_requested_total",
        "Total cancel requests handed to the transport"
    )
    .unwrap()
});

/// Placement failures reported by the transport.
pub static PLACE_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "helium_place_failed_total",
        "Total order placement failures"
    )
    .unwrap()
});

/// Fills received.
/// Labels: side (buy/sell), kind (partial/complete)
pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helium_fills_total",
        "Total fills received",
        &["side", "kind"]
    )
    .unwrap()
});

/// Transitions into lockdown.
/// Labels: reason (max_distance/stop_loss/volatility/manual)
pub static LOCKDOWN_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helium_lockdown_total",
        "Total transitions into lockdown",
        &["reason"]
    )
    .unwrap()
});

/// Risk breaches, including repeats while already locked down.
/// Labels: reason
pub static LOCKDOWN_TRIGGERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helium_lockdown_triggers_total",
        "Total lockdown triggers including repeats",
        &["reason"]
    )
    .unwrap()
});

/// Net position in base units.
pub static POSITION: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("helium_position", "Net position in base units").unwrap());

/// Realized plus unrealized profit/loss in quote units.
pub static PROFIT_LOSS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "helium_profit_loss",
        "Realized plus unrealized profit/loss"
    )
    .unwrap()
});

/// Strategy state (0=disabled, 1=enabled, 2=locked down).
pub static STRATEGY_STATE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "helium_strategy_state",
        "Strategy state (0=disabled, 1=enabled, 2=locked down)"
    )
    .unwrap()
});

/// Last hourly volatility reading.
pub static HOURLY_VOLATILITY: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "helium_hourly_volatility",
        "Last hourly volatility reading"
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn order_requested(side: &str, purpose: &str) {
        ORDERS_REQUESTED_TOTAL
            .with_label_values(&[side, purpose])
            .inc();
    }

    pub fn cancel_requested() {
        CANCELS_REQUESTED_TOTAL.inc();
    }

    pub fn place_failed() {
        PLACE_FAILED_TOTAL.inc();
    }

    pub fn fill(side: &str, kind: &str) {
        FILLS_TOTAL.with_label_values(&[side, kind]).inc();
    }

    pub fn lockdown(reason: &str) {
        LOCKDOWN_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn lockdown_triggered(reason: &str) {
        LOCKDOWN_TRIGGERS_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn set_position(position: f64) {
        POSITION.set(position);
    }

    pub fn set_profit_loss(pnl: f64) {
        PROFIT_LOSS.set(pnl);
    }

    pub fn set_strategy_state(code: i64) {
        STRATEGY_STATE.set(code);
    }

    pub fn set_hourly_volatility(vol: f64) {
        HOURLY_VOLATILITY.set(vol);
    }

    /// Render the default registry in Prometheus text format.
    pub fn encode() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
