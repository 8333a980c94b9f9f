//! Collaborator interfaces consumed by the strategy.
//!
//! All calls are synchronous and must not block: the strategy runs on a
//! single cooperative thread, so a transport hands requests off and reports
//! their outcome later as an [`OrderEvent`](crate::OrderEvent).

use rust_decimal::Decimal;

use crate::error::BookError;
use crate::order::OrderId;
use crate::{Price, Size};

/// Read access to an aggregated order book.
pub trait Book {
    /// Volume-weighted price to execute `signed_size` against the book.
    ///
    /// Positive sizes walk the asks (a buy), negative sizes walk the bids.
    /// Fails with [`BookError::InsufficientDepth`] if the side is too thin.
    fn vwap(&self, signed_size: Decimal) -> Result<Price, BookError>;

    /// Best (lowest) ask price, if any.
    fn best_ask(&self) -> Option<Price>;

    /// Best (highest) bid price, if any.
    fn best_bid(&self) -> Option<Price>;
}

/// Realized volatility estimate.
pub trait VolatilityMonitor {
    /// Volatility scaled to a one-hour horizon.
    fn hourly_volatility(&self) -> f64;

    /// Feed a fresh mid price observed at `now_ms`.
    fn observe_mid(&mut self, _mid: Price, _now_ms: u64) {}
}

/// Non-blocking order submission.
pub trait OrderTransport {
    fn submit_bid(&mut self, size: Size, price: Price);

    fn submit_ask(&mut self, size: Size, price: Price);

    fn cancel(&mut self, oid: &OrderId);
}
