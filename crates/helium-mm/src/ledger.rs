//! Position and order ledger.
//!
//! Tracks resting orders in acknowledgment order, placements still in
//! flight to the transport, and the net position with average entry price
//! and realized PnL.

use helium_core::{Order, OrderId, OrderSide, Price, Size};
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use tracing::debug;

/// A placement handed to the transport but not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub side: OrderSide,
    pub size: Size,
    pub price: Price,
}

/// A fill applied to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub oid: OrderId,
    pub side: OrderSide,
    /// Limit price of the filled order.
    pub price: Price,
    /// Quantity filled by this event.
    pub size: Size,
}

/// Single-market ledger owned by the strategy.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Resting orders, oldest acknowledgment first.
    orders: Vec<Order>,
    in_flight: Vec<InFlight>,
    /// Net position (positive = long, negative = short).
    net_size: Decimal,
    /// Average entry price of the current position.
    avg_entry: Decimal,
    realized_pnl: Decimal,
    fill_count: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a placement request handed to the transport.
    pub fn record_submitted(&mut self, side: OrderSide, size: Size, price: Price) {
        self.in_flight.push(InFlight { side, size, price });
    }

    /// Record an acknowledged order.
    pub fn record_placed(&mut self, order: Order) {
        self.release_in_flight(order.side, order.size, order.price);
        self.orders.push(order);
    }

    /// Release the in-flight entry of a rejected placement.
    pub fn record_place_failed(&mut self, side: OrderSide, size: Size, price: Price) {
        self.release_in_flight(side, size, price);
    }

    /// Apply a partial fill. Returns the quantity filled by this event.
    ///
    /// Events that do not shrink the order (duplicates, unknown ids) are
    /// ignored.
    pub fn record_partial_fill(&mut self, oid: &OrderId, remaining: Size) -> Option<Fill> {
        let order = self.orders.iter_mut().find(|o| &o.oid == oid)?;
        if remaining >= order.size {
            debug!(oid = %oid, remaining = %remaining, size = %order.size, "Ignoring non-reducing partial fill");
            return None;
        }
        let filled = order.size - remaining;
        order.size = remaining;
        let fill = Fill {
            oid: order.oid.clone(),
            side: order.side,
            price: order.price,
            size: filled,
        };
        self.apply_fill(fill.side, fill.price, fill.size);
        Some(fill)
    }

    /// Apply a complete fill of whatever size is still resting.
    pub fn record_complete_fill(&mut self, oid: &OrderId) -> Option<Fill> {
        let order = self.take(oid)?;
        let fill = Fill {
            oid: order.oid,
            side: order.side,
            price: order.price,
            size: order.size,
        };
        self.apply_fill(fill.side, fill.price, fill.size);
        Some(fill)
    }

    /// Remove a cancelled order.
    pub fn record_cancelled(&mut self, oid: &OrderId) -> Option<Order> {
        self.take(oid)
    }

    /// Resting plus in-flight bid size: what the quote engine compares
    /// against the target.
    pub fn outstanding_bid_size(&self) -> Size {
        let resting: Size = self
            .orders
            .iter()
            .filter(|o| o.side == OrderSide::Buy)
            .map(|o| o.size)
            .sum();
        let pending: Size = self
            .in_flight
            .iter()
            .filter(|p| p.side == OrderSide::Buy)
            .map(|p| p.size)
            .sum();
        resting + pending
    }

    /// Resting (bid, ask) size.
    pub fn open_size(&self) -> (Size, Size) {
        self.orders
            .iter()
            .fold((Size::ZERO, Size::ZERO), |(bids, asks), o| match o.side {
                OrderSide::Buy => (bids + o.size, asks),
                OrderSide::Sell => (bids, asks + o.size),
            })
    }

    /// Oldest resting ask.
    pub fn oldest_ask(&self) -> Option<&Order> {
        self.orders.iter().find(|o| o.side == OrderSide::Sell)
    }

    pub fn get(&self, oid: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.oid == oid)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn in_flight(&self) -> &[InFlight] {
        &self.in_flight
    }

    pub fn position(&self) -> Decimal {
        self.net_size
    }

    pub fn avg_entry(&self) -> Decimal {
        self.avg_entry
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn fill_count(&self) -> u64 {
        self.fill_count
    }

    /// Mark-to-market value of the open position.
    ///
    /// Longs are marked at the best bid and shorts at the best ask, the
    /// prices the position could be closed at. A missing side marks nothing.
    pub fn unrealized_pnl(&self, best_bid: Option<Price>, best_ask: Option<Price>) -> Decimal {
        if self.net_size > Decimal::ZERO {
            best_bid
                .map(|bid| (bid.inner() - self.avg_entry) * self.net_size)
                .unwrap_or(Decimal::ZERO)
        } else if self.net_size < Decimal::ZERO {
            best_ask
                .map(|ask| (self.avg_entry - ask.inner()) * self.net_size.abs())
                .unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }

    fn take(&mut self, oid: &OrderId) -> Option<Order> {
        let idx = self.orders.iter().position(|o| &o.oid == oid)?;
        Some(self.orders.remove(idx))
    }

    /// Drop the in-flight entry matching an acknowledgment or rejection.
    ///
    /// Exact matches win; otherwise the oldest entry on the same side is
    /// released, since venues may round price or size.
    fn release_in_flight(&mut self, side: OrderSide, size: Size, price: Price) {
        let idx = self
            .in_flight
            .iter()
            .position(|p| p.side == side && p.size == size && p.price == price)
            .or_else(|| self.in_flight.iter().position(|p| p.side == side));
        if let Some(idx) = idx {
            self.in_flight.remove(idx);
        }
    }

    fn apply_fill(&mut self, side: OrderSide, price: Price, size: Size) {
        let fill_size = size.inner();
        let fill_price = price.inner();
        let signed_size = fill_size * Decimal::from(side.sign());

        let old_size = self.net_size;
        let new_size = old_size + signed_size;

        // Reducing an existing position realizes PnL on the reduced amount
        if (old_size > Decimal::ZERO && signed_size < Decimal::ZERO)
            || (old_size < Decimal::ZERO && signed_size > Decimal::ZERO)
        {
            let reduce_amount = signed_size.abs().min(old_size.abs());
            let pnl = if old_size > Decimal::ZERO {
                (fill_price - self.avg_entry) * reduce_amount
            } else {
                (self.avg_entry - fill_price) * reduce_amount
            };
            self.realized_pnl += pnl;
        }

        if new_size.is_zero() {
            self.avg_entry = Decimal::ZERO;
        } else if !old_size.is_zero() && new_size.signum() != old_size.signum() {
            // Flipped through zero: the residual was opened at this fill
            self.avg_entry = fill_price;
        } else if old_size.is_zero() || new_size.signum() == signed_size.signum() {
            let old_notional = old_size.abs() * self.avg_entry;
            let new_notional = fill_size * fill_price;
            self.avg_entry = (old_notional + new_notional) / new_size.abs();
        }

        self.net_size = new_size;
        self.fill_count += 1;
    }
}
