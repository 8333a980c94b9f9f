//! The Helium strategy.
//!
//! Owns the book view, the order transport, the ledger and the risk guard,
//! and ties them together:
//!
//! - [`Helium::update`] runs on every book change: quote, then risk checks.
//! - [`OrderLifecycle`] callbacks keep the ledger current and cycle every
//!   filled bid unit into an ask at `fill_price + spread`.
//! - [`RiskPolicy`] handles lockdown and the periodic PnL recomputation.
//!
//! Everything runs on one logical thread; no method blocks.

use helium_core::{
    Book, Order, OrderId, OrderSide, OrderTransport, OrderType, Price, Size, VolatilityMonitor,
};
use helium_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::QuoteParams;
use crate::error::MmResult;
use crate::ledger::{Fill, Ledger};
use crate::lifecycle::OrderLifecycle;
use crate::quote_engine::compute_quote;
use crate::risk::{
    distance_breached, stop_loss_breached, volatility_breached, LockdownReason, RiskGuard,
    RiskPolicy, StrategyState,
};
use crate::timer::{TimerScheduler, TimerTask};

/// Single-market quoting strategy.
pub struct Helium<B, T> {
    params: QuoteParams,
    book: B,
    transport: T,
    volmonitor: Option<Box<dyn VolatilityMonitor>>,
    ledger: Ledger,
    risk: RiskGuard,
    /// Half-spread from the last quoting pass; used to price cycle asks.
    spread: Option<Price>,
}

impl<B: Book, T: OrderTransport> Helium<B, T> {
    pub fn new(params: QuoteParams, book: B, transport: T) -> MmResult<Self> {
        params.validate()?;
        Metrics::set_strategy_state(StrategyState::Disabled.code());
        Ok(Self {
            params,
            book,
            transport,
            volmonitor: None,
            ledger: Ledger::new(),
            risk: RiskGuard::new(),
            spread: None,
        })
    }

    /// Attach a volatility monitor; the volatility check runs only with one.
    #[must_use]
    pub fn with_volatility_monitor(mut self, monitor: Box<dyn VolatilityMonitor>) -> Self {
        self.volmonitor = Some(monitor);
        self
    }

    pub fn params(&self) -> &QuoteParams {
        &self.params
    }

    pub fn book(&self) -> &B {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut B {
        &mut self.book
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn profit_loss(&self) -> Decimal {
        self.risk.profit_loss()
    }

    pub fn lockdown_reason(&self) -> Option<&LockdownReason> {
        self.risk.lockdown_reason()
    }

    /// Half-spread from the last quoting pass.
    pub fn half_spread(&self) -> Option<Price> {
        self.spread
    }

    /// Start quoting. Refused once locked down.
    pub fn enable(&mut self) -> bool {
        let enabled = self.risk.enable();
        Metrics::set_strategy_state(self.risk.state().code());
        enabled
    }

    /// Stop quoting without locking down.
    pub fn disable(&mut self) {
        self.risk.disable();
        Metrics::set_strategy_state(self.risk.state().code());
    }

    /// Run a deferred task.
    pub fn on_timer(&mut self, task: TimerTask, timers: &mut dyn TimerScheduler) {
        match task {
            TimerTask::Enable => {
                self.enable();
            }
            TimerTask::ComputePnl => {
                self.compute_pnl(timers);
            }
        }
    }

    /// Feed the top-of-book mid to the volatility monitor, if any.
    ///
    /// Runs in every state so the estimator warms up before quoting starts.
    pub fn observe_market(&mut self, now_ms: u64) {
        let Some(monitor) = self.volmonitor.as_deref_mut() else {
            return;
        };
        if let (Some(bid), Some(ask)) = (self.book.best_bid(), self.book.best_ask()) {
            monitor.observe_mid(Price::midpoint(bid, ask), now_ms);
        }
    }

    /// Quote against the current book, then run the risk checks.
    ///
    /// No-op unless enabled.
    pub fn update(&mut self) {
        if !self.risk.is_enabled() {
            return;
        }

        let position = self.ledger.position();
        let outstanding = self.ledger.outstanding_bid_size();
        match compute_quote(
            &self.book,
            self.params.trade_size,
            self.params.spread_factor,
            outstanding,
            position,
        ) {
            Some(quote) => {
                self.spread = Some(quote.half_spread);
                if self.params.debug {
                    debug!(
                        ask_vwap = %quote.fair.ask_vwap,
                        bid_vwap = %quote.fair.bid_vwap,
                        mid = %quote.mid,
                        half_spread = %quote.half_spread,
                        outstanding_bids = %outstanding,
                        position = %position,
                        "Quote computed"
                    );
                }

                if let Some(bid) = quote.bid {
                    self.submit(OrderSide::Buy, bid.size, bid.price, "quote");
                }
                self.check_distance(quote.mid);
            }
            // Distance needs a mid; the other checks still run
            None => debug!("Book is not two-sided, skipping quote"),
        }

        self.check_stop_loss();
        self.check_volatility();
    }

    fn check_distance(&mut self, mid: Price) {
        let Some(ask) = self.ledger.oldest_ask().map(|o| o.price) else {
            return;
        };
        if distance_breached(ask, mid, self.params.max_distance) {
            self.lockdown(LockdownReason::MaxDistance { ask, mid });
        }
    }

    fn check_stop_loss(&mut self) {
        let Some(stop) = self.params.active_stop_loss() else {
            return;
        };
        let profit_loss = self.risk.profit_loss();
        if stop_loss_breached(profit_loss, stop) {
            self.lockdown(LockdownReason::StopLoss {
                threshold: stop,
                profit_loss,
            });
        }
    }

    fn check_volatility(&mut self) {
        let Some(volatility) = self.volmonitor.as_deref().map(|m| m.hourly_volatility()) else {
            return;
        };
        Metrics::set_hourly_volatility(volatility);
        if volatility_breached(volatility, self.params.vol_thresh) {
            self.lockdown(LockdownReason::ExcessiveVolatility { volatility });
        }
    }

    fn dumping(&self) -> bool {
        self.params.dump_on_lockdown && self.risk.is_locked_down()
    }

    fn submit(&mut self, side: OrderSide, size: Size, price: Price, purpose: &'static str) {
        self.ledger.record_submitted(side, size, price);
        match side {
            OrderSide::Buy => self.transport.submit_bid(size, price),
            OrderSide::Sell => self.transport.submit_ask(size, price),
        }
        Metrics::order_requested(&side.to_string(), purpose);
        info!(side = %side, size = %size, price = %price, purpose, "Order requested");
    }

    fn request_cancel(&mut self, oid: &OrderId) {
        self.transport.cancel(oid);
        Metrics::cancel_requested();
        info!(oid = %oid, "Cancel requested");
    }

    /// Sell `size` at the best bid less the flatten slippage.
    fn flatten(&mut self, size: Size) {
        let Some(bid) = self.book.best_bid() else {
            warn!(size = %size, "No bid to flatten against, position left open");
            return;
        };
        let price = bid.shifted_bps(-self.params.flatten_slippage_bps);
        self.submit(OrderSide::Sell, size, price, "flatten");
    }

    /// Cancel everything resting and flatten a long position.
    fn dump(&mut self) {
        let oids: Vec<OrderId> = self.ledger.orders().iter().map(|o| o.oid.clone()).collect();
        for oid in &oids {
            self.request_cancel(oid);
        }

        // Asks still in flight will rest and sell part of the position
        let pending_asks: Decimal = self
            .ledger
            .in_flight()
            .iter()
            .filter(|p| p.side == OrderSide::Sell)
            .map(|p| p.size.inner())
            .sum();
        let exposure = self.ledger.position() - pending_asks;
        if exposure > Decimal::ZERO {
            self.flatten(Size::new(exposure));
        } else if self.ledger.position() < Decimal::ZERO {
            warn!(
                position = %self.ledger.position(),
                "Short position left open on lockdown"
            );
        }
    }

    /// Strategy hook for a filled bid unit.
    fn on_buy_fill(&mut self, fill: &Fill) {
        if self.dumping() {
            self.flatten(fill.size);
            return;
        }
        let spread = self.spread.unwrap_or_else(|| {
            warn!(oid = %fill.oid, "No half-spread computed yet, cycling at fill price");
            Price::ZERO
        });
        self.submit(OrderSide::Sell, fill.size, fill.price + spread, "cycle");
    }

    fn record_fill(&mut self, fill: &Fill, kind: &str) {
        Metrics::fill(&fill.side.to_string(), kind);
        Metrics::set_position(self.ledger.position().to_f64().unwrap_or(0.0));
        info!(
            oid = %fill.oid,
            side = %fill.side,
            price = %fill.price,
            size = %fill.size,
            kind,
            position = %self.ledger.position(),
            "Order filled"
        );
        if fill.side == OrderSide::Buy {
            self.on_buy_fill(fill);
        }
    }
}

impl<B: Book, T: OrderTransport> OrderLifecycle for Helium<B, T> {
    fn on_place(
        &mut self,
        oid: OrderId,
        side: OrderSide,
        price: Price,
        size: Size,
        order_type: OrderType,
    ) {
        self.ledger
            .record_placed(Order::new(oid.clone(), side, price, size, order_type));
        info!(oid = %oid, side = %side, price = %price, size = %size, order_type = %order_type, "Order placed");

        if side == OrderSide::Buy && self.dumping() {
            warn!(oid = %oid, "Bid acknowledged after lockdown, cancelling");
            self.request_cancel(&oid);
        }
    }

    fn on_place_fail(&mut self, side: OrderSide, size: Size, price: Price, reason: &str) {
        self.ledger.record_place_failed(side, size, price);
        Metrics::place_failed();
        warn!(side = %side, size = %size, price = %price, reason, "Order placement failed");
    }

    fn on_partial_fill(&mut self, oid: &OrderId, remaining: Size) {
        match self.ledger.record_partial_fill(oid, remaining) {
            Some(fill) => self.record_fill(&fill, "partial"),
            None => debug!(oid = %oid, remaining = %remaining, "Partial fill ignored"),
        }
    }

    fn on_complete_fill(&mut self, oid: &OrderId) {
        match self.ledger.record_complete_fill(oid) {
            Some(fill) => self.record_fill(&fill, "complete"),
            None => debug!(oid = %oid, "Fill for unknown order ignored"),
        }
    }

    fn on_cancel(&mut self, oid: &OrderId) {
        match self.ledger.record_cancelled(oid) {
            Some(order) => info!(oid = %oid, side = %order.side, size = %order.size, "Order cancelled"),
            None => debug!(oid = %oid, "Cancel for unknown order ignored"),
        }
    }
}

impl<B: Book, T: OrderTransport> RiskPolicy for Helium<B, T> {
    fn state(&self) -> StrategyState {
        self.risk.state()
    }

    fn lockdown(&mut self, reason: LockdownReason) {
        let label = reason.label();
        Metrics::lockdown_triggered(label);
        if !self.risk.lockdown(reason) {
            return;
        }
        Metrics::lockdown(label);
        Metrics::set_strategy_state(self.risk.state().code());
        if self.params.dump_on_lockdown {
            self.dump();
        }
    }

    fn compute_pnl(&mut self, timers: &mut dyn TimerScheduler) -> Decimal {
        let unrealized = self
            .ledger
            .unrealized_pnl(self.book.best_bid(), self.book.best_ask());
        let realized = self.ledger.realized_pnl();
        let profit_loss = realized + unrealized;

        self.risk.set_profit_loss(profit_loss);
        Metrics::set_profit_loss(profit_loss.to_f64().unwrap_or(0.0));
        info!(
            profit_loss = %profit_loss,
            realized = %realized,
            unrealized = %unrealized,
            position = %self.ledger.position(),
            "Profit/loss"
        );

        self.check_stop_loss();

        if let Some(interval) = self.params.track_pnl_interval() {
            timers.run_after(interval, TimerTask::ComputePnl);
        }
        profit_loss
    }
}
