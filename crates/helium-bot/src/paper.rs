//! Paper trading: a channel-backed transport and a simulated exchange.
//!
//! The strategy submits through [`ChannelTransport`] without blocking; the
//! application loop drains the channel into [`PaperExchange`], which
//! acknowledges requests, matches resting orders against the replayed book
//! and reports [`OrderEvent`]s back to the strategy.

use helium_core::{
    Order, OrderEvent, OrderId, OrderRequest, OrderSide, OrderTransport, OrderType, Price, Size,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::book::LadderBook;

/// Hands order requests to the application loop.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OrderRequest>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OrderRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, request: OrderRequest) {
        if let Err(e) = self.tx.send(request) {
            warn!(request = ?e.0, "Order channel closed, request dropped");
        }
    }
}

impl OrderTransport for ChannelTransport {
    fn submit_bid(&mut self, size: Size, price: Price) {
        self.send(OrderRequest::bid(size, price));
    }

    fn submit_ask(&mut self, size: Size, price: Price) {
        self.send(OrderRequest::ask(size, price));
    }

    fn cancel(&mut self, oid: &OrderId) {
        self.send(OrderRequest::Cancel { oid: oid.clone() });
    }
}

/// Simulated venue for a single market.
///
/// Resting bids fill when the best ask trades at or through them, resting
/// asks when the best bid does. Each pass may take at most
/// `max_fill_fraction` of the touching level, shared across orders in
/// acknowledgment order.
#[derive(Debug)]
pub struct PaperExchange {
    max_fill_fraction: Decimal,
    resting: Vec<Order>,
}

impl PaperExchange {
    pub fn new(max_fill_fraction: f64) -> Self {
        Self {
            max_fill_fraction: Decimal::from_f64(max_fill_fraction).unwrap_or(Decimal::ONE),
            resting: Vec::new(),
        }
    }

    pub fn resting(&self) -> &[Order] {
        &self.resting
    }

    /// Execute a request; fills caused by a crossing placement are
    /// reported right after its acknowledgment.
    pub fn handle(&mut self, request: OrderRequest, book: &LadderBook) -> Vec<OrderEvent> {
        match request {
            OrderRequest::Place { side, size, price } => {
                if !size.is_positive() || !price.is_positive() {
                    warn!(side = %side, size = %size, price = %price, "Paper exchange rejected order");
                    return vec![OrderEvent::PlaceFailed {
                        side,
                        size,
                        price,
                        reason: format!("invalid order: {size} @ {price}"),
                    }];
                }
                let order = Order::new(OrderId::generate(), side, price, size, OrderType::Limit);
                debug!(oid = %order.oid, side = %side, size = %size, price = %price, "Paper order resting");
                self.resting.push(order.clone());

                let mut events = vec![OrderEvent::Placed { order }];
                events.extend(self.match_book(book));
                events
            }
            OrderRequest::Cancel { oid } => {
                match self.resting.iter().position(|o| o.oid == oid) {
                    Some(idx) => {
                        self.resting.remove(idx);
                        vec![OrderEvent::Cancelled { oid }]
                    }
                    None => {
                        debug!(oid = %oid, "Cancel for order no longer resting");
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Match resting orders against the current top of book.
    pub fn match_book(&mut self, book: &LadderBook) -> Vec<OrderEvent> {
        let mut events = Vec::new();

        if let Some((ask_px, ask_sz)) = book.best_ask_level() {
            let available = ask_sz.inner() * self.max_fill_fraction;
            self.fill_side(OrderSide::Buy, |px| px >= ask_px, available, &mut events);
        }
        if let Some((bid_px, bid_sz)) = book.best_bid_level() {
            let available = bid_sz.inner() * self.max_fill_fraction;
            self.fill_side(OrderSide::Sell, |px| px <= bid_px, available, &mut events);
        }

        self.resting.retain(|o| !o.size.is_zero());
        events
    }

    fn fill_side(
        &mut self,
        side: OrderSide,
        crosses: impl Fn(Price) -> bool,
        mut available: Decimal,
        events: &mut Vec<OrderEvent>,
    ) {
        for order in self
            .resting
            .iter_mut()
            .filter(|o| o.side == side && !o.size.is_zero())
        {
            if available <= Decimal::ZERO {
                break;
            }
            if !crosses(order.price) {
                continue;
            }
            let fill = order.size.inner().min(available);
            available -= fill;
            order.size = Size::new(order.size.inner() - fill);

            info!(oid = %order.oid, side = %side, price = %order.price, size = %fill, "Paper fill");
            if order.size.is_zero() {
                events.push(OrderEvent::Filled {
                    oid: order.oid.clone(),
                });
            } else {
                events.push(OrderEvent::PartiallyFilled {
                    oid: order.oid.clone(),
                    remaining: order.size,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book(bid: Decimal, bid_sz: Decimal, ask: Decimal, ask_sz: Decimal) -> LadderBook {
        let mut book = LadderBook::new();
        book.replace(
            &[(Price::new(bid), Size::new(bid_sz))],
            &[(Price::new(ask), Size::new(ask_sz))],
        )
        .unwrap();
        book
    }

    fn placed_oid(events: &[OrderEvent]) -> OrderId {
        match &events[0] {
            OrderEvent::Placed { order } => order.oid.clone(),
            other => panic!("expected Placed, got {other:?}"),
        }
    }

    #[test]
    fn test_channel_transport_forwards_requests() {
        let (mut transport, mut rx) = ChannelTransport::new();
        transport.submit_bid(Size::new(dec!(1)), Price::new(dec!(99)));
        transport.cancel(&OrderId::from("x"));
        assert_eq!(
            rx.try_recv().unwrap(),
            OrderRequest::bid(Size::new(dec!(1)), Price::new(dec!(99)))
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            OrderRequest::Cancel {
                oid: OrderId::from("x")
            }
        );
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (mut transport, rx) = ChannelTransport::new();
        drop(rx);
        transport.submit_ask(Size::new(dec!(1)), Price::new(dec!(101)));
    }

    #[test]
    fn test_passive_bid_rests() {
        let mut exchange = PaperExchange::new(0.5);
        let book = book(dec!(99), dec!(10), dec!(101), dec!(10));
        let events = exchange.handle(
            OrderRequest::bid(Size::new(dec!(5)), Price::new(dec!(99.5))),
            &book,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(exchange.resting().len(), 1);
    }

    #[test]
    fn test_bid_fills_when_ask_trades_through() {
        let mut exchange = PaperExchange::new(0.5);
        let events = exchange.handle(
            OrderRequest::bid(Size::new(dec!(5)), Price::new(dec!(99.5))),
            &book(dec!(99), dec!(10), dec!(101), dec!(10)),
        );
        let oid = placed_oid(&events);

        // 0.5 * 6 = 3 available at the touch
        let events = exchange.match_book(&book(dec!(98), dec!(10), dec!(99.4), dec!(6)));
        assert_eq!(
            events,
            vec![OrderEvent::PartiallyFilled {
                oid: oid.clone(),
                remaining: Size::new(dec!(2)),
            }]
        );

        let events = exchange.match_book(&book(dec!(98), dec!(10), dec!(99.4), dec!(6)));
        assert_eq!(events, vec![OrderEvent::Filled { oid }]);
        assert!(exchange.resting().is_empty());
    }

    #[test]
    fn test_crossing_ask_fills_on_placement() {
        let mut exchange = PaperExchange::new(1.0);
        let events = exchange.handle(
            OrderRequest::ask(Size::new(dec!(2)), Price::new(dec!(98.5))),
            &book(dec!(99), dec!(10), dec!(101), dec!(10)),
        );
        let oid = placed_oid(&events);
        assert_eq!(events[1], OrderEvent::Filled { oid });
        assert!(exchange.resting().is_empty());
    }

    #[test]
    fn test_depth_shared_in_ack_order() {
        let mut exchange = PaperExchange::new(1.0);
        let quiet = book(dec!(90), dec!(10), dec!(110), dec!(10));
        let first = placed_oid(&exchange.handle(
            OrderRequest::bid(Size::new(dec!(3)), Price::new(dec!(100))),
            &quiet,
        ));
        let second = placed_oid(&exchange.handle(
            OrderRequest::bid(Size::new(dec!(3)), Price::new(dec!(100))),
            &quiet,
        ));

        let events = exchange.match_book(&book(dec!(90), dec!(10), dec!(100), dec!(4)));
        assert_eq!(
            events,
            vec![
                OrderEvent::Filled { oid: first },
                OrderEvent::PartiallyFilled {
                    oid: second,
                    remaining: Size::new(dec!(2)),
                },
            ]
        );
    }

    #[test]
    fn test_cancel() {
        let mut exchange = PaperExchange::new(0.5);
        let book = book(dec!(99), dec!(10), dec!(101), dec!(10));
        let oid = placed_oid(&exchange.handle(
            OrderRequest::bid(Size::new(dec!(1)), Price::new(dec!(98))),
            &book,
        ));

        let events = exchange.handle(OrderRequest::Cancel { oid: oid.clone() }, &book);
        assert_eq!(events, vec![OrderEvent::Cancelled { oid: oid.clone() }]);
        assert!(exchange.handle(OrderRequest::Cancel { oid }, &book).is_empty());
    }

    #[test]
    fn test_rejects_zero_size() {
        let mut exchange = PaperExchange::new(0.5);
        let events = exchange.handle(
            OrderRequest::bid(Size::ZERO, Price::new(dec!(99))),
            &book(dec!(99), dec!(10), dec!(101), dec!(10)),
        );
        assert!(matches!(events[0], OrderEvent::PlaceFailed { .. }));
        assert!(exchange.resting().is_empty());
    }
}
