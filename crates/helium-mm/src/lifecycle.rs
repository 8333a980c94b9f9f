//! Order lifecycle callbacks.

use helium_core::{OrderEvent, OrderId, OrderSide, OrderType, Price, Size};

/// Reactions to transport events.
///
/// Implementors apply the shared ledger bookkeeping first and run their
/// own strategy hook after it.
pub trait OrderLifecycle {
    /// A placement was acknowledged and is resting.
    fn on_place(
        &mut self,
        oid: OrderId,
        side: OrderSide,
        price: Price,
        size: Size,
        order_type: OrderType,
    );

    /// A placement was rejected. Not retried.
    fn on_place_fail(&mut self, side: OrderSide, size: Size, price: Price, reason: &str);

    /// `remaining` is the size still resting after this fill.
    fn on_partial_fill(&mut self, oid: &OrderId, remaining: Size);

    fn on_complete_fill(&mut self, oid: &OrderId);

    fn on_cancel(&mut self, oid: &OrderId);

    /// Dispatch a transport event to the matching callback.
    fn on_order_event(&mut self, event: OrderEvent) {
        match event {
            OrderEvent::Placed { order } => {
                self.on_place(order.oid, order.side, order.price, order.size, order.order_type)
            }
            OrderEvent::PlaceFailed {
                side,
                size,
                price,
                reason,
            } => self.on_place_fail(side, size, price, &reason),
            OrderEvent::PartiallyFilled { oid, remaining } => self.on_partial_fill(&oid, remaining),
            OrderEvent::Filled { oid } => self.on_complete_fill(&oid),
            OrderEvent::Cancelled { oid } => self.on_cancel(&oid),
        }
    }
}
