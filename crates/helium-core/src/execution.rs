//! Messages exchanged between the strategy and an order transport.

use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderId, OrderSide};
use crate::{Price, Size};

/// Request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderRequest {
    Place {
        side: OrderSide,
        size: Size,
        price: Price,
    },
    Cancel {
        oid: OrderId,
    },
}

impl OrderRequest {
    pub fn bid(size: Size, price: Price) -> Self {
        Self::Place {
            side: OrderSide::Buy,
            size,
            price,
        }
    }

    pub fn ask(size: Size, price: Price) -> Self {
        Self::Place {
            side: OrderSide::Sell,
            size,
            price,
        }
    }
}

/// Outcome reported back by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderEvent {
    /// Order acknowledged and resting.
    Placed { order: Order },
    /// Placement rejected; echoes the request.
    PlaceFailed {
        side: OrderSide,
        size: Size,
        price: Price,
        reason: String,
    },
    /// Order partially filled; `remaining` is still resting.
    PartiallyFilled { oid: OrderId, remaining: Size },
    /// Order completely filled.
    Filled { oid: OrderId },
    /// Order cancelled.
    Cancelled { oid: OrderId },
}
