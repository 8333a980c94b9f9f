//! Core domain types for the Helium market maker.
//!
//! - `Price`, `Size`: precision-safe numeric types
//! - `Order`, `OrderSide`, `OrderType`, `OrderId`: order model
//! - `Book`, `VolatilityMonitor`, `OrderTransport`: collaborator interfaces
//! - `OrderRequest`, `OrderEvent`: transport messages

pub mod decimal;
pub mod error;
pub mod execution;
pub mod order;
pub mod traits;

pub use decimal::{Price, Size};
pub use error::{BookError, CoreError, Result};
pub use execution::{OrderEvent, OrderRequest};
pub use order::{Order, OrderId, OrderSide, OrderType};
pub use traits::{Book, OrderTransport, VolatilityMonitor};
