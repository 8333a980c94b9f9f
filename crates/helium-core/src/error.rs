//! Error types for helium-core.

use thiserror::Error;

use crate::Size;

/// Errors raised by a `Book` collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// The book side does not hold enough size to price the request.
    #[error("Insufficient depth: requested {requested}, available {available}")]
    InsufficientDepth { requested: Size, available: Size },

    /// The book side is empty.
    #[error("Empty book side")]
    EmptySide,
}

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error(transparent)]
    Book(#[from] BookError),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
