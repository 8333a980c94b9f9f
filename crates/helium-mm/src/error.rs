//! Strategy error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MmError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type MmResult<T> = Result<T, MmError>;
