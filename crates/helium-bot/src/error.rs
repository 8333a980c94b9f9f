//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] helium_mm::MmError),

    #[error("Book error: {0}")]
    Book(#[from] helium_core::CoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] helium_telemetry::TelemetryError),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
