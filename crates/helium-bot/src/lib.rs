//! Helium market maker runtime.
//!
//! Drives the strategy against a replayed L2 book:
//! - TOML configuration
//! - Timer queue for warm-up and PnL recomputation
//! - Paper exchange with a channel-backed order transport
//! - JSON-lines snapshot replay

pub mod app;
pub mod book;
pub mod config;
pub mod error;
pub mod paper;
pub mod replay;
pub mod scheduler;

pub use app::Application;
pub use book::LadderBook;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
