//! Helium market making strategy.
//!
//! Keeps one bid sized to a target inventory, cycles every filled bid unit
//! into an ask at `fill_price + spread`, and locks down on risk breaches.
//!
//! # Architecture
//!
//! ```text
//! Book update → Helium.update()
//!                ├─ quote_engine: fair value, half-spread, bid shortfall
//!                ├─ Ledger: outstanding bids, position
//!                └─ risk: distance / stop-loss / volatility → lockdown
//!                     ↓
//!                OrderTransport.submit_bid()
//!
//! OrderEvent → OrderLifecycle callbacks → Ledger → cycle ask
//! TimerTask::ComputePnl → RiskPolicy.compute_pnl() → re-arm
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod quote_engine;
pub mod risk;
pub mod strategy;
pub mod timer;
pub mod volatility;

pub use config::QuoteParams;
pub use error::{MmError, MmResult};
pub use ledger::{Fill, InFlight, Ledger};
pub use lifecycle::OrderLifecycle;
pub use quote_engine::{compute_quote, FairValue, Quote};
pub use risk::{LockdownReason, RiskGuard, RiskPolicy, StrategyState};
pub use strategy::Helium;
pub use timer::{RecordingScheduler, TimerScheduler, TimerTask};
pub use volatility::MidVolatility;
