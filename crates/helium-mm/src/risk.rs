//! Strategy state and lockdown.
//!
//! `LockedDown` is a latch: once entered it is never left for the rest of
//! the run. Re-enabling requires an operator restart.

use std::fmt;

use helium_core::Price;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::timer::TimerScheduler;

/// Risk surface of a strategy.
pub trait RiskPolicy {
    fn state(&self) -> StrategyState;

    /// Enter `LockedDown`. Idempotent on state; every call is logged.
    fn lockdown(&mut self, reason: LockdownReason);

    /// Recompute profit/loss, run the stop-loss check and re-arm the PnL
    /// timer when tracking is configured.
    fn compute_pnl(&mut self, timers: &mut dyn TimerScheduler) -> Decimal;
}

/// Trading state of the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyState {
    /// Warm-up or operator pause; no quoting.
    #[default]
    Disabled,
    /// Quoting.
    Enabled,
    /// Terminal risk state.
    LockedDown,
}

impl StrategyState {
    /// Numeric code for the state gauge.
    pub fn code(&self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
            Self::LockedDown => 2,
        }
    }
}

impl fmt::Display for StrategyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "DISABLED"),
            Self::Enabled => write!(f, "ENABLED"),
            Self::LockedDown => write!(f, "LOCKED_DOWN"),
        }
    }
}

/// Reason for a lockdown.
#[derive(Debug, Clone, PartialEq)]
pub enum LockdownReason {
    /// Oldest resting ask drifted too far above mid.
    MaxDistance { ask: Price, mid: Price },
    /// Profit/loss fell below the negated stop-loss threshold.
    StopLoss { threshold: Decimal, profit_loss: Decimal },
    /// Hourly volatility reached the threshold.
    ExcessiveVolatility { volatility: f64 },
    /// Operator request.
    Manual { message: String },
}

impl LockdownReason {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MaxDistance { .. } => "max_distance",
            Self::StopLoss { .. } => "stop_loss",
            Self::ExcessiveVolatility { .. } => "volatility",
            Self::Manual { .. } => "manual",
        }
    }
}

impl fmt::Display for LockdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxDistance { .. } => write!(f, "max distance exceeded"),
            Self::StopLoss { threshold, .. } => {
                write!(f, "stop loss of {:.2} triggered", threshold)
            }
            Self::ExcessiveVolatility { .. } => write!(f, "excessive volatility"),
            Self::Manual { message } => write!(f, "{}", message),
        }
    }
}

/// `ask - mid > max_distance`; equality does not breach.
pub fn distance_breached(ask: Price, mid: Price, max_distance: Decimal) -> bool {
    (ask - mid).inner() > max_distance
}

/// `profit_loss < -stop_loss`
pub fn stop_loss_breached(profit_loss: Decimal, stop_loss: Decimal) -> bool {
    profit_loss < -stop_loss
}

/// `volatility >= vol_thresh`
pub fn volatility_breached(volatility: f64, vol_thresh: f64) -> bool {
    volatility >= vol_thresh
}

/// Owns the strategy state and the last computed profit/loss.
#[derive(Debug, Default)]
pub struct RiskGuard {
    state: StrategyState,
    profit_loss: Decimal,
    /// First reason that locked the strategy down.
    lockdown_reason: Option<LockdownReason>,
}

impl RiskGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == StrategyState::Enabled
    }

    pub fn is_locked_down(&self) -> bool {
        self.state == StrategyState::LockedDown
    }

    pub fn profit_loss(&self) -> Decimal {
        self.profit_loss
    }

    pub fn set_profit_loss(&mut self, profit_loss: Decimal) {
        self.profit_loss = profit_loss;
    }

    pub fn lockdown_reason(&self) -> Option<&LockdownReason> {
        self.lockdown_reason.as_ref()
    }

    /// Disabled -> Enabled. Refused once locked down.
    pub fn enable(&mut self) -> bool {
        match self.state {
            StrategyState::LockedDown => {
                warn!(reason = ?self.lockdown_reason, "Refusing to enable: strategy is locked down");
                false
            }
            StrategyState::Enabled => true,
            StrategyState::Disabled => {
                info!("Strategy enabled");
                self.state = StrategyState::Enabled;
                true
            }
        }
    }

    /// Enabled -> Disabled. No effect once locked down.
    pub fn disable(&mut self) {
        if self.state == StrategyState::Enabled {
            info!("Strategy disabled");
            self.state = StrategyState::Disabled;
        }
    }

    /// Latch the lockdown state.
    ///
    /// Returns `true` only on the transition into `LockedDown`; repeated
    /// calls keep the first reason but are still logged.
    pub fn lockdown(&mut self, reason: LockdownReason) -> bool {
        if self.state == StrategyState::LockedDown {
            warn!(reason = %reason, first_reason = ?self.lockdown_reason.as_ref().map(|r| r.to_string()), "Lockdown requested while already locked down");
            return false;
        }
        error!(reason = %reason, detail = ?reason, previous_state = %self.state, "LOCKDOWN");
        self.state = StrategyState::LockedDown;
        self.lockdown_reason = Some(reason);
        true
    }
}
