//! Quote parameters.
//!
//! Immutable for the lifetime of a run. Every threshold the risk guard uses
//! must be present and sane before the strategy is constructed; see
//! [`QuoteParams::validate`].

use std::time::Duration;

use helium_core::Size;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MmError, MmResult};

/// Market making parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteParams {
    /// Multiplier on the VWAP half-width used as the quoting half-spread.
    pub spread_factor: Decimal,

    /// Target inventory: outstanding bids plus position converge to this.
    pub trade_size: Size,

    /// Cancel resting orders and flatten the position when locking down.
    pub dump_on_lockdown: bool,

    /// Hourly volatility at or above which the strategy locks down.
    pub vol_thresh: f64,

    /// Maximum distance of the oldest resting ask above mid.
    pub max_distance: Decimal,

    /// PnL recomputation interval in seconds. `None` disables tracking.
    #[serde(default)]
    pub track_pnl: Option<f64>,

    /// Loss (positive number) at which the strategy locks down.
    /// Requires `track_pnl`.
    #[serde(default)]
    pub stop_loss: Option<Decimal>,

    /// Diagnostic verbosity only.
    #[serde(default)]
    pub debug: bool,

    /// Price concession for the flatten order on lockdown, in basis points
    /// below the best bid.
    #[serde(default = "default_flatten_slippage_bps")]
    pub flatten_slippage_bps: Decimal,
}

fn default_flatten_slippage_bps() -> Decimal {
    Decimal::new(50, 0) // 50 bps
}

impl QuoteParams {
    /// Reject parameters the strategy cannot run with.
    pub fn validate(&self) -> MmResult<()> {
        if self.spread_factor.is_sign_negative() {
            return Err(invalid(format!(
                "spread_factor must be >= 0, got {}",
                self.spread_factor
            )));
        }
        if !self.trade_size.is_positive() {
            return Err(invalid(format!(
                "trade_size must be > 0, got {}",
                self.trade_size
            )));
        }
        if !self.vol_thresh.is_finite() || self.vol_thresh < 0.0 {
            return Err(invalid(format!(
                "vol_thresh must be a finite value >= 0, got {}",
                self.vol_thresh
            )));
        }
        if self.max_distance.is_sign_negative() {
            return Err(invalid(format!(
                "max_distance must be >= 0, got {}",
                self.max_distance
            )));
        }
        if let Some(secs) = self.track_pnl {
            if secs <= 0.0 || Duration::try_from_secs_f64(secs).is_err() {
                return Err(invalid(format!(
                    "track_pnl must be a representable interval > 0 seconds, got {secs}"
                )));
            }
        }
        if let Some(stop) = self.stop_loss {
            if stop <= Decimal::ZERO {
                return Err(invalid(format!("stop_loss must be > 0, got {stop}")));
            }
            if self.track_pnl.is_none() {
                return Err(invalid(
                    "stop_loss requires track_pnl, otherwise profit/loss is never computed"
                        .to_string(),
                ));
            }
        }
        if self.flatten_slippage_bps.is_sign_negative() {
            return Err(invalid(format!(
                "flatten_slippage_bps must be >= 0, got {}",
                self.flatten_slippage_bps
            )));
        }
        Ok(())
    }

    /// PnL timer interval, if tracking is configured.
    pub fn track_pnl_interval(&self) -> Option<Duration> {
        self.track_pnl
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Stop-loss threshold, active only while PnL is tracked.
    pub fn active_stop_loss(&self) -> Option<Decimal> {
        self.track_pnl.and(self.stop_loss)
    }
}

fn invalid(msg: String) -> MmError {
    MmError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params() -> QuoteParams {
        QuoteParams {
            spread_factor: dec!(0.5),
            trade_size: Size::new(dec!(10)),
            dump_on_lockdown: false,
            vol_thresh: 0.05,
            max_distance: dec!(5),
            track_pnl: None,
            stop_loss: None,
            debug: false,
            flatten_slippage_bps: dec!(50),
        }
    }

    #[test]
    fn test_valid_params() {
        assert!(params().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_trade_size() {
        let mut p = params();
        p.trade_size = Size::ZERO;
        assert!(matches!(p.validate(), Err(MmError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_negative_spread_factor() {
        let mut p = params();
        p.spread_factor = dec!(-0.1);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_rejects_stop_loss_without_tracking() {
        let mut p = params();
        p.stop_loss = Some(dec!(100));
        assert!(p.validate().is_err());

        p.track_pnl = Some(5.0);
        assert!(p.validate().is_ok());
        assert_eq!(p.active_stop_loss(), Some(dec!(100)));
    }

    #[test]
    fn test_rejects_bad_track_pnl() {
        let mut p = params();
        p.track_pnl = Some(0.0);
        assert!(p.validate().is_err());
        p.track_pnl = Some(f64::NAN);
        assert!(p.validate().is_err());
        p.track_pnl = Some(f64::INFINITY);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_rejects_unrepresentable_track_pnl() {
        let mut p = params();
        p.track_pnl = Some(1e30);
        assert!(matches!(p.validate(), Err(MmError::InvalidConfig(_))));
        assert!(p.track_pnl_interval().is_none());
    }

    #[test]
    fn test_track_pnl_interval() {
        let mut p = params();
        assert!(p.track_pnl_interval().is_none());
        p.track_pnl = Some(2.5);
        assert_eq!(p.track_pnl_interval(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_serde_defaults() {
        let toml_str = r#"
spread_factor = "0.5"
trade_size = "10"
dump_on_lockdown = true
vol_thresh = 0.05
max_distance = "5"
"#;
        let p: QuoteParams = toml::from_str(toml_str).unwrap();
        assert_eq!(p.spread_factor, dec!(0.5));
        assert_eq!(p.trade_size, Size::new(dec!(10)));
        assert!(p.dump_on_lockdown);
        assert!(p.track_pnl.is_none());
        assert!(p.stop_loss.is_none());
        assert!(!p.debug);
        assert_eq!(p.flatten_slippage_bps, dec!(50));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let toml_str = r#"
spread_factor = "0.5"
trade_size = "10"
"#;
        assert!(toml::from_str::<QuoteParams>(toml_str).is_err());
    }
}
