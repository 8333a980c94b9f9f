//! Application configuration.

use std::time::Duration;

use helium_mm::QuoteParams;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Paper exchange and replay feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// JSON-lines file of L2 book snapshots.
    pub replay_path: String,
    /// Delay between replayed snapshots (ms). Default: 100.
    #[serde(default = "default_replay_interval_ms")]
    pub replay_interval_ms: u64,
    /// Share of the touching level a resting order may take per snapshot.
    /// Default: 0.5.
    #[serde(default = "default_max_fill_fraction")]
    pub max_fill_fraction: f64,
    /// Stop the application once the replay is exhausted. Default: true.
    #[serde(default = "default_exit_on_replay_end")]
    pub exit_on_replay_end: bool,
}

fn default_replay_interval_ms() -> u64 {
    100
}

fn default_max_fill_fraction() -> f64 {
    0.5
}

fn default_exit_on_replay_end() -> bool {
    true
}

/// Mid-price volatility estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Rolling window of 1-second returns. Default: 3600.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Returns required before a reading is non-zero. Default: 60.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_window() -> usize {
    3600
}

fn default_min_samples() -> usize {
    60
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window: default_window(),
            min_samples: default_min_samples(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub strategy: QuoteParams,

    pub paper: PaperConfig,

    #[serde(default)]
    pub volatility: VolatilityConfig,

    /// Delay before quoting is enabled (ms). Default: 1000.
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,

    /// Delay before the first PnL computation (ms). Default: 1000.
    #[serde(default = "default_pnl_start_delay_ms")]
    pub pnl_start_delay_ms: u64,
}

fn default_warmup_ms() -> u64 {
    1_000
}

fn default_pnl_start_delay_ms() -> u64 {
    1_000
}

impl AppConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.strategy.validate()?;
        if !(self.paper.max_fill_fraction > 0.0 && self.paper.max_fill_fraction <= 1.0) {
            return Err(AppError::Config(format!(
                "paper.max_fill_fraction must be in (0, 1], got {}",
                self.paper.max_fill_fraction
            )));
        }
        if self.volatility.enabled && self.volatility.window < 2 {
            return Err(AppError::Config(format!(
                "volatility.window must be >= 2, got {}",
                self.volatility.window
            )));
        }
        Ok(())
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn pnl_start_delay(&self) -> Duration {
        Duration::from_millis(self.pnl_start_delay_ms)
    }

    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.paper.replay_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
[strategy]
spread_factor = "0.5"
trade_size = "10"
dump_on_lockdown = false
vol_thresh = 0.05
max_distance = "5"

[paper]
replay_path = "data/book.jsonl"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.strategy.spread_factor, dec!(0.5));
        assert_eq!(config.paper.replay_interval_ms, 100);
        assert_eq!(config.paper.max_fill_fraction, 0.5);
        assert!(config.paper.exit_on_replay_end);
        assert!(!config.volatility.enabled);
        assert_eq!(config.volatility.window, 3600);
        assert_eq!(config.warmup(), Duration::from_secs(1));
        assert_eq!(config.pnl_start_delay_ms, 1_000);
    }

    #[test]
    fn test_default_config_file_parses() {
        let config = AppConfig::from_toml(include_str!("../../../config/default.toml")).unwrap();
        assert!(config.strategy.track_pnl.is_some());
        assert!(config.volatility.enabled);
    }

    #[test]
    fn test_strategy_validation_is_fatal() {
        let text = MINIMAL.replace("trade_size = \"10\"", "trade_size = \"0\"");
        assert!(matches!(
            AppConfig::from_toml(&text),
            Err(AppError::Strategy(_))
        ));
    }

    #[test]
    fn test_stop_loss_without_tracking_is_fatal() {
        let text = MINIMAL.replace("max_distance = \"5\"", "max_distance = \"5\"\nstop_loss = \"100\"");
        assert!(AppConfig::from_toml(&text).is_err());
    }

    #[test]
    fn test_bad_fill_fraction() {
        let text = format!("{MINIMAL}max_fill_fraction = 1.5\n");
        assert!(matches!(
            AppConfig::from_toml(&text),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_missing_section_fails() {
        assert!(AppConfig::from_toml("warmup_ms = 10").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::from_file("/nonexistent/helium.toml"),
            Err(AppError::Config(_))
        ));
    }
}
