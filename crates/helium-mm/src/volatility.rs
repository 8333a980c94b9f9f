//! Realized volatility of the mid price.
//!
//! Samples the last mid of every wall-clock second, keeps a rolling window
//! of 1-second log returns and scales their standard deviation to one hour.

use std::collections::VecDeque;

use helium_core::{Price, VolatilityMonitor};

/// Seconds per hour, the horizon volatility is scaled to.
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Rolling 1-second mid volatility estimator.
#[derive(Debug)]
pub struct MidVolatility {
    /// Second currently being sampled (unix seconds).
    current_sec: Option<u64>,
    /// Last mid seen in the current second.
    last_mid: f64,
    /// Close of the previous finalized second.
    prev_close: Option<f64>,
    returns: VecDeque<f64>,
    window: usize,
    min_samples: usize,
}

impl MidVolatility {
    pub fn new(window: usize, min_samples: usize) -> Self {
        Self {
            current_sec: None,
            last_mid: 0.0,
            prev_close: None,
            returns: VecDeque::with_capacity(window),
            window: window.max(1),
            min_samples: min_samples.max(2),
        }
    }

    /// Number of 1-second returns in the window.
    pub fn sample_count(&self) -> usize {
        self.returns.len()
    }

    fn finalize_second(&mut self) {
        let close = self.last_mid;
        if let Some(prev) = self.prev_close {
            self.returns.push_back((close / prev).ln());
            while self.returns.len() > self.window {
                self.returns.pop_front();
            }
        }
        self.prev_close = Some(close);
    }
}

impl Default for MidVolatility {
    fn default() -> Self {
        Self::new(3600, 60)
    }
}

impl VolatilityMonitor for MidVolatility {
    fn hourly_volatility(&self) -> f64 {
        let n = self.returns.len();
        if n < self.min_samples {
            return 0.0;
        }
        let mean = self.returns.iter().sum::<f64>() / n as f64;
        let var = self
            .returns
            .iter()
            .map(|r| (r - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        var.sqrt() * SECONDS_PER_HOUR.sqrt()
    }

    fn observe_mid(&mut self, mid: Price, now_ms: u64) {
        let px = mid.to_f64();
        if !(px.is_finite() && px > 0.0) {
            return;
        }
        let now_sec = now_ms / 1000;
        match self.current_sec {
            None => {
                self.current_sec = Some(now_sec);
            }
            Some(sec) if now_sec > sec => {
                self.finalize_second();
                self.current_sec = Some(now_sec);
            }
            // Same second, or a stale timestamp: keep the latest mid
            Some(_) => {}
        }
        self.last_mid = px;
    }
}
