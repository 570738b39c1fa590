//! Rolling indicator implementations.
//!
//! Every function here takes a slice of observations and returns one output
//! per input position, `None` where the indicator is undefined (warm-up,
//! missing inputs, degenerate windows).

pub mod bollinger;
pub mod percentile;
pub mod sma;
pub mod stddev;

use serde::{Deserialize, Serialize};

/// Window sizes and multipliers for the enrichment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ma_windows: Vec<usize>,
    pub bollinger_period: usize,
    pub bollinger_mult: f64,
    pub percentile_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            ma_windows: vec![5, 10, 20, 30, 60, 120, 250],
            bollinger_period: 20,
            bollinger_mult: 2.0,
            percentile_window: 500,
        }
    }
}

/// Bollinger band geometry for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// (close - lower) / (upper - lower); `None` on a zero-width band.
    pub fn position(&self, close: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        if width == 0.0 || !width.is_finite() {
            return None;
        }
        Some((close - self.lower) / width)
    }
}
