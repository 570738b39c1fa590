//! Threshold crossing signals.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::enrich::EnrichedBar;

/// Indicator family a strategy reads for both entry and exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorMode {
    Valuation,
    Bollinger,
}

impl IndicatorMode {
    pub const ALL: [IndicatorMode; 2] = [IndicatorMode::Valuation, IndicatorMode::Bollinger];

    pub fn value(self, bar: &EnrichedBar) -> Option<f64> {
        match self {
            IndicatorMode::Valuation => bar.valuation_percentile,
            IndicatorMode::Bollinger => bar.bollinger_position,
        }
    }
}

impl fmt::Display for IndicatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorMode::Valuation => write!(f, "valuation"),
            IndicatorMode::Bollinger => write!(f, "bollinger"),
        }
    }
}

impl FromStr for IndicatorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "valuation" | "fundamental" => Ok(IndicatorMode::Valuation),
            "bollinger" => Ok(IndicatorMode::Bollinger),
            other => Err(format!("unknown indicator mode: {other}")),
        }
    }
}

/// `prev < threshold <= curr`. Never true on downward or flat motion.
pub fn crossed_up(prev: f64, curr: f64, threshold: f64) -> bool {
    prev < threshold && threshold <= curr
}

/// Crossing over optional readings; a missing side means no signal.
pub fn crossed_up_opt(prev: Option<f64>, curr: Option<f64>, threshold: f64) -> bool {
    match (prev, curr) {
        (Some(p), Some(c)) => crossed_up(p, c, threshold),
        _ => false,
    }
}
