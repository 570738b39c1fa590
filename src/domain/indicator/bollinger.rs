//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::BollingerBands;
use crate::domain::indicator::stddev::calculate_stddev;

pub fn calculate_bollinger(closes: &[f64], period: usize, mult: f64) -> Vec<Option<BollingerBands>> {
    let stddev = calculate_stddev(closes, period);

    stddev
        .iter()
        .enumerate()
        .map(|(i, sd)| {
            let sd = (*sd)?;
            let window = &closes[i + 1 - period..=i];
            let middle = window.iter().sum::<f64>() / period as f64;
            Some(BollingerBands {
                upper: middle + mult * sd,
                middle,
                lower: middle - mult * sd,
            })
        })
        .collect()
}
