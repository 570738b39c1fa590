//! Indicator enrichment of a raw bar sequence.
//!
//! Produces moving averages, Bollinger geometry and rolling valuation
//! percentiles for every bar after the leading run of bars without any
//! valuation data has been trimmed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::bar::Bar;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::percentile::{inverted_percentile_rank, rolling_percentile_rank};
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{BollingerBands, IndicatorConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(flatten)]
    pub bar: Bar,
    /// Keyed by window length.
    pub moving_averages: BTreeMap<usize, Option<f64>>,
    pub bollinger: Option<BollingerBands>,
    pub bollinger_position: Option<f64>,
    pub pe_percentile: Option<f64>,
    pub pb_percentile: Option<f64>,
    pub dyr_yield_percentile: Option<f64>,
    pub valuation_percentile: Option<f64>,
}

impl EnrichedBar {
    pub fn ma(&self, window: usize) -> Option<f64> {
        self.moving_averages.get(&window).copied().flatten()
    }
}

/// Drop bars up to the first one carrying any valuation field.
pub fn trim_leading_missing(bars: &[Bar]) -> &[Bar] {
    match bars.iter().position(Bar::has_valuation) {
        Some(first) => &bars[first..],
        None => &[],
    }
}

/// Plain mean of the three components; any missing component makes the
/// composite missing.
pub fn composite_percentile(pe: Option<f64>, pb: Option<f64>, dyr: Option<f64>) -> Option<f64> {
    Some((pe? + pb? + dyr?) / 3.0)
}

pub fn enrich(bars: &[Bar], config: &IndicatorConfig) -> Vec<EnrichedBar> {
    let bars = trim_leading_missing(bars);
    if bars.is_empty() {
        return Vec::new();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let moving_averages: Vec<(usize, Vec<Option<f64>>)> = config
        .ma_windows
        .iter()
        .map(|&w| (w, calculate_sma(&closes, w)))
        .collect();

    let bands = calculate_bollinger(&closes, config.bollinger_period, config.bollinger_mult);

    let pe: Vec<Option<f64>> = bars.iter().map(|b| b.pe_ttm).collect();
    let pb: Vec<Option<f64>> = bars.iter().map(|b| b.pb).collect();
    let dyr: Vec<Option<f64>> = bars.iter().map(|b| b.dividend_yield).collect();

    let pe_pct = rolling_percentile_rank(&pe, config.percentile_window);
    let pb_pct = rolling_percentile_rank(&pb, config.percentile_window);
    let dyr_pct = inverted_percentile_rank(&dyr, config.percentile_window);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let bollinger = bands[i];
            EnrichedBar {
                bar: bar.clone(),
                moving_averages: moving_averages
                    .iter()
                    .map(|(w, series)| (*w, series[i]))
                    .collect(),
                bollinger,
                bollinger_position: bollinger.and_then(|b| b.position(bar.close)),
                pe_percentile: pe_pct[i],
                pb_percentile: pb_pct[i],
                dyr_yield_percentile: dyr_pct[i],
                valuation_percentile: composite_percentile(pe_pct[i], pb_pct[i], dyr_pct[i]),
            }
        })
        .collect()
}
