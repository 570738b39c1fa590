//! Per-index home summaries built from ranked strategy statistics.

use serde::{Deserialize, Serialize};

use crate::domain::enrich::EnrichedBar;
use crate::domain::metrics::StrategyStat;
use crate::domain::signal::IndicatorMode;
use crate::domain::universe::IndexMeta;

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Strategies holding for at most this share of the window do not
    /// contribute to the baseline rate.
    pub min_position_rate: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            min_position_rate: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSummary {
    pub mode: IndicatorMode,
    /// Mean duration-adjusted rate of sufficiently active strategies.
    pub baseline_rate: f64,
    pub selected: usize,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub duration_adjusted_rate: f64,
}

fn mean_or_zero(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Select the strategies of `mode` beating the active-strategy baseline and
/// average their thresholds and rates.
pub fn summarize_mode(
    stats: &[StrategyStat],
    mode: IndicatorMode,
    config: &SummaryConfig,
) -> ModeSummary {
    let of_mode: Vec<&StrategyStat> = stats.iter().filter(|s| s.mode == mode).collect();

    let baseline_rate = mean_or_zero(
        of_mode
            .iter()
            .filter(|s| s.position_rate > config.min_position_rate)
            .map(|s| s.duration_adjusted_rate),
    );

    let selected: Vec<&StrategyStat> = of_mode
        .into_iter()
        .filter(|s| s.duration_adjusted_rate > baseline_rate)
        .collect();

    ModeSummary {
        mode,
        baseline_rate,
        selected: selected.len(),
        buy_threshold: mean_or_zero(selected.iter().map(|s| s.buy_threshold)),
        sell_threshold: mean_or_zero(selected.iter().map(|s| s.sell_threshold)),
        duration_adjusted_rate: mean_or_zero(selected.iter().map(|s| s.duration_adjusted_rate)),
    }
}

/// Holding-day-weighted mean of annual returns; 0 without holding time.
pub fn blended_annual_return(stats: &[StrategyStat]) -> f64 {
    let total_days: i64 = stats.iter().map(|s| s.total_holding_days).sum();
    if total_days <= 0 {
        return 0.0;
    }
    stats
        .iter()
        .map(|s| s.total_holding_days as f64 / total_days as f64 * s.annual_return)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeRecord {
    pub code: String,
    pub name: String,
    pub tracking_fund_count: u32,
    pub latest: EnrichedBar,
    pub valuation: ModeSummary,
    pub bollinger: ModeSummary,
    pub blended_annual_return: f64,
}

impl HomeRecord {
    /// `None` when the index has no enriched bars.
    pub fn build(
        meta: &IndexMeta,
        bars: &[EnrichedBar],
        stats: &[StrategyStat],
        config: &SummaryConfig,
    ) -> Option<HomeRecord> {
        let latest = bars.last()?.clone();
        Some(HomeRecord {
            code: meta.code.clone(),
            name: meta.name.clone(),
            tracking_fund_count: meta.tracking_fund_count,
            latest,
            valuation: summarize_mode(stats, IndicatorMode::Valuation, config),
            bollinger: summarize_mode(stats, IndicatorMode::Bollinger, config),
            blended_annual_return: blended_annual_return(stats),
        })
    }
}
