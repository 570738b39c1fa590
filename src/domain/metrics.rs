//! Per-strategy performance statistics.

use serde::{Deserialize, Serialize};

use super::position::StrategyState;
use super::signal::IndicatorMode;
use super::strategy::StrategyConfig;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStat {
    pub strategy_name: String,
    pub mode: IndicatorMode,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub total_holding_days: i64,
    pub final_capital: f64,
    pub total_return: f64,
    pub total_rate: f64,
    pub annual_return: f64,
    pub window_duration_days: i64,
    pub duration_adjusted_rate: f64,
    pub position_rate: f64,
}

impl StrategyStat {
    pub fn compute(config: &StrategyConfig, state: &StrategyState, initial_capital: f64) -> Self {
        Self::from_figures(
            config,
            state.capital,
            state.total_holding_days,
            state.window_duration_days(),
            initial_capital,
        )
    }

    /// Statistics from terminal capital, holding days and window length.
    pub fn from_figures(
        config: &StrategyConfig,
        final_capital: f64,
        total_holding_days: i64,
        window_duration_days: i64,
        initial_capital: f64,
    ) -> Self {
        let total_return = final_capital - initial_capital;
        let total_rate = if initial_capital > 0.0 {
            total_return / initial_capital
        } else {
            0.0
        };

        Self {
            strategy_name: config.name.clone(),
            mode: config.mode,
            buy_threshold: config.buy_threshold,
            sell_threshold: config.sell_threshold,
            total_holding_days,
            final_capital,
            total_return,
            total_rate,
            annual_return: annualize(total_rate, total_holding_days),
            window_duration_days,
            duration_adjusted_rate: duration_adjusted_rate(total_rate, window_duration_days),
            position_rate: position_rate(total_holding_days, window_duration_days),
        }
    }
}

/// `(1 + rate)^(365 / days) - 1`; 0 when there is no holding time or the
/// compounding base is not positive.
pub fn annualize(total_rate: f64, holding_days: i64) -> f64 {
    if holding_days <= 0 {
        return 0.0;
    }
    let base = 1.0 + total_rate;
    if base <= 0.0 {
        return 0.0;
    }
    base.powf(DAYS_PER_YEAR / holding_days as f64) - 1.0
}

pub fn duration_adjusted_rate(total_rate: f64, window_days: i64) -> f64 {
    if window_days > 0 {
        total_rate / (window_days as f64 / DAYS_PER_YEAR)
    } else {
        0.0
    }
}

pub fn position_rate(holding_days: i64, window_days: i64) -> f64 {
    if window_days > 0 {
        holding_days as f64 / window_days as f64
    } else {
        0.0
    }
}

/// Descending by duration-adjusted rate; ties keep bank order.
pub fn rank(stats: &mut [StrategyStat]) {
    stats.sort_by(|a, b| b.duration_adjusted_rate.total_cmp(&a.duration_adjusted_rate));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn config() -> StrategyConfig {
        StrategyConfig::new(IndicatorMode::Valuation, 0.1, 0.4)
    }

    #[test]
    fn untouched_strategy_is_all_zero() {
        let state = StrategyState::new(100_000.0);
        let stat = StrategyStat::compute(&config(), &state, 100_000.0);
        assert_relative_eq!(stat.total_return, 0.0);
        assert_relative_eq!(stat.total_rate, 0.0);
        assert_relative_eq!(stat.annual_return, 0.0);
        assert_relative_eq!(stat.duration_adjusted_rate, 0.0);
        assert_relative_eq!(stat.position_rate, 0.0);
        assert_eq!(stat.window_duration_days, 0);
    }

    #[test]
    fn returns_from_terminal_state() {
        let mut state = StrategyState::new(100_000.0);
        state.capital = 120_000.0;
        state.total_holding_days = 365;
        state.first_evaluated = NaiveDate::from_ymd_opt(2020, 1, 1);
        state.last_evaluated = NaiveDate::from_ymd_opt(2021, 12, 31);
        let stat = StrategyStat::compute(&config(), &state, 100_000.0);

        assert_relative_eq!(stat.total_return, 20_000.0);
        assert_relative_eq!(stat.total_rate, 0.2);
        assert_relative_eq!(stat.annual_return, 0.2, epsilon = 1e-12);
        assert_eq!(stat.window_duration_days, 730);
        assert_relative_eq!(stat.duration_adjusted_rate, 0.1);
        assert_relative_eq!(stat.position_rate, 0.5);
    }

    #[test]
    fn annualize_compounds_short_holdings() {
        // 10% over half a year compounds to 21% annually
        assert_relative_eq!(annualize(0.1, 182), 1.1_f64.powf(365.0 / 182.0) - 1.0);
        assert!(annualize(0.1, 182) > 0.2);
    }

    #[test]
    fn annualize_guards() {
        assert_relative_eq!(annualize(0.5, 0), 0.0);
        assert_relative_eq!(annualize(-1.0, 100), 0.0);
        assert_relative_eq!(annualize(-1.5, 100), 0.0);
        assert!(annualize(-0.5, 100) < 0.0);
    }

    #[test]
    fn duration_and_position_guards() {
        assert_relative_eq!(duration_adjusted_rate(0.3, 0), 0.0);
        assert_relative_eq!(position_rate(10, 0), 0.0);
    }

    #[test]
    fn rank_descending_by_duration_rate() {
        let make = |rate: f64, name: &str| {
            let mut s = StrategyStat::from_figures(&config(), 100_000.0, 0, 365, 100_000.0);
            s.duration_adjusted_rate = rate;
            s.strategy_name = name.into();
            s
        };
        let mut stats = vec![make(0.1, "a"), make(0.3, "b"), make(-0.2, "c"), make(0.3, "d")];
        rank(&mut stats);
        let names: Vec<&str> = stats.iter().map(|s| s.strategy_name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }
}
