//! Multi-strategy simulation over one index's enriched bar sequence.
//!
//! Each strategy carries its own [`StrategyState`]; signals observed on
//! day T execute at day T+1's open.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::enrich::EnrichedBar;
use crate::domain::error::IdxtraderError;
use crate::domain::metrics::{self, StrategyStat};
use crate::domain::position::StrategyState;
use crate::domain::signal::crossed_up_opt;
use crate::domain::strategy::StrategyConfig;
use crate::domain::trade::{TradeDirection, TradeEvent};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Bars dated before this are discarded.
    pub cutoff_date: NaiveDate,
    /// Bars after the cutoff that only serve as history.
    pub warmup_bars: usize,
    pub initial_capital: f64,
    /// Fractional loss from entry that forces an exit, e.g. 0.15.
    pub stop_loss_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            cutoff_date: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default(),
            warmup_bars: 250,
            initial_capital: 100_000.0,
            stop_loss_pct: 0.15,
        }
    }
}

/// Post-cutoff bars and the index of the first evaluated one.
#[derive(Debug, Clone, Copy)]
pub struct TestWindow<'a> {
    pub bars: &'a [EnrichedBar],
    pub start: usize,
}

impl<'a> TestWindow<'a> {
    pub fn evaluated(&self) -> &'a [EnrichedBar] {
        &self.bars[self.start..]
    }
}

/// `None` when no more than `warmup_bars` bars fall on or after the cutoff.
pub fn select_test_window<'a>(
    bars: &'a [EnrichedBar],
    config: &BacktestConfig,
) -> Option<TestWindow<'a>> {
    let first = bars.partition_point(|b| b.bar.date < config.cutoff_date);
    let bars = &bars[first..];
    if bars.len() <= config.warmup_bars {
        return None;
    }
    Some(TestWindow {
        bars,
        start: config.warmup_bars,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub log: Vec<TradeEvent>,
    /// Ranked by duration-adjusted rate, best first.
    pub stats: Vec<StrategyStat>,
}

impl BacktestResult {
    pub fn trades_for<'a>(&'a self, strategy_name: &'a str) -> impl Iterator<Item = &'a TradeEvent> {
        self.log.iter().filter(move |e| e.strategy_name == strategy_name)
    }
}

pub fn run_index_backtest(
    bars: &[EnrichedBar],
    strategies: &[StrategyConfig],
    config: &BacktestConfig,
) -> Result<BacktestResult, IdxtraderError> {
    for strategy in strategies {
        strategy.validate()?;
    }

    let Some(window) = select_test_window(bars, config) else {
        return Ok(BacktestResult::default());
    };
    check_prices(window.evaluated())?;

    let bars = window.bars;
    let mut states: Vec<StrategyState> = strategies
        .iter()
        .map(|_| StrategyState::new(config.initial_capital))
        .collect();
    let mut log = Vec::new();

    for i in window.start..bars.len() {
        let today = &bars[i];
        let date = today.bar.date;
        let Some(next_open) = bars.get(i + 1).map(|b| b.bar.open) else {
            continue;
        };

        for (strategy, state) in strategies.iter().zip(states.iter_mut()) {
            // the first evaluated row has no previous reading inside the window
            let prev = if i == window.start {
                None
            } else {
                strategy.mode.value(&bars[i - 1])
            };
            if prev.is_none() {
                continue;
            }
            let curr = strategy.mode.value(today);
            state.mark_evaluated(date);

            if !state.in_position {
                if next_open > 0.0 && crossed_up_opt(prev, curr, strategy.buy_threshold) {
                    let amount = state.open(date, next_open);
                    log.push(event(date, strategy, TradeDirection::Buy, amount, next_open, amount));
                }
                continue;
            }

            let direction = if state.should_stop_loss(next_open, config.stop_loss_pct) {
                TradeDirection::StopLossSell
            } else if crossed_up_opt(prev, curr, strategy.sell_threshold) {
                TradeDirection::TakeProfitSell
            } else {
                continue;
            };
            let cash = state.close(date, next_open);
            log.push(event(date, strategy, direction, cash, next_open, cash));
        }
    }

    if let Some(last) = bars.last() {
        // the final row never has a following bar in the sequence
        let exit_price = last.bar.close;
        for (strategy, state) in strategies.iter().zip(states.iter_mut()) {
            if state.in_position {
                let cash = state.close(last.bar.date, exit_price);
                log.push(event(
                    last.bar.date,
                    strategy,
                    TradeDirection::ForceSell,
                    cash,
                    exit_price,
                    cash,
                ));
            }
        }
    }

    let mut stats: Vec<StrategyStat> = strategies
        .iter()
        .zip(states.iter())
        .map(|(strategy, state)| StrategyStat::compute(strategy, state, config.initial_capital))
        .collect();
    metrics::rank(&mut stats);

    Ok(BacktestResult { log, stats })
}

fn check_prices(bars: &[EnrichedBar]) -> Result<(), IdxtraderError> {
    for b in bars {
        if !(b.bar.open.is_finite() && b.bar.close.is_finite()) {
            return Err(IdxtraderError::Data {
                reason: format!(
                    "{} on {}: open/close must be finite",
                    b.bar.index_code, b.bar.date
                ),
            });
        }
    }
    Ok(())
}

fn event(
    date: NaiveDate,
    strategy: &StrategyConfig,
    direction: TradeDirection,
    traded_amount: f64,
    price: f64,
    resulting_cash: f64,
) -> TradeEvent {
    TradeEvent {
        date,
        strategy_name: strategy.name.clone(),
        direction,
        traded_amount,
        price,
        resulting_cash,
    }
}
