mod common;

use approx::assert_relative_eq;
use common::*;
use idxtrader::domain::backtest::{BacktestConfig, run_index_backtest};
use idxtrader::domain::bar::normalize;
use idxtrader::domain::batch::{RunPlan, backtest_index, run_batch};
use idxtrader::domain::enrich::enrich;
use idxtrader::domain::indicator::IndicatorConfig;
use idxtrader::domain::signal::IndicatorMode;
use idxtrader::domain::strategy::default_bank;
use idxtrader::domain::summary::SummaryConfig;
use idxtrader::domain::trade::{TradeDirection, replay};
use std::time::Duration;

fn plan() -> RunPlan {
    RunPlan {
        indicators: IndicatorConfig::default(),
        backtest: BacktestConfig::default(),
        strategies: default_bank(),
        summary: SummaryConfig::default(),
        threads: 2,
        timeout: None,
    }
}

fn cutoff() -> chrono::NaiveDate {
    BacktestConfig::default().cutoff_date
}

mod test_window {
    use super::*;

    #[test]
    fn exactly_warmup_bars_after_cutoff_yields_nothing() {
        let bars = enrich(
            &bars_around_cutoff("A", cutoff(), 300, 250),
            &IndicatorConfig::default(),
        );
        let result = run_index_backtest(&bars, &default_bank(), &BacktestConfig::default()).unwrap();
        assert!(result.log.is_empty());
        assert!(result.stats.is_empty());
    }

    #[test]
    fn one_bar_past_warmup_evaluates_a_single_row() {
        let bars = enrich(
            &bars_around_cutoff("A", cutoff(), 300, 251),
            &IndicatorConfig::default(),
        );
        let result = run_index_backtest(&bars, &default_bank(), &BacktestConfig::default()).unwrap();
        assert!(result.log.is_empty());
        assert_eq!(result.stats.len(), 32);
        for stat in &result.stats {
            assert_eq!(stat.window_duration_days, 0);
            assert_eq!(stat.total_holding_days, 0);
            assert_relative_eq!(stat.final_capital, 100_000.0);
            assert_relative_eq!(stat.duration_adjusted_rate, 0.0);
        }
    }

    #[test]
    fn bars_before_cutoff_do_not_count_toward_warmup() {
        let bars = enrich(
            &bars_around_cutoff("A", cutoff(), 2000, 100),
            &IndicatorConfig::default(),
        );
        let result = run_index_backtest(&bars, &default_bank(), &BacktestConfig::default()).unwrap();
        assert!(result.stats.is_empty());
    }
}

mod simulation {
    use super::*;

    fn simulated() -> (
        Vec<idxtrader::domain::enrich::EnrichedBar>,
        idxtrader::domain::backtest::BacktestResult,
    ) {
        let bars = enrich(
            &bars_around_cutoff("000300", cutoff(), 600, 900),
            &IndicatorConfig::default(),
        );
        let result = run_index_backtest(&bars, &default_bank(), &BacktestConfig::default()).unwrap();
        (bars, result)
    }

    #[test]
    fn cyclical_data_produces_trades_in_both_modes() {
        let (_, result) = simulated();
        assert_eq!(result.stats.len(), 32);
        assert!(result.log.iter().any(|e| e.strategy_name.ends_with("valuation")));
        assert!(result.log.iter().any(|e| e.strategy_name.ends_with("bollinger")));
    }

    #[test]
    fn replaying_the_log_reproduces_every_stat() {
        let (_, result) = simulated();
        for stat in &result.stats {
            let r = replay(&result.log, &stat.strategy_name, 100_000.0);
            assert_relative_eq!(r.final_capital, stat.final_capital, max_relative = 1e-12);
            assert_eq!(r.total_holding_days, stat.total_holding_days);
        }
    }

    #[test]
    fn capital_after_sell_is_shares_times_price() {
        let (_, result) = simulated();
        for stat in &result.stats {
            let events: Vec<_> = result.trades_for(&stat.strategy_name).collect();
            for pair in events.chunks(2) {
                assert_eq!(pair.len(), 2, "{} ends flat", stat.strategy_name);
                let (buy, sell) = (pair[0], pair[1]);
                assert_eq!(buy.direction, TradeDirection::Buy);
                assert!(sell.direction.is_sell());
                let shares = buy.resulting_cash / buy.price;
                assert_relative_eq!(sell.resulting_cash, shares * sell.price, max_relative = 1e-12);
                assert!(sell.date >= buy.date);
            }
        }
    }

    #[test]
    fn force_sells_happen_on_the_final_row_at_close() {
        let (bars, result) = simulated();
        let last = bars.last().unwrap();
        for e in result.log.iter().filter(|e| e.direction == TradeDirection::ForceSell) {
            assert_eq!(e.date, last.bar.date);
            assert_relative_eq!(e.price, last.bar.close);
        }
    }

    #[test]
    fn stop_losses_respect_the_threshold() {
        let (_, result) = simulated();
        for stat in &result.stats {
            let events: Vec<_> = result.trades_for(&stat.strategy_name).collect();
            for pair in events.chunks(2) {
                if pair[1].direction == TradeDirection::StopLossSell {
                    assert!((pair[1].price - pair[0].price) / pair[0].price <= -0.15);
                }
            }
        }
    }

    #[test]
    fn stats_ranked_and_bounded() {
        let (_, result) = simulated();
        for w in result.stats.windows(2) {
            assert!(w[0].duration_adjusted_rate >= w[1].duration_adjusted_rate);
        }
        for stat in &result.stats {
            assert!(stat.window_duration_days > 0);
            // a force sell counts holding up to the final row, one past the window
            let slack = 1.0 / stat.window_duration_days as f64;
            assert!(stat.position_rate >= 0.0 && stat.position_rate <= 1.0 + slack);
            assert!(
                stat.window_duration_days <= 900 - 250,
                "window {} too long",
                stat.window_duration_days
            );
        }
    }

    #[test]
    fn mode_filter_matches_names() {
        let (_, result) = simulated();
        for stat in &result.stats {
            let expected = match stat.mode {
                IndicatorMode::Valuation => "valuation",
                IndicatorMode::Bollinger => "bollinger",
            };
            assert!(stat.strategy_name.ends_with(expected));
        }
    }
}

mod batch {
    use super::*;

    #[test]
    fn backtest_index_normalizes_unsorted_input() {
        let mut raw = bars_around_cutoff("A", cutoff(), 300, 400);
        raw.reverse();
        let data = MockDataPort::new().with_index(meta("A"), raw.clone());
        let out = backtest_index(&data, &meta("A"), &plan()).unwrap();

        let expected = enrich(&normalize(raw), &IndicatorConfig::default());
        assert_eq!(out.bars.len(), expected.len());
        assert_eq!(out.bars.first().unwrap().bar.date, expected[0].bar.date);
        assert!(out.home.is_some());
    }

    #[test]
    fn empty_index_is_no_data() {
        let data = MockDataPort::new().with_index(meta("A"), Vec::new());
        let err = backtest_index(&data, &meta("A"), &plan()).unwrap_err();
        assert!(err.to_string().contains("no data"));
    }

    #[test]
    fn partial_failure_keeps_siblings() {
        let data = MockDataPort::new()
            .with_index(meta("A"), bars_around_cutoff("A", cutoff(), 300, 400))
            .with_error(meta("B"), "disk on fire")
            .with_index(meta("C"), Vec::new())
            .with_index(meta("D"), bars_around_cutoff("D", cutoff(), 300, 500));
        let indices = data.indices.clone();
        let report = run_batch(&data, &indices, &plan()).unwrap();

        let ok: Vec<&str> = report.results.iter().map(|r| r.meta.code.as_str()).collect();
        assert_eq!(ok, vec!["A", "D"]);
        let failed: Vec<&str> = report.failures.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(failed, vec!["B", "C"]);
        assert!(report.failures[0].reason.contains("disk on fire"));
        assert_eq!(report.home_records().len(), 2);
    }

    #[test]
    fn invalid_strategy_fails_each_index() {
        let data = MockDataPort::new()
            .with_index(meta("A"), bars_around_cutoff("A", cutoff(), 300, 400));
        let mut p = plan();
        p.strategies[0].buy_threshold = 0.9;
        let report = run_batch(&data, &data.indices.clone(), &p).unwrap();
        assert!(report.results.is_empty());
        assert!(report.failures[0].reason.contains("invalid strategy"));
    }

    #[test]
    fn elapsed_timeout_skips_remaining_indices() {
        let data = MockDataPort::new()
            .with_index(meta("A"), bars_around_cutoff("A", cutoff(), 300, 400))
            .with_index(meta("B"), bars_around_cutoff("B", cutoff(), 300, 400));
        let p = RunPlan {
            timeout: Some(Duration::ZERO),
            ..plan()
        };
        let report = run_batch(&data, &data.indices.clone(), &p).unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].reason.contains("timeout"));
    }

    #[test]
    fn single_thread_matches_parallel() {
        let data = MockDataPort::new()
            .with_index(meta("A"), bars_around_cutoff("A", cutoff(), 300, 700))
            .with_index(meta("B"), bars_around_cutoff("B", cutoff(), 500, 600));
        let indices = data.indices.clone();
        let serial = run_batch(&data, &indices, &RunPlan { threads: 1, ..plan() }).unwrap();
        let parallel = run_batch(&data, &indices, &RunPlan { threads: 4, ..plan() }).unwrap();
        for (s, p) in serial.results.iter().zip(parallel.results.iter()) {
            assert_eq!(s.result, p.result);
        }
    }

    #[test]
    fn home_record_summarizes_latest_bar() {
        let data = MockDataPort::new()
            .with_index(meta("A"), bars_around_cutoff("A", cutoff(), 600, 900));
        let report = run_batch(&data, &data.indices.clone(), &plan()).unwrap();
        let home = report.home_records();
        let record = &home[0];
        let result = &report.results[0];

        assert_eq!(record.code, "A");
        assert_eq!(record.tracking_fund_count, 5);
        assert_eq!(record.latest, *result.bars.last().unwrap());
        assert_eq!(record.valuation.mode, IndicatorMode::Valuation);
        assert!(record.valuation.selected <= 16);
        assert!(record.bollinger.selected <= 16);
    }
}
