//! Batch orchestration over the index universe.
//!
//! Each index is fetched, enriched and simulated to completion on one
//! worker of a bounded rayon pool. A failing index is recorded and its
//! siblings continue.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::backtest::{BacktestConfig, BacktestResult, run_index_backtest};
use crate::domain::bar::normalize;
use crate::domain::enrich::{EnrichedBar, enrich};
use crate::domain::error::IdxtraderError;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::strategy::StrategyConfig;
use crate::domain::summary::{HomeRecord, SummaryConfig};
use crate::domain::universe::IndexMeta;
use crate::ports::data_port::DataPort;

/// Everything a run needs besides the data source.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub indicators: IndicatorConfig,
    pub backtest: BacktestConfig,
    pub strategies: Vec<StrategyConfig>,
    pub summary: SummaryConfig,
    /// Worker count; 0 uses rayon's default.
    pub threads: usize,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexBacktest {
    pub meta: IndexMeta,
    pub bars: Vec<EnrichedBar>,
    #[serde(flatten)]
    pub result: BacktestResult,
    #[serde(skip)]
    pub home: Option<HomeRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexFailure {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// In universe order.
    pub results: Vec<IndexBacktest>,
    pub failures: Vec<IndexFailure>,
}

impl BatchReport {
    pub fn home_records(&self) -> Vec<HomeRecord> {
        self.results.iter().filter_map(|r| r.home.clone()).collect()
    }
}

/// Fetch, enrich and simulate a single index.
pub fn backtest_index(
    data: &dyn DataPort,
    meta: &IndexMeta,
    plan: &RunPlan,
) -> Result<IndexBacktest, IdxtraderError> {
    let raw = data.fetch_bars(&meta.code)?;
    if raw.is_empty() {
        return Err(IdxtraderError::NoData {
            code: meta.code.clone(),
        });
    }
    let bars = enrich(&normalize(raw), &plan.indicators);
    let result = run_index_backtest(&bars, &plan.strategies, &plan.backtest)?;
    tracing::debug!(
        code = %meta.code,
        bars = bars.len(),
        trades = result.log.len(),
        "index simulated"
    );
    let home = HomeRecord::build(meta, &bars, &result.stats, &plan.summary);
    Ok(IndexBacktest {
        meta: meta.clone(),
        bars,
        result,
        home,
    })
}

pub fn run_batch(
    data: &(dyn DataPort + Sync),
    indices: &[IndexMeta],
    plan: &RunPlan,
) -> Result<BatchReport, IdxtraderError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(plan.threads)
        .build()
        .map_err(|e| IdxtraderError::ConfigInvalid {
            section: "batch".into(),
            key: "threads".into(),
            reason: e.to_string(),
        })?;

    let deadline = plan.timeout.map(|t| Instant::now() + t);
    tracing::info!(
        indices = indices.len(),
        strategies = plan.strategies.len(),
        threads = pool.current_num_threads(),
        "starting batch"
    );

    let outcomes: Vec<Result<IndexBacktest, IndexFailure>> = pool.install(|| {
        indices
            .par_iter()
            .map(|meta| {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    tracing::warn!(code = %meta.code, "run timeout reached before start");
                    return Err(IndexFailure {
                        code: meta.code.clone(),
                        reason: "run timeout reached before start".into(),
                    });
                }
                backtest_index(data, meta, plan).map_err(|e| {
                    tracing::error!(code = %meta.code, error = %e, "index failed");
                    IndexFailure {
                        code: meta.code.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(r) => report.results.push(r),
            Err(f) => report.failures.push(f),
        }
    }
    tracing::info!(
        succeeded = report.results.len(),
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}
