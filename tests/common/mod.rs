#![allow(dead_code)]

use chrono::NaiveDate;
use idxtrader::domain::bar::Bar;
use idxtrader::domain::batch::IndexBacktest;
use idxtrader::domain::error::IdxtraderError;
use idxtrader::domain::summary::HomeRecord;
use idxtrader::domain::universe::IndexMeta;
use idxtrader::ports::data_port::DataPort;
use idxtrader::ports::report_port::ReportPort;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Mutex;

pub struct MockDataPort {
    pub indices: Vec<IndexMeta>,
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            indices: Vec::new(),
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_index(mut self, meta: IndexMeta, bars: Vec<Bar>) -> Self {
        self.data.insert(meta.code.clone(), bars);
        self.indices.push(meta);
        self
    }

    pub fn with_error(mut self, meta: IndexMeta, reason: &str) -> Self {
        self.errors.insert(meta.code.clone(), reason.to_string());
        self.indices.push(meta);
        self
    }
}

impl DataPort for MockDataPort {
    fn list_indices(&self) -> Result<Vec<IndexMeta>, IdxtraderError> {
        Ok(self.indices.clone())
    }

    fn fetch_bars(&self, code: &str) -> Result<Vec<Bar>, IdxtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(IdxtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(code).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockReportPort {
    pub indices: Mutex<Vec<String>>,
    pub home: Mutex<Vec<HomeRecord>>,
}

impl ReportPort for MockReportPort {
    fn write_index(&self, result: &IndexBacktest) -> Result<(), IdxtraderError> {
        self.indices.lock().unwrap().push(result.meta.code.clone());
        Ok(())
    }

    fn write_home(&self, records: &[HomeRecord]) -> Result<(), IdxtraderError> {
        *self.home.lock().unwrap() = records.to_vec();
        Ok(())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn meta(code: &str) -> IndexMeta {
    IndexMeta {
        code: code.to_string(),
        name: format!("Index {code}"),
        launch_date: date("2005-01-04"),
        tracking_fund_count: 5,
        constituent_count: 300,
    }
}

pub fn make_bar(code: &str, date: NaiveDate, close: f64, pe: f64, pb: f64, dyr: f64) -> Bar {
    Bar {
        index_code: code.to_string(),
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000_000.0,
        change: 0.0,
        amount: close * 1_000_000.0,
        pe_ttm: Some(pe),
        pb: Some(pb),
        dividend_yield: Some(dyr),
    }
}

/// `n` consecutive daily bars from `start` with cyclical prices and
/// valuations, so threshold strategies trade repeatedly.
pub fn cyclical_bars(code: &str, start: NaiveDate, n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let price_phase = 2.0 * PI * t / 90.0;
            let value_phase = 2.0 * PI * t / 140.0;
            let close = 1000.0 + 150.0 * price_phase.sin() + 0.2 * t;
            let mut bar = make_bar(
                code,
                start + chrono::Duration::days(i as i64),
                close,
                12.0 + 4.0 * value_phase.sin(),
                1.4 + 0.3 * (value_phase + 0.4).sin(),
                0.025 - 0.008 * (value_phase - 0.3).sin(),
            );
            bar.open = close - 5.0 * (price_phase * 3.0).cos();
            bar
        })
        .collect()
}

/// `history` bars before `cutoff` followed by `after` bars on and after it.
pub fn bars_around_cutoff(code: &str, cutoff: NaiveDate, history: usize, after: usize) -> Vec<Bar> {
    cyclical_bars(
        code,
        cutoff - chrono::Duration::days(history as i64),
        history + after,
    )
}
