//! Daily index bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of price and valuation data for an index.
///
/// Valuation fields are optional: the upstream source only publishes them
/// from some point after the index launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub index_code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub change: f64,
    pub amount: f64,
    pub pe_ttm: Option<f64>,
    pub pb: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl Bar {
    /// True when at least one valuation field is present.
    pub fn has_valuation(&self) -> bool {
        self.pe_ttm.is_some() || self.pb.is_some() || self.dividend_yield.is_some()
    }
}

/// Sort by date and drop duplicate dates, keeping the last occurrence.
pub fn normalize(mut bars: Vec<Bar>) -> Vec<Bar> {
    // stable sort keeps input order within a date, so the last row wins below
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar(date: &str) -> Bar {
        Bar {
            index_code: "000300".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
            change: 0.01,
            amount: 5_000_000.0,
            pe_ttm: None,
            pb: None,
            dividend_yield: None,
        }
    }

    #[test]
    fn has_valuation_any_field() {
        let mut bar = sample_bar("2024-01-15");
        assert!(!bar.has_valuation());
        bar.pb = Some(1.2);
        assert!(bar.has_valuation());
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let mut dup = sample_bar("2024-01-02");
        dup.close = 999.0;
        let bars = vec![
            sample_bar("2024-01-03"),
            sample_bar("2024-01-02"),
            dup,
            sample_bar("2024-01-01"),
        ];
        let out = normalize(bars);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(out[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!((out[1].close - 999.0).abs() < f64::EPSILON);
        assert_eq!(out[2].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn normalize_empty() {
        assert!(normalize(vec![]).is_empty());
    }
}
