//! Index universe: metadata and eligibility filtering.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub code: String,
    pub name: String,
    pub launch_date: NaiveDate,
    pub tracking_fund_count: u32,
    pub constituent_count: u32,
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub min_years: u32,
    pub require_tracking_fund: bool,
    pub black_list: Vec<String>,
    pub as_of: NaiveDate,
}

impl FilterConfig {
    pub fn with_as_of(as_of: NaiveDate) -> Self {
        FilterConfig {
            min_years: 3,
            require_tracking_fund: true,
            black_list: Vec::new(),
            as_of,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

/// Comma-separated codes; an empty or blank input is an empty list.
pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut codes = Vec::new();
    let mut seen = HashSet::new();
    for token in input.split(',') {
        let code = token.trim();
        if code.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !seen.insert(code.to_string()) {
            return Err(UniverseError::DuplicateCode(code.to_string()));
        }
        codes.push(code.to_string());
    }
    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    TooYoung { days: i64 },
    NoConstituents,
    NoTrackingFund,
    BlackListed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooYoung { days } => write!(f, "launched only {days} days ago"),
            SkipReason::NoConstituents => write!(f, "no constituents"),
            SkipReason::NoTrackingFund => write!(f, "no tracking fund"),
            SkipReason::BlackListed => write!(f, "black-listed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedIndex {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct FilteredUniverse {
    pub eligible: Vec<IndexMeta>,
    pub skipped: Vec<SkippedIndex>,
}

pub fn eligibility(meta: &IndexMeta, config: &FilterConfig) -> Result<(), SkipReason> {
    if config.black_list.iter().any(|c| c == &meta.code) {
        return Err(SkipReason::BlackListed);
    }
    let days = (config.as_of - meta.launch_date).num_days();
    if days < 365 * i64::from(config.min_years) {
        return Err(SkipReason::TooYoung { days });
    }
    if meta.constituent_count == 0 {
        return Err(SkipReason::NoConstituents);
    }
    if config.require_tracking_fund && meta.tracking_fund_count == 0 {
        return Err(SkipReason::NoTrackingFund);
    }
    Ok(())
}

/// Split `indices` into eligible and skipped, preserving input order.
pub fn filter_indices(indices: Vec<IndexMeta>, config: &FilterConfig) -> FilteredUniverse {
    let mut out = FilteredUniverse::default();
    for meta in indices {
        match eligibility(&meta, config) {
            Ok(()) => out.eligible.push(meta),
            Err(reason) => {
                tracing::debug!(code = %meta.code, %reason, "index filtered out");
                out.skipped.push(SkippedIndex {
                    code: meta.code,
                    reason,
                });
            }
        }
    }
    tracing::info!(
        eligible = out.eligible.len(),
        skipped = out.skipped.len(),
        "index universe filtered"
    );
    out
}
