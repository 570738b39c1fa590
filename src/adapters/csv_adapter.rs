//! CSV file data adapter.
//!
//! Layout under the base directory:
//! - `indices.csv`: one [`IndexMeta`] per row
//! - `<code>.csv`: daily bars with a header row, columns in any order

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::bar::{Bar, normalize};
use crate::domain::error::IdxtraderError;
use crate::domain::universe::IndexMeta;
use crate::ports::data_port::DataPort;

pub const INDEX_LIST_FILE: &str = "indices.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    open: usize,
    close: usize,
    pe_ttm: usize,
    pb: usize,
    dyr: usize,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
    change: Option<usize>,
    amount: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord, code: &str) -> Result<Self, IdxtraderError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| IdxtraderError::MissingColumn {
                code: code.to_string(),
                column: name.to_string(),
            })
        };
        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            close: require("close")?,
            pe_ttm: require("pe_ttm")?,
            pb: require("pb")?,
            dyr: require("dyr")?,
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
            change: find("change"),
            amount: find("amount"),
        })
    }
}

fn cell<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).map(str::trim).unwrap_or("")
}

fn parse_optional(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    code: &str,
) -> Result<Option<f64>, IdxtraderError> {
    let raw = cell(record, idx);
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| IdxtraderError::Data {
            reason: format!("{}: invalid {} value `{}`: {}", code, column, raw, e),
        })
}

fn parse_required(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    code: &str,
) -> Result<f64, IdxtraderError> {
    parse_optional(record, idx, column, code)?.ok_or_else(|| IdxtraderError::Data {
        reason: format!("{}: empty {} value", code, column),
    })
}

fn parse_bars(content: &str, code: &str) -> Result<Vec<Bar>, IdxtraderError> {
    let csv_err = |e: csv::Error| IdxtraderError::Data {
        reason: format!("{}: CSV parse error: {}", code, e),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let cols = Columns::locate(&headers, code)?;

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;

        let date_str = cell(&record, cols.date);
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            IdxtraderError::Data {
                reason: format!("{}: invalid date `{}`: {}", code, date_str, e),
            }
        })?;

        let open = parse_required(&record, cols.open, "open", code)?;
        let close = parse_required(&record, cols.close, "close", code)?;
        let or_else = |col: Option<usize>, name: &str, fallback: f64| -> Result<f64, IdxtraderError> {
            match col {
                Some(idx) => Ok(parse_optional(&record, idx, name, code)?.unwrap_or(fallback)),
                None => Ok(fallback),
            }
        };

        bars.push(Bar {
            index_code: code.to_string(),
            date,
            open,
            high: or_else(cols.high, "high", open.max(close))?,
            low: or_else(cols.low, "low", open.min(close))?,
            close,
            volume: or_else(cols.volume, "volume", 0.0)?,
            change: or_else(cols.change, "change", 0.0)?,
            amount: or_else(cols.amount, "amount", 0.0)?,
            pe_ttm: parse_optional(&record, cols.pe_ttm, "pe_ttm", code)?,
            pb: parse_optional(&record, cols.pb, "pb", code)?,
            dividend_yield: parse_optional(&record, cols.dyr, "dyr", code)?,
        });
    }

    Ok(normalize(bars))
}

impl DataPort for CsvAdapter {
    fn list_indices(&self) -> Result<Vec<IndexMeta>, IdxtraderError> {
        let path = self.base_path.join(INDEX_LIST_FILE);
        let content = fs::read_to_string(&path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut indices = Vec::new();
        for result in rdr.deserialize::<IndexMeta>() {
            let meta = result.map_err(|e| IdxtraderError::Data {
                reason: format!("{}: {}", path.display(), e),
            })?;
            indices.push(meta);
        }
        Ok(indices)
    }

    fn fetch_bars(&self, code: &str) -> Result<Vec<Bar>, IdxtraderError> {
        let path = self.csv_path(code);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(IdxtraderError::NoData {
                    code: code.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        parse_bars(&content, code)
    }
}
