//! SQLite bar store.
//!
//! Holds the same index list and bar history the CSV adapter reads, so a
//! data directory can be imported once and backtested repeatedly.

use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

use crate::domain::bar::Bar;
use crate::domain::error::IdxtraderError;
use crate::domain::universe::IndexMeta;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> IdxtraderError {
    IdxtraderError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> IdxtraderError {
    IdxtraderError::Database {
        reason: e.to_string(),
    }
}

fn parse_date(idx: usize, text: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, IdxtraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| IdxtraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;
        let pool_size = u32::try_from(config.get_int("sqlite", "pool_size", 4)?).unwrap_or(1).max(1);

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, IdxtraderError> {
        // every pooled connection to :memory: is a separate database
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_err)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, IdxtraderError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), IdxtraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS indices (
                    code TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    launch_date TEXT NOT NULL,
                    tracking_fund_count INTEGER NOT NULL,
                    constituent_count INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS bars (
                    index_code TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL NOT NULL,
                    change REAL NOT NULL,
                    amount REAL NOT NULL,
                    pe_ttm REAL,
                    pb REAL,
                    dyr REAL,
                    PRIMARY KEY (index_code, date)
                );",
            )
            .map_err(query_err)
    }

    pub fn insert_indices(&self, indices: &[IndexMeta]) -> Result<(), IdxtraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        for meta in indices {
            tx.execute(
                "INSERT OR REPLACE INTO indices
                 (code, name, launch_date, tracking_fund_count, constituent_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    meta.code,
                    meta.name,
                    meta.launch_date.format("%Y-%m-%d").to_string(),
                    meta.tracking_fund_count,
                    meta.constituent_count
                ],
            )
            .map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    /// Later rows for an existing `(index_code, date)` replace earlier ones.
    pub fn insert_bars(&self, bars: &[Bar]) -> Result<(), IdxtraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO bars
                 (index_code, date, open, high, low, close, volume, change, amount, pe_ttm, pb, dyr)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    bar.index_code,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    bar.change,
                    bar.amount,
                    bar.pe_ttm,
                    bar.pb,
                    bar.dividend_yield
                ],
            )
            .map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    /// First and last bar date plus bar count for `code`.
    pub fn data_range(&self, code: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, IdxtraderError> {
        let conn = self.conn()?;
        let row: Option<(Option<String>, Option<String>, i64)> = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM bars WHERE index_code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(query_err)?;

        match row {
            Some((Some(min), Some(max), count)) if count > 0 => Ok(Some((
                parse_date(0, min).map_err(query_err)?,
                parse_date(1, max).map_err(query_err)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}

impl DataPort for SqliteAdapter {
    fn list_indices(&self) -> Result<Vec<IndexMeta>, IdxtraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT code, name, launch_date, tracking_fund_count, constituent_count
                 FROM indices ORDER BY code",
            )
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(IndexMeta {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    launch_date: parse_date(2, row.get(2)?)?,
                    tracking_fund_count: row.get(3)?,
                    constituent_count: row.get(4)?,
                })
            })
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn fetch_bars(&self, code: &str) -> Result<Vec<Bar>, IdxtraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT index_code, date, open, high, low, close, volume, change, amount,
                        pe_ttm, pb, dyr
                 FROM bars WHERE index_code = ?1 ORDER BY date ASC",
            )
            .map_err(query_err)?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok(Bar {
                    index_code: row.get(0)?,
                    date: parse_date(1, row.get(1)?)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                    change: row.get(7)?,
                    amount: row.get(8)?,
                    pe_ttm: row.get(9)?,
                    pb: row.get(10)?,
                    dividend_yield: row.get(11)?,
                })
            })
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }
}
