//! JSON report adapter implementing ReportPort.
//!
//! Writes `<output>/index/<code>.json` per index and `<output>/index/home.json`
//! for the summary rows. Missing values serialize as `null`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::batch::IndexBacktest;
use crate::domain::error::IdxtraderError;
use crate::domain::summary::HomeRecord;
use crate::ports::report_port::ReportPort;

pub const HOME_FILE: &str = "home.json";

pub struct JsonReportAdapter {
    index_dir: PathBuf,
}

impl JsonReportAdapter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            index_dir: output_dir.as_ref().join("index"),
        }
    }

    pub fn index_path(&self, code: &str) -> PathBuf {
        self.index_dir.join(format!("{}.json", code))
    }

    pub fn home_path(&self) -> PathBuf {
        self.index_dir.join(HOME_FILE)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), IdxtraderError> {
        fs::create_dir_all(&self.index_dir)?;
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), "report written");
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_index(&self, result: &IndexBacktest) -> Result<(), IdxtraderError> {
        self.write_json(&self.index_path(&result.meta.code), result)
    }

    fn write_home(&self, records: &[HomeRecord]) -> Result<(), IdxtraderError> {
        self.write_json(&self.home_path(), records)
    }
}
