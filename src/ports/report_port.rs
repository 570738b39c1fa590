//! Report output port trait.

use crate::domain::batch::IndexBacktest;
use crate::domain::error::IdxtraderError;
use crate::domain::summary::HomeRecord;

/// Port for persisting backtest results.
pub trait ReportPort {
    fn write_index(&self, result: &IndexBacktest) -> Result<(), IdxtraderError>;

    fn write_home(&self, records: &[HomeRecord]) -> Result<(), IdxtraderError>;
}
