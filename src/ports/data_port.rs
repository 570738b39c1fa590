//! Data access port trait.

use crate::domain::bar::Bar;
use crate::domain::error::IdxtraderError;
use crate::domain::universe::IndexMeta;

pub trait DataPort {
    /// All known indices, unfiltered.
    fn list_indices(&self) -> Result<Vec<IndexMeta>, IdxtraderError>;

    /// Daily bars for one index. Ordering is not guaranteed; callers
    /// normalize before use.
    fn fetch_bars(&self, code: &str) -> Result<Vec<Bar>, IdxtraderError>;
}
