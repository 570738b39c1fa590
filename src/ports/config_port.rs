//! Configuration access port trait.

use chrono::NaiveDate;

use crate::domain::error::IdxtraderError;

/// Typed access to `[section] key` values.
///
/// Absent or blank keys yield the default; present but unparsable values
/// are `ConfigInvalid`.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, IdxtraderError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, IdxtraderError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, IdxtraderError>;

    /// `YYYY-MM-DD`.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, IdxtraderError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| IdxtraderError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("invalid date `{}`, expected YYYY-MM-DD", s.trim()),
                }),
            _ => Ok(None),
        }
    }
}
