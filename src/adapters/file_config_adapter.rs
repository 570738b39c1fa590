//! INI file configuration adapter.

use std::fs;
use std::path::Path;

use configparser::ini::Ini;

use crate::domain::error::IdxtraderError;
use crate::ports::config_port::ConfigPort;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, IdxtraderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, IdxtraderError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, file: &str) -> Result<Self, IdxtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| IdxtraderError::ConfigParse {
                file: file.to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    fn typed<T>(
        &self,
        section: &str,
        key: &str,
        default: T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, IdxtraderError> {
        match self.get_string(section, key) {
            Some(raw) if !raw.trim().is_empty() => {
                parse(raw.trim()).ok_or_else(|| IdxtraderError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("cannot parse `{}`", raw.trim()),
                })
            }
            _ => Ok(default),
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, IdxtraderError> {
        self.typed(section, key, default, |s| s.parse().ok())
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, IdxtraderError> {
        self.typed(section, key, default, |s| s.parse().ok())
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, IdxtraderError> {
        self.typed(section, key, default, Self::parse_bool)
    }
}
