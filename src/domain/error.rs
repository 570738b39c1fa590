//! Domain error types.

/// Top-level error type for idxtrader.
#[derive(Debug, thiserror::Error)]
pub enum IdxtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("missing required column `{column}` for {code}")]
    MissingColumn { code: String, column: String },

    #[error("invalid strategy {name}: {reason}")]
    InvalidStrategy { name: String, reason: String },

    #[error("no data for index {code}")]
    NoData { code: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&IdxtraderError> for std::process::ExitCode {
    fn from(err: &IdxtraderError) -> Self {
        let code: u8 = match err {
            IdxtraderError::Io(_) | IdxtraderError::Json(_) => 1,
            IdxtraderError::ConfigParse { .. }
            | IdxtraderError::ConfigMissing { .. }
            | IdxtraderError::ConfigInvalid { .. } => 2,
            IdxtraderError::Database { .. } => 3,
            IdxtraderError::InvalidStrategy { .. } => 4,
            IdxtraderError::Data { .. }
            | IdxtraderError::MissingColumn { .. }
            | IdxtraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
