//! Configuration validation.
//!
//! Validates every config section before a run starts.

use crate::domain::error::IdxtraderError;
use crate::domain::strategy::parse_bank;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    validate_backtest(config)?;
    validate_indicators(config)?;
    validate_strategies(config)?;
    validate_summary(config)?;
    validate_filter(config)?;
    validate_batch(config)?;
    validate_data(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> IdxtraderError {
    IdxtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    config.get_date("backtest", "cutoff_date")?;
    if config.get_int("backtest", "warmup_bars", 250)? < 0 {
        return Err(invalid("backtest", "warmup_bars", "warmup_bars must be non-negative"));
    }
    if config.get_double("backtest", "initial_capital", 100_000.0)? <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    let stop_loss = config.get_double("backtest", "stop_loss", 0.15)?;
    if stop_loss <= 0.0 || stop_loss >= 1.0 {
        return Err(invalid("backtest", "stop_loss", "stop_loss must be between 0 and 1"));
    }
    Ok(())
}

/// Comma-separated positive window lengths.
pub fn parse_windows(input: &str) -> Result<Vec<usize>, IdxtraderError> {
    input
        .split(',')
        .map(|t| match t.trim().parse::<usize>() {
            Ok(w) if w > 0 => Ok(w),
            _ => Err(invalid(
                "indicators",
                "ma_windows",
                &format!("invalid window `{}`", t.trim()),
            )),
        })
        .collect()
}

fn validate_indicators(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    if let Some(windows) = config.get_string("indicators", "ma_windows") {
        parse_windows(&windows)?;
    }
    if config.get_int("indicators", "bollinger_period", 20)? < 2 {
        return Err(invalid(
            "indicators",
            "bollinger_period",
            "bollinger_period must be at least 2",
        ));
    }
    if config.get_double("indicators", "bollinger_mult", 2.0)? <= 0.0 {
        return Err(invalid(
            "indicators",
            "bollinger_mult",
            "bollinger_mult must be positive",
        ));
    }
    if config.get_int("indicators", "percentile_window", 500)? < 1 {
        return Err(invalid(
            "indicators",
            "percentile_window",
            "percentile_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    match config.get_string("strategies", "bank") {
        Some(bank) if !bank.trim().is_empty() => parse_bank(&bank).map(|_| ()),
        _ => Ok(()),
    }
}

fn validate_summary(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    let rate = config.get_double("summary", "min_position_rate", 0.15)?;
    if !(0.0..1.0).contains(&rate) {
        return Err(invalid(
            "summary",
            "min_position_rate",
            "min_position_rate must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_filter(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    if config.get_int("filter", "min_years", 3)? < 0 {
        return Err(invalid("filter", "min_years", "min_years must be non-negative"));
    }
    config.get_bool("filter", "require_tracking_fund", true)?;
    config.get_date("filter", "as_of")?;
    if let Some(list) = config.get_string("filter", "black_list") {
        parse_codes(&list).map_err(|e| invalid("filter", "black_list", &e.to_string()))?;
    }
    Ok(())
}

fn validate_batch(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    if config.get_int("batch", "threads", 0)? < 0 {
        return Err(invalid("batch", "threads", "threads must be non-negative"));
    }
    if config.get_int("batch", "timeout_secs", 0)? < 0 {
        return Err(invalid("batch", "timeout_secs", "timeout_secs must be non-negative"));
    }
    Ok(())
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), IdxtraderError> {
    match config.get_string("data", "backend").as_deref() {
        None | Some("csv") => Ok(()),
        Some("sqlite") => {
            if config.get_string("sqlite", "path").is_none() {
                return Err(IdxtraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                });
            }
            if config.get_int("sqlite", "pool_size", 4)? < 1 {
                return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
            }
            Ok(())
        }
        Some(other) => Err(invalid(
            "data",
            "backend",
            &format!("unknown backend '{other}', expected csv or sqlite"),
        )),
    }
}
