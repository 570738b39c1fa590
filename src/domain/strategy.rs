//! Threshold strategy configurations.

use serde::{Deserialize, Serialize};

use crate::domain::error::IdxtraderError;
use crate::domain::signal::IndicatorMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub mode: IndicatorMode,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

impl StrategyConfig {
    /// Named after its thresholds in percent, e.g. `10-40 valuation`.
    pub fn new(mode: IndicatorMode, buy_threshold: f64, sell_threshold: f64) -> Self {
        let name = format!(
            "{:.0}-{:.0} {}",
            buy_threshold * 100.0,
            sell_threshold * 100.0,
            mode
        );
        StrategyConfig {
            name,
            mode,
            buy_threshold,
            sell_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), IdxtraderError> {
        let in_unit = |t: f64| t > 0.0 && t < 1.0;
        if !in_unit(self.buy_threshold) || !in_unit(self.sell_threshold) {
            return Err(IdxtraderError::InvalidStrategy {
                name: self.name.clone(),
                reason: "thresholds must lie strictly between 0 and 1".into(),
            });
        }
        if self.buy_threshold >= self.sell_threshold {
            return Err(IdxtraderError::InvalidStrategy {
                name: self.name.clone(),
                reason: "buy_threshold must be below sell_threshold".into(),
            });
        }
        Ok(())
    }
}

/// Sixteen threshold pairs per mode: buy in 0.10..=0.45 step 0.05, sell at
/// buy + 0.30 and buy + 0.40.
pub fn default_bank() -> Vec<StrategyConfig> {
    let mut bank = Vec::with_capacity(32);
    for mode in IndicatorMode::ALL {
        for step in 0..8 {
            let buy = (10 + step * 5) as f64 / 100.0;
            for spread in [30, 40] {
                let sell = (10 + step * 5 + spread) as f64 / 100.0;
                bank.push(StrategyConfig::new(mode, buy, sell));
            }
        }
    }
    bank
}

/// Parse `mode:buy:sell` entries separated by commas.
pub fn parse_bank(input: &str) -> Result<Vec<StrategyConfig>, IdxtraderError> {
    let invalid = |reason: String| IdxtraderError::ConfigInvalid {
        section: "strategies".into(),
        key: "bank".into(),
        reason,
    };

    let mut bank = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid("empty strategy entry".into()));
        }
        let parts: Vec<&str> = token.split(':').collect();
        let [mode, buy, sell] = parts.as_slice() else {
            return Err(invalid(format!("expected mode:buy:sell, got `{token}`")));
        };
        let mode: IndicatorMode = mode.parse().map_err(invalid)?;
        let buy: f64 = buy
            .trim()
            .parse()
            .map_err(|_| invalid(format!("invalid buy threshold in `{token}`")))?;
        let sell: f64 = sell
            .trim()
            .parse()
            .map_err(|_| invalid(format!("invalid sell threshold in `{token}`")))?;
        let config = StrategyConfig::new(mode, buy, sell);
        config.validate()?;
        if bank.iter().any(|c: &StrategyConfig| c.name == config.name) {
            return Err(invalid(format!("duplicate strategy `{}`", config.name)));
        }
        bank.push(config);
    }
    Ok(bank)
}
