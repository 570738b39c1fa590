//! Per-strategy position state.

use chrono::NaiveDate;

/// Mutable state of one strategy. Evolves strictly in date order and is
/// owned by a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyState {
    pub in_position: bool,
    pub entry_date: Option<NaiveDate>,
    pub entry_price: f64,
    pub capital: f64,
    pub shares: f64,
    pub total_holding_days: i64,
    pub first_evaluated: Option<NaiveDate>,
    pub last_evaluated: Option<NaiveDate>,
}

impl StrategyState {
    pub fn new(initial_capital: f64) -> Self {
        StrategyState {
            in_position: false,
            entry_date: None,
            entry_price: 0.0,
            capital: initial_capital,
            shares: 0.0,
            total_holding_days: 0,
            first_evaluated: None,
            last_evaluated: None,
        }
    }

    pub fn mark_evaluated(&mut self, date: NaiveDate) {
        if self.first_evaluated.is_none() {
            self.first_evaluated = Some(date);
        }
        self.last_evaluated = Some(date);
    }

    /// Commit the full capital at `price`. Returns the notional committed.
    pub fn open(&mut self, date: NaiveDate, price: f64) -> f64 {
        self.in_position = true;
        self.entry_date = Some(date);
        self.entry_price = price;
        self.shares = self.capital / price;
        self.capital
    }

    /// Fractional move from the entry price; 0 when no entry price is set.
    pub fn return_since_entry(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss_pct: f64) -> bool {
        self.in_position && self.return_since_entry(price) <= -stop_loss_pct
    }

    /// Liquidate at `price` on `date`. Returns the resulting capital.
    pub fn close(&mut self, date: NaiveDate, price: f64) -> f64 {
        let proceeds = self.shares * price;
        if let Some(entry) = self.entry_date {
            self.total_holding_days += (date - entry).num_days();
        }
        self.in_position = false;
        self.entry_date = None;
        self.entry_price = 0.0;
        self.shares = 0.0;
        self.capital = proceeds;
        proceeds
    }

    pub fn window_duration_days(&self) -> i64 {
        match (self.first_evaluated, self.last_evaluated) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }
}
