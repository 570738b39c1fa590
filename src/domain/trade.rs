//! Append-only trade log.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    Buy,
    StopLossSell,
    TakeProfitSell,
    ForceSell,
}

impl TradeDirection {
    pub fn is_sell(self) -> bool {
        !matches!(self, TradeDirection::Buy)
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeDirection::Buy => "buy",
            TradeDirection::StopLossSell => "stop_loss_sell",
            TradeDirection::TakeProfitSell => "take_profit_sell",
            TradeDirection::ForceSell => "force_sell",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub strategy_name: String,
    pub direction: TradeDirection,
    pub traded_amount: f64,
    pub price: f64,
    pub resulting_cash: f64,
}

/// Capital and holding days reconstructed from a strategy's events.
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub final_capital: f64,
    pub total_holding_days: i64,
    pub round_trips: usize,
}

/// Rebuild the terminal figures of `strategy_name` from the log alone.
///
/// Buys commit all capital at the event price; sells realize
/// `shares × price`. Events for other strategies are ignored.
pub fn replay(events: &[TradeEvent], strategy_name: &str, initial_capital: f64) -> Replay {
    let mut capital = initial_capital;
    let mut shares = 0.0;
    let mut entry: Option<NaiveDate> = None;
    let mut total_holding_days = 0;
    let mut round_trips = 0;

    for event in events.iter().filter(|e| e.strategy_name == strategy_name) {
        match event.direction {
            TradeDirection::Buy => {
                shares = capital / event.price;
                entry = Some(event.date);
            }
            _ => {
                capital = shares * event.price;
                shares = 0.0;
                if let Some(d) = entry.take() {
                    total_holding_days += (event.date - d).num_days();
                }
                round_trips += 1;
            }
        }
    }

    Replay {
        final_capital: capital,
        total_holding_days,
        round_trips,
    }
}
