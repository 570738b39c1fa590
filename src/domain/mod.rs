//! Core domain types and logic.

pub mod bar;
pub mod indicator;
pub mod enrich;
pub mod signal;
pub mod strategy;
pub mod position;
pub mod trade;
pub mod backtest;
pub mod metrics;
pub mod summary;
pub mod universe;
pub mod batch;
pub mod config_validation;
pub mod error;
