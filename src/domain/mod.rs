//! Core domain types and logic: bar enrichment and the backtest simulator.

pub mod backtest;
pub mod config;
pub mod divergence;
pub mod error;
pub mod execution;
pub mod fusion;
pub mod indicator;
pub mod levels;
pub mod metrics;
pub mod ohlcv;
pub mod patterns;
pub mod pipeline;
pub mod portfolio;
pub mod position;
pub mod resample;
pub mod swing;

#[cfg(test)]
pub(crate) mod testkit;
