//! pairlab - Statistical Arbitrage Pair Analytics Library
//!
//! Screens a ticker universe for co-moving pairs, estimates the
//! Ornstein-Uhlenbeck speed of a pair's return spread, and backtests a
//! z-score threshold rule on the pair's price ratio.
//!
//! # Modules
//!
//! - `domain`: Core data model (PricePanel, ReturnsPanel, result records)
//! - `strategy`: Pair screen, Kalman filter, OU estimator, z-score gate
//! - `backtest`: Threshold-rule simulator and performance evaluator
//! - `ports`: Trait abstractions (PriceDataPort)
//! - `adapters`: External implementations (CSV, synthetic, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: AnalyticsSession use cases

pub mod adapters;
pub mod application;
pub mod backtest;
pub mod config;
pub mod domain;
pub mod ports;
pub mod strategy;
