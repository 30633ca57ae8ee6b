//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - CSV: wide close-price files
//! - Synthetic: seeded correlated random walks
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod csv_prices;
pub mod synthetic;

pub use cli::CliApp;
pub use csv_prices::CsvPriceData;
pub use synthetic::SyntheticPriceData;
