//! Ports Layer - Trait definitions for external dependencies
//!
//! The analytics core never fetches data itself. Price sources implement
//! `PriceDataPort` and hand back a ready `PricePanel`.

pub mod price_data;

pub use price_data::{MarketDataError, PriceDataPort, PriceQuery};

#[cfg(test)]
pub use price_data::MockPriceDataPort;
