//! RobustLab Core: domain types, price providers, strategy trait, deterministic RNG.
//!
//! This crate holds everything the validation engine consumes:
//! - Domain types (portfolios, parameter records, price series, date windows)
//! - The `PriceProvider` trait with in-memory, CSV-directory, caching, and
//!   synthetic (test-only) implementations
//! - Close alignment and cleaning (coverage filter, forward fill)
//! - The `Strategy` trait with fixed-weight and momentum implementations
//! - A BLAKE3-derived RNG hierarchy for order-independent sampling

pub mod data;
pub mod domain;
pub mod rng;
pub mod strategy;

pub use data::{DataError, PriceProvider};
pub use domain::{DateWindow, ParamValue, Portfolio, PricePoint, PriceSeries, StrategyParams};
pub use rng::RngHierarchy;
pub use strategy::{Strategy, StrategyError};
