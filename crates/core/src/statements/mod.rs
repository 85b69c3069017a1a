//! Three-statement financial projections.
//!
//! Turns per-year operating drivers into a P&L, balance sheet and cash flow
//! for every year of the horizon, iterating until the balance sheets balance.

pub mod builder;
pub mod cache;
pub mod engine;
pub mod error;
pub mod policy;
pub mod ratios;
pub mod types;

#[cfg(test)]
mod tests;

pub use builder::{CarriedState, StatementBuilder, YearDrivers, YearStatements};
pub use cache::{CacheKey, CachedGenerator, MokaStatementCache, StatementCache};
pub use engine::{
    DEFAULT_ITERATION_CAP, DEFAULT_TOLERANCE, EngineSettings, StatementEngine, generate_statements,
};
pub use error::StatementError;
pub use policy::{InterestBasis, ProjectionPolicy};
pub use ratios::YearRatios;
pub use types::{
    BalanceSheet, CashFlow, ConvergenceReport, ConvergenceStatus, Driver, OpeningBalances,
    ProfitAndLoss, RawOpeningBalances, RawStatementInputs, StatementInputs, StatementSet,
};
