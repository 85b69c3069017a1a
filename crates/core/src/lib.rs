//! Core business logic for Forecast.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `statements` - Three-statement projections (P&L, balance sheet, cash flow)
//!   with convergence of the circular interest/cash dependency

pub mod statements;
