//! Shared types, errors, and configuration for Forecast.
//!
//! This crate provides common types used across all other crates:
//! - Currency amount helpers with decimal precision
//! - Typed IDs for scenario references
//! - The modeled horizon (start/end year)
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
