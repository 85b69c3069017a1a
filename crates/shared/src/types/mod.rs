//! Common types used across the application.

pub mod amount;
pub mod horizon;
pub mod id;

pub use amount::{CURRENCY_SCALE, MAX_AMOUNT, amount_from_f64, round_currency, within_tolerance};
pub use horizon::Horizon;
pub use id::*;
