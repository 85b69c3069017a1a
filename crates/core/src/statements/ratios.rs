//! Derived margin ratios.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::StatementError;
use super::types::{ProfitAndLoss, StatementSet};

/// Decimal places kept for ratios.
const RATIO_SCALE: u32 = 4;

/// Margins for one year, as fractions of revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRatios {
    /// Zero-based year index.
    pub year_index: usize,
    /// Gross profit / revenue.
    pub gross_margin: Decimal,
    /// EBITDA / revenue.
    pub ebitda_margin: Decimal,
    /// Net income / revenue.
    pub net_margin: Decimal,
}

fn ratio(
    year: usize,
    name: &'static str,
    numerator: Decimal,
    denominator: Decimal,
) -> Result<Decimal, StatementError> {
    numerator
        .checked_div(denominator)
        .map(|value| value.round_dp(RATIO_SCALE))
        .ok_or(StatementError::DivisionByZero { year, ratio: name })
}

impl YearRatios {
    /// Computes margins for a single P&L.
    pub fn from_profit_and_loss(pl: &ProfitAndLoss) -> Result<Self, StatementError> {
        let year = pl.year_index;
        Ok(Self {
            year_index: year,
            gross_margin: ratio(year, "gross_margin", pl.gross_profit, pl.revenue)?,
            ebitda_margin: ratio(year, "ebitda_margin", pl.ebitda, pl.revenue)?,
            net_margin: ratio(year, "net_margin", pl.net_income, pl.revenue)?,
        })
    }
}

impl StatementSet {
    /// Margins for every year; fails on the first year without revenue.
    pub fn ratios(&self) -> Result<Vec<YearRatios>, StatementError> {
        self.profit_and_loss
            .iter()
            .map(YearRatios::from_profit_and_loss)
            .collect()
    }
}
