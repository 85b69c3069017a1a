//! Projection policy: rates for the rows that are derived rather than driven.
//!
//! Every rate defaults to zero, which leaves COGS, interest, taxes and deferred
//! revenue at zero.

use forecast_shared::types::round_currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::StatementError;

/// Balance interest is charged on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestBasis {
    /// Year-end cash balance.
    #[default]
    Ending,
    /// Mean of opening and year-end cash.
    Average,
}

/// Rates applied while building each year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectionPolicy {
    /// COGS as a share of revenue (0 to 1).
    pub cogs_rate: Decimal,
    /// Tax rate on positive pre-tax income (0 to 1).
    pub tax_rate: Decimal,
    /// Rate charged on net debt, i.e. negative cash (-1 to 1).
    ///
    /// Positive cash yields negative interest expense (interest income).
    pub interest_rate: Decimal,
    /// Balance the interest rate applies to.
    pub interest_basis: InterestBasis,
    /// Share of a year's revenue held as deferred revenue at year end (0 to 1).
    pub deferred_revenue_rate: Decimal,
}

impl ProjectionPolicy {
    /// Checks every rate against its allowed range.
    pub fn validate(&self) -> Result<(), StatementError> {
        let unit = [
            ("policy.cogsRate", self.cogs_rate),
            ("policy.taxRate", self.tax_rate),
            ("policy.deferredRevenueRate", self.deferred_revenue_rate),
        ];
        for (field, rate) in unit {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(StatementError::invalid(field, "rate must be between 0 and 1"));
            }
        }

        if self.interest_rate < Decimal::NEGATIVE_ONE || self.interest_rate > Decimal::ONE {
            return Err(StatementError::invalid(
                "policy.interestRate",
                "rate must be between -1 and 1",
            ));
        }

        Ok(())
    }

    /// Whether interest depends on the year's own cash balance.
    #[must_use]
    pub fn is_circular(&self) -> bool {
        !self.interest_rate.is_zero()
    }

    /// Cost of goods sold for a year's revenue, `None` on overflow.
    #[must_use]
    pub fn cogs(&self, revenue: Decimal) -> Option<Decimal> {
        self.cogs_rate.checked_mul(revenue).map(round_currency)
    }

    /// Interest expense given the year's opening and ending cash.
    ///
    /// Returns `None` when the product leaves the decimal range.
    #[must_use]
    pub fn interest(&self, beginning_cash: Decimal, ending_cash: Decimal) -> Option<Decimal> {
        if self.interest_rate.is_zero() {
            return Some(Decimal::ZERO);
        }

        let cash = match self.interest_basis {
            InterestBasis::Ending => ending_cash,
            InterestBasis::Average => beginning_cash.checked_add(ending_cash)? / Decimal::TWO,
        };
        self.interest_rate.checked_mul(-cash).map(round_currency)
    }

    /// Taxes on pre-tax income; losses are not taxed.
    #[must_use]
    pub fn taxes(&self, pre_tax_income: Decimal) -> Option<Decimal> {
        if pre_tax_income <= Decimal::ZERO {
            return Some(Decimal::ZERO);
        }
        self.tax_rate.checked_mul(pre_tax_income).map(round_currency)
    }

    /// Deferred revenue liability at year end, `None` on overflow.
    #[must_use]
    pub fn deferred_revenue(&self, revenue: Decimal) -> Option<Decimal> {
        self.deferred_revenue_rate
            .checked_mul(revenue)
            .map(round_currency)
    }
}
