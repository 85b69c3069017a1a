//! Statement data types.

use forecast_shared::types::{MAX_AMOUNT, amount_from_f64};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::builder::YearDrivers;
use super::error::StatementError;

/// Per-year driver series supplied by the assumption repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Driver {
    /// Revenue.
    Revenue,
    /// Staff costs.
    StaffCosts,
    /// Rent.
    Rent,
    /// Other operating expenses.
    Opex,
    /// Capital expenditure.
    Capex,
    /// Depreciation charge.
    Depreciation,
    /// External financing inflow (negative for distributions).
    Financing,
}

impl Driver {
    /// Field name used in errors and serialized payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::StaffCosts => "staffCosts",
            Self::Rent => "rent",
            Self::Opex => "opex",
            Self::Capex => "capex",
            Self::Depreciation => "depreciation",
            Self::Financing => "financing",
        }
    }

    /// Whether the driver is a currency amount that cannot go below zero.
    #[must_use]
    pub const fn is_non_negative(self) -> bool {
        !matches!(self, Self::Financing)
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Balances carried into the first modeled year besides cash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpeningBalances {
    /// Net fixed assets at the start of the horizon.
    pub fixed_assets: Decimal,
    /// Accumulated retained earnings at the start of the horizon.
    pub retained_earnings: Decimal,
    /// Deferred revenue liability at the start of the horizon.
    pub deferred_revenue: Decimal,
}

/// Horizon-aligned driver series for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementInputs {
    /// Revenue per year.
    pub revenue: Vec<Decimal>,
    /// Staff costs per year.
    pub staff_costs: Vec<Decimal>,
    /// Rent per year.
    pub rent: Vec<Decimal>,
    /// Other operating expenses per year.
    pub opex: Vec<Decimal>,
    /// Capital expenditure per year.
    pub capex: Vec<Decimal>,
    /// Depreciation per year.
    pub depreciation: Vec<Decimal>,
    /// Cash at the start of the first year.
    pub beginning_cash: Decimal,
    /// External financing per year; zero when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing: Option<Vec<Decimal>>,
    /// Opening balances other than cash.
    #[serde(default)]
    pub opening: OpeningBalances,
}

impl StatementInputs {
    /// Creates inputs from the six required series and the opening cash.
    #[must_use]
    pub fn new(
        revenue: Vec<Decimal>,
        staff_costs: Vec<Decimal>,
        rent: Vec<Decimal>,
        opex: Vec<Decimal>,
        capex: Vec<Decimal>,
        depreciation: Vec<Decimal>,
        beginning_cash: Decimal,
    ) -> Self {
        Self {
            revenue,
            staff_costs,
            rent,
            opex,
            capex,
            depreciation,
            beginning_cash,
            financing: None,
            opening: OpeningBalances::default(),
        }
    }

    /// Sets the external financing series.
    #[must_use]
    pub fn with_financing(mut self, financing: Vec<Decimal>) -> Self {
        self.financing = Some(financing);
        self
    }

    /// Sets the opening balances.
    #[must_use]
    pub fn with_opening(mut self, opening: OpeningBalances) -> Self {
        self.opening = opening;
        self
    }

    /// Number of modeled years, taken from `revenue`.
    #[must_use]
    pub fn horizon_len(&self) -> usize {
        self.revenue.len()
    }

    fn series(&self) -> Vec<(Driver, &[Decimal])> {
        let mut series = vec![
            (Driver::Revenue, self.revenue.as_slice()),
            (Driver::StaffCosts, self.staff_costs.as_slice()),
            (Driver::Rent, self.rent.as_slice()),
            (Driver::Opex, self.opex.as_slice()),
            (Driver::Capex, self.capex.as_slice()),
            (Driver::Depreciation, self.depreciation.as_slice()),
        ];
        if let Some(financing) = &self.financing {
            series.push((Driver::Financing, financing.as_slice()));
        }
        series
    }

    /// Validates shape and values, returning the horizon length.
    pub fn validate(&self) -> Result<usize, StatementError> {
        let years = self.horizon_len();
        if years == 0 {
            return Err(StatementError::EmptyHorizon);
        }

        let series = self.series();
        for (driver, values) in &series {
            if values.len() != years {
                return Err(StatementError::LengthMismatch {
                    field: driver.as_str().to_string(),
                    expected: years,
                    actual: values.len(),
                });
            }
        }

        for (driver, values) in &series {
            for (year, value) in values.iter().enumerate() {
                if value.abs() > MAX_AMOUNT {
                    return Err(StatementError::invalid_at(
                        year,
                        driver.as_str(),
                        "value exceeds the maximum supported amount",
                    ));
                }
                if driver.is_non_negative() && *value < Decimal::ZERO {
                    return Err(StatementError::invalid_at(
                        year,
                        driver.as_str(),
                        "value must not be negative",
                    ));
                }
            }
        }

        let scalars = [
            ("beginningCash", self.beginning_cash, false),
            ("opening.fixedAssets", self.opening.fixed_assets, true),
            ("opening.retainedEarnings", self.opening.retained_earnings, false),
            ("opening.deferredRevenue", self.opening.deferred_revenue, true),
        ];
        for (field, value, non_negative) in scalars {
            if value.abs() > MAX_AMOUNT {
                return Err(StatementError::invalid(
                    field,
                    "value exceeds the maximum supported amount",
                ));
            }
            if non_negative && value < Decimal::ZERO {
                return Err(StatementError::invalid(field, "value must not be negative"));
            }
        }

        Ok(years)
    }

    /// Drivers for one year. The caller guarantees `year` is in range.
    pub(crate) fn drivers_for(&self, year: usize) -> YearDrivers {
        YearDrivers {
            revenue: self.revenue[year],
            staff_costs: self.staff_costs[year],
            rent: self.rent[year],
            opex: self.opex[year],
            capex: self.capex[year],
            depreciation: self.depreciation[year],
            financing: self
                .financing
                .as_ref()
                .map_or(Decimal::ZERO, |financing| financing[year]),
        }
    }
}

/// Opening balances as raw floating-point numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOpeningBalances {
    /// Net fixed assets.
    pub fixed_assets: f64,
    /// Retained earnings.
    pub retained_earnings: f64,
    /// Deferred revenue.
    pub deferred_revenue: f64,
}

/// Driver series as plain numeric arrays, the shape hosts hand over.
///
/// Convert with `StatementInputs::try_from`; NaN and infinities are rejected
/// with the year and field they were found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatementInputs {
    /// Revenue per year.
    pub revenue: Vec<f64>,
    /// Staff costs per year.
    pub staff_costs: Vec<f64>,
    /// Rent per year.
    pub rent: Vec<f64>,
    /// Other operating expenses per year.
    pub opex: Vec<f64>,
    /// Capital expenditure per year.
    pub capex: Vec<f64>,
    /// Depreciation per year.
    pub depreciation: Vec<f64>,
    /// Cash at the start of the first year.
    pub beginning_cash: f64,
    /// External financing per year.
    #[serde(default)]
    pub financing: Option<Vec<f64>>,
    /// Opening balances other than cash.
    #[serde(default)]
    pub opening: RawOpeningBalances,
}

fn convert_series(driver: Driver, values: &[f64]) -> Result<Vec<Decimal>, StatementError> {
    values
        .iter()
        .enumerate()
        .map(|(year, &value)| {
            amount_from_f64(value)
                .map_err(|err| StatementError::invalid_at(year, driver.as_str(), err.to_string()))
        })
        .collect()
}

fn convert_scalar(field: &str, value: f64) -> Result<Decimal, StatementError> {
    amount_from_f64(value).map_err(|err| StatementError::invalid(field, err.to_string()))
}

impl TryFrom<RawStatementInputs> for StatementInputs {
    type Error = StatementError;

    fn try_from(raw: RawStatementInputs) -> Result<Self, Self::Error> {
        Ok(Self {
            revenue: convert_series(Driver::Revenue, &raw.revenue)?,
            staff_costs: convert_series(Driver::StaffCosts, &raw.staff_costs)?,
            rent: convert_series(Driver::Rent, &raw.rent)?,
            opex: convert_series(Driver::Opex, &raw.opex)?,
            capex: convert_series(Driver::Capex, &raw.capex)?,
            depreciation: convert_series(Driver::Depreciation, &raw.depreciation)?,
            beginning_cash: convert_scalar("beginningCash", raw.beginning_cash)?,
            financing: raw
                .financing
                .as_deref()
                .map(|values| convert_series(Driver::Financing, values))
                .transpose()?,
            opening: OpeningBalances {
                fixed_assets: convert_scalar("opening.fixedAssets", raw.opening.fixed_assets)?,
                retained_earnings: convert_scalar(
                    "opening.retainedEarnings",
                    raw.opening.retained_earnings,
                )?,
                deferred_revenue: convert_scalar(
                    "opening.deferredRevenue",
                    raw.opening.deferred_revenue,
                )?,
            },
        })
    }
}

/// Profit & Loss for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    /// Zero-based year index.
    pub year_index: usize,
    /// Revenue.
    pub revenue: Decimal,
    /// Cost of goods sold.
    pub cogs: Decimal,
    /// Revenue - COGS.
    pub gross_profit: Decimal,
    /// Staff costs + rent + opex.
    pub operating_expenses: Decimal,
    /// Gross profit - operating expenses.
    pub ebitda: Decimal,
    /// Depreciation charge.
    pub depreciation: Decimal,
    /// EBITDA - depreciation.
    pub ebit: Decimal,
    /// Interest expense (negative when cash earns interest).
    pub interest: Decimal,
    /// Income taxes.
    pub taxes: Decimal,
    /// EBIT - interest - taxes.
    pub net_income: Decimal,
}

/// Balance sheet at the end of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    /// Zero-based year index.
    pub year_index: usize,
    /// Cash, equal to the cash flow's ending cash.
    pub cash: Decimal,
    /// Net fixed assets.
    pub fixed_assets: Decimal,
    /// Cash + fixed assets.
    pub total_assets: Decimal,
    /// Revenue collected in advance.
    pub deferred_revenue: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Contributed capital.
    pub paid_in_capital: Decimal,
    /// Accumulated net income.
    pub retained_earnings: Decimal,
    /// Paid-in capital + retained earnings.
    pub total_equity: Decimal,
    /// Total liabilities + total equity.
    pub total_liabilities_and_equity: Decimal,
    /// Whether `balance_difference` is within tolerance.
    pub is_balanced: bool,
    /// Total assets - total liabilities and equity.
    pub balance_difference: Decimal,
}

/// Cash flow statement for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    /// Zero-based year index.
    pub year_index: usize,
    /// Net income the cash projection was built on.
    pub net_income: Decimal,
    /// Depreciation add-back.
    pub depreciation: Decimal,
    /// Change in working capital.
    pub working_capital_change: Decimal,
    /// Net income + depreciation + working capital change.
    pub operating_cash_flow: Decimal,
    /// Capital expenditure.
    pub capex: Decimal,
    /// Negative capex.
    pub investing_cash_flow: Decimal,
    /// External financing.
    pub financing_cash_flow: Decimal,
    /// Operating + investing + financing.
    pub net_cash_change: Decimal,
    /// Prior year's ending cash.
    pub beginning_cash: Decimal,
    /// Beginning cash + net cash change.
    pub ending_cash: Decimal,
}

/// Terminal state of the convergence driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceStatus {
    /// Every year balanced within tolerance.
    Converged,
    /// The iteration cap was reached first.
    Exhausted,
    /// The next pass left the decimal range; the last complete pass is
    /// returned unbalanced.
    Diverged,
}

/// Outcome of the outer iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceReport {
    /// Number of complete full-horizon passes.
    pub passes: u32,
    /// Whether every year balanced within tolerance.
    pub balanced: bool,
    /// Absolute tolerance used.
    pub tolerance: Decimal,
    /// Iteration cap in force.
    pub iteration_cap: u32,
    /// Terminal state.
    pub status: ConvergenceStatus,
    /// Largest absolute balance difference in the returned set.
    pub max_balance_difference: Decimal,
}

/// Converged (or best-effort) three-statement set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSet {
    /// Profit & Loss per year.
    pub profit_and_loss: Vec<ProfitAndLoss>,
    /// Balance sheet per year.
    pub balance_sheet: Vec<BalanceSheet>,
    /// Cash flow per year.
    pub cash_flow: Vec<CashFlow>,
    /// Convergence report.
    pub convergence: ConvergenceReport,
    /// Whether this result was returned from cache.
    #[serde(default)]
    pub cached: bool,
}

impl StatementSet {
    /// Number of modeled years.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profit_and_loss.len()
    }

    /// Whether the set holds no years.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profit_and_loss.is_empty()
    }

    /// Year indices whose balance sheet is out of tolerance.
    #[must_use]
    pub fn unbalanced_years(&self) -> Vec<usize> {
        self.balance_sheet
            .iter()
            .filter(|bs| !bs.is_balanced)
            .map(|bs| bs.year_index)
            .collect()
    }
}
