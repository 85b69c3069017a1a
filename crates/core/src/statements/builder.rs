//! Per-year statement builder.
//!
//! Builds one year's P&L, balance sheet and cash flow from that year's
//! drivers and the state carried forward from the year before.

use forecast_shared::types::within_tolerance;
use rust_decimal::Decimal;

use super::error::StatementError;
use super::policy::ProjectionPolicy;
use super::types::{BalanceSheet, CashFlow, OpeningBalances, ProfitAndLoss, StatementInputs};

/// One year's driver values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearDrivers {
    /// Revenue.
    pub revenue: Decimal,
    /// Staff costs.
    pub staff_costs: Decimal,
    /// Rent.
    pub rent: Decimal,
    /// Other operating expenses.
    pub opex: Decimal,
    /// Capital expenditure.
    pub capex: Decimal,
    /// Depreciation.
    pub depreciation: Decimal,
    /// External financing.
    pub financing: Decimal,
}

/// Balances that roll from one year's close into the next year's open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarriedState {
    /// Ending cash (from the cash flow).
    pub cash: Decimal,
    /// Net fixed assets.
    pub fixed_assets: Decimal,
    /// Retained earnings (from the P&L).
    pub retained_earnings: Decimal,
    /// Deferred revenue liability.
    pub deferred_revenue: Decimal,
    /// Contributed capital.
    pub paid_in_capital: Decimal,
}

impl CarriedState {
    /// Opening state for the first year.
    ///
    /// Paid-in capital is whatever makes the opening balance sheet balance.
    #[must_use]
    pub fn opening(inputs: &StatementInputs) -> Self {
        let OpeningBalances {
            fixed_assets,
            retained_earnings,
            deferred_revenue,
        } = inputs.opening;

        Self {
            cash: inputs.beginning_cash,
            fixed_assets,
            retained_earnings,
            deferred_revenue,
            paid_in_capital: inputs.beginning_cash + fixed_assets
                - deferred_revenue
                - retained_earnings,
        }
    }
}

/// The three statements for one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearStatements {
    /// Profit & Loss.
    pub profit_and_loss: ProfitAndLoss,
    /// Balance sheet.
    pub balance_sheet: BalanceSheet,
    /// Cash flow.
    pub cash_flow: CashFlow,
}

/// Builds single years under a fixed policy and tolerance.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    policy: &'a ProjectionPolicy,
    tolerance: Decimal,
}

impl<'a> StatementBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub const fn new(policy: &'a ProjectionPolicy, tolerance: Decimal) -> Self {
        Self { policy, tolerance }
    }

    /// Builds year `year` and returns its statements with the state to carry
    /// into the following year.
    ///
    /// `interest_anchor` is the interest estimate the cash projection uses.
    /// The P&L books interest on the cash that projection produces, so a stale
    /// anchor shows up as a balance difference.
    ///
    /// Fails with [`StatementError::Overflow`] when any amount leaves the
    /// decimal range.
    pub fn build(
        &self,
        year: usize,
        drivers: &YearDrivers,
        prior: &CarriedState,
        interest_anchor: Decimal,
    ) -> Result<(YearStatements, CarriedState), StatementError> {
        self.try_build(year, drivers, prior, interest_anchor)
            .ok_or(StatementError::Overflow { year })
    }

    fn try_build(
        &self,
        year: usize,
        drivers: &YearDrivers,
        prior: &CarriedState,
        interest_anchor: Decimal,
    ) -> Option<(YearStatements, CarriedState)> {
        let policy = self.policy;

        // Operating lines, independent of cash.
        let cogs = policy.cogs(drivers.revenue)?;
        let gross_profit = drivers.revenue.checked_sub(cogs)?;
        let operating_expenses = drivers
            .staff_costs
            .checked_add(drivers.rent)?
            .checked_add(drivers.opex)?;
        let ebitda = gross_profit.checked_sub(operating_expenses)?;
        let ebit = ebitda.checked_sub(drivers.depreciation)?;

        // Cash flow, projected from the anchored interest.
        let deferred_revenue = policy.deferred_revenue(drivers.revenue)?;
        let working_capital_change = deferred_revenue.checked_sub(prior.deferred_revenue)?;
        let projected_pre_tax = ebit.checked_sub(interest_anchor)?;
        let projected_net_income = projected_pre_tax.checked_sub(policy.taxes(projected_pre_tax)?)?;
        let operating_cash_flow = projected_net_income
            .checked_add(drivers.depreciation)?
            .checked_add(working_capital_change)?;
        let investing_cash_flow = -drivers.capex;
        let financing_cash_flow = drivers.financing;
        let net_cash_change = operating_cash_flow
            .checked_add(investing_cash_flow)?
            .checked_add(financing_cash_flow)?;
        let beginning_cash = prior.cash;
        let ending_cash = beginning_cash.checked_add(net_cash_change)?;

        // P&L interest on the realized balance.
        let interest = policy.interest(beginning_cash, ending_cash)?;
        let pre_tax = ebit.checked_sub(interest)?;
        let taxes = policy.taxes(pre_tax)?;
        let net_income = pre_tax.checked_sub(taxes)?;

        let fixed_assets = prior
            .fixed_assets
            .checked_add(drivers.capex)?
            .checked_sub(drivers.depreciation)?;
        let retained_earnings = prior.retained_earnings.checked_add(net_income)?;
        let paid_in_capital = prior.paid_in_capital.checked_add(drivers.financing)?;

        let total_assets = ending_cash.checked_add(fixed_assets)?;
        let total_liabilities = deferred_revenue;
        let total_equity = paid_in_capital.checked_add(retained_earnings)?;
        let total_liabilities_and_equity = total_liabilities.checked_add(total_equity)?;
        let balance_difference = total_assets.checked_sub(total_liabilities_and_equity)?;

        let statements = YearStatements {
            profit_and_loss: ProfitAndLoss {
                year_index: year,
                revenue: drivers.revenue,
                cogs,
                gross_profit,
                operating_expenses,
                ebitda,
                depreciation: drivers.depreciation,
                ebit,
                interest,
                taxes,
                net_income,
            },
            balance_sheet: BalanceSheet {
                year_index: year,
                cash: ending_cash,
                fixed_assets,
                total_assets,
                deferred_revenue,
                total_liabilities,
                paid_in_capital,
                retained_earnings,
                total_equity,
                total_liabilities_and_equity,
                is_balanced: within_tolerance(balance_difference, self.tolerance),
                balance_difference,
            },
            cash_flow: CashFlow {
                year_index: year,
                net_income: projected_net_income,
                depreciation: drivers.depreciation,
                working_capital_change,
                operating_cash_flow,
                capex: drivers.capex,
                investing_cash_flow,
                financing_cash_flow,
                net_cash_change,
                beginning_cash,
                ending_cash,
            },
        };

        let carried = CarriedState {
            cash: ending_cash,
            fixed_assets,
            retained_earnings,
            deferred_revenue,
            paid_in_capital,
        };

        Some((statements, carried))
    }
}
