//! Convergence driver for three-statement generation.
//!
//! Rebuilds the whole horizon until every balance sheet balances within
//! tolerance or the iteration cap is hit. Between passes the interest anchors
//! are re-derived from the latest P&L, which is what resolves the circular
//! dependency between interest and cash.

use forecast_shared::config::{EngineConfig, MAX_ITERATION_CAP};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::builder::{CarriedState, StatementBuilder, YearDrivers, YearStatements};
use super::error::StatementError;
use super::policy::ProjectionPolicy;
use super::types::{ConvergenceReport, ConvergenceStatus, StatementInputs, StatementSet};

/// Default absolute balance tolerance (0.01 currency units).
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Default maximum number of full-horizon passes.
pub const DEFAULT_ITERATION_CAP: u32 = 10;

/// Tolerance and iteration cap for the convergence driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Absolute tolerance for `|total assets - liabilities and equity|`.
    pub tolerance: Decimal,
    /// Maximum number of passes.
    pub iteration_cap: u32,
}

impl EngineSettings {
    /// Creates settings.
    #[must_use]
    pub const fn new(tolerance: Decimal, iteration_cap: u32) -> Self {
        Self {
            tolerance,
            iteration_cap,
        }
    }

    /// Checks tolerance and cap ranges.
    pub fn validate(&self) -> Result<(), StatementError> {
        if self.tolerance.is_sign_negative() {
            return Err(StatementError::InvalidSettings(
                "tolerance must not be negative".to_string(),
            ));
        }
        if self.iteration_cap == 0 || self.iteration_cap > MAX_ITERATION_CAP {
            return Err(StatementError::InvalidSettings(format!(
                "iteration cap must be between 1 and {MAX_ITERATION_CAP}"
            )));
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE, DEFAULT_ITERATION_CAP)
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self::new(config.tolerance, config.iteration_cap)
    }
}

/// Generates converged statement sets.
///
/// Pure and synchronous: no I/O, no shared state, safe to call from many
/// threads at once.
#[derive(Debug, Clone, Default)]
pub struct StatementEngine {
    settings: EngineSettings,
    policy: ProjectionPolicy,
}

impl StatementEngine {
    /// Creates an engine with default settings and a zero-rate policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with explicit settings and policy.
    #[must_use]
    pub const fn with_config(settings: EngineSettings, policy: ProjectionPolicy) -> Self {
        Self { settings, policy }
    }

    /// Returns the engine settings.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the projection policy.
    #[must_use]
    pub const fn policy(&self) -> &ProjectionPolicy {
        &self.policy
    }

    /// Generates the statement set for `inputs`.
    ///
    /// Invalid inputs fail immediately. Running out of passes does not fail:
    /// the last set is returned with `convergence.balanced == false`. When a
    /// later pass would overflow the decimal range, the last complete pass is
    /// returned as [`ConvergenceStatus::Diverged`]; only an overflow on the
    /// first pass is an error.
    pub fn generate(&self, inputs: &StatementInputs) -> Result<StatementSet, StatementError> {
        self.settings.validate()?;
        self.policy.validate()?;
        let years = inputs.validate()?;
        debug!(
            years,
            circular = self.policy.is_circular(),
            iteration_cap = self.settings.iteration_cap,
            "Generating statements"
        );

        let drivers: Vec<YearDrivers> = (0..years).map(|year| inputs.drivers_for(year)).collect();
        let opening = CarriedState::opening(inputs);
        let builder = StatementBuilder::new(&self.policy, self.settings.tolerance);
        let mut anchors = vec![Decimal::ZERO; years];
        let mut last_pass: Option<Vec<YearStatements>> = None;
        let mut passes = 0;

        loop {
            let pass = match Self::run_pass(&builder, &drivers, &opening, &anchors) {
                Ok(pass) => pass,
                Err(err) => {
                    let Some(previous) = last_pass else {
                        return Err(err);
                    };
                    warn!(
                        passes,
                        years,
                        error = %err,
                        "Interest anchors diverged before balance sheet balanced"
                    );
                    return Ok(self.finish(previous, passes, ConvergenceStatus::Diverged));
                }
            };
            passes += 1;

            let balanced = pass.iter().all(|year| year.balance_sheet.is_balanced);
            debug!(
                pass = passes,
                years,
                balanced,
                max_balance_difference = %max_balance_difference(&pass),
                "Statement pass complete"
            );

            if balanced {
                debug!(passes, years, "Statements converged");
                return Ok(self.finish(pass, passes, ConvergenceStatus::Converged));
            }
            if passes >= self.settings.iteration_cap {
                warn!(
                    passes,
                    years,
                    max_balance_difference = %max_balance_difference(&pass),
                    tolerance = %self.settings.tolerance,
                    "Iteration cap reached before balance sheet balanced"
                );
                return Ok(self.finish(pass, passes, ConvergenceStatus::Exhausted));
            }

            anchors = pass
                .iter()
                .map(|year| year.profit_and_loss.interest)
                .collect();
            last_pass = Some(pass);
        }
    }

    /// Builds every year once, in order.
    fn run_pass(
        builder: &StatementBuilder<'_>,
        drivers: &[YearDrivers],
        opening: &CarriedState,
        anchors: &[Decimal],
    ) -> Result<Vec<YearStatements>, StatementError> {
        let mut state = *opening;
        drivers
            .iter()
            .zip(anchors)
            .enumerate()
            .map(|(year, (year_drivers, &anchor))| {
                let (statements, carried) = builder.build(year, year_drivers, &state, anchor)?;
                state = carried;
                Ok(statements)
            })
            .collect()
    }

    fn finish(
        &self,
        pass: Vec<YearStatements>,
        passes: u32,
        status: ConvergenceStatus,
    ) -> StatementSet {
        let report = ConvergenceReport {
            passes,
            balanced: pass.iter().all(|year| year.balance_sheet.is_balanced),
            tolerance: self.settings.tolerance,
            iteration_cap: self.settings.iteration_cap,
            status,
            max_balance_difference: max_balance_difference(&pass),
        };
        Self::assemble(pass, report)
    }

    fn assemble(pass: Vec<YearStatements>, convergence: ConvergenceReport) -> StatementSet {
        let mut profit_and_loss = Vec::with_capacity(pass.len());
        let mut balance_sheet = Vec::with_capacity(pass.len());
        let mut cash_flow = Vec::with_capacity(pass.len());

        for year in pass {
            profit_and_loss.push(year.profit_and_loss);
            balance_sheet.push(year.balance_sheet);
            cash_flow.push(year.cash_flow);
        }

        StatementSet {
            profit_and_loss,
            balance_sheet,
            cash_flow,
            convergence,
            cached: false,
        }
    }
}

fn max_balance_difference(pass: &[YearStatements]) -> Decimal {
    pass.iter()
        .map(|year| year.balance_sheet.balance_difference.abs())
        .max()
        .unwrap_or_default()
}

/// Generates statements with default settings and a zero-rate policy.
pub fn generate_statements(inputs: &StatementInputs) -> Result<StatementSet, StatementError> {
    StatementEngine::new().generate(inputs)
}
