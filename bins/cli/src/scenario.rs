//! Scenario files and the report printed for them.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forecast_core::statements::{
    CacheKey, ProjectionPolicy, RawStatementInputs, StatementInputs, StatementSet, YearRatios,
};
use forecast_shared::types::{Horizon, ScenarioId};
use forecast_shared::{AppError, AppResult};

/// A projection scenario as stored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Scenario identifier.
    pub scenario_id: ScenarioId,
    /// Last time the scenario's assumptions changed.
    pub last_modified: DateTime<Utc>,
    /// Driver series, one value per modeled year.
    pub inputs: RawStatementInputs,
    /// Projection rates; zero rates when omitted.
    #[serde(default)]
    pub policy: ProjectionPolicy,
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("scenario file {}", path.display()))
            } else {
                AppError::Internal(format!("cannot read {}: {err}", path.display()))
            }
        })?;
        Self::from_json(&contents)
    }

    /// Parses a scenario from JSON text.
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| AppError::Validation(format!("malformed scenario: {err}")))
    }

    /// Cache key for this revision of the scenario.
    #[must_use]
    pub const fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.scenario_id, self.last_modified)
    }

    /// Converts the raw series and checks them against the configured horizon.
    pub fn statement_inputs(&self, horizon: &Horizon) -> AppResult<StatementInputs> {
        let inputs = StatementInputs::try_from(self.inputs.clone())?;
        if inputs.horizon_len() != horizon.len() {
            return Err(AppError::Validation(format!(
                "scenario covers {} years but the horizon {}-{} has {}",
                inputs.horizon_len(),
                horizon.start_year,
                horizon.end_year,
                horizon.len()
            )));
        }
        Ok(inputs)
    }
}

/// Output document: the statement set labeled with calendar years.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport<'a> {
    /// Scenario identifier.
    pub scenario_id: ScenarioId,
    /// Calendar year of each index.
    pub years: Vec<i32>,
    /// Generated statements.
    #[serde(flatten)]
    pub statements: &'a StatementSet,
    /// Margins, absent when some year has no revenue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratios: Option<Vec<YearRatios>>,
}

impl<'a> ScenarioReport<'a> {
    /// Builds the report for `statements`.
    #[must_use]
    pub fn new(scenario: &Scenario, horizon: &Horizon, statements: &'a StatementSet) -> Self {
        Self {
            scenario_id: scenario.scenario_id,
            years: horizon.years().collect(),
            statements,
            ratios: statements.ratios().ok(),
        }
    }
}
