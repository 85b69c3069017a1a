//! Forecast CLI
//!
//! Generates the three statements for a scenario file and prints them as JSON.
//!
//! ```text
//! forecast <scenario.json>
//! ```

mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forecast_core::statements::{
    CachedGenerator, EngineSettings, MokaStatementCache, StatementEngine,
};
use forecast_shared::{AppConfig, AppError};

use crate::scenario::{Scenario, ScenarioReport};

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_core=info,forecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<AppError>()
                .map_or(70, AppError::exit_code);
            error!(error = %format!("{err:#}"), code, "Forecast failed");
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run() -> anyhow::Result<()> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| AppError::Validation("usage: forecast <scenario.json>".to_string()))?;

    // Load configuration
    let config = AppConfig::load().map_err(AppError::from)?;
    config.validate()?;
    let horizon = config.horizon()?;

    let scenario = Scenario::from_path(&path)
        .with_context(|| format!("loading scenario {}", path.display()))?;
    let inputs = scenario.statement_inputs(&horizon)?;
    info!(
        scenario_id = %scenario.scenario_id,
        start_year = horizon.start_year,
        end_year = horizon.end_year,
        "Scenario loaded"
    );

    let engine = StatementEngine::with_config(
        EngineSettings::from(&config.engine),
        scenario.policy.clone(),
    );
    let generator = CachedGenerator::new(engine, MokaStatementCache::from(&config.cache));

    let statements = generator
        .generate(scenario.cache_key(), &inputs)
        .map_err(AppError::from)?;

    let convergence = &statements.convergence;
    if convergence.balanced {
        info!(
            passes = convergence.passes,
            max_balance_difference = %convergence.max_balance_difference,
            "Statements balanced"
        );
    } else {
        let unbalanced: Vec<i32> = statements
            .unbalanced_years()
            .into_iter()
            .filter_map(|index| horizon.year_at(index))
            .collect();
        warn!(
            passes = convergence.passes,
            iteration_cap = convergence.iteration_cap,
            max_balance_difference = %convergence.max_balance_difference,
            ?unbalanced,
            "Statements did not balance within tolerance"
        );
    }

    let report = ScenarioReport::new(&scenario, &horizon, &statements);
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    println!("{json}");

    Ok(())
}
