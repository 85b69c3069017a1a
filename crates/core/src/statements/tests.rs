//! Property-based and scenario tests for statement generation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use forecast_shared::config::MAX_ITERATION_CAP;

use super::engine::{EngineSettings, StatementEngine, generate_statements};
use super::error::StatementError;
use super::policy::{InterestBasis, ProjectionPolicy};
use super::types::{ConvergenceStatus, OpeningBalances, StatementInputs, StatementSet};

fn inputs(
    revenue: &[Decimal],
    staff_costs: &[Decimal],
    rent: &[Decimal],
    opex: &[Decimal],
    capex: &[Decimal],
    depreciation: &[Decimal],
    beginning_cash: Decimal,
) -> StatementInputs {
    StatementInputs::new(
        revenue.to_vec(),
        staff_costs.to_vec(),
        rent.to_vec(),
        opex.to_vec(),
        capex.to_vec(),
        depreciation.to_vec(),
        beginning_cash,
    )
}

fn three_year_inputs() -> StatementInputs {
    inputs(
        &[dec!(2_000_000), dec!(2_200_000), dec!(2_400_000)],
        &[dec!(900_000); 3],
        &[dec!(300_000); 3],
        &[dec!(200_000); 3],
        &[dec!(100_000); 3],
        &[dec!(50_000); 3],
        dec!(1_000_000),
    )
}

fn engine_with(policy: ProjectionPolicy) -> StatementEngine {
    StatementEngine::with_config(EngineSettings::default(), policy)
}

/// Asserts the identities every returned set satisfies, converged or not.
fn assert_structural_identities(set: &StatementSet, inputs: &StatementInputs) {
    let years = inputs.horizon_len();
    assert_eq!(set.profit_and_loss.len(), years);
    assert_eq!(set.balance_sheet.len(), years);
    assert_eq!(set.cash_flow.len(), years);

    let mut prior_fixed_assets = inputs.opening.fixed_assets;
    for year in 0..years {
        let pl = &set.profit_and_loss[year];
        let bs = &set.balance_sheet[year];
        let cf = &set.cash_flow[year];

        assert_eq!(pl.year_index, year);
        assert_eq!(pl.ebitda, pl.gross_profit - pl.operating_expenses);
        assert_eq!(pl.ebit, pl.ebitda - pl.depreciation);
        assert_eq!(pl.net_income, pl.ebit - pl.interest - pl.taxes);

        assert_eq!(bs.total_assets, bs.cash + bs.fixed_assets);
        assert_eq!(
            bs.total_liabilities_and_equity,
            bs.total_liabilities + bs.total_equity
        );
        assert_eq!(
            bs.balance_difference,
            bs.total_assets - bs.total_liabilities_and_equity
        );
        assert_eq!(bs.cash, cf.ending_cash);
        assert_eq!(
            bs.fixed_assets,
            prior_fixed_assets + inputs.capex[year] - inputs.depreciation[year]
        );
        prior_fixed_assets = bs.fixed_assets;

        assert_eq!(
            cf.operating_cash_flow,
            cf.net_income + cf.depreciation + cf.working_capital_change
        );
        assert_eq!(
            cf.net_cash_change,
            cf.operating_cash_flow + cf.investing_cash_flow + cf.financing_cash_flow
        );
        assert_eq!(cf.ending_cash, cf.beginning_cash + cf.net_cash_change);

        if year == 0 {
            assert_eq!(cf.beginning_cash, inputs.beginning_cash);
        } else {
            assert_eq!(cf.beginning_cash, set.cash_flow[year - 1].ending_cash);
        }
    }

    assert_eq!(
        set.convergence.balanced,
        set.balance_sheet.iter().all(|bs| bs.is_balanced)
    );
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_loss_making_year_with_negative_cash() {
    let inputs = inputs(
        &[dec!(10_000_000)],
        &[dec!(10_000_000)],
        &[dec!(5_000_000)],
        &[dec!(1_000_000)],
        &[dec!(0)],
        &[dec!(0)],
        dec!(0),
    );

    let set = generate_statements(&inputs).unwrap();

    assert_eq!(set.profit_and_loss[0].net_income, dec!(-6_000_000));
    assert_eq!(set.cash_flow[0].ending_cash, dec!(-6_000_000));
    assert_eq!(set.balance_sheet[0].cash, dec!(-6_000_000));
    assert_eq!(set.balance_sheet[0].retained_earnings, dec!(-6_000_000));
    assert_eq!(set.balance_sheet[0].total_equity, dec!(-6_000_000));
    assert!(set.balance_sheet[0].is_balanced);
    assert!(set.convergence.balanced);
    assert_eq!(set.convergence.passes, 1);
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_two_year_cash_continuity() {
    let inputs = inputs(
        &[dec!(1_000), dec!(1_500)],
        &[dec!(600), dec!(650)],
        &[dec!(100), dec!(100)],
        &[dec!(50), dec!(75)],
        &[dec!(200), dec!(0)],
        &[dec!(40), dec!(40)],
        dec!(300),
    );

    // Circular policy so more than one pass runs.
    let policy = ProjectionPolicy {
        interest_rate: dec!(0.04),
        ..ProjectionPolicy::default()
    };
    for engine in [StatementEngine::new(), engine_with(policy)] {
        let set = engine.generate(&inputs).unwrap();
        assert_eq!(set.cash_flow[1].beginning_cash, set.cash_flow[0].ending_cash);
        assert_structural_identities(&set, &inputs);
    }
}

#[test]
fn test_mismatched_series_rejected() {
    let inputs = inputs(
        &[dec!(100); 5],
        &[dec!(10); 4],
        &[dec!(0); 5],
        &[dec!(0); 5],
        &[dec!(0); 5],
        &[dec!(0); 5],
        dec!(0),
    );

    let err = generate_statements(&inputs).unwrap_err();
    assert_eq!(
        err,
        StatementError::LengthMismatch {
            field: "staffCosts".to_string(),
            expected: 5,
            actual: 4,
        }
    );
}

#[test]
fn test_oscillating_interest_exhausts_iteration_cap() {
    // Interest equal to the whole ending balance flips cash between two
    // values on every pass.
    let inputs = inputs(
        &[dec!(500); 3],
        &[dec!(0); 3],
        &[dec!(0); 3],
        &[dec!(0); 3],
        &[dec!(0); 3],
        &[dec!(0); 3],
        dec!(1_000),
    );
    let engine = engine_with(ProjectionPolicy {
        interest_rate: Decimal::NEGATIVE_ONE,
        interest_basis: InterestBasis::Ending,
        ..ProjectionPolicy::default()
    });

    let set = engine.generate(&inputs).unwrap();

    assert!(!set.convergence.balanced);
    assert_eq!(set.convergence.passes, 10);
    assert_eq!(set.convergence.iteration_cap, 10);
    assert_eq!(set.convergence.status, ConvergenceStatus::Exhausted);
    assert!(set.convergence.max_balance_difference > dec!(0.01));
    assert_eq!(set.unbalanced_years(), vec![0, 1, 2]);
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_exhaustion_honors_configured_cap() {
    let inputs = inputs(
        &[dec!(500)],
        &[dec!(0)],
        &[dec!(0)],
        &[dec!(0)],
        &[dec!(0)],
        &[dec!(0)],
        dec!(1_000),
    );
    let engine = StatementEngine::with_config(
        EngineSettings::new(dec!(0.01), 3),
        ProjectionPolicy {
            interest_rate: Decimal::NEGATIVE_ONE,
            ..ProjectionPolicy::default()
        },
    );

    let set = engine.generate(&inputs).unwrap();
    assert_eq!(set.convergence.passes, 3);
    assert!(!set.convergence.balanced);
    assert_eq!(set.balance_sheet[0].balance_difference.abs(), dec!(1500));
}

fn twelve_year_inputs() -> StatementInputs {
    inputs(
        &[dec!(1_000_000); 12],
        &[dec!(0); 12],
        &[dec!(0); 12],
        &[dec!(0); 12],
        &[dec!(0); 12],
        &[dec!(0); 12],
        dec!(1_000_000),
    )
}

fn long_run_engine(interest_rate: Decimal) -> StatementEngine {
    StatementEngine::with_config(
        EngineSettings::new(dec!(0.01), MAX_ITERATION_CAP),
        ProjectionPolicy {
            interest_rate,
            ..ProjectionPolicy::default()
        },
    )
}

#[test]
fn test_growing_anchors_stop_at_last_complete_pass() {
    let inputs = twelve_year_inputs();

    let set = long_run_engine(Decimal::ONE).generate(&inputs).unwrap();

    assert_eq!(set.convergence.status, ConvergenceStatus::Diverged);
    assert!(!set.convergence.balanced);
    assert!(set.convergence.passes > 1);
    assert!(set.convergence.passes < MAX_ITERATION_CAP);
    assert_eq!(set.len(), 12);
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_negative_unit_rate_over_long_horizon_never_fails() {
    let inputs = twelve_year_inputs();

    let set = long_run_engine(Decimal::NEGATIVE_ONE).generate(&inputs).unwrap();

    assert_ne!(set.convergence.status, ConvergenceStatus::Converged);
    assert!(!set.convergence.balanced);
    assert!(set.convergence.passes <= MAX_ITERATION_CAP);
    assert_eq!(set.len(), 12);
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_single_year_horizon() {
    let inputs = inputs(
        &[dec!(800)],
        &[dec!(300)],
        &[dec!(100)],
        &[dec!(50)],
        &[dec!(120)],
        &[dec!(30)],
        dec!(1_000),
    );

    let set = generate_statements(&inputs).unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.cash_flow[0].beginning_cash, dec!(1_000));
    assert_eq!(set.cash_flow[0].ending_cash, dec!(1_230));
    assert_eq!(set.balance_sheet[0].fixed_assets, dec!(90));
    assert_eq!(set.balance_sheet[0].paid_in_capital, dec!(1_000));
    assert!(set.convergence.balanced);
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_circular_interest_converges_after_several_passes() {
    let inputs = three_year_inputs();
    let engine = engine_with(ProjectionPolicy {
        interest_rate: dec!(0.05),
        ..ProjectionPolicy::default()
    });

    let set = engine.generate(&inputs).unwrap();

    assert!(set.convergence.balanced);
    assert_eq!(set.convergence.status, ConvergenceStatus::Converged);
    assert!(set.convergence.passes > 1);
    assert!(set.convergence.passes <= 10);
    assert!(set.convergence.max_balance_difference <= dec!(0.01));
    // Positive cash earns interest.
    assert!(set.profit_and_loss.iter().all(|pl| pl.interest < Decimal::ZERO));
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_overdraft_interest_settles_at_fixed_point() {
    // Cash c satisfies c = -6,000,000 - 0.08 * (-c), so interest is
    // 0.08 * 6,000,000 / 0.92.
    let inputs = inputs(
        &[dec!(10_000_000)],
        &[dec!(10_000_000)],
        &[dec!(5_000_000)],
        &[dec!(1_000_000)],
        &[dec!(0)],
        &[dec!(0)],
        dec!(0),
    );
    let engine = engine_with(ProjectionPolicy {
        interest_rate: dec!(0.08),
        ..ProjectionPolicy::default()
    });

    let set = engine.generate(&inputs).unwrap();

    assert!(set.convergence.balanced);
    assert!((set.profit_and_loss[0].interest - dec!(521_739.13)).abs() <= dec!(0.01));
    assert!(set.balance_sheet[0].cash < dec!(-6_000_000));
}

#[test]
fn test_average_basis_with_taxes_converges() {
    let inputs = three_year_inputs();
    let engine = engine_with(ProjectionPolicy {
        tax_rate: dec!(0.25),
        interest_rate: dec!(0.05),
        interest_basis: InterestBasis::Average,
        ..ProjectionPolicy::default()
    });

    let set = engine.generate(&inputs).unwrap();

    assert!(set.convergence.balanced);
    assert!(set.profit_and_loss.iter().all(|pl| pl.taxes > Decimal::ZERO));
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_cogs_deferred_revenue_and_financing() {
    let inputs = three_year_inputs()
        .with_financing(vec![dec!(500_000), dec!(0), dec!(-250_000)])
        .with_opening(OpeningBalances {
            fixed_assets: dec!(400_000),
            retained_earnings: dec!(150_000),
            deferred_revenue: dec!(120_000),
        });
    let engine = engine_with(ProjectionPolicy {
        cogs_rate: dec!(0.30),
        deferred_revenue_rate: dec!(0.05),
        ..ProjectionPolicy::default()
    });

    let set = engine.generate(&inputs).unwrap();

    assert_eq!(set.convergence.passes, 1);
    assert!(set.convergence.balanced);
    assert_eq!(set.profit_and_loss[0].cogs, dec!(600_000));
    assert_eq!(set.balance_sheet[0].deferred_revenue, dec!(100_000));
    assert_eq!(set.cash_flow[0].working_capital_change, dec!(-20_000));
    assert_eq!(set.cash_flow[2].financing_cash_flow, dec!(-250_000));
    assert_eq!(set.balance_sheet[2].paid_in_capital, dec!(1_380_000));
    assert_structural_identities(&set, &inputs);
}

#[test]
fn test_ratios_from_generated_set() {
    let set = generate_statements(&three_year_inputs()).unwrap();
    let ratios = set.ratios().unwrap();

    assert_eq!(ratios.len(), 3);
    assert_eq!(ratios[0].gross_margin, Decimal::ONE);
    assert_eq!(ratios[0].ebitda_margin, dec!(0.3));
}

#[test]
fn test_ratios_fail_without_revenue() {
    let inputs = inputs(
        &[dec!(100), dec!(0)],
        &[dec!(10); 2],
        &[dec!(0); 2],
        &[dec!(0); 2],
        &[dec!(0); 2],
        &[dec!(0); 2],
        dec!(0),
    );

    let set = generate_statements(&inputs).unwrap();
    assert_eq!(
        set.ratios().unwrap_err(),
        StatementError::DivisionByZero {
            year: 1,
            ratio: "gross_margin",
        }
    );
}

#[test]
fn test_invalid_policy_rejected_before_generation() {
    let engine = engine_with(ProjectionPolicy {
        tax_rate: dec!(1.5),
        ..ProjectionPolicy::default()
    });
    assert!(matches!(
        engine.generate(&three_year_inputs()),
        Err(StatementError::InvalidInput { year: None, .. })
    ));
}

#[test]
fn test_statement_set_serializes_camel_case() {
    let set = generate_statements(&three_year_inputs()).unwrap();
    let json = serde_json::to_value(&set).unwrap();

    assert!(json["profitAndLoss"][0]["netIncome"].is_string());
    assert!(json["balanceSheet"][0]["isBalanced"].as_bool().unwrap());
    assert_eq!(json["cashFlow"][1]["yearIndex"], 1);
    assert_eq!(json["convergence"]["status"], "converged");
    assert_eq!(json["convergence"]["passes"], 1);
}

// ============================================================================
// Properties
// ============================================================================

/// Strategy for a currency amount from 0.00 to 10,000,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a full set of inputs with 1 to 8 years.
fn inputs_strategy() -> impl Strategy<Value = StatementInputs> {
    (1usize..=8).prop_flat_map(|years| {
        (
            prop::collection::vec(amount(), years),
            prop::collection::vec(amount(), years),
            prop::collection::vec(amount(), years),
            prop::collection::vec(amount(), years),
            prop::collection::vec(amount(), years),
            prop::collection::vec(amount(), years),
            (-1_000_000_000i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        )
            .prop_map(|(revenue, staff, rent, opex, capex, depreciation, cash)| {
                StatementInputs::new(revenue, staff, rent, opex, capex, depreciation, cash)
            })
    })
}

/// Strategy for an interest rate across the accepted range, -1.00 to 1.00.
fn interest_rate() -> impl Strategy<Value = Decimal> {
    (-100i64..=100i64).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// With no circular terms every year balances on the first pass.
    #[test]
    fn prop_zero_rate_policy_balances_in_one_pass(inputs in inputs_strategy()) {
        let set = generate_statements(&inputs).unwrap();

        prop_assert!(set.convergence.balanced);
        prop_assert_eq!(set.convergence.passes, 1);
        for bs in &set.balance_sheet {
            prop_assert!(bs.balance_difference.abs() <= dec!(0.01));
        }
    }

    /// Every year balances, or the report says it does not.
    #[test]
    fn prop_balance_is_reported_faithfully(
        inputs in inputs_strategy(),
        rate in interest_rate(),
    ) {
        let engine = engine_with(ProjectionPolicy {
            interest_rate: rate,
            ..ProjectionPolicy::default()
        });
        let set = engine.generate(&inputs).unwrap();

        let all_balanced = set
            .balance_sheet
            .iter()
            .all(|bs| bs.balance_difference.abs() <= set.convergence.tolerance);
        prop_assert_eq!(set.convergence.balanced, all_balanced);
        prop_assert!(set.convergence.passes >= 1);
        prop_assert!(set.convergence.passes <= set.convergence.iteration_cap);
        match set.convergence.status {
            ConvergenceStatus::Converged => prop_assert!(set.convergence.balanced),
            ConvergenceStatus::Exhausted => {
                prop_assert!(!set.convergence.balanced);
                prop_assert_eq!(set.convergence.passes, set.convergence.iteration_cap);
            }
            ConvergenceStatus::Diverged => prop_assert!(!set.convergence.balanced),
        }
    }

    /// Any accepted rate and cap yields a populated set, never a failure.
    #[test]
    fn prop_any_accepted_cap_returns_populated_set(
        inputs in inputs_strategy(),
        rate in interest_rate(),
        cap in 1u32..=MAX_ITERATION_CAP,
    ) {
        let engine = StatementEngine::with_config(
            EngineSettings::new(dec!(0.01), cap),
            ProjectionPolicy {
                interest_rate: rate,
                ..ProjectionPolicy::default()
            },
        );

        let set = engine.generate(&inputs);
        prop_assert!(set.is_ok());
        let set = set.unwrap();
        prop_assert_eq!(set.len(), inputs.horizon_len());
        prop_assert!(set.convergence.passes >= 1);
        prop_assert!(set.convergence.passes <= cap);
    }

    /// Ending cash of one year is exactly the beginning cash of the next.
    #[test]
    fn prop_cash_continuity(
        inputs in inputs_strategy(),
        rate in interest_rate(),
    ) {
        let engine = engine_with(ProjectionPolicy {
            interest_rate: rate,
            ..ProjectionPolicy::default()
        });
        let set = engine.generate(&inputs).unwrap();

        prop_assert_eq!(set.cash_flow[0].beginning_cash, inputs.beginning_cash);
        for pair in set.cash_flow.windows(2) {
            prop_assert_eq!(pair[0].ending_cash, pair[1].beginning_cash);
        }
    }

    /// Fixed assets roll forward by capex less depreciation, exactly.
    #[test]
    fn prop_fixed_asset_roll_forward(inputs in inputs_strategy()) {
        let set = generate_statements(&inputs).unwrap();

        let mut prior = Decimal::ZERO;
        for (year, bs) in set.balance_sheet.iter().enumerate() {
            prop_assert_eq!(bs.fixed_assets, prior + inputs.capex[year] - inputs.depreciation[year]);
            prior = bs.fixed_assets;
        }
    }

    /// Identical inputs give identical output.
    #[test]
    fn prop_generation_is_idempotent(
        inputs in inputs_strategy(),
        rate in interest_rate(),
    ) {
        let engine = engine_with(ProjectionPolicy {
            interest_rate: rate,
            tax_rate: dec!(0.2),
            ..ProjectionPolicy::default()
        });

        let first = engine.generate(&inputs).unwrap();
        let second = engine.generate(&inputs).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Shortening any series below the revenue length is rejected.
    #[test]
    fn prop_length_mismatch_rejected(
        inputs in inputs_strategy(),
        which in 0usize..5,
    ) {
        let mut inputs = inputs;
        let series = match which {
            0 => &mut inputs.staff_costs,
            1 => &mut inputs.rent,
            2 => &mut inputs.opex,
            3 => &mut inputs.capex,
            _ => &mut inputs.depreciation,
        };
        series.pop();

        let is_length_mismatch = matches!(
            generate_statements(&inputs),
            Err(StatementError::LengthMismatch { .. })
        );
        prop_assert!(is_length_mismatch);
    }
}
