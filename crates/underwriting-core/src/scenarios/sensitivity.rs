use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::OutputMetric;
use crate::types::*;
use crate::underwriting::inputs::{ModelInputs, MIN_EXIT_CAP_RATE};
use crate::underwriting::model::run_model;
use crate::UnderwritingResult;

/// Purchase-price changes along the grid rows.
pub const PRICE_CHANGES: [Rate; 5] = [dec!(-0.10), dec!(-0.05), dec!(0), dec!(0.05), dec!(0.10)];

/// Exit cap-rate shifts along the grid columns, in basis points.
pub const EXIT_CAP_DELTAS_BPS: [Decimal; 5] =
    [dec!(-100), dec!(-50), dec!(0), dec!(50), dec!(100)];

const BASE_POSITION: (usize, usize) = (2, 2);

/// Input for the price / exit-cap sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub base_inputs: ModelInputs,
    #[serde(default)]
    pub metric: OutputMetric,
}

/// Output of the price / exit-cap sensitivity grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub metric: OutputMetric,
    pub price_changes: Vec<Rate>,
    pub exit_cap_deltas_bps: Vec<Decimal>,
    /// Row axis: purchase price at each change
    pub purchase_prices: Vec<Money>,
    /// Column axis: exit cap rate at each shift, after flooring
    pub exit_cap_rates: Vec<Rate>,
    /// matrix[i][j] = metric at purchase_prices[i] and exit_cap_rates[j]
    pub matrix: Vec<Vec<Option<Decimal>>>,
    pub base_case_value: Option<Decimal>,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Evaluate `eval_fn` at every (row, col) pair.
pub fn evaluate_grid<F>(
    rows: &[Decimal],
    cols: &[Decimal],
    eval_fn: F,
) -> Vec<Vec<Option<Decimal>>>
where
    F: Fn(Decimal, Decimal) -> Option<Decimal>,
{
    rows.iter()
        .map(|r| cols.iter().map(|c| eval_fn(*r, *c)).collect())
        .collect()
}

fn shifted_cap(base: Rate, bps: Decimal) -> Rate {
    base.saturating_add(bps / dec!(10000)).max(MIN_EXIT_CAP_RATE)
}

/// Re-run the model across purchase price and exit cap rate and record one metric per cell.
#[tracing::instrument(skip_all, fields(metric = %input.metric))]
pub fn run_sensitivity_grid(
    input: &SensitivityInput,
) -> UnderwritingResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base = input.base_inputs.sanitize_with_warnings(&mut warnings);
    let metric = input.metric;

    let purchase_prices: Vec<Money> = PRICE_CHANGES
        .iter()
        .map(|pct| base.purchase_price.saturating_mul(Decimal::ONE + pct))
        .collect();
    let exit_cap_rates: Vec<Rate> = EXIT_CAP_DELTAS_BPS
        .iter()
        .map(|bps| shifted_cap(base.exit_cap_rate, *bps))
        .collect();

    let matrix = evaluate_grid(&purchase_prices, &exit_cap_rates, |price, cap| {
        let mut scenario = base.clone();
        scenario.purchase_price = price;
        scenario.exit_cap_rate = cap;
        metric.extract(&run_model(&scenario))
    });

    let base_case_value = metric.extract(&run_model(&base));

    let undefined = matrix.iter().flatten().filter(|v| v.is_none()).count();
    if undefined > 0 {
        warnings.push(format!(
            "{undefined} of {} grid cells are undefined for {}",
            PRICE_CHANGES.len() * EXIT_CAP_DELTAS_BPS.len(),
            metric.label()
        ));
    }
    if exit_cap_rates.first() == exit_cap_rates.get(1) {
        warnings.push(format!(
            "Exit cap rate {} is too low to shift down; \
             lower columns are floored at {MIN_EXIT_CAP_RATE}",
            base.exit_cap_rate
        ));
    }

    let output = SensitivityOutput {
        metric,
        price_changes: PRICE_CHANGES.to_vec(),
        exit_cap_deltas_bps: EXIT_CAP_DELTAS_BPS.to_vec(),
        purchase_prices,
        exit_cap_rates,
        matrix,
        base_case_value,
        base_case_position: BASE_POSITION,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity: Purchase Price x Exit Cap Rate",
        &serde_json::json!({
            "metric": metric,
            "base_purchase_price": base.purchase_price,
            "base_exit_cap_rate": base.exit_cap_rate,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::underwriting::inputs::{OpexModel, RevenueModel};
    use rust_decimal_macros::dec;

    fn sample_input() -> ModelInputs {
        ModelInputs {
            purchase_price: dec!(2000000),
            closing_cost_rate: dec!(0.01),
            hold_period_years: 5,
            revenue: RevenueModel::Flat {
                annual_revenue: dec!(240000),
            },
            rent_growth: dec!(0.03),
            expense_growth: dec!(0.03),
            vacancy_rate: dec!(0.05),
            opex: OpexModel::PercentOfRevenue { rate: dec!(0.38) },
            exit_cap_rate: dec!(0.065),
            cost_of_sale_rate: dec!(0.02),
            ltv: dec!(0.6),
            interest_rate: dec!(0.06),
            amortization_years: 30,
            discount_rate: dec!(0.09),
            ..Default::default()
        }
    }

    #[test]
    fn test_evaluate_grid_shape_and_order() {
        let rows = [dec!(1), dec!(2)];
        let cols = [dec!(10), dec!(20), dec!(30)];
        let grid = evaluate_grid(&rows, &cols, |r, c| Some(r * c));
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].len(), 3);
        assert_eq!(grid[1][2], Some(dec!(60)));
    }

    #[test]
    fn test_center_cell_equals_base_for_every_metric() {
        for metric in OutputMetric::ALL {
            let out = run_sensitivity_grid(&SensitivityInput {
                base_inputs: sample_input(),
                metric,
            })
            .unwrap()
            .result;
            let (r, c) = out.base_case_position;
            assert_eq!(out.matrix[r][c], out.base_case_value, "{metric}");
            assert!(out.base_case_value.is_some(), "{metric}");
        }
    }

    #[test]
    fn test_axes() {
        let out = run_sensitivity_grid(&SensitivityInput {
            base_inputs: sample_input(),
            metric: OutputMetric::LeveredIrr,
        })
        .unwrap()
        .result;
        assert_eq!(out.purchase_prices[0], dec!(1800000));
        assert_eq!(out.purchase_prices[4], dec!(2200000));
        assert_eq!(out.exit_cap_rates[0], dec!(0.055));
        assert_eq!(out.exit_cap_rates[4], dec!(0.075));
        assert_eq!(out.matrix.len(), 5);
        assert!(out.matrix.iter().all(|row| row.len() == 5));
    }

    #[test]
    fn test_irr_falls_with_price_and_cap() {
        let out = run_sensitivity_grid(&SensitivityInput {
            base_inputs: sample_input(),
            metric: OutputMetric::LeveredIrr,
        })
        .unwrap()
        .result;
        for j in 0..5 {
            for i in 0..4 {
                assert!(out.matrix[i][j].unwrap() > out.matrix[i + 1][j].unwrap());
            }
        }
        for i in 0..5 {
            for j in 0..4 {
                assert!(out.matrix[i][j].unwrap() > out.matrix[i][j + 1].unwrap());
            }
        }
    }

    #[test]
    fn test_low_cap_floors_and_warns() {
        let mut input = sample_input();
        input.exit_cap_rate = dec!(0.004);
        let out = run_sensitivity_grid(&SensitivityInput {
            base_inputs: input,
            metric: OutputMetric::ExitSalePrice,
        })
        .unwrap();
        assert_eq!(out.result.exit_cap_rates[0], MIN_EXIT_CAP_RATE);
        assert_eq!(out.result.exit_cap_rates[1], MIN_EXIT_CAP_RATE);
        assert!(out.warnings.iter().any(|w| w.contains("floored")));
    }

    #[test]
    fn test_undefined_cells_warn() {
        let out = run_sensitivity_grid(&SensitivityInput {
            base_inputs: ModelInputs {
                ltv: Decimal::ZERO,
                ..sample_input()
            },
            metric: OutputMetric::Dscr,
        })
        .unwrap();
        assert!(out.result.matrix.iter().flatten().all(Option::is_none));
        assert!(out.result.base_case_value.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("25 of 25")));
    }
}
