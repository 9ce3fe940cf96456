use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::inputs::ModelInputs;
use super::metrics::{compute_metrics, ReturnMetrics};
use super::projection::{project, CashFlowSet, ExitValuation, Financing, YearSeries};
use super::recommendation::{classify, RecommendationResult};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::UnderwritingResult;

/// Full output of one underwriting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Inputs after sanitization, as actually modelled
    pub inputs: ModelInputs,
    pub total_acquisition_cost: Money,
    pub series: YearSeries,
    pub cash_flows: CashFlowSet,
    pub exit: ExitValuation,
    pub financing: Financing,
    pub metrics: ReturnMetrics,
    pub recommendation: RecommendationResult,
    /// Set when projected amounts left the decimal range; optional metrics are then `None`
    pub out_of_range: bool,
}

/// Projector + metrics + classifier as a single pure function.
///
/// Sanitizes on entry, so any `ModelInputs` value is accepted. The sensitivity and tornado
/// engines call this and nothing else.
pub fn run_model(inputs: &ModelInputs) -> ModelResult {
    let inputs = inputs.sanitized();
    evaluate(inputs)
}

fn evaluate(inputs: ModelInputs) -> ModelResult {
    let projection = project(&inputs);
    let metrics = compute_metrics(&inputs, &projection);
    let recommendation = classify(metrics.dscr, metrics.cash_on_cash, metrics.levered_irr);

    ModelResult {
        inputs,
        total_acquisition_cost: projection.total_acquisition_cost,
        series: projection.series,
        cash_flows: projection.cash_flows,
        exit: projection.exit,
        financing: projection.financing,
        metrics,
        recommendation,
        out_of_range: projection.out_of_range,
    }
}

/// Underwrite a deal, wrapping the model result with warnings and computation metadata.
#[tracing::instrument(skip_all, fields(hold = inputs.hold_period_years))]
pub fn underwrite_deal(inputs: &ModelInputs) -> UnderwritingResult<ComputationOutput<ModelResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let clean = inputs.sanitize_with_warnings(&mut warnings);
    let result = evaluate(clean);
    collect_warnings(&result, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    tracing::debug!(elapsed_us = elapsed, warnings = warnings.len(), "deal underwritten");

    let assumptions = result.inputs.clone();
    Ok(with_metadata(
        "Real Estate Acquisition Underwriting (Annual DCF, Bisection IRR)",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

fn collect_warnings(result: &ModelResult, warnings: &mut Vec<String>) {
    let m = &result.metrics;
    let inputs = &result.inputs;

    if result.out_of_range {
        warnings.push(
            "Projected amounts exceed the decimal range — return metrics are undefined".into(),
        );
    }

    if let Some(dscr) = m.dscr {
        if dscr < dec!(1.2) {
            warnings.push(format!(
                "DSCR of {dscr:.2} is below 1.20x — lender covenant risk"
            ));
        }
    }

    if inputs.ltv > dec!(0.80) {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80% — high leverage",
            inputs.ltv.saturating_mul(dec!(100))
        ));
    }

    if m.year1_noi < Decimal::ZERO {
        warnings.push("Year-1 NOI is negative — operating expenses exceed income".into());
    }

    if !result.out_of_range {
        if m.unlevered_irr.is_none() {
            warnings.push("Unlevered IRR is undefined for this cash-flow profile".into());
        }
        if m.levered_irr.is_none() {
            warnings.push("Levered IRR is undefined for this cash-flow profile".into());
        }
    }

    let payoff = m.loan_payoff_at_exit;
    if payoff > m.net_sale_proceeds && payoff > Decimal::ZERO {
        warnings.push(format!(
            "Loan payoff {:.0} exceeds net sale proceeds {:.0} — equity is wiped out at exit",
            m.loan_payoff_at_exit, m.net_sale_proceeds
        ));
    }
}
