use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

use super::OutputMetric;
use crate::types::*;
use crate::underwriting::inputs::{ModelInputs, OpexModel, MIN_EXIT_CAP_RATE};
use crate::underwriting::model::run_model;
use crate::UnderwritingResult;

/// Assumption perturbed one at a time by the tornado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TornadoDriver {
    PurchasePrice,
    ExitCapRate,
    RentGrowth,
    OtherIncomeGrowth,
    VacancyRate,
    InterestRate,
    OpexRate,
}

impl TornadoDriver {
    pub const ALL: [TornadoDriver; 7] = [
        TornadoDriver::PurchasePrice,
        TornadoDriver::ExitCapRate,
        TornadoDriver::RentGrowth,
        TornadoDriver::OtherIncomeGrowth,
        TornadoDriver::VacancyRate,
        TornadoDriver::InterestRate,
        TornadoDriver::OpexRate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TornadoDriver::PurchasePrice => "Purchase price ±5%",
            TornadoDriver::ExitCapRate => "Exit cap rate ±50 bps",
            TornadoDriver::RentGrowth => "Rent growth ±1pp",
            TornadoDriver::OtherIncomeGrowth => "Other income growth ±1pp",
            TornadoDriver::VacancyRate => "Vacancy ±1pp",
            TornadoDriver::InterestRate => "Interest rate ±1pp",
            TornadoDriver::OpexRate => "Opex % of revenue ±3pp",
        }
    }

    /// Current value of the driver, or `None` when the inputs do not use it.
    fn value(self, inputs: &ModelInputs) -> Option<Decimal> {
        match self {
            TornadoDriver::PurchasePrice => Some(inputs.purchase_price),
            TornadoDriver::ExitCapRate => Some(inputs.exit_cap_rate),
            TornadoDriver::RentGrowth => Some(inputs.rent_growth),
            TornadoDriver::OtherIncomeGrowth => Some(inputs.resolved_other_income_growth()),
            TornadoDriver::VacancyRate => Some(inputs.vacancy_rate),
            TornadoDriver::InterestRate => Some(inputs.interest_rate),
            TornadoDriver::OpexRate => match inputs.opex {
                OpexModel::PercentOfRevenue { rate } => Some(rate),
                _ => None,
            },
        }
    }

    /// Driver value after moving it down (`sign = -1`) or up (`sign = 1`), floors applied.
    fn shifted(self, base: Decimal, sign: Decimal) -> Decimal {
        match self {
            TornadoDriver::PurchasePrice => base.saturating_mul(Decimal::ONE + sign * dec!(0.05)),
            TornadoDriver::ExitCapRate => {
                base.saturating_add(sign * dec!(0.005)).max(MIN_EXIT_CAP_RATE)
            }
            TornadoDriver::RentGrowth | TornadoDriver::OtherIncomeGrowth => {
                base.saturating_add(sign * dec!(0.01))
            }
            TornadoDriver::VacancyRate | TornadoDriver::InterestRate => {
                base.saturating_add(sign * dec!(0.01)).max(Decimal::ZERO)
            }
            TornadoDriver::OpexRate => base.saturating_add(sign * dec!(0.03)).max(Decimal::ZERO),
        }
    }

    fn apply(self, inputs: &mut ModelInputs, value: Decimal) {
        match self {
            TornadoDriver::PurchasePrice => inputs.purchase_price = value,
            TornadoDriver::ExitCapRate => inputs.exit_cap_rate = value,
            TornadoDriver::RentGrowth => inputs.rent_growth = value,
            TornadoDriver::OtherIncomeGrowth => inputs.other_income_growth = Some(value),
            TornadoDriver::VacancyRate => inputs.vacancy_rate = value,
            TornadoDriver::InterestRate => inputs.interest_rate = value,
            TornadoDriver::OpexRate => {
                if let OpexModel::PercentOfRevenue { rate } = &mut inputs.opex {
                    *rate = value;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoInput {
    pub base_inputs: ModelInputs,
    #[serde(default)]
    pub metric: OutputMetric,
}

/// One bar of the tornado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TornadoRow {
    pub driver: TornadoDriver,
    pub label: String,
    /// Driver value on the low side; `None` when the driver does not apply
    pub low_input: Option<Decimal>,
    pub high_input: Option<Decimal>,
    pub low_value: Option<Decimal>,
    pub high_value: Option<Decimal>,
    /// Metric change vs base on each side
    pub low_delta: Option<Decimal>,
    pub high_delta: Option<Decimal>,
    /// Largest absolute delta
    pub swing: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TornadoOutput {
    pub metric: OutputMetric,
    pub base_value: Option<Decimal>,
    /// Rows ranked by swing, largest first; undefined swings last
    pub rows: Vec<TornadoRow>,
}

/// Rank the drivers by how far a one-at-a-time move shifts the chosen metric.
#[tracing::instrument(skip_all, fields(metric = %input.metric))]
pub fn run_tornado(input: &TornadoInput) -> UnderwritingResult<ComputationOutput<TornadoOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base = input.base_inputs.sanitize_with_warnings(&mut warnings);
    let metric = input.metric;
    let base_value = metric.extract(&run_model(&base));

    if base_value.is_none() {
        warnings.push(format!(
            "Base {} is undefined; swings cannot be measured",
            metric.label()
        ));
    }

    let mut rows: Vec<TornadoRow> = TornadoDriver::ALL
        .iter()
        .map(|driver| tornado_row(*driver, &base, metric, base_value))
        .collect();

    if rows
        .iter()
        .any(|r| r.driver == TornadoDriver::OpexRate && r.low_input.is_none())
    {
        warnings.push(
            "Opex driver has no effect: opex is not modelled as a percentage of revenue".into(),
        );
    }

    rows.sort_by(|a, b| by_swing_desc(a.swing, b.swing));

    let output = TornadoOutput {
        metric,
        base_value,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tornado: One-at-a-Time Driver Sensitivity",
        &serde_json::json!({ "metric": metric }),
        warnings,
        elapsed,
        output,
    ))
}

fn tornado_row(
    driver: TornadoDriver,
    base: &ModelInputs,
    metric: OutputMetric,
    base_value: Option<Decimal>,
) -> TornadoRow {
    let side = |sign: Decimal| -> (Option<Decimal>, Option<Decimal>) {
        match driver.value(base) {
            Some(current) => {
                let moved = driver.shifted(current, sign);
                let mut scenario = base.clone();
                driver.apply(&mut scenario, moved);
                (Some(moved), metric.extract(&run_model(&scenario)))
            }
            None => (None, base_value),
        }
    };

    let (low_input, low_value) = side(-Decimal::ONE);
    let (high_input, high_value) = side(Decimal::ONE);

    let delta = |v: Option<Decimal>| v?.checked_sub(base_value?);
    let low_delta = delta(low_value);
    let high_delta = delta(high_value);

    let swing = match (low_delta, high_delta) {
        (Some(l), Some(h)) => Some(l.abs().max(h.abs())),
        (Some(d), None) | (None, Some(d)) => Some(d.abs()),
        (None, None) => None,
    };

    TornadoRow {
        driver,
        label: driver.label().to_string(),
        low_input,
        high_input,
        low_value,
        high_value,
        low_delta,
        high_delta,
        swing,
    }
}

fn by_swing_desc(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
