use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::inputs::{
    CapexModel, ExpenseLine, ModelInputs, OpexModel, RecoveryModel, RentRollLine, RevenueModel,
};
use crate::error::UnderwritingError;
use crate::UnderwritingResult;

/// Build sanitized `ModelInputs` from a loosely-typed JSON deal form.
///
/// Numbers may arrive as JSON numbers or numeric strings (`"1,250,000"`, `"$950"`, `"1e6"`).
/// Missing and null fields take their defaults silently; anything present that does not parse
/// falls back to the default and records a warning. Only a form that is not a JSON object is
/// rejected.
#[tracing::instrument(skip_all)]
pub fn inputs_from_json(
    form: &Value,
    warnings: &mut Vec<String>,
) -> UnderwritingResult<ModelInputs> {
    let obj = form
        .as_object()
        .ok_or_else(|| UnderwritingError::InvalidInput {
            field: "inputs".into(),
            reason: format!("expected a JSON object, got {}", kind(form)),
        })?;

    let d = ModelInputs::default();
    let mut f = Fields { warnings };

    let parsed = ModelInputs {
        purchase_price: f.number(obj, "purchase_price", d.purchase_price),
        due_diligence_cost: f.number(obj, "due_diligence_cost", d.due_diligence_cost),
        closing_cost_rate: f.number(obj, "closing_cost_rate", d.closing_cost_rate),
        hold_period_years: f.count(obj, "hold_period_years", d.hold_period_years),
        revenue: f.revenue(obj),
        other_income: f.number(obj, "other_income", d.other_income),
        unit_count: f.count(obj, "unit_count", d.unit_count),
        square_feet: f.number(obj, "square_feet", d.square_feet),
        rent_growth: f.number(obj, "rent_growth", d.rent_growth),
        other_income_growth: f.optional_number(obj, "other_income_growth"),
        expense_growth: f.number(obj, "expense_growth", d.expense_growth),
        capex_growth: f.number(obj, "capex_growth", d.capex_growth),
        vacancy_rate: f.number(obj, "vacancy_rate", d.vacancy_rate),
        opex: f.opex(obj),
        management_fee_rate: f.number(obj, "management_fee_rate", d.management_fee_rate),
        reserve_per_unit: f.number(obj, "reserve_per_unit", d.reserve_per_unit),
        recoveries: f.recoveries(obj),
        capex: f.capex(obj),
        exit_cap_rate: f.number(obj, "exit_cap_rate", d.exit_cap_rate),
        cost_of_sale_rate: f.number(obj, "cost_of_sale_rate", d.cost_of_sale_rate),
        ltv: f.number(obj, "ltv", d.ltv),
        interest_rate: f.number(obj, "interest_rate", d.interest_rate),
        amortization_years: f.count(obj, "amortization_years", d.amortization_years),
        discount_rate: f.number(obj, "discount_rate", d.discount_rate),
    };

    Ok(parsed.sanitize_with_warnings(f.warnings))
}

/// Parse a scalar as a decimal. Accepts JSON numbers and numeric strings with currency
/// symbols, thousands separators or exponent notation.
pub fn parse_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_str(&n.to_string()),
        Value::String(s) => parse_str(s),
        _ => None,
    }
}

fn parse_str(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

struct Fields<'w> {
    warnings: &'w mut Vec<String>,
}

impl Fields<'_> {
    fn fallback(&mut self, field: &str, raw: &Value, default: impl std::fmt::Display) {
        tracing::debug!(field, raw = %raw, "unparseable input, using default");
        self.warnings.push(format!(
            "{field}: could not read {raw} as a number — using {default}"
        ));
    }

    fn number(&mut self, obj: &Map<String, Value>, key: &str, default: Decimal) -> Decimal {
        match obj.get(key) {
            None => default,
            Some(v) if is_blank(v) => default,
            Some(v) => parse_number(v).unwrap_or_else(|| {
                self.fallback(key, v, default);
                default
            }),
        }
    }

    fn optional_number(&mut self, obj: &Map<String, Value>, key: &str) -> Option<Decimal> {
        match obj.get(key) {
            None => None,
            Some(v) if is_blank(v) => None,
            Some(v) => {
                let parsed = parse_number(v);
                if parsed.is_none() {
                    self.fallback(key, v, "the default");
                }
                parsed
            }
        }
    }

    /// Whole non-negative count. Fractions truncate; negatives clamp to 0.
    fn count(&mut self, obj: &Map<String, Value>, key: &str, default: u32) -> u32 {
        let value = self.number(obj, key, Decimal::from(default));
        if value < Decimal::ZERO {
            self.warnings
                .push(format!("{key} {value} is negative — clamped to 0"));
            return 0;
        }
        value.trunc().to_u32().unwrap_or_else(|| {
            self.fallback(key, &Value::String(value.to_string()), default);
            default
        })
    }

    /// Nested object for a variant model plus its `mode` tag.
    fn section<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        key: &str,
    ) -> Option<(&'a Map<String, Value>, String)> {
        let section = obj.get(key)?;
        match section.as_object() {
            Some(inner) => {
                let mode = inner
                    .get("mode")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                Some((inner, mode))
            }
            None if section.is_null() => None,
            None => {
                self.warnings
                    .push(format!("{key}: expected an object — using the default model"));
                None
            }
        }
    }

    fn unknown_mode(&mut self, key: &str, mode: &str) {
        tracing::debug!(field = key, mode, "unknown model mode");
        self.warnings
            .push(format!("{key}: unknown mode '{mode}' — using the default model"));
    }

    fn revenue(&mut self, obj: &Map<String, Value>) -> RevenueModel {
        let Some((section, mode)) = self.section(obj, "revenue") else {
            return RevenueModel::default();
        };
        match mode.as_str() {
            "rent_roll" => RevenueModel::RentRoll {
                lines: self.rent_roll_lines(section),
            },
            "flat" | "" => RevenueModel::Flat {
                annual_revenue: self.number(section, "annual_revenue", Decimal::ZERO),
            },
            other => {
                self.unknown_mode("revenue", other);
                RevenueModel::default()
            }
        }
    }

    fn rent_roll_lines(&mut self, section: &Map<String, Value>) -> Vec<RentRollLine> {
        let rows = section
            .get("lines")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        rows.iter()
            .filter_map(Value::as_object)
            .enumerate()
            .map(|(i, row)| RentRollLine {
                label: label(row, i),
                unit_count: self.count(row, "unit_count", 0),
                monthly_rent: self.number(row, "monthly_rent", Decimal::ZERO),
            })
            .collect()
    }

    fn expense_lines(&mut self, section: &Map<String, Value>) -> Vec<ExpenseLine> {
        let rows = section
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        rows.iter()
            .filter_map(Value::as_object)
            .enumerate()
            .map(|(i, row)| ExpenseLine {
                label: label(row, i),
                annual_amount: self.number(row, "annual_amount", Decimal::ZERO),
            })
            .collect()
    }

    fn opex(&mut self, obj: &Map<String, Value>) -> OpexModel {
        let Some((section, mode)) = self.section(obj, "opex") else {
            return OpexModel::default();
        };
        match mode.as_str() {
            "percent_of_revenue" | "" => OpexModel::PercentOfRevenue {
                rate: self.number(section, "rate", Decimal::ZERO),
            },
            "line_items" => OpexModel::LineItems {
                items: self.expense_lines(section),
            },
            "per_unit" => OpexModel::PerUnit {
                annual_per_unit: self.number(section, "annual_per_unit", Decimal::ZERO),
            },
            "hybrid" => OpexModel::Hybrid {
                items: self.expense_lines(section),
                annual_per_unit: self.number(section, "annual_per_unit", Decimal::ZERO),
            },
            other => {
                self.unknown_mode("opex", other);
                OpexModel::default()
            }
        }
    }

    fn recoveries(&mut self, obj: &Map<String, Value>) -> RecoveryModel {
        let Some((section, mode)) = self.section(obj, "recoveries") else {
            return RecoveryModel::default();
        };
        match mode.as_str() {
            "none" | "" => RecoveryModel::None,
            "percent_of_opex" => RecoveryModel::PercentOfOpex {
                rate: self.number(section, "rate", Decimal::ZERO),
            },
            "flat_annual" => RecoveryModel::FlatAnnual {
                amount: self.number(section, "amount", Decimal::ZERO),
            },
            other => {
                self.unknown_mode("recoveries", other);
                RecoveryModel::default()
            }
        }
    }

    fn capex(&mut self, obj: &Map<String, Value>) -> CapexModel {
        let Some((section, mode)) = self.section(obj, "capex") else {
            return CapexModel::default();
        };
        match mode.as_str() {
            "per_unit" | "" => CapexModel::PerUnit {
                annual_per_unit: self.number(section, "annual_per_unit", Decimal::ZERO),
            },
            "per_square_foot" => CapexModel::PerSquareFoot {
                annual_per_sf: self.number(section, "annual_per_sf", Decimal::ZERO),
            },
            other => {
                self.unknown_mode("capex", other);
                CapexModel::default()
            }
        }
    }
}

fn label(row: &Map<String, Value>, index: usize) -> String {
    row.get("label")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Line {}", index + 1))
}
