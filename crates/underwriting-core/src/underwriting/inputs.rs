use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Smallest exit cap rate the model will divide by.
pub const MIN_EXIT_CAP_RATE: Rate = dec!(0.000001);

/// Longest hold period the model will project.
pub const MAX_HOLD_PERIOD_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Variant models
// ---------------------------------------------------------------------------

/// One line of a unit-aggregated rent roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentRollLine {
    pub label: String,
    pub unit_count: u32,
    /// Contract rent per unit per month
    pub monthly_rent: Money,
}

/// How year-1 rent revenue is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RevenueModel {
    /// Gross potential rent = sum of unit_count * monthly_rent * 12
    RentRoll { lines: Vec<RentRollLine> },
    /// A single annual revenue figure
    Flat { annual_revenue: Money },
}

impl Default for RevenueModel {
    fn default() -> Self {
        RevenueModel::Flat {
            annual_revenue: Decimal::ZERO,
        }
    }
}

/// A fixed operating-expense line, stated in year-1 dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub label: String,
    pub annual_amount: Money,
}

/// Operating expense model, excluding management fee and reserves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OpexModel {
    /// Share of each year's total revenue
    PercentOfRevenue { rate: Rate },
    /// Itemized lines, grown at the expense growth rate
    LineItems { items: Vec<ExpenseLine> },
    /// Annual cost per unit, grown at the expense growth rate
    PerUnit { annual_per_unit: Money },
    /// Itemized lines plus a per-unit component
    Hybrid {
        items: Vec<ExpenseLine>,
        annual_per_unit: Money,
    },
}

impl Default for OpexModel {
    fn default() -> Self {
        OpexModel::PercentOfRevenue {
            rate: Decimal::ZERO,
        }
    }
}

/// Tenant expense recoveries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RecoveryModel {
    #[default]
    None,
    /// Share of each year's operating expenses
    PercentOfOpex { rate: Rate },
    /// Year-1 amount grown at the rent growth rate
    FlatAnnual { amount: Money },
}

/// Capital expenditure model. Both variants grow at the capex growth rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CapexModel {
    PerSquareFoot { annual_per_sf: Money },
    PerUnit { annual_per_unit: Money },
}

impl Default for CapexModel {
    fn default() -> Self {
        CapexModel::PerUnit {
            annual_per_unit: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// ModelInputs
// ---------------------------------------------------------------------------

/// Complete set of underwriting assumptions for a single acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInputs {
    /// Contract purchase price
    pub purchase_price: Money,
    /// Due-diligence spend paid at closing
    pub due_diligence_cost: Money,
    /// Closing costs as a share of purchase price
    pub closing_cost_rate: Rate,
    /// Hold period in years (at least 1)
    pub hold_period_years: u32,

    pub revenue: RevenueModel,
    /// Year-1 other income (parking, laundry, fees)
    pub other_income: Money,
    /// Unit count used when the revenue model is not a rent roll
    pub unit_count: u32,
    /// Rentable square feet
    pub square_feet: Decimal,

    pub rent_growth: Rate,
    /// Falls back to `rent_growth` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_income_growth: Option<Rate>,
    pub expense_growth: Rate,
    pub capex_growth: Rate,
    /// Vacancy and credit loss as a share of revenue plus recoveries
    pub vacancy_rate: Rate,

    pub opex: OpexModel,
    /// Management fee as a share of total revenue
    pub management_fee_rate: Rate,
    /// Annual replacement reserve per unit
    pub reserve_per_unit: Money,
    pub recoveries: RecoveryModel,
    pub capex: CapexModel,

    pub exit_cap_rate: Rate,
    pub cost_of_sale_rate: Rate,

    /// Loan-to-value on purchase price (0 = all-cash)
    pub ltv: Rate,
    pub interest_rate: Rate,
    pub amortization_years: u32,

    /// Discount rate for NPV
    pub discount_rate: Rate,
}

impl Default for ModelInputs {
    fn default() -> Self {
        Self {
            purchase_price: Decimal::ZERO,
            due_diligence_cost: Decimal::ZERO,
            closing_cost_rate: Decimal::ZERO,
            hold_period_years: 1,
            revenue: RevenueModel::default(),
            other_income: Decimal::ZERO,
            unit_count: 0,
            square_feet: Decimal::ZERO,
            rent_growth: Decimal::ZERO,
            other_income_growth: None,
            expense_growth: Decimal::ZERO,
            capex_growth: Decimal::ZERO,
            vacancy_rate: Decimal::ZERO,
            opex: OpexModel::default(),
            management_fee_rate: Decimal::ZERO,
            reserve_per_unit: Decimal::ZERO,
            recoveries: RecoveryModel::default(),
            capex: CapexModel::default(),
            exit_cap_rate: dec!(0.07),
            cost_of_sale_rate: Decimal::ZERO,
            ltv: Decimal::ZERO,
            interest_rate: Decimal::ZERO,
            amortization_years: 30,
            discount_rate: dec!(0.10),
        }
    }
}

impl ModelInputs {
    /// Copy of the inputs with every model invariant enforced.
    ///
    /// Idempotent: sanitizing an already-sanitized value returns an equal value.
    pub fn sanitized(&self) -> Self {
        self.sanitize_with_warnings(&mut Vec::new())
    }

    /// As [`ModelInputs::sanitized`], recording a warning for every clamped field.
    pub fn sanitize_with_warnings(&self, warnings: &mut Vec<String>) -> Self {
        let mut out = self.clone();

        if out.hold_period_years < 1 {
            warnings.push("Hold period below 1 year — using 1".into());
            out.hold_period_years = 1;
        }
        if out.hold_period_years > MAX_HOLD_PERIOD_YEARS {
            warnings.push(format!(
                "Hold period of {} years exceeds the {MAX_HOLD_PERIOD_YEARS}-year cap",
                out.hold_period_years
            ));
            out.hold_period_years = MAX_HOLD_PERIOD_YEARS;
        }
        if out.exit_cap_rate < MIN_EXIT_CAP_RATE {
            warnings.push(format!(
                "Exit cap rate {} is not positive — floored at {MIN_EXIT_CAP_RATE}",
                out.exit_cap_rate
            ));
            out.exit_cap_rate = MIN_EXIT_CAP_RATE;
        }

        out.vacancy_rate = floor_at_zero("vacancy_rate", out.vacancy_rate, warnings);
        out.expense_growth = floor_at_zero("expense_growth", out.expense_growth, warnings);
        out.capex_growth = floor_at_zero("capex_growth", out.capex_growth, warnings);
        out.interest_rate = floor_at_zero("interest_rate", out.interest_rate, warnings);

        out
    }

    /// Number of units the per-unit expense, reserve and capex models scale by.
    pub fn total_units(&self) -> u32 {
        match &self.revenue {
            RevenueModel::RentRoll { lines } => {
                let units = lines
                    .iter()
                    .fold(0u32, |acc, l| acc.saturating_add(l.unit_count));
                if units > 0 {
                    units
                } else {
                    self.unit_count
                }
            }
            RevenueModel::Flat { .. } => self.unit_count,
        }
    }

    /// Year-1 rent revenue before vacancy.
    pub fn base_rent(&self) -> Money {
        match &self.revenue {
            RevenueModel::RentRoll { lines } => lines.iter().fold(Decimal::ZERO, |acc, l| {
                let months = Decimal::from(l.unit_count) * dec!(12);
                acc.saturating_add(months.saturating_mul(l.monthly_rent))
            }),
            RevenueModel::Flat { annual_revenue } => *annual_revenue,
        }
    }

    /// Other-income growth after falling back to rent growth.
    pub fn resolved_other_income_growth(&self) -> Rate {
        self.other_income_growth.unwrap_or(self.rent_growth)
    }
}

fn floor_at_zero(field: &str, value: Rate, warnings: &mut Vec<String>) -> Rate {
    if value < Decimal::ZERO {
        warnings.push(format!("{field} {value} is negative — clamped to 0"));
        Decimal::ZERO
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sanitize_clamps_invariants() {
        let input = ModelInputs {
            hold_period_years: 0,
            exit_cap_rate: dec!(-0.05),
            vacancy_rate: dec!(-0.02),
            expense_growth: dec!(-0.01),
            capex_growth: dec!(-0.03),
            rent_growth: dec!(0.025),
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let clean = input.sanitize_with_warnings(&mut warnings);

        assert_eq!(clean.hold_period_years, 1);
        assert_eq!(clean.exit_cap_rate, MIN_EXIT_CAP_RATE);
        assert_eq!(clean.vacancy_rate, Decimal::ZERO);
        assert_eq!(clean.expense_growth, Decimal::ZERO);
        assert_eq!(clean.capex_growth, Decimal::ZERO);
        assert_eq!(clean.other_income_growth, None);
        assert_eq!(clean.resolved_other_income_growth(), dec!(0.025));
        assert_eq!(warnings.len(), 5);
    }

    #[test]
    fn test_unset_other_income_growth_tracks_later_rent_growth() {
        let mut clean = ModelInputs {
            rent_growth: dec!(0.02),
            ..Default::default()
        }
        .sanitized();
        clean.rent_growth = dec!(0.05);
        assert_eq!(clean.resolved_other_income_growth(), dec!(0.05));
    }

    #[test]
    fn test_hold_period_capped() {
        let input = ModelInputs {
            hold_period_years: 300,
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let clean = input.sanitize_with_warnings(&mut warnings);

        assert_eq!(clean.hold_period_years, MAX_HOLD_PERIOD_YEARS);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("300"));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let input = ModelInputs {
            hold_period_years: 0,
            vacancy_rate: dec!(-1),
            ..Default::default()
        };
        let once = input.sanitized();
        assert_eq!(once.sanitized(), once);
    }

    #[test]
    fn test_explicit_other_income_growth_kept() {
        let input = ModelInputs {
            rent_growth: dec!(0.03),
            other_income_growth: Some(dec!(0.01)),
            ..Default::default()
        };
        assert_eq!(input.sanitized().other_income_growth, Some(dec!(0.01)));
    }

    #[test]
    fn test_rent_roll_base_rent_and_units() {
        let input = ModelInputs {
            revenue: RevenueModel::RentRoll {
                lines: vec![
                    RentRollLine {
                        label: "1BR".into(),
                        unit_count: 10,
                        monthly_rent: dec!(1200),
                    },
                    RentRollLine {
                        label: "2BR".into(),
                        unit_count: 5,
                        monthly_rent: dec!(1600),
                    },
                ],
            },
            unit_count: 99,
            ..Default::default()
        };
        // 10*1200*12 + 5*1600*12 = 144000 + 96000
        assert_eq!(input.base_rent(), dec!(240000));
        assert_eq!(input.total_units(), 15);
    }

    #[test]
    fn test_flat_revenue_uses_unit_count_field() {
        let input = ModelInputs {
            revenue: RevenueModel::Flat {
                annual_revenue: dec!(500000),
            },
            unit_count: 40,
            ..Default::default()
        };
        assert_eq!(input.base_rent(), dec!(500000));
        assert_eq!(input.total_units(), 40);
    }

    #[test]
    fn test_tagged_enum_json_shape() {
        let json = serde_json::json!({
            "purchase_price": "1000000",
            "opex": { "mode": "per_unit", "annual_per_unit": "4500" },
            "recoveries": { "mode": "none" }
        });
        let input: ModelInputs = serde_json::from_value(json).unwrap();
        assert_eq!(input.purchase_price, dec!(1000000));
        assert_eq!(
            input.opex,
            OpexModel::PerUnit {
                annual_per_unit: dec!(4500)
            }
        );
        assert_eq!(input.recoveries, RecoveryModel::None);
        assert_eq!(input.hold_period_years, 1);
    }
}
