use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::amortization::{checked_monthly_payment, remaining_balance};
use super::inputs::{
    CapexModel, ExpenseLine, ModelInputs, OpexModel, RecoveryModel, MAX_HOLD_PERIOD_YEARS,
};
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-year operating series indexed by year. Index 0 is unused and holds zero; index
/// `hold + 1` is the forward year used to value the exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSeries {
    pub rent_revenue: Vec<Money>,
    pub other_income: Vec<Money>,
    pub total_revenue: Vec<Money>,
    pub recoveries: Vec<Money>,
    /// Vacancy and credit loss, always <= 0
    pub vacancy_loss: Vec<Money>,
    pub effective_gross_income: Vec<Money>,
    pub operating_expenses: Vec<Money>,
    pub noi: Vec<Money>,
    pub capex: Vec<Money>,
}

impl YearSeries {
    fn zeroed(len: usize) -> Self {
        Self {
            rent_revenue: vec![Decimal::ZERO; len],
            other_income: vec![Decimal::ZERO; len],
            total_revenue: vec![Decimal::ZERO; len],
            recoveries: vec![Decimal::ZERO; len],
            vacancy_loss: vec![Decimal::ZERO; len],
            effective_gross_income: vec![Decimal::ZERO; len],
            operating_expenses: vec![Decimal::ZERO; len],
            noi: vec![Decimal::ZERO; len],
            capex: vec![Decimal::ZERO; len],
        }
    }

    /// Last projected year, including the forward exit year.
    pub fn last_year(&self) -> usize {
        self.noi.len().saturating_sub(1)
    }
}

/// Unlevered and levered cash flows, index 0 = closing, 1..=hold = operating years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSet {
    pub unlevered: Vec<Money>,
    pub levered: Vec<Money>,
}

/// Terminal sale at the end of the hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitValuation {
    /// Forward (hold + 1) NOI capitalised at exit
    pub exit_noi: Money,
    pub sale_price: Money,
    pub sale_costs: Money,
    pub net_sale_proceeds: Money,
}

/// Acquisition loan sized off purchase price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financing {
    pub loan_proceeds: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    /// Balance repaid from sale proceeds at exit
    pub payoff_at_exit: Money,
}

/// Everything the projector derives from one set of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub hold_period_years: u32,
    /// Price + due diligence + closing costs
    pub total_acquisition_cost: Money,
    pub series: YearSeries,
    pub cash_flows: CashFlowSet,
    pub exit: ExitValuation,
    pub financing: Financing,
    /// Set when an amount left the decimal range and was saturated
    pub out_of_range: bool,
}

// ---------------------------------------------------------------------------
// Range-checked arithmetic
// ---------------------------------------------------------------------------

/// Checked decimal arithmetic that saturates on overflow and remembers that it did.
#[derive(Debug, Default)]
struct RangeCheck {
    overflowed: bool,
}

impl RangeCheck {
    fn saturate(&mut self, negative: bool) -> Decimal {
        self.overflowed = true;
        if negative {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    }

    fn add(&mut self, a: Decimal, b: Decimal) -> Decimal {
        match a.checked_add(b) {
            Some(v) => v,
            None => self.saturate(a.is_sign_negative()),
        }
    }

    fn sub(&mut self, a: Decimal, b: Decimal) -> Decimal {
        match a.checked_sub(b) {
            Some(v) => v,
            None => self.saturate(a.is_sign_negative()),
        }
    }

    fn mul(&mut self, a: Decimal, b: Decimal) -> Decimal {
        match a.checked_mul(b) {
            Some(v) => v,
            None => self.saturate(a.is_sign_negative() != b.is_sign_negative()),
        }
    }

    /// Divisor must be non-zero.
    fn div(&mut self, a: Decimal, b: Decimal) -> Decimal {
        match a.checked_div(b) {
            Some(v) => v,
            None => self.saturate(a.is_sign_negative() != b.is_sign_negative()),
        }
    }
}

// ---------------------------------------------------------------------------
// Expense bases
// ---------------------------------------------------------------------------

/// Variant models reduced to a revenue share plus a growing fixed base, resolved once per
/// projection.
struct OpexBasis {
    share_of_revenue: Rate,
    fixed_base: Money,
}

impl OpexBasis {
    fn resolve(model: &OpexModel, units: Decimal, rc: &mut RangeCheck) -> Self {
        match model {
            OpexModel::PercentOfRevenue { rate } => Self {
                share_of_revenue: *rate,
                fixed_base: Decimal::ZERO,
            },
            OpexModel::LineItems { items } => Self {
                share_of_revenue: Decimal::ZERO,
                fixed_base: Self::line_total(items, rc),
            },
            OpexModel::PerUnit { annual_per_unit } => Self {
                share_of_revenue: Decimal::ZERO,
                fixed_base: rc.mul(*annual_per_unit, units),
            },
            OpexModel::Hybrid {
                items,
                annual_per_unit,
            } => {
                let lines = Self::line_total(items, rc);
                let per_unit = rc.mul(*annual_per_unit, units);
                Self {
                    share_of_revenue: Decimal::ZERO,
                    fixed_base: rc.add(lines, per_unit),
                }
            }
        }
    }

    fn line_total(items: &[ExpenseLine], rc: &mut RangeCheck) -> Money {
        items
            .iter()
            .fold(Decimal::ZERO, |acc, i| rc.add(acc, i.annual_amount))
    }

    fn amount(&self, revenue: Money, expense_factor: Decimal, rc: &mut RangeCheck) -> Money {
        let variable = rc.mul(self.share_of_revenue, revenue);
        let fixed = rc.mul(self.fixed_base, expense_factor);
        rc.add(variable, fixed).max(Decimal::ZERO)
    }
}

struct RecoveryBasis {
    share_of_opex: Rate,
    flat_base: Money,
}

impl RecoveryBasis {
    fn resolve(model: &RecoveryModel) -> Self {
        match model {
            RecoveryModel::None => Self {
                share_of_opex: Decimal::ZERO,
                flat_base: Decimal::ZERO,
            },
            RecoveryModel::PercentOfOpex { rate } => Self {
                share_of_opex: *rate,
                flat_base: Decimal::ZERO,
            },
            RecoveryModel::FlatAnnual { amount } => Self {
                share_of_opex: Decimal::ZERO,
                flat_base: *amount,
            },
        }
    }

    fn amount(&self, opex: Money, rent_factor: Decimal, rc: &mut RangeCheck) -> Money {
        let share = rc.mul(self.share_of_opex, opex);
        let flat = rc.mul(self.flat_base, rent_factor);
        rc.add(share, flat)
    }
}

fn capex_base(
    model: &CapexModel,
    units: Decimal,
    square_feet: Decimal,
    rc: &mut RangeCheck,
) -> Money {
    match model {
        CapexModel::PerSquareFoot { annual_per_sf } => rc.mul(*annual_per_sf, square_feet),
        CapexModel::PerUnit { annual_per_unit } => rc.mul(*annual_per_unit, units),
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project operating series and cash flows.
///
/// Expects sanitized inputs; see [`ModelInputs::sanitized`]. Amounts that leave the decimal
/// range saturate at `Decimal::MAX`/`Decimal::MIN` and set [`Projection::out_of_range`].
pub fn project(inputs: &ModelInputs) -> Projection {
    let hold = inputs.hold_period_years.clamp(1, MAX_HOLD_PERIOD_YEARS);
    let years = hold as usize;
    let mut rc = RangeCheck::default();
    let series = project_series(inputs, years + 1, &mut rc);

    // --- Acquisition ---
    let price = inputs.purchase_price;
    let closing_costs = rc.mul(price, inputs.closing_cost_rate);
    let price_and_diligence = rc.add(price, inputs.due_diligence_cost);
    let total_acquisition_cost = rc.add(price_and_diligence, closing_costs);

    // --- Exit on forward NOI ---
    let exit_noi = series.noi[years + 1];
    let sale_price = if inputs.exit_cap_rate > Decimal::ZERO {
        rc.div(exit_noi, inputs.exit_cap_rate)
    } else {
        Decimal::ZERO
    };
    let sale_costs = rc.mul(sale_price, inputs.cost_of_sale_rate);
    let net_sale_proceeds = rc.sub(sale_price, sale_costs);

    // --- Financing ---
    let loan_proceeds = rc.mul(price, inputs.ltv).max(Decimal::ZERO);
    let monthly = checked_monthly_payment(
        loan_proceeds,
        inputs.interest_rate,
        inputs.amortization_years,
    )
    .unwrap_or_else(|| rc.saturate(false));
    let annual_debt_service = rc.mul(monthly, dec!(12));
    let payoff_at_exit = remaining_balance(
        loan_proceeds,
        inputs.interest_rate,
        inputs.amortization_years,
        hold.saturating_mul(12),
    );

    // --- Cash flows ---
    let mut unlevered = Vec::with_capacity(years + 1);
    let mut levered = Vec::with_capacity(years + 1);
    unlevered.push(-total_acquisition_cost);
    levered.push(rc.add(-total_acquisition_cost, loan_proceeds));

    for year in 1..=years {
        let operating = rc.sub(series.noi[year], series.capex[year]);
        unlevered.push(operating);
        levered.push(rc.sub(operating, annual_debt_service));
    }
    let levered_exit = rc.sub(net_sale_proceeds, payoff_at_exit);
    unlevered[years] = rc.add(unlevered[years], net_sale_proceeds);
    levered[years] = rc.add(levered[years], levered_exit);

    if rc.overflowed {
        tracing::debug!(hold, "projection saturated at the decimal range");
    }

    Projection {
        hold_period_years: hold,
        total_acquisition_cost,
        series,
        cash_flows: CashFlowSet {
            unlevered,
            levered,
        },
        exit: ExitValuation {
            exit_noi,
            sale_price,
            sale_costs,
            net_sale_proceeds,
        },
        financing: Financing {
            loan_proceeds,
            monthly_payment: monthly,
            annual_debt_service,
            payoff_at_exit,
        },
        out_of_range: rc.overflowed,
    }
}

/// Build the operating series for years 1..=last_year.
fn project_series(inputs: &ModelInputs, last_year: usize, rc: &mut RangeCheck) -> YearSeries {
    let mut series = YearSeries::zeroed(last_year + 1);

    let units = Decimal::from(inputs.total_units());
    let base_rent = inputs.base_rent();
    let opex_basis = OpexBasis::resolve(&inputs.opex, units, rc);
    let recovery_basis = RecoveryBasis::resolve(&inputs.recoveries);
    let base_capex = capex_base(&inputs.capex, units, inputs.square_feet, rc);
    let base_reserves = rc.mul(inputs.reserve_per_unit, units);

    let rent_step = rc.add(Decimal::ONE, inputs.rent_growth);
    let other_step = rc.add(Decimal::ONE, inputs.resolved_other_income_growth());
    let expense_step = rc.add(Decimal::ONE, inputs.expense_growth);
    let capex_step = rc.add(Decimal::ONE, inputs.capex_growth);

    let mut rent_factor = Decimal::ONE;
    let mut other_factor = Decimal::ONE;
    let mut expense_factor = Decimal::ONE;
    let mut capex_factor = Decimal::ONE;

    for year in 1..=last_year {
        if year > 1 {
            rent_factor = rc.mul(rent_factor, rent_step);
            other_factor = rc.mul(other_factor, other_step);
            expense_factor = rc.mul(expense_factor, expense_step);
            capex_factor = rc.mul(capex_factor, capex_step);
        }

        let rent = rc.mul(base_rent, rent_factor);
        let other = rc.mul(inputs.other_income, other_factor);
        let revenue = rc.add(rent, other);

        let management_fee = rc.mul(inputs.management_fee_rate, revenue).max(Decimal::ZERO);
        let reserves = rc.mul(base_reserves, expense_factor).max(Decimal::ZERO);
        let base_opex = opex_basis.amount(revenue, expense_factor, rc);
        let opex_before_reserves = rc.add(base_opex, management_fee);
        let opex = rc.add(opex_before_reserves, reserves);

        let recoveries = recovery_basis.amount(opex, rent_factor, rc);
        let gross = rc.add(revenue, recoveries);
        let vacancy_loss = -rc.mul(gross, inputs.vacancy_rate);
        let egi = rc.add(gross, vacancy_loss);

        series.rent_revenue[year] = rent;
        series.other_income[year] = other;
        series.total_revenue[year] = revenue;
        series.recoveries[year] = recoveries;
        series.vacancy_loss[year] = vacancy_loss;
        series.effective_gross_income[year] = egi;
        series.operating_expenses[year] = opex;
        series.noi[year] = rc.sub(egi, opex);
        series.capex[year] = rc.mul(base_capex, capex_factor);
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::underwriting::inputs::{RentRollLine, RevenueModel};
    use rust_decimal_macros::dec;

    fn flat_input(rent: Money) -> ModelInputs {
        ModelInputs {
            purchase_price: dec!(1000000),
            hold_period_years: 5,
            revenue: RevenueModel::Flat {
                annual_revenue: rent,
            },
            exit_cap_rate: dec!(0.10),
            ..Default::default()
        }
        .sanitized()
    }

    #[test]
    fn test_series_length_includes_forward_year() {
        let p = project(&flat_input(dec!(100000)));
        assert_eq!(p.series.noi.len(), 7);
        assert_eq!(p.series.last_year(), 6);
        assert_eq!(p.series.noi[0], Decimal::ZERO);
        assert_eq!(p.cash_flows.unlevered.len(), 6);
        assert_eq!(p.cash_flows.levered.len(), 6);
    }

    #[test]
    fn test_no_growth_no_costs_noi_is_flat() {
        let mut input = flat_input(dec!(100000));
        input.other_income = dec!(5000);
        let p = project(&input.sanitized());

        for year in 1..=6 {
            assert_eq!(p.series.noi[year], dec!(105000), "year {year}");
        }
        for year in 1..5 {
            assert_eq!(p.cash_flows.unlevered[year], p.series.noi[year]);
        }
    }

    #[test]
    fn test_rent_compounds_from_year_one() {
        let mut input = flat_input(dec!(100000));
        input.rent_growth = dec!(0.03);
        let p = project(&input.sanitized());

        assert_eq!(p.series.rent_revenue[1], dec!(100000));
        assert_eq!(p.series.rent_revenue[2], dec!(103000));
        assert_eq!(p.series.rent_revenue[3], dec!(106090));
    }

    #[test]
    fn test_other_income_follows_rent_growth_by_default() {
        let mut input = flat_input(dec!(100000));
        input.other_income = dec!(10000);
        input.rent_growth = dec!(0.05);
        let p = project(&input.sanitized());
        assert_eq!(p.series.other_income[2], dec!(10500));

        input.other_income_growth = Some(Decimal::ZERO);
        let p = project(&input.sanitized());
        assert_eq!(p.series.other_income[2], dec!(10000));
    }

    #[test]
    fn test_percent_of_revenue_opex_with_fee() {
        let mut input = flat_input(dec!(200000));
        input.opex = OpexModel::PercentOfRevenue { rate: dec!(0.35) };
        input.management_fee_rate = dec!(0.04);
        let p = project(&input.sanitized());

        // 0.35 * 200000 + 0.04 * 200000
        assert_eq!(p.series.operating_expenses[1], dec!(78000));
        assert_eq!(p.series.noi[1], dec!(122000));
    }

    #[test]
    fn test_hybrid_opex_grows_with_expense_growth() {
        let mut input = flat_input(dec!(300000));
        input.unit_count = 20;
        input.expense_growth = dec!(0.02);
        input.reserve_per_unit = dec!(250);
        input.opex = OpexModel::Hybrid {
            items: vec![
                ExpenseLine {
                    label: "Taxes".into(),
                    annual_amount: dec!(30000),
                },
                ExpenseLine {
                    label: "Insurance".into(),
                    annual_amount: dec!(10000),
                },
            ],
            annual_per_unit: dec!(1500),
        };
        let p = project(&input.sanitized());

        // 40000 + 1500 * 20 + reserves 250 * 20
        assert_eq!(p.series.operating_expenses[1], dec!(75000));
        assert_eq!(p.series.operating_expenses[2], dec!(76500));
    }

    #[test]
    fn test_recoveries_and_vacancy() {
        let mut input = flat_input(dec!(100000));
        input.opex = OpexModel::LineItems {
            items: vec![ExpenseLine {
                label: "CAM".into(),
                annual_amount: dec!(20000),
            }],
        };
        input.recoveries = RecoveryModel::PercentOfOpex { rate: dec!(0.5) };
        input.vacancy_rate = dec!(0.10);
        let p = project(&input.sanitized());

        assert_eq!(p.series.recoveries[1], dec!(10000));
        // -(100000 + 10000) * 0.10
        assert_eq!(p.series.vacancy_loss[1], dec!(-11000));
        assert_eq!(p.series.effective_gross_income[1], dec!(99000));
        assert_eq!(p.series.noi[1], dec!(79000));
    }

    #[test]
    fn test_flat_recoveries_grow_with_rent() {
        let mut input = flat_input(dec!(100000));
        input.rent_growth = dec!(0.10);
        input.recoveries = RecoveryModel::FlatAnnual {
            amount: dec!(5000),
        };
        let p = project(&input.sanitized());
        assert_eq!(p.series.recoveries[1], dec!(5000));
        assert_eq!(p.series.recoveries[2], dec!(5500));
    }

    #[test]
    fn test_capex_per_square_foot() {
        let mut input = flat_input(dec!(100000));
        input.square_feet = dec!(20000);
        input.capex_growth = dec!(0.03);
        input.capex = CapexModel::PerSquareFoot {
            annual_per_sf: dec!(0.25),
        };
        let p = project(&input.sanitized());

        assert_eq!(p.series.capex[1], dec!(5000));
        assert_eq!(p.series.capex[2], dec!(5150));
        assert_eq!(p.cash_flows.unlevered[1], dec!(95000));
    }

    #[test]
    fn test_rent_roll_per_unit_capex_uses_roll_units() {
        let mut input = flat_input(Decimal::ZERO);
        input.revenue = RevenueModel::RentRoll {
            lines: vec![RentRollLine {
                label: "Studio".into(),
                unit_count: 12,
                monthly_rent: dec!(1000),
            }],
        };
        input.capex = CapexModel::PerUnit {
            annual_per_unit: dec!(300),
        };
        let p = project(&input.sanitized());

        assert_eq!(p.series.rent_revenue[1], dec!(144000));
        assert_eq!(p.series.capex[1], dec!(3600));
    }

    #[test]
    fn test_one_year_hold_known_answer() {
        let mut input = flat_input(dec!(100000));
        input.hold_period_years = 1;
        let p = project(&input.sanitized());

        assert_eq!(p.exit.exit_noi, dec!(100000));
        assert_eq!(p.exit.sale_price, dec!(1000000));
        assert_eq!(
            p.cash_flows.unlevered,
            vec![dec!(-1000000), dec!(1100000)]
        );
        assert_eq!(p.cash_flows.levered, p.cash_flows.unlevered);
    }

    #[test]
    fn test_acquisition_costs_and_sale_costs() {
        let mut input = flat_input(dec!(100000));
        input.hold_period_years = 1;
        input.due_diligence_cost = dec!(15000);
        input.closing_cost_rate = dec!(0.02);
        input.cost_of_sale_rate = dec!(0.03);
        let p = project(&input.sanitized());

        assert_eq!(p.total_acquisition_cost, dec!(1035000));
        assert_eq!(p.cash_flows.unlevered[0], dec!(-1035000));
        assert_eq!(p.exit.sale_costs, dec!(30000));
        assert_eq!(p.exit.net_sale_proceeds, dec!(970000));
        assert_eq!(p.cash_flows.unlevered[1], dec!(1070000));
    }

    #[test]
    fn test_levered_flows_net_debt_service_and_payoff() {
        let mut input = flat_input(dec!(100000));
        input.ltv = dec!(0.60);
        input.interest_rate = dec!(0.06);
        input.amortization_years = 30;
        let p = project(&input.sanitized());

        let f = &p.financing;
        assert_eq!(f.loan_proceeds, dec!(600000));
        assert_eq!(f.annual_debt_service, f.monthly_payment * dec!(12));
        assert_eq!(
            f.payoff_at_exit,
            remaining_balance(f.loan_proceeds, dec!(0.06), 30, 60)
        );

        assert_eq!(p.cash_flows.levered[0], dec!(-400000));
        assert_eq!(
            p.cash_flows.levered[1],
            p.cash_flows.unlevered[1] - f.annual_debt_service
        );
        let expected = p.cash_flows.unlevered[5] - f.annual_debt_service - f.payoff_at_exit;
        assert!((p.cash_flows.levered[5] - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_expense_components_floor_at_zero() {
        let mut input = flat_input(dec!(100000));
        input.opex = OpexModel::PercentOfRevenue { rate: dec!(-0.2) };
        input.management_fee_rate = dec!(-0.05);
        let p = project(&input.sanitized());
        assert_eq!(p.series.operating_expenses[1], Decimal::ZERO);
    }

    #[test]
    fn test_unbounded_growth_saturates_instead_of_panicking() {
        let mut input = flat_input(dec!(100000));
        input.hold_period_years = 60;
        input.rent_growth = dec!(3.0);
        input.ltv = dec!(0.7);
        input.interest_rate = dec!(0.06);
        let p = project(&input.sanitized());

        assert!(p.out_of_range);
        assert_eq!(p.cash_flows.unlevered.len(), 61);
        assert_eq!(p.series.rent_revenue[60], Decimal::MAX);
        assert_eq!(p.series.noi[1], dec!(100000));
    }

    #[test]
    fn test_hold_period_capped_in_projection() {
        let mut input = flat_input(dec!(100000));
        input.hold_period_years = 1_000_000_000;
        let p = project(&input);

        assert_eq!(p.hold_period_years, MAX_HOLD_PERIOD_YEARS);
        assert_eq!(p.series.noi.len(), MAX_HOLD_PERIOD_YEARS as usize + 2);
        assert!(!p.out_of_range);
    }
}
