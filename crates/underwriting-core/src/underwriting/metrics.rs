use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::inputs::ModelInputs;
use super::projection::Projection;
use crate::time_value::{irr, npv};
use crate::types::{Money, Multiple, Rate};

/// Return metrics for one projection. `None` marks a metric that is undefined for the deal,
/// e.g. DSCR with no debt or IRR for a cash-flow shape with no sign change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// Going-in cap rate: year-1 NOI / purchase price
    pub cap_rate: Option<Rate>,
    /// Year-1 NOI / annual debt service
    pub dscr: Option<Multiple>,
    /// Year-1 levered cash flow / equity invested
    pub cash_on_cash: Option<Rate>,
    pub unlevered_irr: Option<Rate>,
    pub levered_irr: Option<Rate>,
    pub unlevered_npv: Option<Money>,
    pub levered_npv: Option<Money>,
    /// Levered distributions over the hold / equity invested
    pub equity_multiple: Option<Multiple>,
    pub exit_noi: Money,
    pub exit_sale_price: Money,
    pub sale_costs: Money,
    pub net_sale_proceeds: Money,
    pub loan_proceeds: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub loan_payoff_at_exit: Money,
    pub year1_noi: Money,
    pub equity_invested: Money,
}

/// Derive return metrics from a projection.
///
/// A projection that left the decimal range yields `None` for every optional metric.
pub fn compute_metrics(inputs: &ModelInputs, projection: &Projection) -> ReturnMetrics {
    let cash_flows = &projection.cash_flows;
    let financing = &projection.financing;
    let year1_noi = projection.series.noi[1];

    let equity_invested = -cash_flows.levered[0];
    let year1_levered = cash_flows.levered[1];
    let levered_distributions = cash_flows
        .levered
        .iter()
        .skip(1)
        .fold(Decimal::ZERO, |acc, cf| acc.saturating_add(*cf));

    let metrics = ReturnMetrics {
        cap_rate: ratio(year1_noi, inputs.purchase_price),
        dscr: ratio(year1_noi, financing.annual_debt_service),
        cash_on_cash: ratio(year1_levered, equity_invested),
        unlevered_irr: irr(&cash_flows.unlevered),
        levered_irr: irr(&cash_flows.levered),
        unlevered_npv: npv(inputs.discount_rate, &cash_flows.unlevered),
        levered_npv: npv(inputs.discount_rate, &cash_flows.levered),
        equity_multiple: ratio(levered_distributions, equity_invested),
        exit_noi: projection.exit.exit_noi,
        exit_sale_price: projection.exit.sale_price,
        sale_costs: projection.exit.sale_costs,
        net_sale_proceeds: projection.exit.net_sale_proceeds,
        loan_proceeds: financing.loan_proceeds,
        monthly_payment: financing.monthly_payment,
        annual_debt_service: financing.annual_debt_service,
        loan_payoff_at_exit: financing.payoff_at_exit,
        year1_noi,
        equity_invested,
    };

    if projection.out_of_range {
        ReturnMetrics {
            cap_rate: None,
            dscr: None,
            cash_on_cash: None,
            unlevered_irr: None,
            levered_irr: None,
            unlevered_npv: None,
            levered_npv: None,
            equity_multiple: None,
            ..metrics
        }
    } else {
        metrics
    }
}

/// `numerator / denominator`, undefined unless the denominator is strictly positive.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator > Decimal::ZERO {
        numerator.checked_div(denominator)
    } else {
        None
    }
}
