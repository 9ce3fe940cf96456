use serde::{Deserialize, Serialize};

use super::model::ModelResult;
use crate::types::Money;

/// One operating year of the annual cash-flow export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRow {
    pub year: u32,
    pub rent_revenue: Money,
    pub other_income: Money,
    pub total_revenue: Money,
    pub recoveries: Money,
    pub vacancy_loss: Money,
    pub effective_gross_income: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    pub capex: Money,
    pub unlevered_cash_flow: Money,
    pub levered_cash_flow: Money,
}

/// Labelled exit figure appended below the annual rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailerRow {
    pub label: String,
    pub value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReport {
    pub rows: Vec<AnnualRow>,
    pub trailer: Vec<TrailerRow>,
}

/// Flatten a model result into per-year rows for years 1..=hold plus exit trailer rows.
///
/// The forward exit year is not a row; it only shows up through the exit NOI trailer.
pub fn annual_table(result: &ModelResult) -> AnnualReport {
    let s = &result.series;
    let cf = &result.cash_flows;
    let hold = cf.unlevered.len().saturating_sub(1);

    let rows = (1..=hold)
        .map(|y| AnnualRow {
            year: y as u32,
            rent_revenue: s.rent_revenue[y],
            other_income: s.other_income[y],
            total_revenue: s.total_revenue[y],
            recoveries: s.recoveries[y],
            vacancy_loss: s.vacancy_loss[y],
            effective_gross_income: s.effective_gross_income[y],
            operating_expenses: s.operating_expenses[y],
            noi: s.noi[y],
            capex: s.capex[y],
            unlevered_cash_flow: cf.unlevered[y],
            levered_cash_flow: cf.levered[y],
        })
        .collect();

    let trailer = [
        ("Exit NOI", result.exit.exit_noi),
        ("Sale price", result.exit.sale_price),
        ("Sale costs", result.exit.sale_costs),
        ("Loan payoff", result.financing.payoff_at_exit),
        ("Net sale proceeds", result.exit.net_sale_proceeds),
    ]
    .into_iter()
    .map(|(label, value)| TrailerRow {
        label: label.to_string(),
        value,
    })
    .collect();

    AnnualReport { rows, trailer }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::underwriting::inputs::{ModelInputs, RevenueModel};
    use crate::underwriting::model::run_model;
    use rust_decimal_macros::dec;

    #[test]
    fn test_one_row_per_hold_year() {
        let result = run_model(&ModelInputs {
            purchase_price: dec!(1000000),
            hold_period_years: 4,
            revenue: RevenueModel::Flat {
                annual_revenue: dec!(100000),
            },
            rent_growth: dec!(0.02),
            exit_cap_rate: dec!(0.08),
            ..Default::default()
        });
        let report = annual_table(&result);

        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.rows[0].year, 1);
        assert_eq!(report.rows[3].year, 4);
        assert_eq!(report.rows[1].rent_revenue, dec!(102000));
        assert_eq!(report.rows[3].unlevered_cash_flow, result.cash_flows.unlevered[4]);
    }

    #[test]
    fn test_trailer_rows() {
        let result = run_model(&ModelInputs {
            purchase_price: dec!(1000000),
            revenue: RevenueModel::Flat {
                annual_revenue: dec!(100000),
            },
            exit_cap_rate: dec!(0.10),
            cost_of_sale_rate: dec!(0.02),
            ..Default::default()
        });
        let report = annual_table(&result);

        let labels: Vec<&str> = report.trailer.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Exit NOI", "Sale price", "Sale costs", "Loan payoff", "Net sale proceeds"]
        );
        assert_eq!(report.trailer[1].value, dec!(1000000));
        assert_eq!(report.trailer[4].value, dec!(980000));
    }
}
