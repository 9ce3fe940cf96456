pub mod sensitivity;
pub mod tornado;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::UnderwritingError;
use crate::underwriting::model::ModelResult;

/// Model output tracked by the sensitivity grid and tornado ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMetric {
    #[default]
    LeveredIrr,
    LeveredNpv,
    CashOnCash,
    Dscr,
    ExitSalePrice,
}

impl OutputMetric {
    pub const ALL: [OutputMetric; 5] = [
        OutputMetric::LeveredIrr,
        OutputMetric::LeveredNpv,
        OutputMetric::CashOnCash,
        OutputMetric::Dscr,
        OutputMetric::ExitSalePrice,
    ];

    /// Read this metric off a model result. `None` when undefined for the deal.
    pub fn extract(self, result: &ModelResult) -> Option<Decimal> {
        let m = &result.metrics;
        match self {
            OutputMetric::LeveredIrr => m.levered_irr,
            OutputMetric::LeveredNpv => m.levered_npv,
            OutputMetric::CashOnCash => m.cash_on_cash,
            OutputMetric::Dscr => m.dscr,
            OutputMetric::ExitSalePrice => Some(m.exit_sale_price),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OutputMetric::LeveredIrr => "Levered IRR",
            OutputMetric::LeveredNpv => "Levered NPV",
            OutputMetric::CashOnCash => "Cash-on-Cash",
            OutputMetric::Dscr => "DSCR",
            OutputMetric::ExitSalePrice => "Exit Sale Price",
        }
    }

    fn key(self) -> &'static str {
        match self {
            OutputMetric::LeveredIrr => "levered_irr",
            OutputMetric::LeveredNpv => "levered_npv",
            OutputMetric::CashOnCash => "cash_on_cash",
            OutputMetric::Dscr => "dscr",
            OutputMetric::ExitSalePrice => "exit_sale_price",
        }
    }
}

impl fmt::Display for OutputMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for OutputMetric {
    type Err = UnderwritingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "levered_irr" | "irr" => Ok(OutputMetric::LeveredIrr),
            "levered_npv" | "npv" => Ok(OutputMetric::LeveredNpv),
            "cash_on_cash" | "coc" => Ok(OutputMetric::CashOnCash),
            "dscr" => Ok(OutputMetric::Dscr),
            "exit_sale_price" | "sale_price" => Ok(OutputMetric::ExitSalePrice),
            _ => Err(UnderwritingError::InvalidInput {
                field: "metric".into(),
                reason: format!(
                    "unknown metric '{s}' (expected one of levered_irr, levered_npv, \
                     cash_on_cash, dscr, exit_sale_price)"
                ),
            }),
        }
    }
}
