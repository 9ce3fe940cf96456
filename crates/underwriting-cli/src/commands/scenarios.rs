use clap::Args;
use serde_json::Value;

use underwriting_core::scenarios::sensitivity::{run_sensitivity_grid, SensitivityInput};
use underwriting_core::scenarios::tornado::{run_tornado, TornadoInput};
use underwriting_core::scenarios::OutputMetric;

use crate::input::{self, DealArgs};

/// Arguments for the sensitivity grid and tornado
#[derive(Args)]
pub struct ScenarioArgs {
    #[command(flatten)]
    pub deal: DealArgs,

    /// Metric to track: levered_irr, levered_npv, cash_on_cash, dscr, exit_sale_price
    #[arg(long, default_value = "levered_irr")]
    pub metric: OutputMetric,
}

pub fn run_sensitivity(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = input::load_deal(&args.deal)?;
    let mut output = run_sensitivity_grid(&SensitivityInput {
        base_inputs: loaded.inputs,
        metric: args.metric,
    })?;
    prepend_warnings(&mut output.warnings, loaded.warnings);
    Ok(serde_json::to_value(output)?)
}

pub fn run_tornado_chart(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = input::load_deal(&args.deal)?;
    let mut output = run_tornado(&TornadoInput {
        base_inputs: loaded.inputs,
        metric: args.metric,
    })?;
    prepend_warnings(&mut output.warnings, loaded.warnings);
    Ok(serde_json::to_value(output)?)
}

fn prepend_warnings(warnings: &mut Vec<String>, mut parse_warnings: Vec<String>) {
    parse_warnings.append(warnings);
    *warnings = parse_warnings;
}
