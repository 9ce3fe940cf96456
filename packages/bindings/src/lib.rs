use napi::Result as NapiResult;
use napi_derive::napi;
use serde_json::Value;

use underwriting_core::scenarios::sensitivity::{run_sensitivity_grid, SensitivityInput};
use underwriting_core::scenarios::tornado::{run_tornado, TornadoInput};
use underwriting_core::scenarios::OutputMetric;
use underwriting_core::underwriting::inputs::ModelInputs;
use underwriting_core::underwriting::model::underwrite_deal;
use underwriting_core::underwriting::sanitize::inputs_from_json;
use underwriting_core::underwriting::snapshot::deal_form;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a deal form (bare inputs or snapshot) leniently, as the front end sends it.
fn parse_deal(input_json: &str) -> NapiResult<(ModelInputs, Vec<String>)> {
    let document: Value = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let mut warnings = Vec::new();
    let inputs = inputs_from_json(deal_form(&document), &mut warnings).map_err(to_napi_error)?;
    Ok((inputs, warnings))
}

fn metric_arg(metric: Option<String>) -> NapiResult<OutputMetric> {
    match metric {
        Some(m) => m.parse().map_err(to_napi_error),
        None => Ok(OutputMetric::default()),
    }
}

fn merge(parse_warnings: Vec<String>, warnings: &mut Vec<String>) {
    let mut merged = parse_warnings;
    merged.append(warnings);
    *warnings = merged;
}

// ---------------------------------------------------------------------------
// Underwriting
// ---------------------------------------------------------------------------

#[napi]
pub fn underwrite(input_json: String) -> NapiResult<String> {
    let (inputs, parse_warnings) = parse_deal(&input_json)?;
    let mut output = underwrite_deal(&inputs).map_err(to_napi_error)?;
    merge(parse_warnings, &mut output.warnings);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn sensitivity_grid(input_json: String, metric: Option<String>) -> NapiResult<String> {
    let (inputs, parse_warnings) = parse_deal(&input_json)?;
    let mut output = run_sensitivity_grid(&SensitivityInput {
        base_inputs: inputs,
        metric: metric_arg(metric)?,
    })
    .map_err(to_napi_error)?;
    merge(parse_warnings, &mut output.warnings);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn tornado(input_json: String, metric: Option<String>) -> NapiResult<String> {
    let (inputs, parse_warnings) = parse_deal(&input_json)?;
    let mut output = run_tornado(&TornadoInput {
        base_inputs: inputs,
        metric: metric_arg(metric)?,
    })
    .map_err(to_napi_error)?;
    merge(parse_warnings, &mut output.warnings);
    serde_json::to_string(&output).map_err(to_napi_error)
}
