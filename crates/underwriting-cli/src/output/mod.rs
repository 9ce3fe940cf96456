pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Sensitivity matrix laid out for display: header row plus one labelled row per price.
pub(crate) struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Recognise a sensitivity result (`purchase_prices` x `exit_cap_rates` -> `matrix`).
pub(crate) fn sensitivity_grid(result: &Value) -> Option<Grid> {
    let prices = result.get("purchase_prices")?.as_array()?;
    let caps = result.get("exit_cap_rates")?.as_array()?;
    let matrix = result.get("matrix")?.as_array()?;

    let mut header = vec!["purchase_price \\ exit_cap_rate".to_string()];
    header.extend(caps.iter().map(scalar));

    let rows = prices
        .iter()
        .zip(matrix)
        .map(|(price, cells)| {
            let mut row = vec![scalar(price)];
            if let Some(cells) = cells.as_array() {
                row.extend(cells.iter().map(scalar));
            }
            row
        })
        .collect();

    Some(Grid { header, rows })
}

/// Row-shaped payload: a top-level `results` array or a tornado's `result.rows`.
pub(crate) fn record_rows(value: &Value) -> Option<&Vec<Value>> {
    value
        .get("results")
        .and_then(Value::as_array)
        .or_else(|| value.get("result")?.get("rows")?.as_array())
}

/// Render a leaf value. Nulls (undefined metrics) render empty.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Flatten nested objects into dotted `(path, value)` pairs; arrays stay whole.
pub(crate) fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, val, out);
            }
        }
        _ => out.push((prefix.to_string(), scalar(value))),
    }
}
