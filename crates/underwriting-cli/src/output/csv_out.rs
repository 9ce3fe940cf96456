use serde_json::Value;
use std::io;

use super::{flatten, record_rows, scalar, sensitivity_grid};

/// Write output as CSV to stdout.
///
/// Annual exports write one row per year followed by `label,value` trailer rows, so the
/// writer is flexible about record length.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    if let Some(rows) = record_rows(value) {
        write_array_csv(&mut wtr, rows);
        if let Some(Value::Array(trailer)) = value.get("trailer") {
            for item in trailer {
                let label = item.get("label").map(scalar).unwrap_or_default();
                let val = item.get("value").map(scalar).unwrap_or_default();
                let _ = wtr.write_record([label, val]);
            }
        }
    } else if let Some(grid) = value.get("result").and_then(sensitivity_grid) {
        let _ = wtr.write_record(&grid.header);
        for row in &grid.rows {
            let _ = wtr.write_record(row);
        }
    } else if let Some(result) = value.get("result") {
        let _ = wtr.write_record(["field", "value"]);
        let mut pairs = Vec::new();
        flatten("", result, &mut pairs);
        for (key, val) in pairs {
            let _ = wtr.write_record([key, val]);
        }
    } else {
        let _ = wtr.write_record(["field", "value"]);
        let mut pairs = Vec::new();
        flatten("", value, &mut pairs);
        for (key, val) in pairs {
            let _ = wtr.write_record([key, val]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([scalar(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
