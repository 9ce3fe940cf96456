use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, record_rows, scalar, sensitivity_grid};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(rows) = record_rows(value) {
        print_array_table(rows);
        if let Some(Value::Array(trailer)) = value.get("trailer") {
            print_array_table(trailer);
        }
        print_footer(value.as_object());
        return;
    }

    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result_table(result, map),
            None => print_flat_object(value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Some(grid) = sensitivity_grid(result) {
        if let Some(metric) = result.get("metric") {
            println!("Metric: {}", scalar(metric));
        }
        let mut builder = Builder::default();
        builder.push_record(grid.header);
        for row in grid.rows {
            builder.push_record(row);
        }
        println!("{}", Table::from(builder));
    } else if let Some(Value::Object(metrics)) = result.get("metrics") {
        // Underwriting result: metrics and recommendation, not the full series
        print_flat_object(&Value::Object(metrics.clone()));
        if let Some(Value::Array(assessments)) =
            result.get("recommendation").and_then(|r| r.get("assessments"))
        {
            print_array_table(assessments);
        }
        if let Some(headline) = result.get("recommendation").and_then(|r| r.get("headline")) {
            println!("\nRecommendation: {}", scalar(headline));
        }
    } else {
        print_flat_object(result);
    }

    print_footer(Some(envelope));
}

fn print_footer(envelope: Option<&Map<String, Value>>) {
    let Some(envelope) = envelope else {
        return;
    };

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    let mut pairs = Vec::new();
    flatten("", value, &mut pairs);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in pairs {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", scalar(item));
        }
    }
}
