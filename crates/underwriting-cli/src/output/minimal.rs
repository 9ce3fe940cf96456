use serde_json::Value;

/// Print just the key answer from the output.
///
/// Looks for well-known result fields in priority order, then falls back to the first
/// field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Paths into the result, most useful first
    let priority_paths: [&[&str]; 6] = [
        &["recommendation", "headline"],
        &["metrics", "levered_irr"],
        &["base_case_value"],
        &["base_value"],
        &["monthly_payment"],
        &["metrics", "unlevered_irr"],
    ];

    for path in priority_paths {
        if let Some(val) = lookup(result_obj, path) {
            if !val.is_null() {
                println!("{}", format_minimal(val));
                return;
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_path() {
        let v = json!({ "recommendation": { "headline": "Likely worth pursuing" } });
        assert_eq!(
            lookup(&v, &["recommendation", "headline"]),
            Some(&json!("Likely worth pursuing"))
        );
        assert!(lookup(&v, &["metrics", "dscr"]).is_none());
    }
}
