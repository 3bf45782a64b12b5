use serde_json::Value;
use std::io;

use super::{payload, scalar_text};

/// Write output as CSV to stdout.
///
/// Arrays (normalised events, accrual steps, validation issues) become one
/// row per element; objects become `field,value` rows with nested keys
/// joined by dots (`catch_up.gp_allocation`).
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = match value.get("error") {
        Some(error) => error.get("issues").unwrap_or(error),
        None => payload(value),
    };

    match body {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(_) => {
            if let Some(Value::Array(steps)) = body.get("steps") {
                write_array_csv(&mut wtr, steps);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                let mut rows = Vec::new();
                flatten("", body, &mut rows);
                for (key, val) in rows {
                    let _ = wtr.write_record([key, val]);
                }
            }
        }
        other => {
            let _ = wtr.write_record([scalar_text(other)]);
        }
    }

    let _ = wtr.flush();
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, val, rows);
            }
        }
        other => rows.push((prefix.to_string(), scalar_text(other))),
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([scalar_text(item)]);
        }
    }
}
