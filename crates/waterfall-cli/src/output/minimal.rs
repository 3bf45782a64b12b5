use serde_json::Value;

use super::{payload, scalar_text};

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls
/// back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    if let Some(error) = value.get("error") {
        let kind = error.get("kind").map(scalar_text).unwrap_or_default();
        let message = error.get("message").map(scalar_text).unwrap_or_default();
        println!("{}: {}", kind, message);
        return;
    }

    let result_obj = payload(value);

    let priority_keys = [
        "profit_split_percentage",
        "accrued_preferred",
        "total_gp_profit",
    ];

    match result_obj {
        Value::Object(map) => {
            for key in &priority_keys {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", scalar_text(val));
                        return;
                    }
                }
            }

            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, scalar_text(val));
            }
        }
        // Normalised event list: report how many events survived
        Value::Array(events) => println!("{}", events.len()),
        other => println!("{}", scalar_text(other)),
    }
}
