pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value, true),
        OutputFormat::Compact => json::print_json(value, false),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The payload of a computation envelope (`result`) or an API response
/// (`data`); the value itself otherwise.
pub fn payload(value: &Value) -> &Value {
    value
        .get("result")
        .or_else(|| value.get("data"))
        .unwrap_or(value)
}

/// Tier keys of a waterfall result, in allocation order.
pub const TIER_KEYS: [&str; 4] = [
    "return_of_capital",
    "preferred_return",
    "catch_up",
    "final_split",
];

pub fn is_waterfall(value: &Value) -> bool {
    value.get(TIER_KEYS[0]).is_some()
}

pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
