use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{is_waterfall, payload, scalar_text, TIER_KEYS};

const TIER_LABELS: [&str; 4] = [
    "Return of Capital",
    "Preferred Return",
    "GP Catch-Up",
    "Final Split",
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(error) = value.get("error") {
        print_error(error);
        return;
    }

    let result = payload(value);
    if is_waterfall(result) {
        print_waterfall(result);
    } else if let Some(Value::Array(steps)) = result.get("steps") {
        if let Value::Object(map) = result {
            print_fields(map, &["steps"]);
        }
        println!();
        print_array_table(steps);
    } else {
        match result {
            Value::Object(map) => print_fields(map, &[]),
            Value::Array(arr) => print_array_table(arr),
            other => println!("{}", other),
        }
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_waterfall(result: &Value) {
    let field = |key: &str| result.get(key).map(scalar_text).unwrap_or_default();

    let mut header = Builder::default();
    header.push_record(["Field", "Value"]);
    for key in [
        "commitment_id",
        "analysis_date",
        "total_commitment",
        "total_distributions",
    ] {
        header.push_record([key.to_string(), field(key)]);
    }
    println!("{}", Table::from(header));

    let mut tiers = Builder::default();
    tiers.push_record(["Tier", "LP", "GP"]);
    for (key, label) in TIER_KEYS.iter().zip(TIER_LABELS) {
        let tier = result.get(*key);
        let share = |side: &str| {
            tier.and_then(|t| t.get(side))
                .map(scalar_text)
                .unwrap_or_default()
        };
        tiers.push_record([label.to_string(), share("lp_allocation"), share("gp_allocation")]);
    }
    tiers.push_record([
        "Total Profit".to_string(),
        field("total_lp_profit"),
        field("total_gp_profit"),
    ]);
    println!("{}", Table::from(tiers));
    println!("GP share of profit: {}", field("profit_split_percentage"));
}

fn print_fields(map: &Map<String, Value>, skip: &[&str]) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if skip.contains(&key.as_str()) {
            continue;
        }
        builder.push_record([key.as_str(), &scalar_text(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_error(error: &Value) {
    let field = |key: &str| error.get(key).map(scalar_text).unwrap_or_default();
    println!("{}: {}", field("kind"), field("message"));
    if let Some(Value::Array(issues)) = error.get("issues") {
        print_array_table(issues);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", scalar_text(item));
        }
    }
}
