pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Scalar columns of a distribution summary, in display order.
pub const SUMMARY_COLUMNS: [&str; 6] = [
    "time_years",
    "mean",
    "percentile_5",
    "percentile_95",
    "invested_capital",
    "sample_size",
];

/// The summaries held by an envelope: the single `result`, or every entry of
/// `results` when several times were requested.
pub fn summaries(value: &Value) -> Vec<&Value> {
    if let Some(Value::Array(results)) = value.get("results") {
        results.iter().collect()
    } else if let Some(result) = value.get("result").filter(|r| r.get("mean").is_some()) {
        vec![result]
    } else {
        Vec::new()
    }
}

/// `"9y 11m"` from a summary's `label` object.
pub fn time_label(summary: &Value) -> String {
    let part = |key: &str| {
        summary
            .pointer(&format!("/label/{key}"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };
    format!("{}y {}m", part("years"), part("months"))
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
