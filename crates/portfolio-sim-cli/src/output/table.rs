use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{format_value, summaries, time_label, SUMMARY_COLUMNS};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    let rows = summaries(value);
    if !rows.is_empty() {
        print_summary_table(&rows);
    } else if let Some(paths) = value.get("result").filter(|r| r.get("paths").is_some()) {
        print_paths_table(paths);
    } else {
        println!("{}", value);
    }

    print_warnings(value);

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// One row per requested time.
fn print_summary_table(rows: &[&Value]) {
    let mut builder = Builder::default();
    let mut header = vec!["time".to_string()];
    header.extend(SUMMARY_COLUMNS.iter().map(|c| c.to_string()));
    header.push("density".to_string());
    builder.push_record(header);

    for summary in rows {
        let mut record = vec![time_label(summary)];
        record.extend(SUMMARY_COLUMNS.iter().map(|c| {
            summary
                .get(*c)
                .map(format_value)
                .unwrap_or_default()
        }));
        record.push(
            summary
                .pointer("/density/method/type")
                .map(format_value)
                .unwrap_or_default(),
        );
        builder.push_record(record);
    }

    println!("{}", Table::from(builder));
}

/// Cross-sectional mean and range of the paths at every kept column.
fn print_paths_table(report: &Value) {
    let times = report.get("time_years").and_then(Value::as_array);
    let invested = report.get("invested_capital").and_then(Value::as_array);
    let paths = report.get("paths").and_then(Value::as_array);
    let (Some(times), Some(invested), Some(paths)) = (times, invested, paths) else {
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["time_years", "invested_capital", "min", "mean", "max"]);
    for (k, t) in times.iter().enumerate() {
        let column: Vec<f64> = paths
            .iter()
            .filter_map(|p| p.get(k).and_then(Value::as_f64))
            .collect();
        let (lo, hi) = column
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let mean = column.iter().sum::<f64>() / column.len().max(1) as f64;
        builder.push_record([
            format_value(t),
            invested.get(k).map(format_value).unwrap_or_default(),
            format!("{:.2}", lo),
            format!("{:.2}", mean),
            format!("{:.2}", hi),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_warnings(value: &Value) {
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
}
