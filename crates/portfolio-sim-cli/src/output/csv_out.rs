use serde_json::Value;
use std::io;

use super::{format_value, summaries, SUMMARY_COLUMNS};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Summaries become one row per requested time; a path dump becomes one row
/// per kept grid column with a value column per path.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let rows = summaries(value);
    if !rows.is_empty() {
        write_summaries(&mut wtr, &rows);
    } else if let Some(report) = value.get("result").filter(|r| r.get("paths").is_some()) {
        write_paths(&mut wtr, report);
    } else {
        let _ = wtr.write_record([value.to_string()]);
    }

    let _ = wtr.flush();
}

fn write_summaries(wtr: &mut StdoutWriter<'_>, rows: &[&Value]) {
    let _ = wtr.write_record(SUMMARY_COLUMNS);
    for summary in rows {
        let record: Vec<String> = SUMMARY_COLUMNS
            .iter()
            .map(|c| summary.get(*c).map(raw_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}

fn write_paths(wtr: &mut StdoutWriter<'_>, report: &Value) {
    let empty = Vec::new();
    let times = report
        .get("time_years")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let invested = report
        .get("invested_capital")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let paths = report
        .get("paths")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut header = vec!["time_years".to_string(), "invested_capital".to_string()];
    header.extend((0..paths.len()).map(|i| format!("path_{i}")));
    let _ = wtr.write_record(&header);

    for (k, t) in times.iter().enumerate() {
        let mut record = vec![
            raw_value(t),
            invested.get(k).map(raw_value).unwrap_or_default(),
        ];
        record.extend(
            paths
                .iter()
                .map(|p| p.get(k).map(raw_value).unwrap_or_default()),
        );
        let _ = wtr.write_record(&record);
    }
}

/// Full-precision numbers for machine consumption; everything else as displayed.
fn raw_value(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => format_value(other),
    }
}
