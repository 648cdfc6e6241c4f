use serde_json::Value;

use super::{format_value, summaries, time_label};

/// Print just the key answer: the mean portfolio value, one line per
/// requested time when there are several.
pub fn print_minimal(value: &Value) {
    let rows = summaries(value);
    match rows.as_slice() {
        [] => println!("{}", format_value(value.get("result").unwrap_or(value))),
        [single] => println!("{}", single.get("mean").map(format_value).unwrap_or_default()),
        many => {
            for summary in many {
                println!(
                    "{}: {}",
                    time_label(summary),
                    summary.get("mean").map(format_value).unwrap_or_default()
                );
            }
        }
    }
}
