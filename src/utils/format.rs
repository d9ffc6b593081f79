// src/utils/format.rs

use crate::models::result_set::{ResultSet, Scalar};

/// Comma-joined matches, or "nothing".
pub fn join_matches(matches: &[String]) -> String {
    if matches.is_empty() {
        "nothing".to_string()
    } else {
        matches.join(", ")
    }
}

/// Renders rows as a pipe-separated text table for live feedback.
pub fn format_results(result: &ResultSet) -> String {
    if result.is_empty() {
        return "No results returned".to_string();
    }

    let columns = result.columns();

    let mut output = columns.join(" | ");
    output.push('\n');
    output.push_str(&vec!["---"; columns.len()].join(" | "));
    output.push('\n');

    for row in result.rows() {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| row.get(col).unwrap_or(&Scalar::Null).to_string())
            .collect();
        output.push_str(&cells.join(" | "));
        output.push('\n');
    }

    output
}
