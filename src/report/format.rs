//! Formatted terminal output: run summary and table previews.
//!
//! We keep formatting code in one place so:
//! - the pipeline and model code stay free of presentation concerns
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{FeatureTable, PredictConfig, Prediction, RawTable, RowStamp};
use crate::io::export::EXPORT_TIMESTAMP_FMT;
use crate::report::prediction_stats;

/// Rows shown by the raw-data preview.
pub const RAW_PREVIEW_ROWS: usize = 5;

/// Widest a single cell may get in a preview table.
const MAX_CELL_WIDTH: usize = 20;

/// Format the run summary (input stats, feature layout, model, predictions).
pub fn format_run_summary(run: &RunOutput, config: &PredictConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== spnp - {} prediction ===\n", config.prediction_name));
    out.push_str(&format!("Input: {}\n", config.csv.describe()));
    out.push_str(&format!(
        "Rows: read={} | used={} | dropped={}\n",
        run.raw.rows_read,
        run.raw.rows_used(),
        run.raw.dropped_lines.len()
    ));
    out.push_str(&format!(
        "Features: n={} | {}\n",
        run.transform.features.n_cols(),
        run.transform.features.columns.join(", ")
    ));
    if !run.transform.scaling.degenerate.is_empty() {
        out.push_str(&format!(
            "Constant columns (centered, not scaled): {}\n",
            run.transform.scaling.degenerate.join(", ")
        ));
    }
    out.push_str(&format!("Model: {}\n", run.model_label));

    match prediction_stats(&run.predictions) {
        Some(stats) => {
            out.push_str(&format!(
                "Predictions: n={} | {}=[{:.2}, {:.2}] | mean={:.2}\n",
                stats.n, config.prediction_name, stats.min, stats.max, stats.mean
            ));
            out.push_str(&format!(
                "Period: {} .. {}\n",
                stats.first.format(EXPORT_TIMESTAMP_FMT),
                stats.last.format(EXPORT_TIMESTAMP_FMT)
            ));
        }
        None => out.push_str("Predictions: none (no complete rows in the upload)\n"),
    }

    out
}

/// First `limit` admitted rows of the upload, as text.
pub fn format_raw_preview(raw: &RawTable, limit: usize) -> String {
    let rows: Vec<Vec<String>> = raw.rows.iter().take(limit).map(|r| r.cells.clone()).collect();
    let mut out = format!("Uploaded data (first {} of {} rows):\n", rows.len(), raw.rows_used());
    out.push_str(&format_text_table(&raw.headers, &rows));
    out
}

/// A feature table with its timestamps, as text.
pub fn format_feature_table(title: &str, stamps: &[RowStamp], table: &FeatureTable) -> String {
    let mut headers = vec!["Date/Time".to_string()];
    headers.extend(table.columns.iter().cloned());

    let rows: Vec<Vec<String>> = stamps
        .iter()
        .enumerate()
        .take(table.n_rows())
        .map(|(i, stamp)| {
            let mut row = vec![stamp.timestamp.format(EXPORT_TIMESTAMP_FMT).to_string()];
            row.extend(table.values.row(i).iter().map(|v| format!("{v:.4}")));
            row
        })
        .collect();

    let mut out = format!("{title}:\n");
    out.push_str(&format_text_table(&headers, &rows));
    out
}

/// The prediction series, as text.
pub fn format_predictions(predictions: &[Prediction], value_name: &str) -> String {
    let headers = vec![
        "line".to_string(),
        "Date/Time".to_string(),
        value_name.to_string(),
    ];
    let rows: Vec<Vec<String>> = predictions
        .iter()
        .map(|p| {
            vec![
                p.line.to_string(),
                p.timestamp.format(EXPORT_TIMESTAMP_FMT).to_string(),
                format!("{:.4}", p.value),
            ]
        })
        .collect();

    let mut out = "Predictions:\n".to_string();
    out.push_str(&format_text_table(&headers, &rows));
    out
}

/// Left-aligned fixed-width table with a dashed rule under the header.
fn format_text_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(j, h)| {
            let cell_max = rows
                .iter()
                .filter_map(|r| r.get(j))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0);
            h.chars().count().max(cell_max).min(MAX_CELL_WIDTH)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, headers, &widths);

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);

    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let parts: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(j, &w)| {
            let cell = cells.get(j).map(String::as_str).unwrap_or("");
            format!("{:<w$}", truncate(cell, w))
        })
        .collect();
    out.push_str(parts.join(" ").trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::RawRow;

    #[test]
    fn text_table_snapshot() {
        let headers = vec!["a".to_string(), "long header".to_string()];
        let rows = vec![vec!["1".to_string(), "x".to_string()]];
        let txt = format_text_table(&headers, &rows);
        assert_eq!(txt, "a long header\n- -----------\n1 x\n");
    }

    #[test]
    fn raw_preview_is_limited() {
        let raw = RawTable {
            headers: vec!["Date/Time".to_string()],
            rows: (0..8)
                .map(|i| RawRow {
                    line: i + 2,
                    cells: vec![format!("row{i}")],
                })
                .collect(),
            rows_read: 8,
            dropped_lines: vec![],
        };
        let txt = format_raw_preview(&raw, RAW_PREVIEW_ROWS);
        assert!(txt.starts_with("Uploaded data (first 5 of 8 rows):\n"));
        assert!(txt.contains("row4"));
        assert!(!txt.contains("row5"));
    }

    #[test]
    fn predictions_table_lists_lines() {
        let ts = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let txt = format_predictions(
            &[Prediction {
                line: 7,
                timestamp: ts,
                value: 12.5,
            }],
            "DA SPNP",
        );
        assert!(txt.contains("7    2023-01-01 00:00:00 12.5000"));
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("abcdefgh", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
