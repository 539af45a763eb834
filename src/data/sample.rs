//! Synthetic upload generation.
//!
//! Produces an hourly table with the column layout the feature pipeline
//! expects, so the tool can be tried without real market data:
//!
//! - load columns formatted with thousands separators (`"12,345.6"`)
//! - a daily load cycle plus Gaussian noise
//! - hub prices that follow total load
//! - an occasional blank cell, which ingest is expected to drop

use std::f64::consts::PI;
use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::{AppError, OUTPUT_EXIT_CODE};
use crate::io::export::EXPORT_TIMESTAMP_FMT;

/// Column layout of generated uploads.
pub const SAMPLE_HEADERS: [&str; 10] = [
    "Date/Time",
    "NP15_LOAD",
    "SP15_LOAD",
    "PG&E",
    "Malin",
    "Hydro",
    "Wind",
    "Solar",
    "Imports",
    "DA SPNP",
];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub rows: usize,
    pub seed: u64,
    pub start: NaiveDateTime,
    /// Probability that any single non-timestamp cell is left blank.
    pub blank_prob: f64,
}

/// A generated table, as text cells.
#[derive(Debug, Clone)]
pub struct SampleTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleTable, AppError> {
    if config.rows == 0 {
        return Err(AppError::new(2, "Sample row count must be > 0."));
    }
    if !(0.0..1.0).contains(&config.blank_prob) {
        return Err(AppError::new(2, "Blank probability must be in [0, 1)."));
    }

    // The last timestamp must be representable before any row is built.
    hour_offset(config.start, config.rows - 1)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let mut rows = Vec::with_capacity(config.rows.min(1 << 16));
    for i in 0..config.rows {
        let ts = hour_offset(config.start, i)?;
        let hour = (i % 24) as f64;

        // Loads peak in the late afternoon.
        let cycle = (2.0 * PI * (hour - 17.0) / 24.0).cos();
        let np15 = 11_000.0 + 2_500.0 * cycle + 300.0 * normal.sample(&mut rng);
        let sp15 = 13_000.0 + 3_000.0 * cycle + 350.0 * normal.sample(&mut rng);

        let total = np15 + sp15;
        let pge = 20.0 + total / 1_000.0 + 2.0 * normal.sample(&mut rng);
        let malin = pge - 3.0 + 1.5 * normal.sample(&mut rng);

        let solar = (6_000.0 * (PI * (hour - 6.0) / 12.0).sin()).max(0.0) + 50.0 * normal.sample(&mut rng).abs();
        let wind = 2_000.0 + 600.0 * normal.sample(&mut rng);
        let hydro = 3_500.0 + 200.0 * normal.sample(&mut rng);
        let imports = 7_000.0 - 0.2 * solar + 400.0 * normal.sample(&mut rng);
        let target = 0.6 * pge + 0.4 * malin + (total - solar) / 2_000.0 + normal.sample(&mut rng);

        let mut row = vec![
            ts.format(EXPORT_TIMESTAMP_FMT).to_string(),
            format_thousands(np15),
            format_thousands(sp15),
            format!("{pge:.2}"),
            format!("{malin:.2}"),
            format!("{hydro:.1}"),
            format!("{wind:.1}"),
            format!("{solar:.1}"),
            format_thousands(imports),
            format!("{target:.2}"),
        ];

        for cell in row.iter_mut().skip(1) {
            if rng.gen_bool(config.blank_prob) {
                cell.clear();
            }
        }
        rows.push(row);
    }

    Ok(SampleTable {
        headers: SAMPLE_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows,
    })
}

pub fn write_sample<W: Write>(writer: W, sample: &SampleTable) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&sample.headers)
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to write sample header: {e}")))?;
    for row in &sample.rows {
        wtr.write_record(row)
            .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to write sample row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to flush sample CSV: {e}")))?;
    Ok(())
}

pub fn write_sample_csv(path: &Path, sample: &SampleTable) -> Result<(), AppError> {
    let file = std::fs::File::create(path)
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    write_sample(file, sample)
}

/// `start + hours`, or an error when chrono can't represent it.
fn hour_offset(start: NaiveDateTime, hours: usize) -> Result<NaiveDateTime, AppError> {
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("Sample period overflows: {start} + {hours} hours is out of range."),
            )
        })
}

/// `12345.67` -> `"12,345.7"`.
fn format_thousands(v: f64) -> String {
    let text = format!("{:.1}", v.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "0"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn config(rows: usize, blank_prob: f64) -> SampleConfig {
        SampleConfig {
            rows,
            seed: 7,
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            blank_prob,
        }
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(12345.67), "12,345.7");
        assert_eq!(format_thousands(999.0), "999.0");
        assert_eq!(format_thousands(1000.0), "1,000.0");
        assert_eq!(format_thousands(-1234567.0), "-1,234,567.0");
    }

    #[test]
    fn same_seed_same_table() {
        let a = generate_sample(&config(48, 0.02)).unwrap();
        let b = generate_sample(&config(48, 0.02)).unwrap();
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.rows.len(), 48);
        assert_eq!(a.rows[1][0], "2023-01-01 01:00:00");
    }

    #[test]
    fn no_blanks_when_probability_is_zero() {
        let sample = generate_sample(&config(24, 0.0)).unwrap();
        assert!(sample.rows.iter().flatten().all(|c| !c.is_empty()));
    }

    #[test]
    fn rejects_empty_request() {
        assert!(generate_sample(&config(0, 0.0)).is_err());
        assert!(generate_sample(&config(5, 1.0)).is_err());
    }

    #[test]
    fn out_of_range_period_is_an_error() {
        let mut far = config(48, 0.0);
        far.start = NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(generate_sample(&far).unwrap_err().exit_code(), 2);

        let huge = config(usize::MAX, 0.0);
        assert_eq!(generate_sample(&huge).unwrap_err().exit_code(), 2);
    }
}
