//! Cell-level parsing and cleanup.
//!
//! Two numeric policies coexist on purpose:
//!
//! - `parse_strict` / `parse_load` fail on anything that is not a finite number
//!   (used for the designated load and price columns)
//! - `coerce_numeric` turns unparseable text into `None` (used for every other
//!   feature column); the pipeline rejects such cells before scaling

use chrono::{NaiveDate, NaiveDateTime};

/// Timestamp layouts accepted for the timestamp column, tried in order.
const DATETIME_FMTS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%b-%Y %H:%M",
];

/// Date-only layouts (interpreted as midnight).
const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a timestamp cell.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FMTS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse a finite number, no cleanup beyond trimming.
pub fn parse_strict(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Parse a load figure that may carry thousands separators (`"12,345.6"`).
pub fn parse_load(s: &str) -> Option<f64> {
    parse_strict(&strip_thousands(s))
}

/// Lenient conversion for generic feature columns: strip separators and
/// whitespace, then parse; anything else becomes `None`.
pub fn coerce_numeric(s: &str) -> Option<f64> {
    let cleaned = strip_thousands(s);
    parse_strict(cleaned.trim())
}

fn strip_thousands(s: &str) -> String {
    s.replace(',', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        for s in [
            "2023-01-01 13:00",
            "2023-01-01 13:00:00",
            "2023-01-01T13:00:00",
            "01/01/2023 13:00",
            "1/1/2023 1:00:00 PM",
            "2023/01/01 13:00",
        ] {
            assert_eq!(parse_timestamp(s), Some(expected), "layout {s}");
        }
    }

    #[test]
    fn date_only_is_midnight() {
        let ts = parse_timestamp("2023-03-05").unwrap();
        assert_eq!(ts.to_string(), "2023-03-05 00:00:00");
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2023-13-01 00:00").is_none());
    }

    #[test]
    fn load_strips_thousands_separators() {
        assert_eq!(parse_load("1,000"), Some(1000.0));
        assert_eq!(parse_load("12,345.5"), Some(12345.5));
        assert_eq!(parse_load("abc"), None);
        assert_eq!(parse_load("inf"), None);
    }

    #[test]
    fn strict_parse_does_not_strip_separators() {
        assert_eq!(parse_strict(" 25.0 "), Some(25.0));
        assert_eq!(parse_strict("1,000"), None);
    }

    #[test]
    fn coercion_turns_text_into_none() {
        assert_eq!(coerce_numeric(" 2,500 "), Some(2500.0));
        assert_eq!(coerce_numeric("OUTAGE"), None);
        assert_eq!(coerce_numeric("NaN"), None);
    }
}
