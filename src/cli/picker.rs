//! Interactive upload picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `spnp predict` and choose an upload" UX
//!
//! The picker searches for `*.csv` files under the current working directory and
//! marks the ones whose header lacks a column the feature pipeline needs.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::domain::FeatureSchema;
use crate::error::AppError;

/// Default directory recursion depth for finding CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Prompt the user to select an upload from the current directory tree.
///
/// Behavior:
/// - list discovered `*.csv` files, flagging missing designated columns
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_csv_path(schema: &FeatureSchema) -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Provide one with `spnp predict --csv <file.csv>`.",
        ));
    }

    println!("Found {} CSV file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        let note = match missing_columns(path, schema) {
            Some(missing) if !missing.is_empty() => format!("  (missing: {})", missing.join(", ")),
            Some(_) => String::new(),
            None => "  (unreadable header)".to_string(),
        };
        println!("{:>3}) {}{note}", idx + 1, pretty_path(path));
    }

    loop {
        print!("Upload which file? Number (1-{}) or path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Provide an upload with `spnp predict --csv <file.csv>`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        let candidate = match input.parse::<usize>() {
            Ok(choice) if (1..=files.len()).contains(&choice) => files[choice - 1].clone(),
            Ok(choice) => {
                println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
                continue;
            }
            Err(_) => PathBuf::from(input),
        };

        match validate_csv_path(&candidate) {
            Ok(path) => return Ok(path),
            Err(err) => println!("{err}"),
        }
    }
}

/// Validate the provided path points to a `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!(
                "Expected a .csv file (got: {}). Use --csv to pass an upload path.",
                path.display()
            ),
        ));
    }

    Ok(path.to_path_buf())
}

/// Designated columns absent from a file's header row.
///
/// `None` when the header can't be read at all. Header names are compared the
/// way ingest normalizes them (BOM stripped, surrounding whitespace trimmed).
pub fn missing_columns(path: &Path, schema: &FeatureSchema) -> Option<Vec<String>> {
    let file = File::open(path).ok()?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first).ok()?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(first.as_bytes());
    let record = reader.records().next()?.ok()?;
    let headers: Vec<String> = record
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    Some(
        schema
            .required_columns()
            .iter()
            .filter(|name| !headers.iter().any(|h| h == *name))
            .map(|name| name.to_string())
            .collect(),
    )
}

/// Discover `*.csv` files under the current directory (deterministic order).
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn find_csv_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                find_csv_files_inner(&path, depth + 1, max_depth, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules" | "Saved Models")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("spnp-picker-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn rejects_missing_and_non_csv_paths() {
        let dir = scratch_dir("validate");
        let txt = dir.join("notes.txt");
        let csv = dir.join("upload.CSV");
        fs::write(&txt, "x").unwrap();
        fs::write(&csv, "Date/Time\n").unwrap();

        assert!(validate_csv_path(&dir.join("absent.csv")).is_err());
        assert!(validate_csv_path(&dir).is_err());
        assert!(validate_csv_path(&txt).is_err());
        assert_eq!(validate_csv_path(&csv).unwrap(), csv);

        assert_eq!(find_csv_files(&dir, 0), vec![csv]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn flags_missing_designated_columns() {
        let dir = scratch_dir("header");
        let partial = dir.join("partial.csv");
        let full = dir.join("full.csv");
        fs::write(&partial, "\u{feff}Date/Time, NP15_LOAD ,Hydro\n2023-01-01,1,2\n").unwrap();
        fs::write(&full, "Date/Time,NP15_LOAD,SP15_LOAD,PG&E,Malin\n").unwrap();

        let schema = FeatureSchema::default();
        assert_eq!(
            missing_columns(&partial, &schema).unwrap(),
            vec!["SP15_LOAD".to_string(), "PG&E".to_string(), "Malin".to_string()]
        );
        assert!(missing_columns(&full, &schema).unwrap().is_empty());
        assert!(missing_columns(&dir.join("absent.csv"), &schema).is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn skips_build_and_model_dirs() {
        assert!(should_skip_dir(Path::new("./target")));
        assert!(should_skip_dir(Path::new("./Saved Models")));
        assert!(!should_skip_dir(Path::new("./data")));
    }
}
