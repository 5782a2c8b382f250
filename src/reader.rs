use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::errors::{MovieError, MovieResult};

/// Loads a CSV file, or a directory of `part-*.csv` files written by
/// [`write`](crate::writer::write), as a data frame of text columns.
///
/// Empty fields become missing values. Without a header the columns are
/// named `_c0`, `_c1`, ...
pub fn load(path: &Path, header: bool) -> MovieResult<DataFrame> {
    let metadata = fs::metadata(path).map_err(|e| MovieError::io(path, e))?;
    if !metadata.is_dir() {
        return load_csv_file(path, header);
    }
    let parts = part_files(path)?;
    let mut frames = parts.iter().map(|part| load_csv_file(part, header));
    let mut frame = frames
        .next()
        .ok_or_else(|| MovieError::parse(path, "no part files found"))??;
    for next in frames {
        let next = next?;
        if next.get_column_names() != frame.get_column_names() {
            return Err(MovieError::parse(path, "part files have different headers"));
        }
        frame.vstack_mut(&next)?;
    }
    Ok(frame)
}

pub(crate) fn part_files(dir: &Path) -> MovieResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| MovieError::io(dir, e))?;
    let mut parts = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MovieError::io(dir, e))?.path();
        let is_part = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("part-") && n.ends_with(".csv"))
            .unwrap_or(false);
        if is_part {
            parts.push(path);
        }
    }
    parts.sort();
    Ok(parts)
}

fn load_csv_file(path: &Path, header: bool) -> MovieResult<DataFrame> {
    let file = fs::File::open(path).map_err(|e| MovieError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(header)
        .flexible(false)
        .from_reader(file);

    let mut names: Vec<String> = if header {
        reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect()
    } else {
        Vec::new()
    };
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];

    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        if names.is_empty() {
            names = (0..record.len()).map(|i| format!("_c{i}")).collect();
            columns = vec![Vec::new(); names.len()];
        }
        for (column, value) in columns.iter_mut().zip(record.iter()) {
            column.push(if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            });
        }
    }
    debug!("Loaded {} rows from {}", columns.first().map_or(0, |c| c.len()), path.display());

    let series = names
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name, values))
        .collect::<Vec<_>>();
    DataFrame::new(series).map_err(|e| MovieError::parse(path, e))
}

fn csv_error(path: &Path, e: csv::Error) -> MovieError {
    if e.is_io_error() {
        if let csv::ErrorKind::Io(io) = e.into_kind() {
            return MovieError::io(path, io);
        }
        return MovieError::parse(path, "I/O failure while reading");
    }
    MovieError::parse(path, e)
}
