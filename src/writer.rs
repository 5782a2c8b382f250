use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Deserialize;

use crate::errors::{MovieError, MovieResult};
use crate::reader::part_files;

const SUCCESS_FILE: &str = "_SUCCESS";

/// What [`write`] does when the destination already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    #[default]
    ErrorIfExists,
    Overwrite,
    Append,
    Ignore,
}

/// Writes `frame` as CSV with a header row into the directory `dest`.
///
/// The directory holds `part-NNNNN.csv` files and a `_SUCCESS` marker.
/// Returns the path of the part file written, or `dest` itself when
/// [`SaveMode::Ignore`] skipped the write.
///
/// [`SaveMode::Overwrite`] removes the old output before writing, so a failed
/// write leaves `dest` without data and without a `_SUCCESS` marker.
/// [`SaveMode::Append`] numbers the new part one past the highest existing one.
pub fn write(frame: &DataFrame, dest: &Path, mode: SaveMode) -> MovieResult<PathBuf> {
    let exists = dest.exists();
    let part_index = match (mode, exists) {
        (SaveMode::ErrorIfExists, true) => {
            return Err(MovieError::io(
                dest,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path already exists"),
            ));
        }
        (SaveMode::Ignore, true) => {
            debug!("{} exists, skipping write", dest.display());
            return Ok(dest.to_path_buf());
        }
        (SaveMode::Overwrite, true) => {
            if dest.is_dir() {
                fs::remove_dir_all(dest).map_err(|e| MovieError::io(dest, e))?;
            } else {
                fs::remove_file(dest).map_err(|e| MovieError::io(dest, e))?;
            }
            0
        }
        (SaveMode::Append, true) => next_part_index(dest)?,
        (_, false) => 0,
    };
    fs::create_dir_all(dest).map_err(|e| MovieError::io(dest, e))?;

    let part = dest.join(format!("part-{part_index:05}.csv"));
    let mut file = fs::File::create(&part).map_err(|e| MovieError::io(&part, e))?;
    let mut frame = frame.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)?;
    fs::File::create(dest.join(SUCCESS_FILE)).map_err(|e| MovieError::io(dest, e))?;
    info!("Wrote {} rows to {}", frame.height(), part.display());
    Ok(part)
}

fn next_part_index(dest: &Path) -> MovieResult<usize> {
    let highest = part_files(dest)?
        .iter()
        .filter_map(|part| {
            part.file_name()?
                .to_str()?
                .strip_prefix("part-")?
                .strip_suffix(".csv")?
                .parse::<usize>()
                .ok()
        })
        .max();
    Ok(highest.map_or(0, |index| index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::load;

    fn scratch() -> PathBuf {
        std::env::temp_dir()
            .join(format!("project_movies_writer_{}", uuid::Uuid::new_v4()))
            .join("action")
    }

    fn movies(names: &[&str]) -> DataFrame {
        let years = vec!["1988"; names.len()];
        df!("movie_name" => names, "year" => years).unwrap()
    }

    #[test]
    fn overwrite_leaves_single_copy_of_latest_data() {
        let dest = scratch();
        write(&movies(&["Die Hard", "Speed"]), &dest, SaveMode::Overwrite).unwrap();
        write(&movies(&["Heat"]), &dest, SaveMode::Overwrite).unwrap();

        assert_eq!(part_files(&dest).unwrap().len(), 1);
        let df = load(&dest, true).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("movie_name").unwrap().str().unwrap().get(0), Some("Heat"));
    }

    #[test]
    fn default_mode_refuses_existing_destination() {
        let dest = scratch();
        write(&movies(&["Die Hard"]), &dest, SaveMode::default()).unwrap();
        let second = write(&movies(&["Heat"]), &dest, SaveMode::ErrorIfExists);
        assert!(matches!(second, Err(MovieError::Io { .. })));
    }

    #[test]
    fn append_adds_next_part() {
        let dest = scratch();
        write(&movies(&["Die Hard"]), &dest, SaveMode::Append).unwrap();
        let part = write(&movies(&["Heat"]), &dest, SaveMode::Append).unwrap();

        assert!(part.ends_with("part-00001.csv"));
        assert_eq!(load(&dest, true).unwrap().height(), 2);
    }

    #[test]
    fn append_after_gap_keeps_every_part() {
        let dest = scratch();
        for name in ["Die Hard", "Heat", "Speed"] {
            write(&movies(&[name]), &dest, SaveMode::Append).unwrap();
        }
        fs::remove_file(dest.join("part-00000.csv")).unwrap();
        let part = write(&movies(&["Ronin"]), &dest, SaveMode::Append).unwrap();

        assert!(part.ends_with("part-00003.csv"));
        let df = load(&dest, true).unwrap();
        let names: Vec<_> = df.column("movie_name").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(names, vec![Some("Heat"), Some("Speed"), Some("Ronin")]);
    }

    #[test]
    fn ignore_keeps_existing_content() {
        let dest = scratch();
        write(&movies(&["Die Hard"]), &dest, SaveMode::Overwrite).unwrap();
        write(&movies(&["Heat", "Speed"]), &dest, SaveMode::Ignore).unwrap();
        assert_eq!(load(&dest, true).unwrap().height(), 1);
    }

    #[test]
    fn round_trip_keeps_rows_and_missing_values() {
        let dest = scratch();
        let original = df!(
            "movie_name" => &[Some("Die Hard"), Some("Aliens, Director's Cut")],
            "rating" => &[Some("8"), None],
        )
        .unwrap();
        write(&original, &dest, SaveMode::Overwrite).unwrap();
        let reloaded = load(&dest, true).unwrap();
        assert!(reloaded.equals_missing(&original));
        assert!(dest.join(SUCCESS_FILE).exists());
    }
}
