//! Column casts, row filters and orderings over genre frames

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::errors::{MovieError, MovieResult};
use crate::models::{MovieRecord, GENRE, MOVIE_NAME, RATING, YEAR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastTarget {
    /// Whole number; decimals are truncated toward zero
    Integer,
    /// Calendar year of a `yyyy[-mm[-dd]]` date
    Year,
}

impl CastTarget {
    fn parse(&self, value: &str) -> Option<i32> {
        match self {
            CastTarget::Integer => parse_integer(value),
            CastTarget::Year => parse_year(value),
        }
    }
}

/// A value that could not be converted and became missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastWarning {
    pub column: String,
    pub row: usize,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Cast {
    pub frame: DataFrame,
    pub warnings: Vec<CastWarning>,
}

/// Returns a copy of `frame` with `column` converted to `Int32`.
///
/// Values that do not convert become missing and are reported in
/// [`Cast::warnings`]; only a missing column is an error.
pub fn cast(frame: &DataFrame, column: &str, target: CastTarget) -> MovieResult<Cast> {
    let series = find_column(frame, column)?;
    if series.dtype() == &DataType::Int32 {
        return Ok(Cast {
            frame: frame.clone(),
            warnings: Vec::new(),
        });
    }
    let text = series.cast(&DataType::String)?;
    let mut warnings = Vec::new();
    let converted: Int32Chunked = text
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value?;
            let parsed = target.parse(value);
            if parsed.is_none() {
                warnings.push(CastWarning {
                    column: column.to_string(),
                    row,
                    value: value.to_string(),
                });
            }
            parsed
        })
        .collect();

    if let Some(first) = warnings.first() {
        warn!(
            "{} value(s) of '{}' could not be cast to {:?} and were set to null (first: row {} '{}')",
            warnings.len(),
            column,
            target,
            first.row,
            first.value
        );
    }
    let mut frame = frame.clone();
    frame.with_column(converted.with_name(column).into_series())?;
    Ok(Cast { frame, warnings })
}

/// Rows whose `column` contains `needle`, in their original order.
/// Missing values never match.
pub fn filter_contains(frame: &DataFrame, column: &str, needle: &str) -> MovieResult<DataFrame> {
    let text = find_column(frame, column)?.cast(&DataType::String)?;
    let mask: BooleanChunked = text
        .str()?
        .into_iter()
        .map(|value| value.map_or(false, |v| v.contains(needle)))
        .collect();
    Ok(frame.filter(&mask)?)
}

/// Stable sort on `column`; missing values go last in both directions.
pub fn sort_by(frame: &DataFrame, column: &str, descending: bool) -> MovieResult<DataFrame> {
    find_column(frame, column)?;
    let options = SortMultipleOptions::default()
        .with_order_descending(descending)
        .with_nulls_last(true)
        .with_maintain_order(true);
    Ok(frame.sort([column], options)?)
}

/// The first `n` rows by descending `column`, optionally projected.
pub fn top_n(
    frame: &DataFrame,
    column: &str,
    n: usize,
    columns: Option<&[&str]>,
) -> MovieResult<DataFrame> {
    let sorted = sort_by(frame, column, true)?;
    let projected = match columns {
        Some(columns) => sorted.select(columns.iter().copied())?,
        None => sorted,
    };
    Ok(projected.head(Some(n)))
}

/// Typed records of a genre frame. Text ratings and years are cast on the fly.
pub fn records(frame: &DataFrame) -> MovieResult<Vec<MovieRecord>> {
    let names = find_column(frame, MOVIE_NAME)?.cast(&DataType::String)?;
    let genres = find_column(frame, GENRE)?.cast(&DataType::String)?;
    let ratings = int_values(frame, RATING, CastTarget::Integer)?;
    let years = int_values(frame, YEAR, CastTarget::Year)?;

    let records = names
        .str()?
        .into_iter()
        .zip(genres.str()?.into_iter())
        .zip(ratings.into_iter().zip(years.into_iter()))
        .map(|((movie_name, genre), (rating, year))| MovieRecord {
            movie_name: movie_name.map(str::to_string),
            genre: genre.map(str::to_string),
            rating,
            year,
        })
        .collect();
    Ok(records)
}

pub(crate) fn int_values(frame: &DataFrame, column: &str, target: CastTarget) -> MovieResult<Int32Chunked> {
    let cast = cast(frame, column, target)?;
    let values = cast.frame.column(column)?.i32()?.clone();
    Ok(values)
}

fn find_column<'a>(frame: &'a DataFrame, column: &str) -> MovieResult<&'a Series> {
    frame
        .column(column)
        .map_err(|_| MovieError::ColumnNotFound(column.to_string()))
}

/// Whole numbers, or decimals truncated toward zero. Exponent forms are rejected.
fn parse_integer(value: &str) -> Option<i32> {
    let value = value.trim();
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let digits = whole.strip_prefix(['+', '-']).unwrap_or(whole);
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    whole.parse::<i32>().ok()
}

fn parse_year(value: &str) -> Option<i32> {
    let date = value.trim().split(['T', ' ']).next()?;
    let mut parts = date.split('-');
    let year = parts.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month = parts.next().map_or(Some(1), |m| m.parse::<u32>().ok())?;
    let day = parts.next().map_or(Some(1), |d| d.parse::<u32>().ok())?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day).map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn action() -> DataFrame {
        df!(
            "movie_name" => &["Die Hard", "Beverly Hills Cop", "Speed"],
            "genre" => &["Action", "Action/Comedy", "Action, Thriller"],
            "rating" => &["8", "6", "9"],
            "year" => &["1988", "1984", "1994"],
        )
        .unwrap()
    }

    #[test_case("8" => Some(8))]
    #[test_case(" 7 " => Some(7))]
    #[test_case("7.9" => Some(7))]
    #[test_case("-2.5" => Some(-2))]
    #[test_case("N/A" => None)]
    #[test_case("NaN" => None)]
    #[test_case("1e3" => None)]
    #[test_case("8e-1" => None)]
    #[test_case("+3." => Some(3))]
    #[test_case("99999999999" => None)]
    fn integer_cast(value: &str) -> Option<i32> {
        parse_integer(value)
    }

    #[test_case("1988" => Some(1988))]
    #[test_case("2001-07" => Some(2001))]
    #[test_case("2001-07-04" => Some(2001))]
    #[test_case("2001-07-04T10:00:00" => Some(2001))]
    #[test_case("2001-02-30" => None)]
    #[test_case("I 2001" => None)]
    #[test_case("88" => None)]
    fn year_cast(value: &str) -> Option<i32> {
        parse_year(value)
    }

    #[test]
    fn cast_turns_bad_values_into_missing() {
        let df = df!("rating" => &[Some("8"), Some("N/A"), None]).unwrap();
        let cast = cast(&df, RATING, CastTarget::Integer).unwrap();

        let ratings = cast.frame.column(RATING).unwrap().i32().unwrap();
        assert_eq!(ratings.into_iter().collect::<Vec<_>>(), vec![Some(8), None, None]);
        assert_eq!(
            cast.warnings,
            vec![CastWarning {
                column: RATING.to_string(),
                row: 1,
                value: "N/A".to_string(),
            }]
        );
    }

    #[test]
    fn cast_missing_column_is_error() {
        assert!(matches!(
            cast(&action(), "runtime", CastTarget::Integer),
            Err(MovieError::ColumnNotFound(c)) if c == "runtime"
        ));
    }

    #[test]
    fn cast_keeps_integer_column() {
        let once = cast(&action(), RATING, CastTarget::Integer).unwrap().frame;
        let twice = cast(&once, RATING, CastTarget::Integer).unwrap();
        assert!(twice.warnings.is_empty());
        assert!(twice.frame.equals_missing(&once));
    }

    #[test]
    fn filter_contains_keeps_matching_rows() {
        let df = df!(
            "movie_name" => &["Die Hard", "Beverly Hills Cop"],
            "genre" => &["Action", "Action/Comedy"],
            "rating" => &[8, 7],
            "year" => &["1988", "1984"],
        )
        .unwrap();
        let comedies = filter_contains(&df, GENRE, "Comedy").unwrap();

        assert_eq!(comedies.height(), 1);
        assert_eq!(
            comedies.column(MOVIE_NAME).unwrap().str().unwrap().get(0),
            Some("Beverly Hills Cop")
        );
    }

    #[test]
    fn filter_contains_is_case_sensitive_and_ordered() {
        let df = df!("genre" => &[Some("Comedy"), None, Some("comedy"), Some("Drama/Comedy")]).unwrap();
        let matched = filter_contains(&df, GENRE, "Comedy").unwrap();
        let genres = matched.column(GENRE).unwrap().str().unwrap();
        assert_eq!(
            genres.into_iter().collect::<Vec<_>>(),
            vec![Some("Comedy"), Some("Drama/Comedy")]
        );
    }

    #[test]
    fn sort_descending_by_rating() {
        let df = cast(&action(), RATING, CastTarget::Integer).unwrap().frame;
        let sorted = sort_by(&df, RATING, true).unwrap();
        let ratings = sorted.column(RATING).unwrap().i32().unwrap();
        assert_eq!(ratings.into_iter().collect::<Vec<_>>(), vec![Some(9), Some(8), Some(6)]);
    }

    #[test]
    fn sort_keeps_ties_in_original_order() {
        let df = df!(
            "movie_name" => &["a", "b", "c", "d", "e"],
            "rating" => &[Some(7), Some(9), None, Some(7), Some(9)],
        )
        .unwrap();
        let sorted = sort_by(&df, RATING, true).unwrap();
        let names = sorted.column(MOVIE_NAME).unwrap().str().unwrap();
        assert_eq!(
            names.into_iter().flatten().collect::<Vec<_>>(),
            vec!["b", "e", "a", "d", "c"]
        );
    }

    #[test]
    fn top_n_limits_and_projects() {
        let df = cast(&action(), RATING, CastTarget::Integer).unwrap().frame;
        let top = top_n(&df, RATING, 2, Some(&[MOVIE_NAME, GENRE, RATING][..])).unwrap();
        assert_eq!(top.get_column_names(), &[MOVIE_NAME, GENRE, RATING]);
        let names = top.column(MOVIE_NAME).unwrap().str().unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec![Some("Speed"), Some("Die Hard")]);
    }

    #[test]
    fn records_are_typed() {
        let records = records(&action()).unwrap();
        assert_eq!(
            records[0],
            MovieRecord {
                movie_name: Some("Die Hard".to_string()),
                genre: Some("Action".to_string()),
                rating: Some(8),
                year: Some(1988),
            }
        );
        assert_eq!(records.len(), 3);
    }
}
