use polars::prelude::*;

use crate::errors::MovieResult;
use crate::models::{AggregateRow, Genre, GenreTable, YearCount, YEAR};
use crate::transform::{int_values, CastTarget};

const COUNT: &str = "count";

/// Unions the genre tables with their genre tag and counts movies per year
/// and genre. Rows come back by ascending year, the unreadable-year group first.
pub fn aggregate(tables: &[GenreTable]) -> MovieResult<Vec<AggregateRow>> {
    if tables.is_empty() {
        return Ok(Vec::new());
    }
    let tagged = tables
        .iter()
        .map(|table| -> MovieResult<LazyFrame> {
            let years = int_values(&table.frame, YEAR, CastTarget::Year)?;
            let frame = DataFrame::new(vec![years.with_name(YEAR).into_series()])?;
            Ok(frame
                .lazy()
                .with_column(lit(table.genre.tag()).alias("genre")))
        })
        .collect::<MovieResult<Vec<_>>>()?;

    let counts = Genre::ALL
        .iter()
        .map(|genre| {
            col("genre")
                .eq(lit(genre.tag()))
                .cast(DataType::UInt32)
                .sum()
                .cast(DataType::UInt32)
                .alias(&genre.count_column())
        })
        .collect::<Vec<_>>();

    let grouped = concat(tagged, UnionArgs::default())?
        .group_by([col(YEAR)])
        .agg(counts)
        .sort([YEAR], SortMultipleOptions::default())
        .collect()?;

    let years = grouped.column(YEAR)?.i32()?;
    let mut columns = Vec::with_capacity(Genre::ALL.len());
    for genre in Genre::ALL {
        columns.push(grouped.column(&genre.count_column())?.u32()?.clone());
    }
    let rows = years
        .into_iter()
        .enumerate()
        .map(|(i, year)| {
            let mut counts = [0u32; 5];
            for (count, column) in counts.iter_mut().zip(&columns) {
                *count = column.get(i).unwrap_or(0);
            }
            AggregateRow { year, counts }
        })
        .collect::<Vec<_>>();
    debug!("Aggregated {} genre tables into {} years", tables.len(), rows.len());
    Ok(rows)
}

/// Movies per year of one frame, ascending; rows without a year are dropped.
pub fn year_counts(frame: &DataFrame) -> MovieResult<Vec<YearCount>> {
    let years = int_values(frame, YEAR, CastTarget::Year)?;
    let grouped = DataFrame::new(vec![years.with_name(YEAR).into_series()])?
        .lazy()
        .filter(col(YEAR).is_not_null())
        .group_by([col(YEAR)])
        .agg([len().cast(DataType::UInt32).alias(COUNT)])
        .sort([YEAR], SortMultipleOptions::default())
        .collect()?;

    let counts = grouped
        .column(YEAR)?
        .i32()?
        .into_iter()
        .zip(grouped.column(COUNT)?.u32()?.into_iter())
        .filter_map(|(year, count)| Some(YearCount { year: year?, count: count? }))
        .collect();
    Ok(counts)
}
