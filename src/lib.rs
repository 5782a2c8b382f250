//! Movie genre reporting: mount a blob container, normalize the genre CSVs,
//! write them back and chart movie counts by year.
//!
//! The storage side follows a download-to-local-root model: a [`Client`]
//! copies the raw blobs under a mount point, every table operation then runs
//! in-process on [`polars`] data frames.

#[macro_use]
extern crate log;

pub mod aggregate;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod chart;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod protocol;
pub mod reader;
pub mod secrets;
pub mod transform;
pub mod utils;
pub mod writer;

pub use client::Client;
pub use errors::{MovieError, MovieResult};
pub use models::{AggregateRow, Genre, GenreTable, MovieRecord, YearCount};

pub mod prelude {
    pub use crate::aggregate::{aggregate, year_counts};
    pub use crate::chart::{render_grouped_bar, render_scatter, render_year_counts, ChartKind, ChartOptions};
    pub use crate::config::ReportConfig;
    pub use crate::errors::{MovieError, MovieResult};
    pub use crate::models::*;
    pub use crate::reader::load;
    pub use crate::transform::{cast, filter_contains, sort_by, top_n, Cast, CastTarget, CastWarning};
    pub use crate::writer::{write, SaveMode};
}
