//! Errors raised by the table operations

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MovieError {
    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Error rendering chart: {0}")]
    Chart(String),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

impl MovieError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MovieError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        MovieError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type MovieResult<T> = Result<T, MovieError>;
