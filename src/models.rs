use std::fmt;
use std::str::FromStr;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

pub const MOVIE_NAME: &str = "movie_name";
pub const GENRE: &str = "genre";
pub const RATING: &str = "rating";
pub const YEAR: &str = "year";

/// One of the five genre files of the movie container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Action,
    Adventure,
    Horror,
    Scifi,
    Thriller,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Horror,
        Genre::Scifi,
        Genre::Thriller,
    ];

    /// Tag used when the genre tables are unioned
    pub fn tag(&self) -> &'static str {
        match self {
            Genre::Action => "action",
            Genre::Adventure => "adventure",
            Genre::Horror => "horror",
            Genre::Scifi => "scifi",
            Genre::Thriller => "thriller",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.tag())
    }

    pub fn count_column(&self) -> String {
        format!("{}_count", self.tag())
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .iter()
            .find(|g| g.tag().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown genre '{s}'"))
    }
}

/// A loaded genre file
#[derive(Debug, Clone)]
pub struct GenreTable {
    pub genre: Genre,
    pub frame: DataFrame,
}

impl GenreTable {
    pub fn new(genre: Genre, frame: DataFrame) -> Self {
        Self { genre, frame }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub movie_name: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<i32>,
    pub year: Option<i32>,
}

/// Movie counts of every genre for one year. A `None` year groups the rows
/// whose year could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub year: Option<i32>,
    pub counts: [u32; 5],
}

impl AggregateRow {
    pub fn count(&self, genre: Genre) -> u32 {
        self.counts[genre.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearCount {
    pub year: i32,
    pub count: u32,
}
