//! The mount → load → normalize → persist → report run

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;

use crate::aggregate::{aggregate, year_counts};
use crate::chart::{render_grouped_bar, render_scatter, render_year_counts, ChartKind};
use crate::client::Client;
use crate::config::ReportConfig;
use crate::errors::MovieResult;
use crate::models::{AggregateRow, Genre, GenreTable, GENRE, MOVIE_NAME, RATING, YEAR};
use crate::reader::load;
use crate::secrets::SecretStore;
use crate::transform::{cast, filter_contains, top_n, CastTarget, CastWarning};
use crate::writer::{write, SaveMode};

/// Loads `<raw>/<genre>.csv` for every genre.
pub fn load_genres(raw: &Path) -> MovieResult<Vec<GenreTable>> {
    Genre::ALL
        .iter()
        .map(|genre| -> MovieResult<GenreTable> {
            let frame = load(&raw.join(genre.file_name()), true)?;
            info!("Loaded {} rows of {}", frame.height(), genre);
            Ok(GenreTable::new(*genre, frame))
        })
        .collect()
}

/// Casts `rating` to an integer and `year` to a calendar year.
pub fn normalize(table: &GenreTable) -> MovieResult<(GenreTable, Vec<CastWarning>)> {
    let rating = cast(&table.frame, RATING, CastTarget::Integer)?;
    let year = cast(&rating.frame, YEAR, CastTarget::Year)?;
    let mut warnings = rating.warnings;
    warnings.extend(year.warnings);
    Ok((GenreTable::new(table.genre, year.frame), warnings))
}

/// Listings shown for one genre
#[derive(Debug, Clone)]
pub struct Highlights {
    pub top_rated: DataFrame,
    pub matching: DataFrame,
    pub latest: DataFrame,
}

pub fn highlights(table: &GenreTable, filter: &str, top: usize, latest: usize) -> MovieResult<Highlights> {
    let top_rated = top_n(&table.frame, RATING, top, Some(&[MOVIE_NAME, GENRE, RATING][..]))?;
    let matching = filter_contains(&table.frame, GENRE, filter)?.head(Some(top));
    let latest = top_n(&table.frame, YEAR, latest, None)?;
    info!("Highest rated {} movies:\n{}", table.genre, top_rated);
    info!("{} movies with genre containing '{}':\n{}", table.genre, filter, matching);
    info!("Most recent {} movies:\n{}", table.genre, latest);
    Ok(Highlights {
        top_rated,
        matching,
        latest,
    })
}

/// Writes every table to `<dir>/<genre>/`.
pub fn persist(tables: &[GenreTable], dir: &Path, mode: SaveMode) -> MovieResult<Vec<PathBuf>> {
    tables
        .iter()
        .map(|table| write(&table.frame, &dir.join(table.genre.tag()), mode))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Report {
    pub rows: Vec<AggregateRow>,
    pub charts: Vec<PathBuf>,
}

/// Aggregates the tables and renders the genre and single-genre charts.
pub fn report(tables: &[GenreTable], config: &ReportConfig) -> MovieResult<Report> {
    let rows = aggregate(tables)?;
    let dir = &config.charts_dir;
    let mut charts = Vec::new();

    let bar = dir.join("genre_counts_bar.svg");
    render_grouped_bar(&rows, &config.genre_chart, &bar)?;
    charts.push(bar);
    let scatter = dir.join("genre_counts_scatter.svg");
    render_scatter(&rows, &config.genre_chart, &scatter)?;
    charts.push(scatter);

    if let Some(table) = tables.iter().find(|t| t.genre == config.highlight_genre) {
        let counts = year_counts(&table.frame)?;
        let bar = dir.join(format!("{}_year_bar.svg", table.genre));
        render_year_counts(&counts, ChartKind::Bar, &config.year_bar_chart, &bar)?;
        charts.push(bar);
        let scatter = dir.join(format!("{}_year_scatter.svg", table.genre));
        render_year_counts(&counts, ChartKind::Scatter, &config.year_scatter_chart, &scatter)?;
        charts.push(scatter);
    }
    info!("Rendered {} charts into {}", charts.len(), dir.display());
    Ok(Report { rows, charts })
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub cast_warnings: usize,
    pub written: Vec<PathBuf>,
    pub uploaded: Vec<String>,
    pub report: Report,
}

/// Runs every stage. With a `storage` profile the raw files are mounted
/// from the container and the transformed output is pushed back to it.
pub async fn run(config: &ReportConfig, secrets: &dyn SecretStore, remount: bool) -> Result<RunSummary, anyhow::Error> {
    let client = match &config.storage {
        Some(storage) => {
            let secret = config
                .secret
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("A 'secret' is required to mount {}", storage.source()))?;
            let key = secrets.get(&secret.scope, &secret.key)?;
            let mut client = Client::new(storage.clone(), key)?;
            if remount && client.list_mount(&config.mount_point).is_ok() {
                client.unmount(&config.mount_point)?;
            }
            client.mount(&config.mount_point, &config.raw_blobs()).await?;
            Some(client)
        }
        None => {
            info!("No storage configured, using {} as is", config.mount_point.display());
            None
        }
    };

    let raw = load_genres(&config.raw_path())?;
    let rows_loaded = raw.iter().map(GenreTable::height).sum();

    let mut tables = Vec::with_capacity(raw.len());
    let mut cast_warnings = 0;
    for table in &raw {
        let (normalized, warnings) = normalize(table)?;
        cast_warnings += warnings.len();
        tables.push(normalized);
    }
    if let Some(table) = tables.iter().find(|t| t.genre == config.highlight_genre) {
        highlights(table, &config.highlight_filter, config.top_n, config.latest_n)?;
    }

    let written = persist(&tables, &config.transformed_path(), SaveMode::Overwrite)?;
    let uploaded = match client.as_ref() {
        Some(client) => client.upload_dir(&config.mount_point, &config.transformed_dir).await?,
        None => Vec::new(),
    };

    let report = report(&tables, config)?;
    Ok(RunSummary {
        rows_loaded,
        cast_warnings,
        written,
        uploaded,
        report,
    })
}
