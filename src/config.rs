use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::chart::ChartOptions;
use crate::models::Genre;
use crate::protocol::StorageConfig;
use crate::secrets::SecretRef;

/// Run configuration, read from a camelCase JSON file
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    /// Remote container to mount; the mount point is used as-is when absent
    pub storage: Option<StorageConfig>,
    pub secret: Option<SecretRef>,
    pub mount_point: PathBuf,
    pub raw_dir: String,
    pub transformed_dir: String,
    pub charts_dir: PathBuf,
    pub highlight_genre: Genre,
    pub highlight_filter: String,
    pub top_n: usize,
    pub latest_n: usize,
    pub genre_chart: ChartOptions,
    pub year_bar_chart: ChartOptions,
    pub year_scatter_chart: ChartOptions,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            storage: None,
            secret: None,
            mount_point: PathBuf::from("/mnt/project-movies-data"),
            raw_dir: "raw-data".to_string(),
            transformed_dir: "transformed-data".to_string(),
            charts_dir: PathBuf::from("charts"),
            highlight_genre: Genre::Action,
            highlight_filter: "Comedy".to_string(),
            top_n: 15,
            latest_n: 20,
            genre_chart: ChartOptions::genre_counts(),
            year_bar_chart: ChartOptions::default(),
            year_scatter_chart: ChartOptions::year_scatter(),
        }
    }
}

impl ReportConfig {
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Error reading config file {}: {e}", path.display()))?;
        Self::from_json(&text)
            .map_err(|e| anyhow::anyhow!("Invalid configuration in {}: {e}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.mount_point.join(&self.raw_dir)
    }

    pub fn transformed_path(&self) -> PathBuf {
        self.mount_point.join(&self.transformed_dir)
    }

    /// Blob names of the five raw genre files
    pub fn raw_blobs(&self) -> Vec<String> {
        Genre::ALL
            .iter()
            .map(|g| format!("{}/{}", self.raw_dir, g.file_name()))
            .collect()
    }
}
