use std::path::PathBuf;

use clap::Parser;
use project_movies::config::ReportConfig;
use project_movies::pipeline;
use project_movies::secrets::EnvSecretStore;

/// Mounts the movie container, normalizes the genre files and charts them
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON run configuration; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `mountPoint` of the configuration
    #[arg(short, long)]
    mount_point: Option<PathBuf>,

    /// Overrides `chartsDir` of the configuration
    #[arg(long)]
    charts_dir: Option<PathBuf>,

    /// Unmounts an existing mount before mounting again
    #[arg(long)]
    remount: bool,

    /// Log filter, e.g. `info` or `project_movies=debug`; defaults to RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = &cli.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(mount_point) = cli.mount_point {
        config.mount_point = mount_point;
    }
    if let Some(charts_dir) = cli.charts_dir {
        config.charts_dir = charts_dir;
    }

    let summary = pipeline::run(&config, &EnvSecretStore, cli.remount).await?;
    log::info!(
        "Loaded {} rows ({} cast warnings), wrote {} tables, uploaded {} files, {} years charted",
        summary.rows_loaded,
        summary.cast_warnings,
        summary.written.len(),
        summary.uploaded.len(),
        summary.report.rows.len()
    );
    for chart in &summary.report.charts {
        println!("{}", chart.display());
    }
    Ok(())
}
