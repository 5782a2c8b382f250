use std::fs;
use std::path::{Path, PathBuf};

use project_movies::config::ReportConfig;
use project_movies::pipeline;
use project_movies::prelude::*;
use project_movies::protocol::StorageConfig;
use project_movies::secrets::{SecretRef, StaticSecretStore};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn raw_csv(genre: Genre) -> String {
    let label = match genre {
        Genre::Action => "Action",
        Genre::Adventure => "Adventure",
        Genre::Horror => "Horror",
        Genre::Scifi => "Sci-Fi",
        Genre::Thriller => "Thriller",
    };
    format!(
        "movie_name,genre,rating,year,certificate\n\
         {label} One,{label},8,2001,PG\n\
         {label} Two,\"{label}, Comedy\",N/A,1999,\n\
         {label} Three,{label},6.5,2001,R\n"
    )
}

fn scratch() -> PathBuf {
    std::env::temp_dir().join(format!("project_movies_pipeline_{}", uuid::Uuid::new_v4()))
}

fn seed_raw(mount_point: &Path) {
    let raw = mount_point.join("raw-data");
    fs::create_dir_all(&raw).unwrap();
    for genre in Genre::ALL {
        fs::write(raw.join(genre.file_name()), raw_csv(genre)).unwrap();
    }
}

fn local_config(mount_point: &Path) -> ReportConfig {
    ReportConfig {
        mount_point: mount_point.to_path_buf(),
        charts_dir: mount_point.join("charts"),
        ..Default::default()
    }
}

#[tokio::test]
async fn local_run_writes_tables_and_charts() {
    let mount_point = scratch();
    seed_raw(&mount_point);
    let config = local_config(&mount_point);

    let summary = pipeline::run(&config, &StaticSecretStore::default(), false)
        .await
        .unwrap();

    assert_eq!(summary.rows_loaded, 15);
    assert_eq!(summary.cast_warnings, 5);
    assert_eq!(summary.written.len(), 5);
    assert!(summary.uploaded.is_empty());
    assert_eq!(
        summary.report.rows,
        vec![
            AggregateRow { year: Some(1999), counts: [1, 1, 1, 1, 1] },
            AggregateRow { year: Some(2001), counts: [2, 2, 2, 2, 2] },
        ]
    );
    assert_eq!(summary.report.charts.len(), 4);
    for chart in &summary.report.charts {
        assert!(chart.exists(), "{} missing", chart.display());
    }
    assert!(mount_point.join("charts").join("action_year_bar.svg").exists());

    let action = load(&mount_point.join("transformed-data").join("action"), true).unwrap();
    let ratings = action.column("rating").unwrap().str().unwrap();
    assert_eq!(
        ratings.into_iter().collect::<Vec<_>>(),
        vec![Some("8"), None, Some("6")]
    );
    assert_eq!(action.column("certificate").unwrap().str().unwrap().get(0), Some("PG"));
}

#[tokio::test]
async fn rerun_overwrites_transformed_output() {
    let mount_point = scratch();
    seed_raw(&mount_point);
    let config = local_config(&mount_point);
    let secrets = StaticSecretStore::default();

    pipeline::run(&config, &secrets, false).await.unwrap();
    pipeline::run(&config, &secrets, false).await.unwrap();

    let horror = mount_point.join("transformed-data").join("horror");
    let parts = fs::read_dir(&horror)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("part-"))
        .count();
    assert_eq!(parts, 1);
    assert_eq!(load(&horror, true).unwrap().height(), 3);
}

#[tokio::test]
async fn missing_raw_file_aborts_run() {
    let mount_point = scratch();
    seed_raw(&mount_point);
    fs::remove_file(mount_point.join("raw-data").join("scifi.csv")).unwrap();

    let result = pipeline::run(&local_config(&mount_point), &StaticSecretStore::default(), false).await;
    assert!(result.is_err());
    assert!(!mount_point.join("transformed-data").exists());
}

#[tokio::test]
async fn remote_run_mounts_and_uploads() {
    let server = MockServer::start().await;
    for genre in Genre::ALL {
        Mock::given(method("GET"))
            .and(wiremock::matchers::path(format!("/movies/raw-data/{}", genre.file_name())))
            .respond_with(ResponseTemplate::new(200).set_body_string(raw_csv(genre)))
            .mount(&server)
            .await;
    }
    Mock::given(method("PUT"))
        .and(path_regex(r"^/movies/transformed-data/[a-z]+/(part-00000\.csv|_SUCCESS)$"))
        .respond_with(ResponseTemplate::new(201))
        .expect(20)
        .mount(&server)
        .await;

    let mount_point = scratch();
    let config = ReportConfig {
        storage: Some(StorageConfig {
            credentials_version: 1,
            account_name: "moviesdata".to_string(),
            container: "movies".to_string(),
            endpoint: Some(server.uri()),
        }),
        secret: Some(SecretRef {
            scope: "projectmoviesscope".to_string(),
            key: "storageAccountKey".to_string(),
        }),
        ..local_config(&mount_point)
    };
    let secrets = StaticSecretStore::default().with("projectmoviesscope", "storageAccountKey", "k");

    let summary = pipeline::run(&config, &secrets, false).await.unwrap();
    assert_eq!(summary.uploaded.len(), 10);

    // The mount is still in place, so a second run needs a remount
    assert!(pipeline::run(&config, &secrets, false).await.is_err());
    pipeline::run(&config, &secrets, true).await.unwrap();
}

#[tokio::test]
async fn remote_run_without_secret_fails() {
    let mut config = local_config(&scratch());
    config.storage = Some(StorageConfig {
        credentials_version: 1,
        account_name: "moviesdata".to_string(),
        container: "movies".to_string(),
        endpoint: Some("http://127.0.0.1:9".to_string()),
    });
    let err = pipeline::run(&config, &StaticSecretStore::default(), false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("secret"));
}

#[test]
fn load_write_load_round_trip() {
    let mount_point = scratch();
    seed_raw(&mount_point);
    let source = mount_point.join("raw-data").join("adventure.csv");

    let first = load(&source, true).unwrap();
    let dest = mount_point.join("copy").join("adventure");
    write(&first, &dest, SaveMode::Overwrite).unwrap();
    let second = load(&dest, true).unwrap();
    assert!(second.equals_missing(&first));
}
