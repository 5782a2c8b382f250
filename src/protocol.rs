//! Blob storage profile and mount descriptor types

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    pub credentials_version: i32,
    pub account_name: String,
    pub container: String,
    /// Overrides `https://<account>.blob.core.windows.net/`, e.g. for an emulator
    pub endpoint: Option<String>,
}

impl StorageConfig {
    pub fn container_url(&self) -> String {
        let root = match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.core.windows.net", self.account_name),
        };
        format!("{}/{}/", root, self.container)
    }

    /// The `wasbs://` form used to describe the mount source
    pub fn source(&self) -> String {
        format!(
            "wasbs://{}@{}.blob.core.windows.net",
            self.container, self.account_name
        )
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountedFile {
    pub name: String,
    pub size: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountInfo {
    pub source: String,
    pub mount_point: String,
    pub files: Vec<MountedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_url_defaults_to_account_host() {
        let config: StorageConfig = serde_json::from_str(
            r#"{"credentialsVersion":1,"accountName":"moviesdata","container":"project-movies-data"}"#,
        )
        .unwrap();
        assert_eq!(
            config.container_url(),
            "https://moviesdata.blob.core.windows.net/project-movies-data/"
        );
        assert_eq!(
            config.source(),
            "wasbs://project-movies-data@moviesdata.blob.core.windows.net"
        );
    }

    #[test]
    fn container_url_uses_endpoint_override() {
        let config = StorageConfig {
            credentials_version: 1,
            account_name: "devstoreaccount1".to_string(),
            container: "movies".to_string(),
            endpoint: Some("http://127.0.0.1:10000/devstoreaccount1/".to_string()),
        };
        assert_eq!(
            config.container_url(),
            "http://127.0.0.1:10000/devstoreaccount1/movies/"
        );
    }
}
