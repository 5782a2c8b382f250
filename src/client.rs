use crate::protocol::*;
use crate::reader::load;
use crate::secrets::AccountKey;
use crate::utils::*;
use polars::prelude::DataFrame;
use reqwest::header;
use std::collections::HashMap;
use std::{fs, path::Path, path::PathBuf};
use url::Url;

/// An asynchronous Client binding a blob container to local mount points
pub struct Client {
    http_client: reqwest::Client,
    base_url: Url,
    /// `wasbs://` description of the container, recorded in every mount
    pub source: String,
    mounts: HashMap<PathBuf, MountCache>,
}

impl Client {
    /// Constructs a new async Client
    /// # Arguments
    ///
    /// * `storage_config` - Blob storage profile of type [StorageConfig]
    /// * `account_key` - Storage account key, usually read from a [SecretStore](crate::secrets::SecretStore)
    pub fn new(storage_config: StorageConfig, account_key: AccountKey) -> Result<Self, anyhow::Error> {
        if storage_config.credentials_version > CREDENTIALS_VERSION {
            return Err(anyhow::anyhow!("'credentials_version' in the storage configuration is {}, which is newer than the \
                    version {} supported by the current release. Please upgrade to a newer release.",
                    storage_config.credentials_version,
                    CREDENTIALS_VERSION));
        }
        Ok(Self {
            http_client: Self::get_client(&account_key)?,
            base_url: Self::build_base_url(&storage_config.container_url())?,
            source: storage_config.source(),
            mounts: HashMap::new(),
        })
    }

    fn get_client(account_key: &AccountKey) -> Result<reqwest::Client, anyhow::Error> {
        let rust_version: &str = &format!("{}", rustc_version_runtime::version());
        let user_agent: &str = &format!("Project-Movies/{VERSION} Rust/{rust_version}");
        let bearer_token = &format!("Bearer {}", account_key.expose());
        let mut headers = header::HeaderMap::new();
        let mut authorization = header::HeaderValue::from_str(bearer_token)
            .map_err(|e| anyhow::anyhow!("Error setting authorization header:{e}"))?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(user_agent)
                .map_err(|e| anyhow::anyhow!("Error setting user agent header:{e}"))?,
        );
        headers.insert(
            header::HeaderName::from_static("x-ms-version"),
            header::HeaderValue::from_static(STORAGE_API_VERSION),
        );
        reqwest::Client::builder().default_headers(headers).build()
            .map_err(|e| anyhow::anyhow!("Error building Http client: {e}"))
    }

    fn build_base_url(endpoint: &str) -> Result<Url, url::ParseError> {
        let mut root_path = endpoint.trim_end_matches('/').to_string();
        root_path.push('/');
        Url::parse(&root_path)
    }

    fn blob_url(&self, blob: &str) -> Result<Url, anyhow::Error> {
        self.base_url.join(blob.trim_start_matches('/'))
            .map_err(|e| anyhow::anyhow!("Error creating blob url for {blob}: {e}"))
    }

    async fn download(&self, blob: &str, dest_path: &Path) -> Result<u64, anyhow::Error> {
        let url = self.blob_url(blob)?;
        debug!("--> HTTP GET to: {}", &url);
        let resp = self.http_client.get(url.as_str()).send().await
            .and_then(|r| r.error_for_status())
            .map_err(|e| anyhow::anyhow!("Error downloading {blob}: {e}"))?;
        let content = resp.bytes().await
            .map_err(|e| anyhow::anyhow!("Failed to read download bytes: {e}"))?;
        fs::write(dest_path, &content)
            .map_err(|e| anyhow::anyhow!("Failed to save {} to {}: {e}", blob, dest_path.display()))?;
        Ok(content.len() as u64)
    }

    async fn put(&self, blob: &str, content: Vec<u8>) -> Result<(), anyhow::Error> {
        let url = self.blob_url(blob)?;
        debug!("--> HTTP PUT to: {} ({} bytes)", &url, content.len());
        self.http_client
            .put(url.as_str())
            .header("x-ms-blob-type", "BlockBlob")
            .body(content)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| anyhow::anyhow!("Error uploading {blob}: {e}"))?;
        Ok(())
    }

    /// Downloads `blobs` under `mount_point` and records the mount.
    ///
    /// Fails if `mount_point` is already mounted; [unmount](Self::unmount) first.
    pub async fn mount(&mut self, mount_point: &Path, blobs: &[String]) -> Result<MountInfo, anyhow::Error> {
        let descriptor = mount_point.join(MOUNT_FILE);
        if self.mounts.contains_key(mount_point) || Path::exists(&descriptor) {
            return Err(anyhow::anyhow!("Directory already mounted: {}", mount_point.display()));
        }
        info!("--> Mounting {} at {}", &self.source, mount_point.display());
        let mut files = Vec::new();
        let mut file_paths = Vec::new();
        for blob in blobs {
            let dst_path = mount_point.join(blob);
            if let Some(parent) = dst_path.parent() {
                fs::create_dir_all(parent).map_err(|e| anyhow::anyhow!("Error creating mount path: {e}"))?;
            }
            let size = self.download(blob, &dst_path).await?;
            debug!("Downloaded {} ({} bytes)", dst_path.display(), size);
            files.push(MountedFile { name: blob.clone(), size });
            file_paths.push(dst_path);
        }
        let info = MountInfo {
            source: self.source.clone(),
            mount_point: mount_point.display().to_string(),
            files,
        };
        serde_json::to_writer(&fs::File::create(&descriptor)?, &info)?;
        self.mounts.insert(
            mount_point.to_path_buf(),
            MountCache { info: info.clone(), file_paths },
        );
        Ok(info)
    }

    /// Mounts known to this client
    pub fn mounts(&self) -> Vec<&MountInfo> {
        self.mounts.values().map(|m| &m.info).collect()
    }

    /// Local paths of the mounted files, from memory or the mount descriptor
    pub fn list_mount(&self, mount_point: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
        if let Some(cached) = self.mounts.get(mount_point) {
            return Ok(cached.file_paths.clone());
        }
        let descriptor = mount_point.join(MOUNT_FILE);
        let text = fs::read_to_string(&descriptor)
            .map_err(|e| anyhow::anyhow!("{} is not mounted: {e}", mount_point.display()))?;
        let info: MountInfo = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Invalid mount descriptor in {}: {e}", descriptor.display()))?;
        Ok(info.files.iter().map(|f| mount_point.join(&f.name)).collect())
    }

    /// Uploads every file below `mount_point/prefix`, overwriting the remote blobs.
    pub async fn upload_dir(&self, mount_point: &Path, prefix: &str) -> Result<Vec<String>, anyhow::Error> {
        let files = files_below(mount_point, &mount_point.join(prefix))
            .map_err(|e| anyhow::anyhow!("Error listing {}: {e}", mount_point.join(prefix).display()))?;
        let mut uploaded = Vec::new();
        for relative in files {
            let blob = blob_name(&relative);
            let content = fs::read(mount_point.join(&relative))
                .map_err(|e| anyhow::anyhow!("Error reading {}: {e}", relative.display()))?;
            self.put(&blob, content).await?;
            uploaded.push(blob);
        }
        info!("--> Uploaded {} files from {}", uploaded.len(), mount_point.join(prefix).display());
        Ok(uploaded)
    }

    /// Forgets the mount and removes its local copy
    pub fn unmount(&mut self, mount_point: &Path) -> Result<(), anyhow::Error> {
        let known = self.mounts.remove(mount_point).is_some();
        if !known && !Path::exists(&mount_point.join(MOUNT_FILE)) {
            return Err(anyhow::anyhow!("Directory not mounted: {}", mount_point.display()));
        }
        fs::remove_dir_all(mount_point).map_err(|e| anyhow::anyhow!("Error removing mount: {e}"))?;
        info!("--> Unmounted {}", mount_point.display());
        Ok(())
    }

    /// Loads a mounted CSV blob with its header row
    pub fn get_dataframe(&self, mount_point: &Path, blob: &str) -> Result<DataFrame, anyhow::Error> {
        load(&mount_point.join(blob), true)
            .map_err(|e| anyhow::anyhow!("Error loading {blob}: {e}"))
    }
}
