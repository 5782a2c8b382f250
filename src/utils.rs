use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::protocol::MountInfo;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Highest `credentialsVersion` of a storage profile this release understands
pub const CREDENTIALS_VERSION: i32 = 1;

/// Blob service REST version sent with every request
pub const STORAGE_API_VERSION: &str = "2021-08-06";

/// Descriptor written at the root of every mount point
pub const MOUNT_FILE: &str = "mount.json";

pub(crate) struct MountCache {
    pub info: MountInfo,
    pub file_paths: Vec<PathBuf>,
}

/// Every regular file below `dir`, sorted, as paths relative to `root`.
pub(crate) fn files_below(root: &Path, dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            found.push(relative.to_path_buf());
        }
    }
    Ok(found)
}

/// Blob names always use forward slashes, whatever the host separator.
pub(crate) fn blob_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_name_joins_with_slashes() {
        let relative = Path::new("transformed-data").join("action").join("part-00000.csv");
        assert_eq!(blob_name(&relative), "transformed-data/action/part-00000.csv");
    }

    #[test]
    fn files_below_lists_nested_files_sorted() {
        let root = std::env::temp_dir().join(format!("project_movies_utils_{}", std::process::id()));
        let nested = root.join("out").join("horror");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("part-00000.csv"), "a\n1\n").unwrap();
        std::fs::write(root.join("out").join("_SUCCESS"), "").unwrap();

        let found = files_below(&root, &root.join("out")).unwrap();
        assert_eq!(
            found,
            vec![
                Path::new("out").join("_SUCCESS"),
                Path::new("out").join("horror").join("part-00000.csv"),
            ]
        );
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn files_below_missing_dir_is_error() {
        let root = std::env::temp_dir().join(format!("project_movies_missing_{}", std::process::id()));
        assert!(files_below(&root, &root.join("out")).is_err());
    }
}
