use std::path::{Path, PathBuf};

use super::{FileStore, FileStoreError};

/// File store backed by a local directory. Stored paths are joined under the
/// root; the derived-path rule upstream keeps them free of separator tricks.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait::async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), FileStoreError> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, FileStoreError> {
        match tokio::fs::read(self.full_path(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn remove(&self, path: &str) -> Result<(), FileStoreError> {
        match tokio::fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(()),
            // Already gone is success for cleanup purposes.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, FileStoreError> {
        let base = self.full_path(prefix);
        if !base.exists() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        collect_files(&base, &mut found)?;
        let mut paths = Vec::new();
        for file in found {
            if let Ok(relative) = file.strip_prefix(&self.root) {
                paths.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
