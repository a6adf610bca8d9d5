use std::collections::HashMap;
use std::sync::Mutex;

use super::{FileStore, FileStoreError};

/// In-memory file store for tests.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), FileStoreError> {
        self.files
            .lock()
            .expect("file store lock poisoned")
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, FileStoreError> {
        Ok(self
            .files
            .lock()
            .expect("file store lock poisoned")
            .get(path)
            .cloned())
    }

    async fn remove(&self, path: &str) -> Result<(), FileStoreError> {
        self.files
            .lock()
            .expect("file store lock poisoned")
            .remove(path);
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, FileStoreError> {
        let mut paths: Vec<String> = self
            .files
            .lock()
            .expect("file store lock poisoned")
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }
}
