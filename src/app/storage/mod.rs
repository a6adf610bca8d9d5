use std::sync::Arc;

/// Abstract interface for tenant-partitioned file storage. Swappable per
/// environment: local disk in production, in-memory in tests.
///
/// Paths are always the derived form produced by
/// `policy::nested::storage_path`, so one tenant's prefix can never
/// enumerate another's.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), FileStoreError>;
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, FileStoreError>;
    async fn remove(&self, path: &str) -> Result<(), FileStoreError>;
    /// Paths currently stored under a prefix, e.g. an organization id.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, FileStoreError>;
}

/// Errors that can occur in a file store.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Re-export implementations
pub use local::LocalFileStore;
pub use memory::MemoryFileStore;

mod local;
mod memory;

/// Build the file store from config.
pub fn from_config(
    config: &crate::app::config::Config,
) -> Result<Arc<dyn FileStore>, FileStoreError> {
    match config.storage_adapter.as_str() {
        "local" => Ok(Arc::new(LocalFileStore::new(config.storage_root.clone()))),
        "memory" => Ok(Arc::new(MemoryFileStore::new())),
        other => Err(FileStoreError::Config(format!(
            "Unknown STORAGE_ADAPTER: {}",
            other
        ))),
    }
}
