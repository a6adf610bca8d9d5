/// Centralized environment configuration.
/// All env vars and defaults are defined here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL. Required.
    pub database_url: String,

    /// File storage adapter: "local" or "memory".
    /// Default: local
    pub storage_adapter: String,

    /// Root directory for the local file store.
    /// Default: ./storage
    pub storage_root: String,
}

impl Config {
    /// Build config from environment variables.
    /// Returns an error if required vars are missing.
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set in .env")?;

        let storage_adapter =
            std::env::var("STORAGE_ADAPTER").unwrap_or_else(|_| "local".to_string());

        let storage_root = std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string());

        Ok(Self {
            database_url,
            storage_adapter,
            storage_root,
        })
    }

    /// Config for tests. In-memory database and in-memory file store.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            storage_adapter: "memory".to_string(),
            storage_root: String::new(),
        }
    }
}
