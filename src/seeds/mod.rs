mod demo_data;
mod dev_superadmin;

use async_trait::async_trait;
use sqlx::SqlitePool;

/// Outcome of running a seed. Skipped seeds are not recorded so they may
/// run again on a later invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Seed executed and made changes; record in _clientdesk_seeds.
    Applied,
    /// Seed chose not to run (e.g. env not set); do not record.
    Skipped,
}

/// A database seed. Seeds run in version order and are tracked for idempotency.
#[async_trait]
pub trait Seed: Send + Sync {
    /// Unique version identifier (timestamp format: YYYYMMDDHHMMSS).
    fn version(&self) -> i64;

    /// Human-readable description of the seed.
    fn description(&self) -> &str;

    /// Execute the seed. Uses the db layer; no raw SQL.
    async fn run(&self, pool: &SqlitePool) -> Result<SeedOutcome, sqlx::Error>;
}

/// All seeds in execution order (sorted by version).
pub fn all_seeds() -> Vec<Box<dyn Seed>> {
    let mut seeds: Vec<Box<dyn Seed>> = vec![
        Box::new(dev_superadmin::DevSuperadmin),
        Box::new(demo_data::DemoData),
    ];
    seeds.sort_by_key(|s| s.version());
    seeds
}
