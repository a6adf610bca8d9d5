use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::{Seed, SeedOutcome};
use crate::app::db;
use crate::app::domain::{Email, HashedPassword, Password, UserId};

/// Creates a superadmin account for local development when
/// `SEED_SUPERADMIN_EMAIL` is set. The generated password is printed once;
/// there is no way to recover it afterwards.
pub struct DevSuperadmin;

#[async_trait]
impl Seed for DevSuperadmin {
    fn version(&self) -> i64 {
        20250301000000
    }

    fn description(&self) -> &str {
        "dev superadmin account from SEED_SUPERADMIN_EMAIL"
    }

    async fn run(&self, pool: &SqlitePool) -> Result<SeedOutcome, sqlx::Error> {
        let Ok(raw_email) = std::env::var("SEED_SUPERADMIN_EMAIL") else {
            info!("SEED_SUPERADMIN_EMAIL not set, skipping superadmin seed");
            return Ok(SeedOutcome::Skipped);
        };

        let Ok(email) = Email::new(raw_email.clone()) else {
            warn!(email = %raw_email, "SEED_SUPERADMIN_EMAIL is not a valid address, skipping");
            return Ok(SeedOutcome::Skipped);
        };

        if db::users::find_by_email(pool, &email).await?.is_some() {
            warn!(email = %raw_email, "user already exists, skipping superadmin seed");
            return Ok(SeedOutcome::Skipped);
        }

        let plaintext = random_password();
        let password = match Password::new(plaintext.clone()) {
            Ok(password) => password,
            Err(error) => {
                warn!(?error, "generated password failed validation, skipping");
                return Ok(SeedOutcome::Skipped);
            }
        };
        let password_hash = match HashedPassword::from_password(&password) {
            Ok(hash) => hash,
            Err(error) => {
                warn!(%error, "password hashing failed, skipping");
                return Ok(SeedOutcome::Skipped);
            }
        };

        let user_id = UserId::new();
        let mut tx = pool.begin().await?;
        db::users::insert(
            &mut *tx,
            &db::users::NewUser {
                id: user_id.clone(),
                email,
                password_hash,
            },
        )
        .await?;
        db::users::grant_superadmin(&mut *tx, &user_id).await?;
        tx.commit().await?;

        info!(email = %raw_email, "created superadmin account");
        println!("Superadmin account created:");
        println!("  email:    {raw_email}");
        println!("  password: {plaintext}");

        Ok(SeedOutcome::Applied)
    }
}

/// Random password that always satisfies the strength rules: the fixed
/// prefix covers the character classes, the hex tail carries the entropy.
fn random_password() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    format!("Sa1-{}", hex::encode(bytes))
}
