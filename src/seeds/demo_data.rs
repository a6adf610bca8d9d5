use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::{Seed, SeedOutcome};
use crate::app::db;
use crate::app::domain::{
    Email, HashedPassword, OrganizationId, OrganizationRole, Password, Slug, UserId,
};

const DEMO_EMAIL: &str = "demo@clientdesk.local";
const DEMO_PASSWORD: &str = "DemoPassword1";

/// Seeds a demo workspace when `SEED_DEMO_DATA=1`: a demo user who owns
/// Acme and is a plain member of Globex, each with a client, a project
/// and a task. Useful for poking at tenant scoping by hand.
pub struct DemoData;

#[async_trait]
impl Seed for DemoData {
    fn version(&self) -> i64 {
        20250301000001
    }

    fn description(&self) -> &str {
        "demo user with Acme and Globex organizations"
    }

    async fn run(&self, pool: &SqlitePool) -> Result<SeedOutcome, sqlx::Error> {
        if std::env::var("SEED_DEMO_DATA").as_deref() != Ok("1") {
            info!("SEED_DEMO_DATA not set to 1, skipping demo data seed");
            return Ok(SeedOutcome::Skipped);
        }

        let Ok(email) = Email::new(DEMO_EMAIL.to_string()) else {
            return Ok(SeedOutcome::Skipped);
        };
        if db::users::find_by_email(pool, &email).await?.is_some() {
            warn!(email = DEMO_EMAIL, "demo user already exists, skipping");
            return Ok(SeedOutcome::Skipped);
        }

        let password = match Password::new(DEMO_PASSWORD.to_string()) {
            Ok(password) => password,
            Err(_) => return Ok(SeedOutcome::Skipped),
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

        seed_organization(&mut tx, &user_id, "Acme", "acme", OrganizationRole::Owner).await?;
        seed_organization(&mut tx, &user_id, "Globex", "globex", OrganizationRole::Member).await?;
        tx.commit().await?;

        info!(email = DEMO_EMAIL, "created demo workspace");
        println!("Demo account created:");
        println!("  email:    {DEMO_EMAIL}");
        println!("  password: {DEMO_PASSWORD}");

        Ok(SeedOutcome::Applied)
    }
}

async fn seed_organization(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: &UserId,
    name: &str,
    slug: &str,
    role: OrganizationRole,
) -> Result<(), sqlx::Error> {
    let organization_id = OrganizationId::new();
    let Ok(slug) = Slug::new(slug.to_string()) else {
        return Ok(());
    };
    db::organizations::insert(
        &mut **tx,
        &db::organizations::NewOrganization {
            id: organization_id.clone(),
            name: name.to_string(),
            slug,
        },
    )
    .await?;
    db::organizations::add_member(&mut **tx, &organization_id, user_id, role).await?;

    let client_id = ulid::Ulid::new().to_string();
    db::clients::insert(
        &mut **tx,
        &db::clients::NewClient {
            id: client_id.clone(),
            organization_id: organization_id.clone(),
            name: format!("{name} Client"),
            email: None,
        },
    )
    .await?;

    let project_id = ulid::Ulid::new().to_string();
    db::projects::insert(
        &mut **tx,
        &db::projects::NewProject {
            id: project_id.clone(),
            organization_id: organization_id.clone(),
            client_id: Some(client_id),
            name: format!("{name} Website"),
        },
    )
    .await?;

    db::tasks::insert(
        &mut **tx,
        &db::tasks::NewTask {
            id: ulid::Ulid::new().to_string(),
            organization_id,
            project_id: Some(project_id),
            title: "Draft the homepage".to_string(),
        },
    )
    .await?;

    Ok(())
}
