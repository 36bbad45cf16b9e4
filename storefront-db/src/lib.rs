//! Database lifecycle management for the storefront.
//!
//! Provides migration running, status checking, and demo catalog seeding.

mod seed;

pub use seed::{seed_demo_catalog, DemoCatalog};

use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// One applied migration as recorded by sqlx.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub success: bool,
}

/// Run all pending migrations.
///
/// Uses sqlx migrations from the `migrations` directory.
/// Idempotent: safe to run multiple times.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Check database connectivity and migration status.
///
/// Logs and returns the most recent applied migrations (newest first).
/// An empty list means `migrate` has not run yet.
pub async fn status(pool: &PgPool) -> Result<Vec<AppliedMigration>> {
    let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if result != 1 {
        return Err(anyhow::anyhow!("Database connectivity check failed"));
    }

    info!("Database connectivity: OK");

    // Runtime query: sqlx::query! would need a database at compile time
    let rows = sqlx::query(
        r#"
        SELECT version, description, success
        FROM _sqlx_migrations
        ORDER BY version DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await;

    match rows {
        Ok(rows) => {
            let applied: Vec<AppliedMigration> = rows
                .iter()
                .map(|row| AppliedMigration {
                    version: row.get("version"),
                    description: row.get("description"),
                    success: row.get("success"),
                })
                .collect();

            if applied.is_empty() {
                warn!("No migrations found in database (run `storefrontd db migrate` first)");
            }
            for migration in &applied {
                let mark = if migration.success { "ok" } else { "FAILED" };
                info!(version = migration.version, description = %migration.description, "Migration {}", mark);
            }
            Ok(applied)
        },
        Err(e) if e.to_string().contains("_sqlx_migrations") => {
            warn!("Migration table not found (run `storefrontd db migrate` first)");
            Ok(Vec::new())
        },
        Err(e) => Err(e.into()),
    }
}
