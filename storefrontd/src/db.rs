//! Database CLI subcommands for storefrontd.
//!
//! Provides `db migrate`, `db status`, and `db seed` commands.

use anyhow::{anyhow, Result};
use std::env;
use tracing::info;

use storefront_db::{migrate, seed_demo_catalog, status};

/// Run database CLI subcommands.
///
/// Supported commands:
/// - `storefrontd db migrate` - Run pending migrations
/// - `storefrontd db status` - Check migration status
/// - `storefrontd db seed` - Insert the demo catalog
pub async fn run_db_command(args: &[String]) -> Result<()> {
    let command = args
        .get(2)
        .ok_or_else(|| anyhow!("Usage: storefrontd db <migrate|status|seed>"))?;

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow!("DATABASE_URL environment variable is required for db commands"))?;

    let pool = sqlx::PgPool::connect(&database_url).await?;

    match command.as_str() {
        "migrate" => {
            migrate(&pool).await?;
        },
        "status" => {
            let applied = status(&pool).await?;
            info!(applied = applied.len(), "Migration status checked");
        },
        "seed" => {
            let catalog = seed_demo_catalog(&pool).await?;
            info!(
                merchant_id = %catalog.merchant_id,
                customer_id = %catalog.customer_id,
                products = ?catalog.product_ids,
                "Demo catalog ready"
            );
        },
        other => {
            return Err(anyhow!("Unknown db command: {}. Use migrate, status, or seed", other));
        },
    }

    Ok(())
}
