//! Test helpers for storefront tests.
//!
//! Provides seeding helpers for merchants, products and customers with
//! filled carts, over any `Store` implementation.

mod helpers;

pub use helpers::{
    seed_customer, seed_customer_with_cart, seed_merchant, seed_product, shipping_address,
    Catalog,
};

pub use anyhow::Result;

/// Setup a clean test database by running migrations.
///
/// Convenience function for tests that need a fresh schema.
/// Note: migrations are located at migrations/ relative to workspace root.
#[cfg(feature = "postgres")]
pub async fn setup_test_db(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("../migrations").run(pool).await?;
    Ok(())
}
