//! Demo catalog for local runs.
//!
//! Seeds one merchant, one category, a few products and one customer.
//! Ids are derived from fixed names, so reseeding is a no-op and the ids
//! are stable across databases.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::Result;

/// Ids of the seeded rows.
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    pub merchant_id: Uuid,
    pub category_id: Uuid,
    pub product_ids: Vec<Uuid>,
    pub customer_id: Uuid,
}

/// (name, price, stock)
const DEMO_PRODUCTS: [(&str, i64, i64); 3] = [
    ("Arabica Gayo 250g", 30000, 5),
    ("Robusta Lampung 250g", 22000, 12),
    ("V60 Paper Filter", 45000, 30),
];

fn demo_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("storefront-demo:{}", name).as_bytes())
}

/// Insert the demo catalog.
///
/// Uses INSERT ... ON CONFLICT DO NOTHING for idempotency. Existing rows,
/// including stock and balances moved by real traffic, are left untouched.
pub async fn seed_demo_catalog(pool: &PgPool) -> Result<DemoCatalog> {
    let merchant_id = demo_id("merchant");
    let category_id = demo_id("category");
    let customer_id = demo_id("customer");

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO merchants (id, name, email, phone, address, balance, created_at, updated_at)
        VALUES ($1, 'Kopi Nusantara', 'merchant@kopi.example', '081300000000',
                'Jl. Braga 1, Bandung', 0, NOW(), NOW())
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(merchant_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, 'Coffee') ON CONFLICT (id) DO NOTHING")
        .bind(category_id)
        .execute(&mut *tx)
        .await?;

    let mut product_ids = Vec::with_capacity(DEMO_PRODUCTS.len());
    for (name, price, stock) in DEMO_PRODUCTS {
        let product_id = demo_id(name);
        sqlx::query(
            r#"
            INSERT INTO products (
                id, merchant_id, category_id, name, description, price, stock,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, '', $5, $6, NOW(), NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(merchant_id)
        .bind(category_id)
        .bind(name)
        .bind(Decimal::from(price))
        .bind(stock)
        .execute(&mut *tx)
        .await?;
        product_ids.push(product_id);
    }

    sqlx::query(
        r#"
        INSERT INTO customers (id, name, email, phone, created_at, updated_at)
        VALUES ($1, 'Budi Santoso', 'budi@example.com', '081234567890', NOW(), NOW())
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(customer_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(%merchant_id, %customer_id, products = product_ids.len(), "Demo catalog seeded");
    Ok(DemoCatalog { merchant_id, category_id, product_ids, customer_id })
}
