//! PostgreSQL store.
//!
//! The customer and merchant aggregates are split across one table per
//! embedded collection. Each repository method runs as a single statement,
//! or as one short SQL transaction when a method touches two tables, so the
//! per-document atomicity of the in-memory store carries over.
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.

use crate::error::StoreError;
use crate::repository::{
    CategoryRepository, CustomerRepository, MerchantRepository, ProductRepository, Store,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction as SqlTransaction};
use storefront_domain::{
    CartItem, Category, CategoryId, Customer, CustomerId, GatewayOrderId, ManageOrderProduct,
    Merchant, MerchantId, OrderItem, OrderItemId, Price, Product, ProductId, ShippingAddress,
    Transaction, TransactionAction, TransactionProduct, TransactionRecord, TransactionStatus,
};
use tracing::debug;

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_customer(&self, id: CustomerId) -> Result<(), StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(StoreError::not_found("customer", id.to_string()))
        }
    }

    /// Bump `updated_at` on a customer and report whether the row exists
    async fn touch_customer(
        tx: &mut SqlTransaction<'_, Postgres>,
        id: CustomerId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE customers SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("customer", id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Row parsing
// =============================================================================

fn price(value: Decimal, column: &str) -> Result<Price, StoreError> {
    Price::new(value)
        .map_err(|e| StoreError::Deserialization(format!("Invalid {} {}: {}", column, value, e)))
}

fn parse_transaction(row: &PgRow) -> Result<Transaction, StoreError> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let Json(actions): Json<Vec<TransactionAction>> = row.try_get("actions")?;
    let Json(products): Json<Vec<TransactionProduct>> = row.try_get("products")?;
    let Json(address): Json<ShippingAddress> = row.try_get("address")?;

    Ok(Transaction {
        id: GatewayOrderId::new(id)?,
        payment_type: row.try_get("payment_type")?,
        status: status.parse()?,
        actions,
        products,
        address,
        created_at: row.try_get("created_at")?,
    })
}

fn parse_record(row: &PgRow) -> Result<TransactionRecord, StoreError> {
    let id: String = row.try_get("id")?;
    let outcome: String = row.try_get("outcome")?;

    Ok(TransactionRecord {
        id: GatewayOrderId::new(id)?,
        outcome: outcome.parse::<TransactionStatus>()?,
        payment_type: row.try_get("payment_type")?,
        resolved_at: row.try_get("resolved_at")?,
    })
}

fn parse_order(row: &PgRow) -> Result<OrderItem, StoreError> {
    let Json(address): Json<ShippingAddress> = row.try_get("address")?;

    Ok(OrderItem {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        price: price(row.try_get("price")?, "order price")?,
        quantity: row.try_get("quantity")?,
        address,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_manage_order(row: &PgRow) -> Result<ManageOrderProduct, StoreError> {
    let Json(address): Json<ShippingAddress> = row.try_get("address")?;

    Ok(ManageOrderProduct {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        product_id: row.try_get("product_id")?,
        price: price(row.try_get("price")?, "order price")?,
        quantity: row.try_get("quantity")?,
        address,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_product(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: row.try_get("id")?,
        merchant_id: row.try_get("merchant_id")?,
        category_id: row.try_get("category_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: price(row.try_get("price")?, "product price")?,
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, merchant_id, category_id, name, description, price, stock, created_at, updated_at";

// =============================================================================
// Customer Repository Implementation
// =============================================================================

#[async_trait]
impl CustomerRepository for PgStore {
    async fn save(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&mut *tx)
        .await?;

        for table in ["cart_items", "transactions", "transaction_records", "customer_orders"] {
            sqlx::query(&format!("DELETE FROM {} WHERE customer_id = $1", table))
                .bind(customer.id)
                .execute(&mut *tx)
                .await?;
        }

        for item in &customer.carts {
            sqlx::query("INSERT INTO cart_items (customer_id, product_id, quantity) VALUES ($1, $2, $3)")
                .bind(customer.id)
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
        }

        for txn in &customer.transactions {
            insert_transaction(&mut tx, customer.id, txn).await?;
        }

        for record in &customer.resolved_transactions {
            insert_record(&mut tx, customer.id, record).await?;
        }

        for order in &customer.orders {
            insert_order(&mut tx, customer.id, order).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT id, name, email, phone, created_at, updated_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let carts = sqlx::query(
            "SELECT product_id, quantity FROM cart_items WHERE customer_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| Ok(CartItem::new(r.try_get("product_id")?, r.try_get("quantity")?)))
        .collect::<Result<Vec<_>, StoreError>>()?;

        let transactions = sqlx::query(
            r#"
            SELECT id, payment_type, status, actions, products, address, created_at
            FROM transactions WHERE customer_id = $1 ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(parse_transaction)
        .collect::<Result<Vec<_>, _>>()?;

        let resolved_transactions = sqlx::query(
            r#"
            SELECT id, outcome, payment_type, resolved_at
            FROM transaction_records WHERE customer_id = $1 ORDER BY resolved_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(parse_record)
        .collect::<Result<Vec<_>, _>>()?;

        let orders = sqlx::query(
            r#"
            SELECT id, product_id, price, quantity, address, created_at, updated_at
            FROM customer_orders WHERE customer_id = $1 ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(parse_order)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Customer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            carts,
            transactions,
            orders,
            resolved_transactions,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn push_product_to_cart(
        &self,
        customer_id: CustomerId,
        item: CartItem,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::touch_customer(&mut tx, customer_id).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO cart_items (customer_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, product_id) DO NOTHING
            "#,
        )
        .bind(customer_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::duplicate("cart_item", item.product_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_product_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::touch_customer(&mut tx, customer_id).await?;

        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE customer_id = $1 AND product_id = $2",
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("cart_item", product_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn pull_product_from_cart(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::touch_customer(&mut tx, customer_id).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1 AND product_id = $2")
            .bind(customer_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pull_product_from_all_carts(&self, product_id: ProductId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        debug!(%product_id, carts = result.rows_affected(), "Product pulled from carts");
        Ok(result.rows_affected())
    }

    async fn create_transaction(
        &self,
        customer_id: CustomerId,
        transaction: &Transaction,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::touch_customer(&mut tx, customer_id).await?;

        insert_transaction(&mut tx, customer_id, transaction).await.map_err(|e| match e {
            StoreError::Duplicate { .. } => {
                StoreError::duplicate("transaction", transaction.id.as_str())
            },
            other => other,
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_transaction(
        &self,
        customer_id: CustomerId,
        transaction_id: &GatewayOrderId,
    ) -> Result<bool, StoreError> {
        self.ensure_customer(customer_id).await?;

        let result = sqlx::query("DELETE FROM transactions WHERE customer_id = $1 AND id = $2")
            .bind(customer_id)
            .bind(transaction_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn resolve_transaction(
        &self,
        customer_id: CustomerId,
        record: &TransactionRecord,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::touch_customer(&mut tx, customer_id).await?;

        let removed = sqlx::query("DELETE FROM transactions WHERE customer_id = $1 AND id = $2")
            .bind(customer_id)
            .bind(record.id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_record(&mut tx, customer_id, record).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn create_order(
        &self,
        customer_id: CustomerId,
        order: &OrderItem,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::touch_customer(&mut tx, customer_id).await?;
        let inserted = insert_order(&mut tx, customer_id, order).await?;
        tx.commit().await?;
        Ok(inserted)
    }
}

async fn insert_transaction(
    tx: &mut SqlTransaction<'_, Postgres>,
    customer_id: CustomerId,
    txn: &Transaction,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, customer_id, payment_type, status, actions, products, address, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(txn.id.as_str())
    .bind(customer_id)
    .bind(&txn.payment_type)
    .bind(txn.status.as_str())
    .bind(Json(&txn.actions))
    .bind(Json(&txn.products))
    .bind(Json(&txn.address))
    .bind(txn.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_record(
    tx: &mut SqlTransaction<'_, Postgres>,
    customer_id: CustomerId,
    record: &TransactionRecord,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO transaction_records (id, customer_id, outcome, payment_type, resolved_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (customer_id, id) DO NOTHING
        "#,
    )
    .bind(record.id.as_str())
    .bind(customer_id)
    .bind(record.outcome.as_str())
    .bind(&record.payment_type)
    .bind(record.resolved_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_order(
    tx: &mut SqlTransaction<'_, Postgres>,
    customer_id: CustomerId,
    order: &OrderItem,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO customer_orders (
            id, customer_id, product_id, price, quantity, address, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (customer_id, id) DO NOTHING
        "#,
    )
    .bind(order.id)
    .bind(customer_id)
    .bind(order.product_id)
    .bind(order.price.as_decimal())
    .bind(order.quantity)
    .bind(Json(&order.address))
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Merchant Repository Implementation
// =============================================================================

#[async_trait]
impl MerchantRepository for PgStore {
    async fn save(&self, merchant: &Merchant) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO merchants (id, name, email, phone, address, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                balance = EXCLUDED.balance,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(merchant.id)
        .bind(&merchant.name)
        .bind(&merchant.email)
        .bind(&merchant.phone)
        .bind(&merchant.address)
        .bind(merchant.balance)
        .bind(merchant.created_at)
        .bind(merchant.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM merchant_orders WHERE merchant_id = $1")
            .bind(merchant.id)
            .execute(&mut *tx)
            .await?;

        for order in &merchant.orders {
            insert_manage_order(&mut tx, merchant.id, order).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: MerchantId) -> Result<Option<Merchant>, StoreError> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, name, email, phone, address, balance, created_at, updated_at
            FROM merchants WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let orders = sqlx::query(
            r#"
            SELECT id, customer_id, product_id, price, quantity, address, created_at, updated_at
            FROM merchant_orders WHERE merchant_id = $1 ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(parse_manage_order)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Merchant {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            balance: row.try_get("balance")?,
            orders,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn push_product_to_manage_orders(
        &self,
        merchant_id: MerchantId,
        order: &ManageOrderProduct,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent pushes for the same merchant
        let exists = sqlx::query("SELECT id FROM merchants WHERE id = $1 FOR UPDATE")
            .bind(merchant_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("merchant", merchant_id.to_string()));
        }

        if !insert_manage_order(&mut tx, merchant_id, order).await? {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE merchants SET balance = balance + $2, updated_at = NOW() WHERE id = $1")
            .bind(merchant_id)
            .bind(order.total())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

async fn insert_manage_order(
    tx: &mut SqlTransaction<'_, Postgres>,
    merchant_id: MerchantId,
    order: &ManageOrderProduct,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO merchant_orders (
            id, merchant_id, customer_id, product_id, price, quantity, address,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (merchant_id, id) DO NOTHING
        "#,
    )
    .bind(order.id)
    .bind(merchant_id)
    .bind(order.customer_id)
    .bind(order.product_id)
    .bind(order.price.as_decimal())
    .bind(order.quantity)
    .bind(Json(&order.address))
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Product Repository Implementation
// =============================================================================

#[async_trait]
impl ProductRepository for PgStore {
    async fn save(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, merchant_id, category_id, name, description, price, stock,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                merchant_id = EXCLUDED.merchant_id,
                category_id = EXCLUDED.category_id,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                stock = EXCLUDED.stock,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product.id)
        .bind(product.merchant_id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.as_decimal())
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                merchant_id = $2, category_id = $3, name = $4, description = $5,
                price = $6, stock = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(product.merchant_id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.as_decimal())
        .bind(product.stock)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", product.id.to_string()));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_product).transpose()
    }

    async fn find_by_merchant(&self, merchant_id: MerchantId) -> Result<Vec<Product>, StoreError> {
        sqlx::query(&format!(
            "SELECT {} FROM products WHERE merchant_id = $1 ORDER BY created_at",
            PRODUCT_COLUMNS
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(parse_product)
        .collect()
    }

    async fn update_quantity(&self, id: ProductId, delta: i64) -> Result<i64, StoreError> {
        let stock: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1 RETURNING stock",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        stock.ok_or_else(|| StoreError::not_found("product", id.to_string()))
    }

    async fn apply_settlement(
        &self,
        id: ProductId,
        key: OrderItemId,
        quantity: i64,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("product", id.to_string()));
        }

        let recorded = sqlx::query(
            r#"
            INSERT INTO product_settlements (product_id, order_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, order_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(quantity)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if recorded == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Category Repository Implementation
// =============================================================================

#[async_trait]
impl CategoryRepository for PgStore {
    async fn save(&self, category: &Category) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO categories (id, name) VALUES ($1, $2) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
        )
        .bind(category.id)
        .bind(&category.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            Ok(Category {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
            })
        })
        .transpose()
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        sqlx::query("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|r| {
                Ok(Category {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                })
            })
            .collect()
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

impl Store for PgStore {
    fn customers(&self) -> &dyn CustomerRepository {
        self
    }

    fn merchants(&self) -> &dyn MerchantRepository {
        self
    }

    fn products(&self) -> &dyn ProductRepository {
        self
    }

    fn categories(&self) -> &dyn CategoryRepository {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
