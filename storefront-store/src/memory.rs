//! In-memory store implementation
//!
//! Used for testing and development without a database.
//! Thread-safe using RwLock for concurrent access. Each repository method
//! holds one write lock for its whole read-modify-write, which gives the
//! same per-document atomicity a document store's update operators do.

use crate::error::StoreError;
use crate::repository::{
    CategoryRepository, CustomerRepository, MerchantRepository, ProductRepository, Store,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use storefront_domain::{
    CartItem, Category, CategoryId, Customer, CustomerId, GatewayOrderId, ManageOrderProduct,
    Merchant, MerchantId, OrderItem, OrderItemId, Product, ProductId, Transaction,
    TransactionRecord,
};

/// In-memory store for testing
pub struct MemoryStore {
    customers: RwLock<HashMap<CustomerId, Customer>>,
    merchants: RwLock<HashMap<MerchantId, Merchant>>,
    products: RwLock<HashMap<ProductId, StoredProduct>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

/// Product with the settlement keys already applied to its stock
struct StoredProduct {
    product: Product,
    settlements: HashSet<OrderItemId>,
}

fn read<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read().map_err(|_| StoreError::Poisoned(name.to_string()))
}

fn write<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned(name.to_string()))
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            customers: RwLock::new(HashMap::new()),
            merchants: RwLock::new(HashMap::new()),
            products: RwLock::new(HashMap::new()),
            categories: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of customers
    pub fn customer_count(&self) -> usize {
        self.customers.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Get the number of products
    pub fn product_count(&self) -> usize {
        self.products.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Clear all data (useful for test setup)
    pub fn clear(&self) {
        if let Ok(mut customers) = self.customers.write() {
            customers.clear();
        }
        if let Ok(mut merchants) = self.merchants.write() {
            merchants.clear();
        }
        if let Ok(mut products) = self.products.write() {
            products.clear();
        }
        if let Ok(mut categories) = self.categories.write() {
            categories.clear();
        }
    }

    /// Run `f` against one customer under the write lock
    fn with_customer<R>(
        &self,
        id: CustomerId,
        f: impl FnOnce(&mut Customer) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut customers = write(&self.customers, "customers")?;
        let customer = customers
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("customer", id.to_string()))?;
        f(customer)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Customer Repository Implementation
// =============================================================================

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn save(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut customers = write(&self.customers, "customers")?;
        customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let customers = read(&self.customers, "customers")?;
        Ok(customers.get(&id).cloned())
    }

    async fn push_product_to_cart(
        &self,
        customer_id: CustomerId,
        item: CartItem,
    ) -> Result<(), StoreError> {
        self.with_customer(customer_id, |customer| {
            if customer.cart_item(item.product_id).is_some() {
                return Err(StoreError::duplicate("cart_item", item.product_id.to_string()));
            }
            customer.carts.push(item);
            customer.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn update_product_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        self.with_customer(customer_id, |customer| {
            let item = customer
                .carts
                .iter_mut()
                .find(|item| item.product_id == product_id)
                .ok_or_else(|| StoreError::not_found("cart_item", product_id.to_string()))?;
            item.quantity = quantity;
            customer.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn pull_product_from_cart(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        self.with_customer(customer_id, |customer| {
            let before = customer.carts.len();
            customer.carts.retain(|item| item.product_id != product_id);
            let removed = customer.carts.len() != before;
            if removed {
                customer.updated_at = Utc::now();
            }
            Ok(removed)
        })
    }

    async fn pull_product_from_all_carts(&self, product_id: ProductId) -> Result<u64, StoreError> {
        let mut customers = write(&self.customers, "customers")?;
        let mut touched = 0;
        for customer in customers.values_mut() {
            let before = customer.carts.len();
            customer.carts.retain(|item| item.product_id != product_id);
            if customer.carts.len() != before {
                customer.updated_at = Utc::now();
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn create_transaction(
        &self,
        customer_id: CustomerId,
        transaction: &Transaction,
    ) -> Result<(), StoreError> {
        self.with_customer(customer_id, |customer| {
            if customer.transaction(&transaction.id).is_some() {
                return Err(StoreError::duplicate("transaction", transaction.id.as_str()));
            }
            customer.transactions.push(transaction.clone());
            customer.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn delete_transaction(
        &self,
        customer_id: CustomerId,
        transaction_id: &GatewayOrderId,
    ) -> Result<bool, StoreError> {
        self.with_customer(customer_id, |customer| {
            let before = customer.transactions.len();
            customer.transactions.retain(|txn| &txn.id != transaction_id);
            Ok(customer.transactions.len() != before)
        })
    }

    async fn resolve_transaction(
        &self,
        customer_id: CustomerId,
        record: &TransactionRecord,
    ) -> Result<bool, StoreError> {
        self.with_customer(customer_id, |customer| {
            let Some(index) = customer.transactions.iter().position(|txn| txn.id == record.id)
            else {
                return Ok(false);
            };
            customer.transactions.remove(index);
            customer.resolved_transactions.push(record.clone());
            customer.updated_at = Utc::now();
            Ok(true)
        })
    }

    async fn create_order(
        &self,
        customer_id: CustomerId,
        order: &OrderItem,
    ) -> Result<bool, StoreError> {
        self.with_customer(customer_id, |customer| {
            if customer.has_order(order.id) {
                return Ok(false);
            }
            customer.orders.push(order.clone());
            customer.updated_at = Utc::now();
            Ok(true)
        })
    }
}

// =============================================================================
// Merchant Repository Implementation
// =============================================================================

#[async_trait]
impl MerchantRepository for MemoryStore {
    async fn save(&self, merchant: &Merchant) -> Result<(), StoreError> {
        let mut merchants = write(&self.merchants, "merchants")?;
        merchants.insert(merchant.id, merchant.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MerchantId) -> Result<Option<Merchant>, StoreError> {
        let merchants = read(&self.merchants, "merchants")?;
        Ok(merchants.get(&id).cloned())
    }

    async fn push_product_to_manage_orders(
        &self,
        merchant_id: MerchantId,
        order: &ManageOrderProduct,
    ) -> Result<bool, StoreError> {
        let mut merchants = write(&self.merchants, "merchants")?;
        let merchant = merchants
            .get_mut(&merchant_id)
            .ok_or_else(|| StoreError::not_found("merchant", merchant_id.to_string()))?;

        if merchant.has_order(order.id) {
            return Ok(false);
        }

        merchant.balance = merchant.balance.checked_add(order.total()).ok_or_else(|| {
            StoreError::Database(format!("Balance overflow for merchant {}", merchant_id))
        })?;
        merchant.orders.push(order.clone());
        merchant.updated_at = Utc::now();
        Ok(true)
    }
}

// =============================================================================
// Product Repository Implementation
// =============================================================================

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn save(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = write(&self.products, "products")?;
        match products.get_mut(&product.id) {
            Some(stored) => stored.product = product.clone(),
            None => {
                products.insert(
                    product.id,
                    StoredProduct {
                        product: product.clone(),
                        settlements: HashSet::new(),
                    },
                );
            },
        }
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = write(&self.products, "products")?;
        let stored = products
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::not_found("product", product.id.to_string()))?;
        stored.product = product.clone();
        stored.product.updated_at = Utc::now();
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let products = read(&self.products, "products")?;
        Ok(products.get(&id).map(|stored| stored.product.clone()))
    }

    async fn find_by_merchant(&self, merchant_id: MerchantId) -> Result<Vec<Product>, StoreError> {
        let products = read(&self.products, "products")?;
        let mut found: Vec<Product> = products
            .values()
            .filter(|stored| stored.product.merchant_id == merchant_id)
            .map(|stored| stored.product.clone())
            .collect();
        found.sort_by_key(|p| p.created_at);
        Ok(found)
    }

    async fn update_quantity(&self, id: ProductId, delta: i64) -> Result<i64, StoreError> {
        let mut products = write(&self.products, "products")?;
        let stored = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("product", id.to_string()))?;
        stored.product.stock += delta;
        stored.product.updated_at = Utc::now();
        Ok(stored.product.stock)
    }

    async fn apply_settlement(
        &self,
        id: ProductId,
        key: OrderItemId,
        quantity: i64,
    ) -> Result<bool, StoreError> {
        let mut products = write(&self.products, "products")?;
        let stored = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("product", id.to_string()))?;

        if !stored.settlements.insert(key) {
            return Ok(false);
        }

        stored.product.stock -= quantity;
        stored.product.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let mut products = write(&self.products, "products")?;
        if products.remove(&id).is_some() {
            Ok(())
        } else {
            Err(StoreError::not_found("product", id.to_string()))
        }
    }
}

// =============================================================================
// Category Repository Implementation
// =============================================================================

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn save(&self, category: &Category) -> Result<(), StoreError> {
        let mut categories = write(&self.categories, "categories")?;
        categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let categories = read(&self.categories, "categories")?;
        Ok(categories.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let categories = read(&self.categories, "categories")?;
        let mut all: Vec<Category> = categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

impl Store for MemoryStore {
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
