//! Repository trait definitions (Ports)
//!
//! These traits define the storage interface for the domain.
//! Implementations can be PostgreSQL, in-memory, or mock for testing.
//!
//! The customer and merchant aggregates embed their collections, so the
//! repositories expose targeted operators (push, pull, set, increment)
//! instead of asking callers to rewrite whole documents.

use crate::error::StoreError;
use async_trait::async_trait;
use storefront_domain::{
    CartItem, Category, CategoryId, Customer, CustomerId, GatewayOrderId, ManageOrderProduct,
    Merchant, MerchantId, OrderItem, OrderItemId, Product, ProductId, Transaction,
    TransactionRecord,
};

/// Repository for the Customer aggregate
///
/// Every method except `save` and `find_by_id` fails with `NotFound` when the
/// customer does not exist.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Save a customer (whole-document insert or replace)
    async fn save(&self, customer: &Customer) -> Result<(), StoreError>;

    /// Find a customer by ID
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Push a new item onto the cart
    ///
    /// Fails with `Duplicate` if the product is already in the cart.
    async fn push_product_to_cart(
        &self,
        customer_id: CustomerId,
        item: CartItem,
    ) -> Result<(), StoreError>;

    /// Set the quantity of an existing cart item
    ///
    /// Fails with `NotFound` if the product is not in the cart.
    async fn update_product_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), StoreError>;

    /// Pull a product from the cart. Returns whether an item was removed.
    async fn pull_product_from_cart(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool, StoreError>;

    /// Pull a product from every customer's cart. Returns the number of carts touched.
    async fn pull_product_from_all_carts(&self, product_id: ProductId) -> Result<u64, StoreError>;

    /// Push a pending transaction
    ///
    /// Fails with `Duplicate` if a transaction with the same id is pending.
    async fn create_transaction(
        &self,
        customer_id: CustomerId,
        transaction: &Transaction,
    ) -> Result<(), StoreError>;

    /// Pull a pending transaction. Returns whether one was removed.
    async fn delete_transaction(
        &self,
        customer_id: CustomerId,
        transaction_id: &GatewayOrderId,
    ) -> Result<bool, StoreError>;

    /// Pull the pending transaction named by `record.id` and push `record`
    /// onto the resolution history, as one write.
    ///
    /// Returns false (and writes nothing) if the transaction is not pending.
    async fn resolve_transaction(
        &self,
        customer_id: CustomerId,
        record: &TransactionRecord,
    ) -> Result<bool, StoreError>;

    /// Push an order unless one with the same id is already present.
    /// Returns whether the order was inserted.
    async fn create_order(
        &self,
        customer_id: CustomerId,
        order: &OrderItem,
    ) -> Result<bool, StoreError>;
}

/// Repository for the Merchant aggregate
#[async_trait]
pub trait MerchantRepository: Send + Sync {
    /// Save a merchant (insert or replace)
    async fn save(&self, merchant: &Merchant) -> Result<(), StoreError>;

    /// Find a merchant by ID
    async fn find_by_id(&self, id: MerchantId) -> Result<Option<Merchant>, StoreError>;

    /// Push a fulfilment order and credit its total to the balance, as one write.
    ///
    /// An order whose id is already present is skipped without touching the
    /// balance. Returns whether the order was inserted.
    async fn push_product_to_manage_orders(
        &self,
        merchant_id: MerchantId,
        order: &ManageOrderProduct,
    ) -> Result<bool, StoreError>;
}

/// Repository for Product entities
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Save a product (insert or replace)
    async fn save(&self, product: &Product) -> Result<(), StoreError>;

    /// Replace an existing product
    ///
    /// Fails with `NotFound` if the product does not exist.
    async fn update(&self, product: &Product) -> Result<(), StoreError>;

    /// Find a product by ID
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Find all products listed by a merchant
    async fn find_by_merchant(&self, merchant_id: MerchantId) -> Result<Vec<Product>, StoreError>;

    /// Atomically add `delta` to the stock (negative to decrement).
    /// Returns the new stock. Stock is not clamped at zero.
    async fn update_quantity(&self, id: ProductId, delta: i64) -> Result<i64, StoreError>;

    /// Decrement stock by `quantity` once per settlement key.
    ///
    /// The key is recorded in the same write as the decrement. A key that was
    /// already applied leaves the stock untouched and returns false.
    async fn apply_settlement(
        &self,
        id: ProductId,
        key: OrderItemId,
        quantity: i64,
    ) -> Result<bool, StoreError>;

    /// Delete a product
    ///
    /// Fails with `NotFound` if the product does not exist.
    async fn delete(&self, id: ProductId) -> Result<(), StoreError>;
}

/// Repository for Category entities
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Save a category (insert or replace)
    async fn save(&self, category: &Category) -> Result<(), StoreError>;

    /// Find a category by ID
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    /// All categories ordered by name
    async fn list(&self) -> Result<Vec<Category>, StoreError>;
}

/// Combined store interface
pub trait Store: Send + Sync {
    /// Get customer repository
    fn customers(&self) -> &dyn CustomerRepository;

    /// Get merchant repository
    fn merchants(&self) -> &dyn MerchantRepository;

    /// Get product repository
    fn products(&self) -> &dyn ProductRepository;

    /// Get category repository
    fn categories(&self) -> &dyn CategoryRepository;
}
