//! Domain Entities for the Storefront
//!
//! The customer aggregate owns its cart, pending transactions, orders and
//! resolution history as embedded collections. Merchants own their
//! fulfilment orders. Products and categories form the catalog.

use crate::value_objects::{GatewayOrderId, Price, ShippingAddress, TransactionStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a Customer
pub type CustomerId = Uuid;

/// Unique identifier for a Merchant
pub type MerchantId = Uuid;

/// Unique identifier for a Product
pub type ProductId = Uuid;

/// Unique identifier for a Category
pub type CategoryId = Uuid;

/// Unique identifier shared by an OrderItem and its ManageOrderProduct twin
pub type OrderItemId = Uuid;

/// Namespace for settlement-derived order ids (UUID v5)
const SETTLEMENT_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0x2c, 0x1a, 0x94, 0x3b, 0x0e, 0x4d, 0x58, 0x9a, 0x71, 0xc4, 0x25, 0x8e, 0x10, 0xd3, 0x6b,
]);

// =============================================================================
// Customer
// =============================================================================

/// Customer aggregate
///
/// The embedded collections belong to this document only. Repositories update
/// them with targeted operators (push, pull, set) rather than rewriting the
/// whole customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,

    /// At most one item per product
    pub carts: Vec<CartItem>,
    /// Charges submitted to the gateway and not yet resolved
    pub transactions: Vec<Transaction>,
    /// Settled purchases
    pub orders: Vec<OrderItem>,
    /// Terminal-state history of transactions removed from `transactions`
    pub resolved_transactions: Vec<TransactionRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a new customer with empty collections
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            carts: Vec::new(),
            transactions: Vec::new(),
            orders: Vec::new(),
            resolved_transactions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find the cart entry for a product
    pub fn cart_item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.carts.iter().find(|item| item.product_id == product_id)
    }

    /// Find a pending transaction by gateway order id (linear search)
    pub fn transaction(&self, id: &GatewayOrderId) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| &txn.id == id)
    }

    /// Find the resolution record of a transaction that already left the pending list
    pub fn resolved_transaction(&self, id: &GatewayOrderId) -> Option<&TransactionRecord> {
        self.resolved_transactions.iter().find(|record| &record.id == id)
    }

    /// Check whether an order with the given id is already recorded
    pub fn has_order(&self, id: OrderItemId) -> bool {
        self.orders.iter().any(|order| order.id == id)
    }
}

/// A line in the customer's cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    /// Requested units; validated against stock at checkout
    pub quantity: i64,
}

impl CartItem {
    /// Create a cart item
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A charge submitted to the payment gateway
///
/// The id is the gateway order id, not a locally generated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: GatewayOrderId,
    pub payment_type: String,
    pub status: TransactionStatus,
    /// Payer instructions returned by the gateway (redirect, QR code, ...)
    pub actions: Vec<TransactionAction>,
    /// Price and quantity snapshot taken at checkout
    pub products: Vec<TransactionProduct>,
    pub address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a pending transaction
    pub fn pending(
        id: GatewayOrderId,
        payment_type: impl Into<String>,
        actions: Vec<TransactionAction>,
        products: Vec<TransactionProduct>,
        address: ShippingAddress,
    ) -> Self {
        Self {
            id,
            payment_type: payment_type.into(),
            status: TransactionStatus::Pending,
            actions,
            products,
            address,
            created_at: Utc::now(),
        }
    }

    /// Sum of price × quantity over the snapshot
    pub fn total(&self) -> Decimal {
        self.products
            .iter()
            .map(TransactionProduct::subtotal)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

/// Payer instruction returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAction {
    pub name: String,
    pub method: String,
    pub url: String,
}

/// Snapshot of one purchased product inside a transaction
///
/// Decoupled from the live product price so totals do not drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionProduct {
    pub product_id: ProductId,
    pub price: Price,
    pub quantity: i64,
}

impl TransactionProduct {
    /// price × quantity
    pub fn subtotal(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// Terminal-state record kept after a transaction leaves the pending list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: GatewayOrderId,
    /// Success or Failed, never Pending
    pub outcome: TransactionStatus,
    pub payment_type: String,
    pub resolved_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Record the resolution of a transaction
    pub fn resolve(transaction: &Transaction, outcome: TransactionStatus) -> Self {
        Self {
            id: transaction.id.clone(),
            outcome,
            payment_type: transaction.payment_type.clone(),
            resolved_at: Utc::now(),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Customer-side order ("my orders")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub price: Price,
    pub quantity: i64,
    pub address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    /// Deterministic order id for one product of a settled transaction
    ///
    /// A replayed settlement derives the same id, which lets every write
    /// target detect that it already holds the order.
    pub fn settlement_id(transaction_id: &GatewayOrderId, product_id: ProductId) -> OrderItemId {
        let name = format!("{}:{}", transaction_id, product_id);
        Uuid::new_v5(&SETTLEMENT_NAMESPACE, name.as_bytes())
    }

    /// Materialize the customer-side order from a transaction snapshot
    pub fn from_settlement(transaction: &Transaction, product: &TransactionProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Self::settlement_id(&transaction.id, product.product_id),
            product_id: product.product_id,
            price: product.price,
            quantity: product.quantity,
            address: transaction.address.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// price × quantity
    pub fn total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// Merchant-side order ("orders to fulfil")
///
/// Independent copy of the customer's OrderItem, sharing its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageOrderProduct {
    pub id: OrderItemId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub price: Price,
    pub quantity: i64,
    pub address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ManageOrderProduct {
    /// Twin of a customer order for the merchant that owns the product
    pub fn for_order(customer_id: CustomerId, order: &OrderItem) -> Self {
        Self {
            id: order.id,
            customer_id,
            product_id: order.product_id,
            price: order.price,
            quantity: order.quantity,
            address: order.address.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }

    /// price × quantity, credited to the merchant balance
    pub fn total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Merchant selling products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Sum of settled order totals
    pub balance: Decimal,
    pub orders: Vec<ManageOrderProduct>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Merchant {
    /// Create a merchant with zero balance and no orders
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            address: String::new(),
            balance: Decimal::ZERO,
            orders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether an order with the given id is already recorded
    pub fn has_order(&self, id: OrderItemId) -> bool {
        self.orders.iter().any(|order| order.id == id)
    }
}

/// Product listed by a merchant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub merchant_id: MerchantId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Units available; decremented only at settlement
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a product
    pub fn new(merchant_id: MerchantId, name: impl Into<String>, price: Price, stock: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            merchant_id,
            category_id: None,
            name: name.into(),
            description: String::new(),
            price,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Assign a category
    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Create a category
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
