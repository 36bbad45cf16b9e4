//! Storefront Domain Layer
//!
//! Pure domain types with zero I/O dependencies.
//! Contains the customer aggregate (cart, pending transactions, orders),
//! the catalog entities, and validated value objects.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{
    CartItem, Category, CategoryId, Customer, CustomerId, ManageOrderProduct, Merchant,
    MerchantId, OrderItem, OrderItemId, Product, ProductId, Transaction, TransactionAction,
    TransactionProduct, TransactionRecord,
};
pub use value_objects::{DomainError, GatewayOrderId, Price, ShippingAddress, TransactionStatus};
