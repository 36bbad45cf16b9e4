//! Engine error types.

use storefront_domain::ProductId;
use thiserror::Error;

/// Validation failures raised while planning a checkout or a cart change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Cart has nothing to check out
    #[error("Cart is empty")]
    EmptyCart,

    /// Quantity must be strictly positive
    #[error("Invalid quantity {quantity} for product {product_name} ({product_id})")]
    InvalidQuantity {
        product_id: ProductId,
        product_name: String,
        quantity: i64,
    },

    /// More units requested than the product has in stock
    #[error(
        "Insufficient stock for product {product_name} ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: i64,
        available: i64,
    },

    /// A line subtotal or the cart total does not fit in a decimal
    #[error("Amount overflow pricing product {product_id}")]
    AmountOverflow { product_id: ProductId },

    /// Cart references a product that was not supplied to the planner
    #[error("Product missing from checkout input: {0}")]
    MissingProduct(ProductId),
}
