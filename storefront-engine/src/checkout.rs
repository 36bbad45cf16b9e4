//! Checkout planning.
//!
//! Given a customer's cart and the live products it references, decide
//! whether the cart can be charged and what the charge contains. Pricing
//! always uses the live product price; the resulting lines become the
//! transaction snapshot.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use storefront_domain::{CartItem, MerchantId, Price, Product, ProductId, TransactionProduct};

use crate::error::EngineError;

/// One priced line of a checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub merchant_id: MerchantId,
    pub name: String,
    /// Live price at checkout time
    pub price: Price,
    pub quantity: i64,
}

impl CheckoutLine {
    /// price × quantity
    ///
    /// # Errors
    ///
    /// `EngineError::AmountOverflow` when price × quantity does not fit in a decimal
    pub fn subtotal(&self) -> Result<Decimal, EngineError> {
        self.price
            .checked_times(self.quantity)
            .ok_or(EngineError::AmountOverflow { product_id: self.product_id })
    }

    /// Snapshot stored on the pending transaction
    pub fn snapshot(&self) -> TransactionProduct {
        TransactionProduct {
            product_id: self.product_id,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// Validated, priced cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPlan {
    /// Lines in cart order
    pub lines: Vec<CheckoutLine>,
    /// Sum of line subtotals
    pub gross_amount: Decimal,
}

impl CheckoutPlan {
    /// Snapshots for the pending transaction
    pub fn snapshots(&self) -> Vec<TransactionProduct> {
        self.lines.iter().map(CheckoutLine::snapshot).collect()
    }
}

/// Enforce `0 < quantity <= product.stock`.
///
/// # Errors
///
/// - `EngineError::InvalidQuantity` when quantity is zero or negative
/// - `EngineError::InsufficientStock` when quantity exceeds stock, naming the
///   product and the units available
pub fn validate_quantity(product: &Product, quantity: i64) -> Result<(), EngineError> {
    if quantity <= 0 {
        return Err(EngineError::InvalidQuantity {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
        });
    }

    if quantity > product.stock {
        return Err(EngineError::InsufficientStock {
            product_id: product.id,
            product_name: product.name.clone(),
            requested: quantity,
            available: product.stock,
        });
    }

    Ok(())
}

/// Validate and price a cart.
///
/// Every item is validated before a plan is returned, so a caller that only
/// mutates state after a successful plan never acts on a cart it rejects.
///
/// # Errors
///
/// - `EngineError::EmptyCart` for an empty cart
/// - `EngineError::MissingProduct` if `products` lacks an entry for a cart item
/// - `EngineError::AmountOverflow` if a subtotal or the total leaves the decimal range
/// - Any error from [`validate_quantity`]
pub fn plan_checkout(
    cart: &[CartItem],
    products: &HashMap<ProductId, Product>,
) -> Result<CheckoutPlan, EngineError> {
    if cart.is_empty() {
        return Err(EngineError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(cart.len());
    let mut gross_amount = Decimal::ZERO;

    for item in cart {
        let product = products
            .get(&item.product_id)
            .ok_or(EngineError::MissingProduct(item.product_id))?;

        validate_quantity(product, item.quantity)?;

        let line = CheckoutLine {
            product_id: product.id,
            merchant_id: product.merchant_id,
            name: product.name.clone(),
            price: product.price,
            quantity: item.quantity,
        };

        debug!(
            product_id = %line.product_id,
            quantity = line.quantity,
            price = %line.price,
            "Checkout line priced"
        );

        gross_amount = gross_amount
            .checked_add(line.subtotal()?)
            .ok_or(EngineError::AmountOverflow { product_id: line.product_id })?;
        lines.push(line);
    }

    Ok(CheckoutPlan { lines, gross_amount })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn product(name: &str, price: Decimal, stock: i64) -> Product {
        Product::new(Uuid::now_v7(), name, Price::new(price).unwrap(), stock)
    }

    fn catalog(products: &[&Product]) -> HashMap<ProductId, Product> {
        products.iter().map(|p| (p.id, (*p).clone())).collect()
    }

    #[test]
    fn test_plan_single_line() {
        let p1 = product("Arabica", dec!(30000), 5);
        let cart = vec![CartItem::new(p1.id, 2)];

        let plan = plan_checkout(&cart, &catalog(&[&p1])).unwrap();

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.gross_amount, dec!(60000));
        assert_eq!(plan.lines[0].merchant_id, p1.merchant_id);

        let snapshots = plan.snapshots();
        assert_eq!(snapshots[0].price.as_decimal(), dec!(30000));
        assert_eq!(snapshots[0].quantity, 2);
    }

    #[test]
    fn test_plan_sums_multiple_lines() {
        let p1 = product("Arabica", dec!(30000), 5);
        let p2 = product("Robusta", dec!(12500.50), 10);
        let cart = vec![CartItem::new(p1.id, 1), CartItem::new(p2.id, 4)];

        let plan = plan_checkout(&cart, &catalog(&[&p1, &p2])).unwrap();

        assert_eq!(plan.gross_amount, dec!(80002));
        assert_eq!(plan.lines[1].name, "Robusta");
    }

    #[test]
    fn test_plan_uses_live_price() {
        let mut p1 = product("Arabica", dec!(30000), 5);
        p1.price = Price::new(dec!(35000)).unwrap();
        let cart = vec![CartItem::new(p1.id, 1)];

        let plan = plan_checkout(&cart, &catalog(&[&p1])).unwrap();

        assert_eq!(plan.gross_amount, dec!(35000));
    }

    #[test]
    fn test_empty_cart_rejected() {
        let result = plan_checkout(&[], &HashMap::new());
        assert_eq!(result, Err(EngineError::EmptyCart));
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let p1 = product("Arabica", dec!(30000), 1);
        let cart = vec![CartItem::new(p1.id, 2)];

        let err = plan_checkout(&cart, &catalog(&[&p1])).unwrap_err();

        assert_eq!(
            err,
            EngineError::InsufficientStock {
                product_id: p1.id,
                product_name: "Arabica".to_string(),
                requested: 2,
                available: 1,
            }
        );
        assert!(err.to_string().contains("Arabica"));
        assert!(err.to_string().contains("available 1"));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let p1 = product("Arabica", dec!(30000), 5);

        assert!(matches!(
            validate_quantity(&p1, 0),
            Err(EngineError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            validate_quantity(&p1, -3),
            Err(EngineError::InvalidQuantity { quantity: -3, .. })
        ));
        assert!(validate_quantity(&p1, 5).is_ok());
    }

    #[test]
    fn test_later_invalid_line_rejects_whole_cart() {
        let p1 = product("Arabica", dec!(30000), 5);
        let p2 = product("Robusta", dec!(10000), 0);
        let cart = vec![CartItem::new(p1.id, 1), CartItem::new(p2.id, 1)];

        let result = plan_checkout(&cart, &catalog(&[&p1, &p2]));

        assert!(matches!(result, Err(EngineError::InsufficientStock { .. })));
    }

    #[test]
    fn test_line_overflow_is_an_error() {
        let p1 = product("Vault", dec!(10000000000000000), 10_000_000_000_000);
        let cart = vec![CartItem::new(p1.id, 10_000_000_000_000)];

        assert_eq!(
            plan_checkout(&cart, &catalog(&[&p1])),
            Err(EngineError::AmountOverflow { product_id: p1.id })
        );
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        // Each line fits, their sum does not
        let p1 = product("Vault", dec!(50000000000000000), 1_000_000_000_000);
        let p2 = product("Safe", dec!(50000000000000000), 1_000_000_000_000);
        let cart = vec![
            CartItem::new(p1.id, 1_000_000_000_000),
            CartItem::new(p2.id, 1_000_000_000_000),
        ];

        assert_eq!(
            plan_checkout(&cart, &catalog(&[&p1, &p2])),
            Err(EngineError::AmountOverflow { product_id: p2.id })
        );
    }

    #[test]
    fn test_missing_product_reported() {
        let missing = Uuid::now_v7();
        let cart = vec![CartItem::new(missing, 1)];

        assert_eq!(
            plan_checkout(&cart, &HashMap::new()),
            Err(EngineError::MissingProduct(missing))
        );
    }
}
