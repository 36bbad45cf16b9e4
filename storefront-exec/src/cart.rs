//! Cart operations over the customer aggregate.
//!
//! Each mutation is a single atomic cart operator on the store. Quantities are
//! checked against live stock when they are set, and again at checkout.

use std::sync::Arc;

use tracing::{debug, info};

use storefront_domain::{CartItem, CustomerId, Product, ProductId};
use storefront_engine::validate_quantity;
use storefront_store::Store;

use crate::deadline::Deadlines;
use crate::error::{ExecError, ExecResult};

/// Cart and catalog maintenance operations.
pub struct CartService<S: Store> {
    store: Arc<S>,
    deadlines: Deadlines,
}

impl<S: Store> CartService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, deadlines: Deadlines::default() }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Put `quantity` of a product in the cart.
    ///
    /// A product already in the cart has its quantity replaced, so the cart
    /// keeps one item per product. Returns the resulting cart.
    pub async fn add_to_cart(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: i64,
    ) -> ExecResult<Vec<CartItem>> {
        let customer = self
            .deadlines
            .store("find customer", self.store.customers().find_by_id(customer_id))
            .await?
            .ok_or_else(|| ExecError::not_found("customer", customer_id))?;

        let product = self.product(product_id).await?;
        validate_quantity(&product, quantity)?;

        if customer.cart_item(product_id).is_some() {
            self.deadlines
                .store(
                    "update cart quantity",
                    self.store.customers().update_product_quantity(customer_id, product_id, quantity),
                )
                .await?;
        } else {
            self.deadlines
                .store(
                    "push cart item",
                    self.store.customers().push_product_to_cart(customer_id, CartItem::new(product_id, quantity)),
                )
                .await?;
        }

        debug!(%customer_id, %product_id, quantity, "Cart item set");
        self.cart(customer_id).await
    }

    /// Change the quantity of an item already in the cart.
    pub async fn update_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: i64,
    ) -> ExecResult<Vec<CartItem>> {
        let customer = self
            .deadlines
            .store("find customer", self.store.customers().find_by_id(customer_id))
            .await?
            .ok_or_else(|| ExecError::not_found("customer", customer_id))?;

        if customer.cart_item(product_id).is_none() {
            return Err(ExecError::not_found("cart item", product_id));
        }

        let product = self.product(product_id).await?;
        validate_quantity(&product, quantity)?;

        self.deadlines
            .store(
                "update cart quantity",
                self.store.customers().update_product_quantity(customer_id, product_id, quantity),
            )
            .await?;

        debug!(%customer_id, %product_id, quantity, "Cart quantity updated");
        self.cart(customer_id).await
    }

    /// Take a product out of the cart.
    pub async fn remove_from_cart(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> ExecResult<Vec<CartItem>> {
        let removed = self
            .deadlines
            .store(
                "pull cart item",
                self.store.customers().pull_product_from_cart(customer_id, product_id),
            )
            .await?;

        if !removed {
            return Err(ExecError::not_found("cart item", product_id));
        }

        debug!(%customer_id, %product_id, "Cart item removed");
        self.cart(customer_id).await
    }

    /// Delete a product from the catalog and from every cart holding it.
    ///
    /// Returns the number of carts the product was pulled from. Pending
    /// transactions keep their snapshot; a later settlement for the product
    /// fails with `NotFound`.
    pub async fn delete_product(&self, product_id: ProductId) -> ExecResult<u64> {
        self.deadlines
            .store("delete product", self.store.products().delete(product_id))
            .await?;

        let carts = self
            .deadlines
            .store(
                "pull from all carts",
                self.store.customers().pull_product_from_all_carts(product_id),
            )
            .await?;

        info!(%product_id, carts, "Product deleted");
        Ok(carts)
    }

    async fn product(&self, product_id: ProductId) -> ExecResult<Product> {
        self.deadlines
            .store("find product", self.store.products().find_by_id(product_id))
            .await?
            .ok_or_else(|| ExecError::not_found("product", product_id))
    }

    async fn cart(&self, customer_id: CustomerId) -> ExecResult<Vec<CartItem>> {
        let customer = self
            .deadlines
            .store("find customer", self.store.customers().find_by_id(customer_id))
            .await?
            .ok_or_else(|| ExecError::not_found("customer", customer_id))?;
        Ok(customer.carts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;
    use storefront_domain::{Customer, Merchant, Price};
    use storefront_engine::EngineError;
    use storefront_store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        customer: Customer,
        product: Product,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let merchant = Merchant::new("Kopi Co", "kopi@example.com", "0813");
        store.merchants().save(&merchant).await.unwrap();
        let product = Product::new(merchant.id, "Arabica", Price::new(dec!(30000)).unwrap(), 5);
        store.products().save(&product).await.unwrap();
        let customer = Customer::new("Budi", "budi@example.com", "0812");
        store.customers().save(&customer).await.unwrap();
        Fixture { store, customer, product }
    }

    #[tokio::test]
    async fn test_add_twice_keeps_one_item() {
        let f = fixture().await;
        let service = CartService::new(f.store.clone());

        service.add_to_cart(f.customer.id, f.product.id, 2).await.unwrap();
        let cart = service.add_to_cart(f.customer.id, f.product.id, 4).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_quantities() {
        let f = fixture().await;
        let service = CartService::new(f.store.clone());

        let err = service.add_to_cart(f.customer.id, f.product.id, 0).await.unwrap_err();
        assert!(matches!(err, ExecError::Engine(EngineError::InvalidQuantity { .. })));

        let err = service.add_to_cart(f.customer.id, f.product.id, 6).await.unwrap_err();
        assert!(matches!(err, ExecError::Engine(EngineError::InsufficientStock { .. })));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let f = fixture().await;
        let err = CartService::new(f.store.clone())
            .add_to_cart(f.customer.id, uuid::Uuid::now_v7(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_requires_item_in_cart() {
        let f = fixture().await;
        let service = CartService::new(f.store.clone());

        let err = service.update_quantity(f.customer.id, f.product.id, 1).await.unwrap_err();
        assert!(matches!(err, ExecError::NotFound { ref entity_type, .. } if entity_type == "cart item"));

        service.add_to_cart(f.customer.id, f.product.id, 1).await.unwrap();
        let cart = service.update_quantity(f.customer.id, f.product.id, 3).await.unwrap();
        assert_eq!(cart[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_remove_from_cart() {
        let f = fixture().await;
        let service = CartService::new(f.store.clone());
        service.add_to_cart(f.customer.id, f.product.id, 1).await.unwrap();

        let cart = service.remove_from_cart(f.customer.id, f.product.id).await.unwrap();
        assert!(cart.is_empty());

        let err = service.remove_from_cart(f.customer.id, f.product.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_product_pulls_from_carts() {
        let f = fixture().await;
        let service = CartService::new(f.store.clone());
        service.add_to_cart(f.customer.id, f.product.id, 1).await.unwrap();

        let other = Customer::new("Sari", "sari@example.com", "0814");
        f.store.customers().save(&other).await.unwrap();
        service.add_to_cart(other.id, f.product.id, 2).await.unwrap();

        assert_eq!(service.delete_product(f.product.id).await.unwrap(), 2);
        assert!(f.store.products().find_by_id(f.product.id).await.unwrap().is_none());

        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert!(customer.carts.is_empty());

        let err = service.delete_product(f.product.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
