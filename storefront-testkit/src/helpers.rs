//! Test helper functions for store seeding.

use rust_decimal::Decimal;

use storefront_domain::{
    CartItem, Customer, Merchant, Price, Product, ProductId, ShippingAddress,
};
use storefront_store::Store;

use crate::Result;

/// One merchant with one product, the shape most scenarios start from.
pub struct Catalog {
    pub merchant: Merchant,
    pub product: Product,
}

impl Catalog {
    /// Seed "Kopi Co" selling `name` at `price` with `stock` units.
    pub async fn seed<S: Store>(store: &S, name: &str, price: Decimal, stock: i64) -> Result<Self> {
        let merchant = seed_merchant(store, "Kopi Co").await?;
        let product = seed_product(store, &merchant, name, price, stock).await?;
        Ok(Self { merchant, product })
    }
}

/// Seed a merchant with zero balance and no orders.
pub async fn seed_merchant<S: Store>(store: &S, name: &str) -> Result<Merchant> {
    let slug = name.to_lowercase().replace(' ', "");
    let merchant = Merchant::new(name, format!("{}@example.com", slug), "081300000000");
    store.merchants().save(&merchant).await?;
    Ok(merchant)
}

/// Seed a product owned by `merchant`.
pub async fn seed_product<S: Store>(
    store: &S,
    merchant: &Merchant,
    name: &str,
    price: Decimal,
    stock: i64,
) -> Result<Product> {
    let product = Product::new(merchant.id, name, Price::new(price)?, stock);
    store.products().save(&product).await?;
    Ok(product)
}

/// Seed a customer with an empty cart.
pub async fn seed_customer<S: Store>(store: &S, name: &str) -> Result<Customer> {
    seed_customer_with_cart(store, name, &[]).await
}

/// Seed a customer whose cart holds `items` as `(product, quantity)` pairs.
///
/// Quantities are written as given, without stock checks, so tests can
/// build carts that checkout must reject.
pub async fn seed_customer_with_cart<S: Store>(
    store: &S,
    name: &str,
    items: &[(ProductId, i64)],
) -> Result<Customer> {
    let slug = name.to_lowercase().replace(' ', "");
    let mut customer = Customer::new(name, format!("{}@example.com", slug), "081200000000");
    customer.carts = items
        .iter()
        .map(|(product_id, quantity)| CartItem::new(*product_id, *quantity))
        .collect();
    store.customers().save(&customer).await?;
    Ok(customer)
}

/// A complete shipping address.
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        recipient_name: "Budi Santoso".to_string(),
        phone: "081234567890".to_string(),
        street: "Jl. Merdeka No. 10".to_string(),
        city: "Bandung".to_string(),
        province: "Jawa Barat".to_string(),
        postal_code: "40111".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use storefront_store::MemoryStore;

    #[tokio::test]
    async fn test_seeded_cart_is_stored() {
        let store = MemoryStore::new();
        let catalog = Catalog::seed(&store, "Arabica", dec!(30000), 5).await.unwrap();
        let customer =
            seed_customer_with_cart(&store, "Budi", &[(catalog.product.id, 2)]).await.unwrap();

        let stored = store.customers().find_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(stored.carts.len(), 1);
        assert_eq!(stored.carts[0].quantity, 2);
        assert_eq!(catalog.product.merchant_id, catalog.merchant.id);
    }

    #[test]
    fn test_shipping_address_is_complete() {
        assert!(shipping_address().validate().is_ok());
    }
}
