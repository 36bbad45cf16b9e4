//! Checkout Orchestrator: cart → charge → pending transaction.
//!
//! # Flow
//!
//! ```text
//! load customer → load products → plan (validate + price) → load merchants
//!   → drain cart → charge gateway → persist pending Transaction
//! ```
//!
//! Stock is not reserved. The cart is drained before the gateway is called
//! and is not restored if the charge fails.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use storefront_domain::{
    CustomerId, GatewayOrderId, MerchantId, ShippingAddress, Transaction, TransactionAction,
    TransactionStatus,
};
use storefront_engine::{filter_actions, plan_checkout, EngineError};
use storefront_store::Store;

use crate::deadline::Deadlines;
use crate::error::{ExecError, ExecResult};
use crate::ports::{ChargeItem, ChargeRequest, CustomerDetails, PaymentGateway};

/// Payment type requested when none is configured
pub const DEFAULT_PAYMENT_TYPE: &str = "gopay";

/// What the client needs to send the payer on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub transaction_id: GatewayOrderId,
    pub payment_type: String,
    pub status: TransactionStatus,
    /// Whitelisted payer instructions
    pub actions: Vec<TransactionAction>,
    pub total_price: Decimal,
}

/// Builds and submits charges from customer carts.
pub struct CheckoutOrchestrator<G: PaymentGateway, S: Store> {
    gateway: Arc<G>,
    store: Arc<S>,
    deadlines: Deadlines,
    payment_type: String,
}

impl<G: PaymentGateway, S: Store> CheckoutOrchestrator<G, S> {
    /// Create an orchestrator with default deadlines and payment type.
    pub fn new(gateway: Arc<G>, store: Arc<S>) -> Self {
        Self {
            gateway,
            store,
            deadlines: Deadlines::default(),
            payment_type: DEFAULT_PAYMENT_TYPE.to_string(),
        }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Payment type requested on every charge
    pub fn with_payment_type(mut self, payment_type: impl Into<String>) -> Self {
        self.payment_type = payment_type.into();
        self
    }

    /// Check out the customer's whole cart.
    ///
    /// # Errors
    ///
    /// - `Domain` if the shipping address is incomplete
    /// - `NotFound` if the customer, a product or its merchant is missing
    /// - `Engine` (validation) for an empty cart or a quantity outside `1..=stock`
    /// - `Upstream` / `Timeout` if the charge fails; the cart stays drained
    pub async fn create(
        &self,
        customer_id: CustomerId,
        address: ShippingAddress,
    ) -> ExecResult<TransactionSummary> {
        address.validate()?;

        let customer = self
            .deadlines
            .store("find customer", self.store.customers().find_by_id(customer_id))
            .await?
            .ok_or_else(|| ExecError::not_found("customer", customer_id))?;

        if customer.carts.is_empty() {
            return Err(EngineError::EmptyCart.into());
        }

        // 1. Load every product the cart references
        let mut products = HashMap::with_capacity(customer.carts.len());
        for item in &customer.carts {
            let product = self
                .deadlines
                .store("find product", self.store.products().find_by_id(item.product_id))
                .await?
                .ok_or_else(|| ExecError::not_found("product", item.product_id))?;
            products.insert(product.id, product);
        }

        // 2. Validate and price; nothing has been written yet
        let plan = plan_checkout(&customer.carts, &products)?;

        // 3. Owning merchants, for line item display
        let mut merchant_names: HashMap<MerchantId, String> = HashMap::new();
        for line in &plan.lines {
            if merchant_names.contains_key(&line.merchant_id) {
                continue;
            }
            let merchant = self
                .deadlines
                .store("find merchant", self.store.merchants().find_by_id(line.merchant_id))
                .await?
                .ok_or_else(|| ExecError::not_found("merchant", line.merchant_id))?;
            merchant_names.insert(merchant.id, merchant.name);
        }

        // 4. Drain the cart
        for line in &plan.lines {
            self.deadlines
                .store(
                    "pull cart item",
                    self.store.customers().pull_product_from_cart(customer_id, line.product_id),
                )
                .await?;
            debug!(%customer_id, product_id = %line.product_id, "Cart item consumed");
        }

        // 5. Submit the charge
        let request = ChargeRequest {
            order_id: GatewayOrderId::generate(),
            payment_type: self.payment_type.clone(),
            gross_amount: plan.gross_amount,
            items: plan
                .lines
                .iter()
                .map(|line| ChargeItem {
                    id: line.product_id.to_string(),
                    name: line.name.clone(),
                    price: line.price.as_decimal(),
                    quantity: line.quantity,
                    merchant_name: merchant_names.get(&line.merchant_id).cloned().unwrap_or_default(),
                })
                .collect(),
            customer: CustomerDetails {
                name: customer.name.clone(),
                email: customer.email.clone(),
                phone: customer.phone.clone(),
                shipping_address: address.clone(),
            },
            correlation_id: customer_id.to_string(),
        };

        info!(
            %customer_id,
            order_id = %request.order_id,
            gross_amount = %request.gross_amount,
            items = request.items.len(),
            "Submitting charge"
        );

        let response = match self
            .deadlines
            .gateway("create charge", self.gateway.create_transaction(&request))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    %customer_id,
                    order_id = %request.order_id,
                    error = %e,
                    "Charge failed after cart was drained"
                );
                return Err(e);
            },
        };

        // 6. Persist the pending transaction under the gateway's id
        let transaction_id = match GatewayOrderId::new(response.order_id.as_str()) {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    %customer_id,
                    order_id = %request.order_id,
                    gateway_order_id = %response.order_id,
                    error = %e,
                    "Gateway returned an unusable order id for a live charge"
                );
                return Err(ExecError::Upstream(format!(
                    "Gateway order id {:?} for charge {} is malformed: {}",
                    response.order_id, request.order_id, e
                )));
            },
        };
        let actions = filter_actions(response.actions);
        let transaction = Transaction::pending(
            transaction_id.clone(),
            response.payment_type,
            actions,
            plan.snapshots(),
            address,
        );

        self.deadlines
            .store(
                "create transaction",
                self.store.customers().create_transaction(customer_id, &transaction),
            )
            .await?;

        info!(
            %customer_id,
            transaction_id = %transaction.id,
            payment_type = %transaction.payment_type,
            total = %plan.gross_amount,
            "Pending transaction stored"
        );

        Ok(TransactionSummary {
            transaction_id,
            payment_type: transaction.payment_type,
            status: transaction.status,
            actions: transaction.actions,
            total_price: plan.gross_amount,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::stub::StubGateway;
    use rust_decimal_macros::dec;
    use storefront_domain::{CartItem, Customer, Merchant, Price, Product};
    use storefront_store::MemoryStore;

    fn address() -> ShippingAddress {
        ShippingAddress {
            recipient_name: "Budi".to_string(),
            phone: "08123456789".to_string(),
            street: "Jl. Merdeka 10".to_string(),
            city: "Bandung".to_string(),
            province: "Jawa Barat".to_string(),
            postal_code: "40111".to_string(),
        }
    }

    struct Fixture {
        gateway: Arc<StubGateway>,
        store: Arc<MemoryStore>,
        customer: Customer,
        product: Product,
    }

    async fn fixture(stock: i64, quantity: i64) -> Fixture {
        priced_fixture(dec!(30000), stock, quantity).await
    }

    async fn priced_fixture(price: Decimal, stock: i64, quantity: i64) -> Fixture {
        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(MemoryStore::new());

        let merchant = Merchant::new("Kopi Co", "kopi@example.com", "0813");
        store.merchants().save(&merchant).await.unwrap();

        let product = Product::new(merchant.id, "Arabica", Price::new(price).unwrap(), stock);
        store.products().save(&product).await.unwrap();

        let mut customer = Customer::new("Budi", "budi@example.com", "0812");
        customer.carts.push(CartItem::new(product.id, quantity));
        store.customers().save(&customer).await.unwrap();

        Fixture { gateway, store, customer, product }
    }

    fn orchestrator(f: &Fixture) -> CheckoutOrchestrator<StubGateway, MemoryStore> {
        CheckoutOrchestrator::new(f.gateway.clone(), f.store.clone())
    }

    #[tokio::test]
    async fn test_checkout_stores_pending_transaction() {
        let f = fixture(5, 2).await;
        f.gateway.set_next_order_id("T1");

        let summary = orchestrator(&f).create(f.customer.id, address()).await.unwrap();

        assert_eq!(summary.transaction_id.as_str(), "T1");
        assert_eq!(summary.payment_type, "gopay");
        assert_eq!(summary.status, TransactionStatus::Pending);
        assert_eq!(summary.total_price, dec!(60000));

        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert!(customer.carts.is_empty());
        assert_eq!(customer.transactions.len(), 1);
        assert_eq!(customer.transactions[0].products[0].quantity, 2);

        let product = f.store.products().find_by_id(f.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn test_charge_carries_correlation_and_merchant() {
        let f = fixture(5, 2).await;

        let summary = orchestrator(&f).create(f.customer.id, address()).await.unwrap();

        let charge = f.gateway.charge(summary.transaction_id.as_str()).unwrap();
        assert_eq!(charge.correlation_id, f.customer.id.to_string());
        assert_eq!(charge.gross_amount, dec!(60000));
        assert_eq!(charge.items[0].merchant_name, "Kopi Co");
        assert_eq!(charge.items[0].id, f.product.id.to_string());
    }

    #[tokio::test]
    async fn test_configured_payment_type_requested() {
        let f = fixture(5, 1).await;

        let summary = orchestrator(&f)
            .with_payment_type("qris")
            .create(f.customer.id, address())
            .await
            .unwrap();

        assert_eq!(summary.payment_type, "qris");
    }

    #[tokio::test]
    async fn test_unknown_actions_filtered() {
        let f = fixture(5, 1).await;
        f.gateway.set_actions(vec![
            TransactionAction {
                name: "deeplink-redirect".to_string(),
                method: "GET".to_string(),
                url: "https://gateway.stub/deeplink".to_string(),
            },
            TransactionAction {
                name: "surprise".to_string(),
                method: "POST".to_string(),
                url: "https://gateway.stub/surprise".to_string(),
            },
        ]);

        let summary = orchestrator(&f).create(f.customer.id, address()).await.unwrap();

        assert_eq!(summary.actions.len(), 1);
        assert_eq!(summary.actions[0].name, "deeplink-redirect");
    }

    #[tokio::test]
    async fn test_missing_customer() {
        let f = fixture(5, 1).await;

        let err = orchestrator(&f).create(uuid::Uuid::now_v7(), address()).await.unwrap_err();

        assert!(matches!(err, ExecError::NotFound { ref entity_type, .. } if entity_type == "customer"));
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let f = fixture(5, 1).await;
        f.store.customers().pull_product_from_cart(f.customer.id, f.product.id).await.unwrap();

        let err = orchestrator(&f).create(f.customer.id, address()).await.unwrap_err();

        assert!(matches!(err, ExecError::Engine(EngineError::EmptyCart)));
        assert_eq!(f.gateway.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_address_rejected() {
        let f = fixture(5, 1).await;
        let mut bad = address();
        bad.postal_code = String::new();

        let err = orchestrator(&f).create(f.customer.id, bad).await.unwrap_err();

        assert!(matches!(err, ExecError::Domain(_)));
        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert_eq!(customer.carts.len(), 1);
    }

    #[tokio::test]
    async fn test_vanished_product_is_not_found() {
        let f = fixture(5, 1).await;
        f.store.products().delete(f.product.id).await.unwrap();

        let err = orchestrator(&f).create(f.customer.id, address()).await.unwrap_err();

        assert!(matches!(err, ExecError::NotFound { ref entity_type, .. } if entity_type == "product"));
    }

    #[tokio::test]
    async fn test_amount_overflow_rejected_before_drain() {
        let f = priced_fixture(dec!(10000000000000000), 10_000_000_000_000, 10_000_000_000_000).await;

        let err = orchestrator(&f).create(f.customer.id, address()).await.unwrap_err();

        assert!(matches!(err, ExecError::Engine(EngineError::AmountOverflow { .. })));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(f.gateway.create_calls(), 0);
        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert_eq!(customer.carts.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_gateway_order_id_rejected() {
        let f = fixture(5, 1).await;
        f.gateway.set_next_order_id("bad id with spaces");

        let err = orchestrator(&f).create(f.customer.id, address()).await.unwrap_err();

        assert!(matches!(err, ExecError::Upstream(_)));
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(f.gateway.create_calls(), 1);

        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert!(customer.carts.is_empty());
        assert!(customer.transactions.is_empty());
    }
}
