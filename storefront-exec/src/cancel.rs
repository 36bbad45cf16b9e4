//! Cancellation of pending transactions.
//!
//! Cancel only asks the gateway. The local transaction stays pending until
//! the gateway's callback resolves it through the reconciler.

use std::sync::Arc;

use tracing::{info, warn};

use storefront_domain::{CustomerId, GatewayOrderId};
use storefront_store::Store;

use crate::deadline::Deadlines;
use crate::error::{ExecError, ExecResult};
use crate::ports::PaymentGateway;

/// Forwards cancel requests for a customer's pending transactions.
pub struct TransactionCanceller<G: PaymentGateway, S: Store> {
    gateway: Arc<G>,
    store: Arc<S>,
    deadlines: Deadlines,
}

impl<G: PaymentGateway, S: Store> TransactionCanceller<G, S> {
    pub fn new(gateway: Arc<G>, store: Arc<S>) -> Self {
        Self { gateway, store, deadlines: Deadlines::default() }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Ask the gateway to cancel one of the customer's pending transactions.
    ///
    /// The gateway is only contacted when the transaction is pending on this
    /// customer, so one customer cannot cancel another's charge.
    pub async fn cancel(&self, customer_id: CustomerId, transaction_id: &GatewayOrderId) -> ExecResult<()> {
        let customer = self
            .deadlines
            .store("find customer", self.store.customers().find_by_id(customer_id))
            .await?
            .ok_or_else(|| ExecError::not_found("customer", customer_id))?;

        if customer.transaction(transaction_id).is_none() {
            return Err(ExecError::not_found("transaction", transaction_id));
        }

        let response = self
            .deadlines
            .gateway("cancel transaction", self.gateway.cancel_transaction(transaction_id))
            .await
            .map_err(|e| {
                warn!(%customer_id, %transaction_id, error = %e, "Gateway cancel failed");
                e
            })?;

        info!(
            %customer_id,
            %transaction_id,
            gateway_status = %response.transaction_status,
            "Cancel requested"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutOrchestrator;
    use crate::stub::StubGateway;
    use rust_decimal_macros::dec;
    use storefront_domain::{CartItem, Customer, Merchant, Price, Product, ShippingAddress};
    use storefront_store::MemoryStore;

    async fn pending(gateway: &Arc<StubGateway>, store: &Arc<MemoryStore>) -> Customer {
        let merchant = Merchant::new("Kopi Co", "kopi@example.com", "0813");
        store.merchants().save(&merchant).await.unwrap();
        let product = Product::new(merchant.id, "Arabica", Price::new(dec!(30000)).unwrap(), 5);
        store.products().save(&product).await.unwrap();

        let mut customer = Customer::new("Budi", "budi@example.com", "0812");
        customer.carts.push(CartItem::new(product.id, 1));
        store.customers().save(&customer).await.unwrap();

        gateway.set_next_order_id("T1");
        let address = ShippingAddress {
            recipient_name: "Budi".to_string(),
            phone: "0812".to_string(),
            street: "Jl. Merdeka 10".to_string(),
            city: "Bandung".to_string(),
            province: "Jawa Barat".to_string(),
            postal_code: "40111".to_string(),
        };
        CheckoutOrchestrator::new(gateway.clone(), store.clone())
            .create(customer.id, address)
            .await
            .unwrap();
        customer
    }

    #[tokio::test]
    async fn test_cancel_keeps_local_transaction() {
        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(MemoryStore::new());
        let customer = pending(&gateway, &store).await;
        let id = GatewayOrderId::new("T1").unwrap();

        TransactionCanceller::new(gateway.clone(), store.clone())
            .cancel(customer.id, &id)
            .await
            .unwrap();

        assert_eq!(gateway.cancel_calls(), 1);
        let stored = store.customers().find_by_id(customer.id).await.unwrap().unwrap();
        assert!(stored.transaction(&id).is_some());
    }

    #[tokio::test]
    async fn test_foreign_transaction_never_reaches_gateway() {
        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(MemoryStore::new());
        pending(&gateway, &store).await;

        let other = Customer::new("Sari", "sari@example.com", "0814");
        store.customers().save(&other).await.unwrap();

        let err = TransactionCanceller::new(gateway.clone(), store.clone())
            .cancel(other.id, &GatewayOrderId::new("T1").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::NotFound { ref entity_type, .. } if entity_type == "transaction"));
        assert_eq!(gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(MemoryStore::new());
        let customer = pending(&gateway, &store).await;
        gateway.set_fail_next(true);

        let err = TransactionCanceller::new(gateway.clone(), store.clone())
            .cancel(customer.id, &GatewayOrderId::new("T1").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(MemoryStore::new());

        let err = TransactionCanceller::new(gateway, store)
            .cancel(uuid::Uuid::now_v7(), &GatewayOrderId::new("T1").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::NotFound { ref entity_type, .. } if entity_type == "customer"));
    }
}
