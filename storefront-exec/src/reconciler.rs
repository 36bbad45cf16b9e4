//! Callback Reconciler: gateway notification → settled or failed transaction.
//!
//! A notification is only a trigger. The reconciler always re-queries the
//! gateway and acts on that answer.
//!
//! # Idempotency
//!
//! A replayed callback must never double-apply. Every write is keyed:
//!
//! - Order ids derive from `(transaction id, product id)`, and both order
//!   pushes skip an id that is already present (the merchant balance is only
//!   credited when the push inserts)
//! - The stock decrement is recorded against the same order id
//! - The pending transaction is pulled and its resolution record pushed in
//!   one customer write
//!
//! A callback that arrives after resolution finds the record and returns
//! `Reconciliation::AlreadyResolved`. A callback that arrives after a
//! partial settlement finds the transaction still pending and re-runs every
//! step; the completed ones are no-ops.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use storefront_domain::{
    CustomerId, GatewayOrderId, ManageOrderProduct, OrderItem, OrderItemId, Transaction,
    TransactionRecord, TransactionStatus,
};
use storefront_engine::{classify, PaymentOutcome};
use storefront_store::Store;

use crate::deadline::Deadlines;
use crate::error::{ExecError, ExecResult};
use crate::ports::{PaymentGateway, StatusNotification};

/// What a callback did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Orders materialized, stock decremented, transaction resolved
    Settled { orders: Vec<OrderItemId> },
    /// Transaction resolved without side effects
    Failed,
    /// Gateway still waiting on the payer; nothing changed
    Pending,
    /// Transaction was resolved by an earlier callback; nothing changed
    AlreadyResolved { outcome: TransactionStatus },
}

impl Reconciliation {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Reconciliation::Settled { .. } => "settled",
            Reconciliation::Failed => "failed",
            Reconciliation::Pending => "pending",
            Reconciliation::AlreadyResolved { .. } => "already_resolved",
        }
    }
}

/// Applies gateway status to the customer, merchant and product documents.
pub struct CallbackReconciler<G: PaymentGateway, S: Store> {
    gateway: Arc<G>,
    store: Arc<S>,
    deadlines: Deadlines,
}

impl<G: PaymentGateway, S: Store> CallbackReconciler<G, S> {
    pub fn new(gateway: Arc<G>, store: Arc<S>) -> Self {
        Self { gateway, store, deadlines: Deadlines::default() }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Handle one status notification.
    ///
    /// # Errors
    ///
    /// - `Domain` if the order id is malformed
    /// - `Upstream` / `Timeout` if the status query fails or answers for
    ///   another order
    /// - `Validation` if the gateway returns no usable correlation id
    /// - `NotFound` if the customer, a product, its merchant, or a transaction
    ///   that was never resolved is missing
    pub async fn callback(&self, notification: &StatusNotification) -> ExecResult<Reconciliation> {
        let order_id = GatewayOrderId::new(notification.order_id.as_str())?;

        let status = self
            .deadlines
            .gateway("check status", self.gateway.check_transaction(&order_id))
            .await?;

        if status.order_id != order_id.as_str() {
            warn!(
                transaction_id = %order_id,
                gateway_order_id = %status.order_id,
                "Gateway status answered for a different order"
            );
            return Err(ExecError::Upstream(format!(
                "Status query for {} answered for order {}",
                order_id, status.order_id
            )));
        }

        let customer_id = correlation_customer(status.correlation_id.as_deref(), &order_id)?;

        let customer = self
            .deadlines
            .store("find customer", self.store.customers().find_by_id(customer_id))
            .await?
            .ok_or_else(|| ExecError::not_found("customer", customer_id))?;

        let outcome = classify(&status.transaction_status, status.fraud_status.as_deref());

        info!(
            %customer_id,
            transaction_id = %order_id,
            transaction_status = %status.transaction_status,
            fraud_status = status.fraud_status.as_deref().unwrap_or("-"),
            outcome = outcome.as_str(),
            "Gateway status verified"
        );

        if outcome == PaymentOutcome::Pending {
            return Ok(Reconciliation::Pending);
        }

        let Some(transaction) = customer.transaction(&order_id).cloned() else {
            if let Some(record) = customer.resolved_transaction(&order_id) {
                info!(
                    %customer_id,
                    transaction_id = %order_id,
                    outcome = %record.outcome,
                    "Transaction already resolved, skipping"
                );
                return Ok(Reconciliation::AlreadyResolved { outcome: record.outcome });
            }
            return Err(ExecError::not_found("transaction", &order_id));
        };

        match outcome {
            PaymentOutcome::Success => self.settle(customer_id, &transaction).await,
            _ => self.fail(customer_id, &transaction).await,
        }
    }

    /// Materialize orders, decrement stock, resolve the transaction.
    async fn settle(
        &self,
        customer_id: CustomerId,
        transaction: &Transaction,
    ) -> ExecResult<Reconciliation> {
        let mut orders = Vec::with_capacity(transaction.products.len());

        for line in &transaction.products {
            let product = self
                .deadlines
                .store("find product", self.store.products().find_by_id(line.product_id))
                .await?
                .ok_or_else(|| ExecError::not_found("product", line.product_id))?;

            let order = OrderItem::from_settlement(transaction, line);
            let managed = ManageOrderProduct::for_order(customer_id, &order);

            let customer_inserted = self
                .deadlines
                .store("create order", self.store.customers().create_order(customer_id, &order))
                .await?;

            let merchant_inserted = self
                .deadlines
                .store(
                    "push merchant order",
                    self.store.merchants().push_product_to_manage_orders(product.merchant_id, &managed),
                )
                .await?;

            let stock_applied = self
                .deadlines
                .store(
                    "apply settlement",
                    self.store.products().apply_settlement(product.id, order.id, line.quantity),
                )
                .await?;

            debug!(
                %customer_id,
                transaction_id = %transaction.id,
                order_id = %order.id,
                product_id = %product.id,
                merchant_id = %product.merchant_id,
                quantity = line.quantity,
                customer_inserted,
                merchant_inserted,
                stock_applied,
                "Settlement line applied"
            );

            orders.push(order.id);
        }

        let record = TransactionRecord::resolve(transaction, TransactionStatus::Success);
        self.resolve(customer_id, &record).await?;

        info!(
            %customer_id,
            transaction_id = %transaction.id,
            orders = orders.len(),
            total = %transaction.total(),
            "Transaction settled"
        );

        Ok(Reconciliation::Settled { orders })
    }

    /// Resolve the transaction as failed. Stock was never touched.
    async fn fail(
        &self,
        customer_id: CustomerId,
        transaction: &Transaction,
    ) -> ExecResult<Reconciliation> {
        let record = TransactionRecord::resolve(transaction, TransactionStatus::Failed);
        self.resolve(customer_id, &record).await?;

        info!(%customer_id, transaction_id = %transaction.id, "Transaction failed");
        Ok(Reconciliation::Failed)
    }

    async fn resolve(&self, customer_id: CustomerId, record: &TransactionRecord) -> ExecResult<()> {
        let removed = self
            .deadlines
            .store(
                "resolve transaction",
                self.store.customers().resolve_transaction(customer_id, record),
            )
            .await?;

        if !removed {
            // A concurrent callback resolved it between our read and this write
            warn!(%customer_id, transaction_id = %record.id, "Transaction already removed");
        }
        Ok(())
    }
}

/// Parse the correlation id the checkout stashed on the charge.
fn correlation_customer(
    correlation_id: Option<&str>,
    order_id: &GatewayOrderId,
) -> ExecResult<CustomerId> {
    let raw = correlation_id.filter(|value| !value.is_empty()).ok_or_else(|| {
        ExecError::Validation(format!("Gateway status for {} carries no customer reference", order_id))
    })?;

    Uuid::parse_str(raw).map_err(|_| {
        ExecError::Validation(format!("Gateway status for {} has invalid customer reference {}", order_id, raw))
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutOrchestrator;
    use crate::ports::{CancelResponse, ChargeRequest, ChargeResponse, StatusResponse};
    use crate::stub::StubGateway;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use storefront_domain::{CartItem, Customer, Merchant, Price, Product, ShippingAddress};
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
        merchant: Merchant,
        product: Product,
    }

    /// Customer with a pending "T1" for 2 × Arabica (stock 5)
    async fn pending_fixture() -> Fixture {
        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(MemoryStore::new());

        let merchant = Merchant::new("Kopi Co", "kopi@example.com", "0813");
        store.merchants().save(&merchant).await.unwrap();

        let product = Product::new(merchant.id, "Arabica", Price::new(dec!(30000)).unwrap(), 5);
        store.products().save(&product).await.unwrap();

        let mut customer = Customer::new("Budi", "budi@example.com", "0812");
        customer.carts.push(CartItem::new(product.id, 2));
        store.customers().save(&customer).await.unwrap();

        gateway.set_next_order_id("T1");
        CheckoutOrchestrator::new(gateway.clone(), store.clone())
            .create(customer.id, address())
            .await
            .unwrap();

        Fixture { gateway, store, customer, merchant, product }
    }

    fn reconciler(f: &Fixture) -> CallbackReconciler<StubGateway, MemoryStore> {
        CallbackReconciler::new(f.gateway.clone(), f.store.clone())
    }

    /// Answers every status query with another order's id
    struct MisroutingGateway(Arc<StubGateway>);

    #[async_trait]
    impl PaymentGateway for MisroutingGateway {
        async fn create_transaction(&self, request: &ChargeRequest) -> Result<ChargeResponse, ExecError> {
            self.0.create_transaction(request).await
        }

        async fn cancel_transaction(&self, order_id: &GatewayOrderId) -> Result<CancelResponse, ExecError> {
            self.0.cancel_transaction(order_id).await
        }

        async fn check_transaction(&self, order_id: &GatewayOrderId) -> Result<StatusResponse, ExecError> {
            let mut status = self.0.check_transaction(order_id).await?;
            status.order_id = "T2".to_string();
            Ok(status)
        }
    }

    #[tokio::test]
    async fn test_settlement_materializes_orders() {
        let f = pending_fixture().await;
        f.gateway.set_status("T1", "settlement", None);

        let result = reconciler(&f).callback(&StatusNotification::for_order("T1")).await.unwrap();
        assert!(matches!(result, Reconciliation::Settled { ref orders } if orders.len() == 1));

        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert!(customer.transactions.is_empty());
        assert_eq!(customer.orders.len(), 1);
        assert_eq!(customer.orders[0].price.as_decimal(), dec!(30000));
        assert_eq!(customer.resolved_transactions[0].outcome, TransactionStatus::Success);

        let merchant = f.store.merchants().find_by_id(f.merchant.id).await.unwrap().unwrap();
        assert_eq!(merchant.orders.len(), 1);
        assert_eq!(merchant.orders[0].id, customer.orders[0].id);
        assert_eq!(merchant.balance, dec!(60000));

        let product = f.store.products().find_by_id(f.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_pending_changes_nothing() {
        let f = pending_fixture().await;

        let result = reconciler(&f).callback(&StatusNotification::for_order("T1")).await.unwrap();
        assert_eq!(result, Reconciliation::Pending);

        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert_eq!(customer.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_notification_body_is_not_trusted() {
        let f = pending_fixture().await;
        let mut forged = StatusNotification::for_order("T1");
        forged.transaction_status = Some("settlement".to_string());

        let result = reconciler(&f).callback(&forged).await.unwrap();

        assert_eq!(result, Reconciliation::Pending);
        assert_eq!(f.gateway.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_resolves_as_failed() {
        let f = pending_fixture().await;
        f.gateway.set_status("T1", "expire", None);

        let result = reconciler(&f).callback(&StatusNotification::for_order("T1")).await.unwrap();
        assert_eq!(result, Reconciliation::Failed);

        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert!(customer.transactions.is_empty());
        assert!(customer.orders.is_empty());
        assert!(customer.carts.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_error_is_fatal() {
        let f = pending_fixture().await;
        f.gateway.set_fail_next(true);

        let err = reconciler(&f).callback(&StatusNotification::for_order("T1")).await.unwrap_err();
        assert!(matches!(err, ExecError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_status_for_other_order_is_upstream() {
        let f = pending_fixture().await;
        f.gateway.set_status("T1", "settlement", None);
        let gateway = Arc::new(MisroutingGateway(f.gateway.clone()));

        let err = CallbackReconciler::new(gateway, f.store.clone())
            .callback(&StatusNotification::for_order("T1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Upstream(_)));

        let customer = f.store.customers().find_by_id(f.customer.id).await.unwrap().unwrap();
        assert_eq!(customer.transactions.len(), 1);
        assert!(customer.orders.is_empty());

        let product = f.store.products().find_by_id(f.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_not_found() {
        let f = pending_fixture().await;
        f.gateway.set_status("T1", "settlement", None);
        f.store.customers().delete_transaction(f.customer.id, &GatewayOrderId::new("T1").unwrap()).await.unwrap();

        let err = reconciler(&f).callback(&StatusNotification::for_order("T1")).await.unwrap_err();
        assert!(matches!(err, ExecError::NotFound { ref entity_type, .. } if entity_type == "transaction"));
    }

    #[tokio::test]
    async fn test_malformed_order_id_rejected() {
        let f = pending_fixture().await;

        let err = reconciler(&f)
            .callback(&StatusNotification::for_order("T1 OR 1=1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::Domain(_)));
        assert_eq!(f.gateway.check_calls(), 0);
    }

    #[test]
    fn test_correlation_parsing() {
        let id = GatewayOrderId::new("T1").unwrap();
        let customer = Uuid::now_v7();

        assert_eq!(correlation_customer(Some(&customer.to_string()), &id).unwrap(), customer);
        assert!(matches!(correlation_customer(None, &id), Err(ExecError::Validation(_))));
        assert!(matches!(correlation_customer(Some(""), &id), Err(ExecError::Validation(_))));
        assert!(matches!(correlation_customer(Some("nope"), &id), Err(ExecError::Validation(_))));
    }
}
