//! Stub implementations for testing.
//!
//! `StubGateway` keeps charges in memory and answers status queries from a
//! scripted table, so checkout and reconciliation can run without a real
//! payment processor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use storefront_domain::{GatewayOrderId, TransactionAction};

use crate::error::ExecError;
use crate::ports::{
    CancelResponse, ChargeRequest, ChargeResponse, PaymentGateway, StatusResponse,
};

/// Scripted gateway status for one order
#[derive(Debug, Clone)]
struct ScriptedStatus {
    transaction_status: String,
    fraud_status: Option<String>,
}

/// Stub payment gateway for testing.
///
/// - Charges succeed and are remembered with their correlation id
/// - Status is "pending" until scripted with [`StubGateway::set_status`]
/// - Cancel marks the order "cancel"
/// - [`StubGateway::set_fail_next`] makes the next call fail with `Upstream`
pub struct StubGateway {
    charges: Mutex<HashMap<String, ChargeRequest>>,
    statuses: Mutex<HashMap<String, ScriptedStatus>>,
    /// Actions returned with every charge
    actions: Mutex<Vec<TransactionAction>>,
    /// Overrides the order id echoed back for the next charge
    next_order_id: Mutex<Option<String>>,
    fail_next: Mutex<bool>,
    create_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    check_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StubGateway {
    /// Create a stub that returns a QR code and a deeplink with every charge.
    pub fn new() -> Self {
        Self {
            charges: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            actions: Mutex::new(vec![
                TransactionAction {
                    name: "generate-qr-code".to_string(),
                    method: "GET".to_string(),
                    url: "https://gateway.stub/qr".to_string(),
                },
                TransactionAction {
                    name: "deeplink-redirect".to_string(),
                    method: "GET".to_string(),
                    url: "https://gateway.stub/deeplink".to_string(),
                },
            ]),
            next_order_id: Mutex::new(None),
            fail_next: Mutex::new(false),
            create_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the actions returned with every charge.
    pub fn set_actions(&self, actions: Vec<TransactionAction>) {
        *lock(&self.actions) = actions;
    }

    /// Echo `order_id` for the next charge instead of the requested one.
    pub fn set_next_order_id(&self, order_id: impl Into<String>) {
        *lock(&self.next_order_id) = Some(order_id.into());
    }

    /// Script the status reported for an order.
    pub fn set_status(&self, order_id: &str, transaction_status: &str, fraud_status: Option<&str>) {
        lock(&self.statuses).insert(
            order_id.to_string(),
            ScriptedStatus {
                transaction_status: transaction_status.to_string(),
                fraud_status: fraud_status.map(str::to_string),
            },
        );
    }

    /// Configure the next call to fail.
    pub fn set_fail_next(&self, fail: bool) {
        *lock(&self.fail_next) = fail;
    }

    /// Charges received so far, keyed by echoed order id.
    pub fn charge(&self, order_id: &str) -> Option<ChargeRequest> {
        lock(&self.charges).get(order_id).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    /// Check if we should fail the next operation.
    fn should_fail(&self) -> bool {
        let mut fail_next = lock(&self.fail_next);
        let fail = *fail_next;
        *fail_next = false; // Reset after check
        fail
    }
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_transaction(&self, request: &ChargeRequest) -> Result<ChargeResponse, ExecError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail() {
            return Err(ExecError::Upstream("Simulated charge failure".to_string()));
        }

        let order_id = lock(&self.next_order_id)
            .take()
            .unwrap_or_else(|| request.order_id.to_string());

        lock(&self.charges).insert(order_id.clone(), request.clone());
        debug!(%order_id, gross_amount = %request.gross_amount, "Stub: charge accepted");

        Ok(ChargeResponse {
            order_id,
            payment_type: request.payment_type.clone(),
            transaction_status: "pending".to_string(),
            actions: lock(&self.actions).clone(),
            status_message: "Success, transaction is created".to_string(),
        })
    }

    async fn cancel_transaction(&self, order_id: &GatewayOrderId) -> Result<CancelResponse, ExecError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail() {
            return Err(ExecError::Upstream("Simulated cancel failure".to_string()));
        }

        if !lock(&self.charges).contains_key(order_id.as_str()) {
            return Err(ExecError::Upstream(format!("Transaction doesn't exist: {}", order_id)));
        }

        self.set_status(order_id.as_str(), "cancel", None);
        debug!(%order_id, "Stub: charge cancelled");

        Ok(CancelResponse {
            order_id: order_id.to_string(),
            transaction_status: "cancel".to_string(),
            status_message: "Success, transaction is canceled".to_string(),
        })
    }

    async fn check_transaction(&self, order_id: &GatewayOrderId) -> Result<StatusResponse, ExecError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail() {
            return Err(ExecError::Upstream("Simulated status failure".to_string()));
        }

        let charge = lock(&self.charges)
            .get(order_id.as_str())
            .cloned()
            .ok_or_else(|| ExecError::Upstream(format!("Transaction doesn't exist: {}", order_id)))?;

        let status = lock(&self.statuses).get(order_id.as_str()).cloned().unwrap_or(ScriptedStatus {
            transaction_status: "pending".to_string(),
            fraud_status: None,
        });

        Ok(StatusResponse {
            order_id: order_id.to_string(),
            payment_type: charge.payment_type,
            transaction_status: status.transaction_status,
            fraud_status: status.fraud_status,
            correlation_id: Some(charge.correlation_id),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CustomerDetails;
    use rust_decimal_macros::dec;
    use storefront_domain::ShippingAddress;

    fn request(order_id: &str) -> ChargeRequest {
        ChargeRequest {
            order_id: GatewayOrderId::new(order_id).unwrap(),
            payment_type: "gopay".to_string(),
            gross_amount: dec!(60000),
            items: vec![],
            customer: CustomerDetails {
                name: "Budi".to_string(),
                email: "budi@example.com".to_string(),
                phone: "0812".to_string(),
                shipping_address: ShippingAddress {
                    recipient_name: "Budi".to_string(),
                    phone: "0812".to_string(),
                    street: "Jl. Merdeka 10".to_string(),
                    city: "Bandung".to_string(),
                    province: "Jawa Barat".to_string(),
                    postal_code: "40111".to_string(),
                },
            },
            correlation_id: "customer-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_charge_then_status_roundtrips_correlation() {
        let gateway = StubGateway::new();
        let response = gateway.create_transaction(&request("ORD-1")).await.unwrap();

        assert_eq!(response.order_id, "ORD-1");
        assert_eq!(response.actions.len(), 2);

        let id = GatewayOrderId::new("ORD-1").unwrap();
        let status = gateway.check_transaction(&id).await.unwrap();
        assert_eq!(status.transaction_status, "pending");
        assert_eq!(status.correlation_id.as_deref(), Some("customer-1"));

        gateway.set_status("ORD-1", "capture", Some("accept"));
        let status = gateway.check_transaction(&id).await.unwrap();
        assert_eq!(status.transaction_status, "capture");
        assert_eq!(status.fraud_status.as_deref(), Some("accept"));
    }

    #[tokio::test]
    async fn test_next_order_id_override() {
        let gateway = StubGateway::new();
        gateway.set_next_order_id("T1");

        let first = gateway.create_transaction(&request("ORD-1")).await.unwrap();
        let second = gateway.create_transaction(&request("ORD-2")).await.unwrap();

        assert_eq!(first.order_id, "T1");
        assert_eq!(second.order_id, "ORD-2");
        assert!(gateway.charge("T1").is_some());
    }

    #[tokio::test]
    async fn test_simulated_failure_resets() {
        let gateway = StubGateway::new();
        gateway.set_fail_next(true);

        assert!(matches!(
            gateway.create_transaction(&request("ORD-1")).await,
            Err(ExecError::Upstream(_))
        ));
        assert!(gateway.create_transaction(&request("ORD-1")).await.is_ok());
        assert_eq!(gateway.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_order_is_upstream_error() {
        let gateway = StubGateway::new();
        let id = GatewayOrderId::new("missing").unwrap();

        assert!(gateway.check_transaction(&id).await.is_err());
        assert!(gateway.cancel_transaction(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_sets_cancel_status() {
        let gateway = StubGateway::new();
        gateway.create_transaction(&request("ORD-1")).await.unwrap();
        let id = GatewayOrderId::new("ORD-1").unwrap();

        gateway.cancel_transaction(&id).await.unwrap();

        let status = gateway.check_transaction(&id).await.unwrap();
        assert_eq!(status.transaction_status, "cancel");
        assert_eq!(gateway.cancel_calls(), 1);
    }
}
