//! Execution layer port definitions.
//!
//! The payment gateway is an external processor reached through this port.
//! Adapters implement it for a concrete gateway (REST client, stub, ...).
//! The types here are wire-neutral; adapters map them to the gateway's
//! own payloads.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_domain::{GatewayOrderId, ShippingAddress, TransactionAction};

use crate::error::ExecError;

// =============================================================================
// Payment Gateway Port
// =============================================================================

/// Port for payment gateway operations.
///
/// Implementations:
/// - `StubGateway` - For testing (in-process charges with scripted statuses)
/// - `RestGateway` (daemon) - The gateway's core REST API
///
/// Every failure, including a gateway-side rejection, is returned as
/// `ExecError::Upstream` carrying the gateway's message.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit a charge.
    async fn create_transaction(&self, request: &ChargeRequest) -> Result<ChargeResponse, ExecError>;

    /// Ask the gateway to cancel a charge.
    ///
    /// Cancellation is confirmed later through a status callback.
    async fn cancel_transaction(&self, order_id: &GatewayOrderId) -> Result<CancelResponse, ExecError>;

    /// Query the authoritative status of a charge.
    async fn check_transaction(&self, order_id: &GatewayOrderId) -> Result<StatusResponse, ExecError>;
}

// =============================================================================
// Charge
// =============================================================================

/// Charge request built at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Locally minted order id the gateway keys the charge by
    pub order_id: GatewayOrderId,
    /// Requested payment method (e.g. "gopay")
    pub payment_type: String,
    /// Sum of line totals
    pub gross_amount: Decimal,
    pub items: Vec<ChargeItem>,
    pub customer: CustomerDetails,
    /// Opaque value the gateway echoes back on status queries.
    /// Holds the local customer id.
    pub correlation_id: String,
}

/// One line of a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeItem {
    /// Product id
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    /// Owning merchant, display only
    pub merchant_name: String,
}

/// Payer contact and shipping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: ShippingAddress,
}

/// Gateway answer to a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeResponse {
    /// Gateway-issued order id; becomes the local Transaction id
    pub order_id: String,
    /// Payment method the gateway actually selected
    pub payment_type: String,
    pub transaction_status: String,
    /// Payer instructions, unfiltered
    pub actions: Vec<TransactionAction>,
    pub status_message: String,
}

/// Gateway answer to a cancel request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResponse {
    pub order_id: String,
    pub transaction_status: String,
    pub status_message: String,
}

// =============================================================================
// Status
// =============================================================================

/// Authoritative status of a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub order_id: String,
    pub payment_type: String,
    /// e.g. "capture", "settlement", "pending", "deny", "cancel", "expire"
    pub transaction_status: String,
    /// Present for capture-type statuses ("accept", "challenge", "deny")
    pub fraud_status: Option<String>,
    /// Value round-tripped from `ChargeRequest::correlation_id`
    pub correlation_id: Option<String>,
}

/// Asynchronous status notification pushed by the gateway.
///
/// Only a trigger: the reconciler re-queries the gateway before acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotification {
    pub order_id: String,
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
}

impl StatusNotification {
    /// Notification carrying only an order id
    pub fn for_order(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            transaction_status: None,
            fraud_status: None,
            status_code: None,
            gross_amount: None,
            signature_key: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_parses_gateway_body() {
        let body = r#"{
            "order_id": "T1",
            "transaction_status": "settlement",
            "status_code": "200",
            "gross_amount": "60000.00",
            "signature_key": "abc",
            "payment_type": "gopay"
        }"#;

        let parsed: StatusNotification = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.order_id, "T1");
        assert_eq!(parsed.transaction_status.as_deref(), Some("settlement"));
        assert!(parsed.fraud_status.is_none());
        assert_eq!(parsed.gross_amount.as_deref(), Some("60000.00"));
    }

    #[test]
    fn test_notification_requires_order_id() {
        let parsed = serde_json::from_str::<StatusNotification>(r#"{"transaction_status":"pending"}"#);
        assert!(parsed.is_err());
    }
}
