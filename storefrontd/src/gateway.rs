//! Payment gateway adapters.
//!
//! `RestGateway` maps the execution layer's wire-neutral types onto the
//! gateway REST client. `DaemonGateway` lets the daemon pick the stub or the
//! REST client at startup while the services stay generic.

use async_trait::async_trait;
use tracing::warn;

use storefront_connectors::{
    ChargeBody, CustomerBody, GatewayRestClient, GatewayRestError, GatewayTransaction, ItemBody,
    ShippingBody, TransactionDetails,
};
use storefront_domain::{GatewayOrderId, TransactionAction};
use storefront_exec::{
    CancelResponse, ChargeRequest, ChargeResponse, ExecError, PaymentGateway, StatusResponse,
    StubGateway,
};

/// Country code sent with every shipping address
const COUNTRY_CODE: &str = "IDN";

// =============================================================================
// REST adapter
// =============================================================================

/// `PaymentGateway` over the gateway's core REST API.
pub struct RestGateway {
    client: GatewayRestClient,
}

impl RestGateway {
    pub fn new(client: GatewayRestClient) -> Self {
        Self { client }
    }
}

fn to_exec_error(operation: &str, error: GatewayRestError) -> ExecError {
    warn!(operation, error = %error, "Gateway request failed");
    match error {
        GatewayRestError::Timeout => ExecError::Timeout(format!("gateway {} request", operation)),
        other => ExecError::Upstream(other.to_string()),
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, ExecError> {
    field.ok_or_else(|| ExecError::Upstream(format!("Gateway response missing {}", name)))
}

/// Build the gateway charge body.
pub fn charge_body(request: &ChargeRequest) -> ChargeBody {
    let address = &request.customer.shipping_address;

    ChargeBody {
        payment_type: request.payment_type.clone(),
        transaction_details: TransactionDetails {
            order_id: request.order_id.to_string(),
            gross_amount: request.gross_amount,
        },
        item_details: request
            .items
            .iter()
            .map(|item| ItemBody {
                id: item.id.clone(),
                price: item.price,
                quantity: item.quantity,
                name: item.name.clone(),
                merchant_name: item.merchant_name.clone(),
            })
            .collect(),
        customer_details: CustomerBody {
            first_name: request.customer.name.clone(),
            email: request.customer.email.clone(),
            phone: request.customer.phone.clone(),
            shipping_address: ShippingBody {
                first_name: address.recipient_name.clone(),
                phone: address.phone.clone(),
                address: format!("{}, {}", address.street, address.province),
                city: address.city.clone(),
                postal_code: address.postal_code.clone(),
                country_code: COUNTRY_CODE.to_string(),
            },
        },
        custom_field1: request.correlation_id.clone(),
    }
}

fn charge_response(request: &ChargeRequest, transaction: GatewayTransaction) -> Result<ChargeResponse, ExecError> {
    Ok(ChargeResponse {
        order_id: required(transaction.order_id, "order_id")?,
        payment_type: transaction.payment_type.unwrap_or_else(|| request.payment_type.clone()),
        transaction_status: required(transaction.transaction_status, "transaction_status")?,
        actions: transaction
            .actions
            .into_iter()
            .map(|action| TransactionAction {
                name: action.name,
                method: action.method,
                url: action.url,
            })
            .collect(),
        status_message: transaction.status_message.unwrap_or_default(),
    })
}

fn status_response(order_id: &GatewayOrderId, transaction: GatewayTransaction) -> Result<StatusResponse, ExecError> {
    Ok(StatusResponse {
        order_id: transaction.order_id.unwrap_or_else(|| order_id.to_string()),
        payment_type: transaction.payment_type.unwrap_or_default(),
        transaction_status: required(transaction.transaction_status, "transaction_status")?,
        fraud_status: transaction.fraud_status,
        correlation_id: transaction.custom_field1,
    })
}

#[async_trait]
impl PaymentGateway for RestGateway {
    async fn create_transaction(&self, request: &ChargeRequest) -> Result<ChargeResponse, ExecError> {
        let transaction = self
            .client
            .charge(&charge_body(request))
            .await
            .map_err(|e| to_exec_error("charge", e))?;
        charge_response(request, transaction)
    }

    async fn cancel_transaction(&self, order_id: &GatewayOrderId) -> Result<CancelResponse, ExecError> {
        let transaction = self.client.cancel(order_id).await.map_err(|e| to_exec_error("cancel", e))?;

        Ok(CancelResponse {
            order_id: transaction.order_id.unwrap_or_else(|| order_id.to_string()),
            transaction_status: transaction.transaction_status.unwrap_or_default(),
            status_message: transaction.status_message.unwrap_or_default(),
        })
    }

    async fn check_transaction(&self, order_id: &GatewayOrderId) -> Result<StatusResponse, ExecError> {
        let transaction = self.client.status(order_id).await.map_err(|e| to_exec_error("status", e))?;
        status_response(order_id, transaction)
    }
}

// =============================================================================
// Runtime selection
// =============================================================================

/// Gateway chosen at startup from configuration.
pub enum DaemonGateway {
    Stub(StubGateway),
    Rest(RestGateway),
}

#[async_trait]
impl PaymentGateway for DaemonGateway {
    async fn create_transaction(&self, request: &ChargeRequest) -> Result<ChargeResponse, ExecError> {
        match self {
            DaemonGateway::Stub(gateway) => gateway.create_transaction(request).await,
            DaemonGateway::Rest(gateway) => gateway.create_transaction(request).await,
        }
    }

    async fn cancel_transaction(&self, order_id: &GatewayOrderId) -> Result<CancelResponse, ExecError> {
        match self {
            DaemonGateway::Stub(gateway) => gateway.cancel_transaction(order_id).await,
            DaemonGateway::Rest(gateway) => gateway.cancel_transaction(order_id).await,
        }
    }

    async fn check_transaction(&self, order_id: &GatewayOrderId) -> Result<StatusResponse, ExecError> {
        match self {
            DaemonGateway::Stub(gateway) => gateway.check_transaction(order_id).await,
            DaemonGateway::Rest(gateway) => gateway.check_transaction(order_id).await,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
