//! Payment Gateway REST API Client
//!
//! Provides REST API integration for:
//! - Submitting charges (`POST /v2/charge`)
//! - Cancelling charges (`POST /v2/{order_id}/cancel`)
//! - Querying charge status (`GET /v2/{order_id}/status`)
//!
//! # Authentication
//!
//! HTTP Basic auth with the server key as username and an empty password.
//!
//! # Errors
//!
//! The gateway reports most failures in the body: HTTP 200 with a
//! `status_code` outside 2xx. Both body-level and HTTP-level failures map to
//! `GatewayRestError::ApiError` carrying the gateway's message.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Method, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

use storefront_domain::GatewayOrderId;

// =============================================================================
// Constants
// =============================================================================

/// Sandbox core API base URL
pub const SANDBOX_API_URL: &str = "https://api.sandbox.midtrans.com";

/// Production core API base URL
pub const PRODUCTION_API_URL: &str = "https://api.midtrans.com";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur in the gateway REST client.
#[derive(Debug, Clone, Error)]
pub enum GatewayRestError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Gateway rejected the request
    #[error("Gateway API error: {code} - {message}")]
    ApiError { code: String, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,
}

// =============================================================================
// Gateway REST Client
// =============================================================================

/// Gateway core API client.
pub struct GatewayRestClient {
    /// HTTP client
    client: Client,
    base_url: String,
    /// Precomputed `Authorization` header value
    authorization: String,
    request_timeout: Duration,
}

impl GatewayRestClient {
    /// Create a client against `base_url` authenticated with `server_key`.
    pub fn new(base_url: impl Into<String>, server_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization: basic_auth(server_key),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Create a client for the sandbox environment.
    pub fn sandbox(server_key: &str) -> Self {
        Self::new(SANDBOX_API_URL, server_key)
    }

    /// Bound every HTTP request by `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.request_timeout = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and decode the gateway's answer.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&ChargeBody>,
    ) -> Result<GatewayTransaction, GatewayRestError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = timeout(self.request_timeout, request.send())
            .await
            .map_err(|_| GatewayRestError::Timeout)?
            .map_err(|e| GatewayRestError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayRestError::ParseError(e.to_string()))?;

        debug!(%method, endpoint, http_status = status.as_u16(), "Gateway response received");
        parse_response(status, &text)
    }

    // =========================================================================
    // Core API
    // =========================================================================

    /// Submit a charge.
    ///
    /// # Endpoint
    ///
    /// `POST /v2/charge`
    pub async fn charge(&self, body: &ChargeBody) -> Result<GatewayTransaction, GatewayRestError> {
        self.send(Method::POST, "/v2/charge", Some(body)).await
    }

    /// Cancel a charge that has not settled.
    ///
    /// # Endpoint
    ///
    /// `POST /v2/{order_id}/cancel`
    pub async fn cancel(&self, order_id: &GatewayOrderId) -> Result<GatewayTransaction, GatewayRestError> {
        self.send(Method::POST, &format!("/v2/{}/cancel", order_id), None).await
    }

    /// Query the status of a charge.
    ///
    /// # Endpoint
    ///
    /// `GET /v2/{order_id}/status`
    pub async fn status(&self, order_id: &GatewayOrderId) -> Result<GatewayTransaction, GatewayRestError> {
        self.send(Method::GET, &format!("/v2/{}/status", order_id), None).await
    }
}

/// `Authorization` header value for a server key.
fn basic_auth(server_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:", server_key)))
}

/// Decode a gateway response body, mapping body- and HTTP-level failures.
fn parse_response(status: StatusCode, body: &str) -> Result<GatewayTransaction, GatewayRestError> {
    let parsed = serde_json::from_str::<GatewayTransaction>(body);

    match parsed {
        Ok(transaction) if !status.is_success() || !transaction.is_success() => {
            Err(GatewayRestError::ApiError {
                code: transaction.status_code,
                message: transaction.status_message.unwrap_or_default(),
            })
        },
        Ok(transaction) => Ok(transaction),
        Err(_) if !status.is_success() => Err(GatewayRestError::RequestFailed(format!("HTTP {}: {}", status, body))),
        Err(e) => Err(GatewayRestError::ParseError(e.to_string())),
    }
}

// =============================================================================
// Gateway Types (request bodies)
// =============================================================================

/// Charge request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeBody {
    /// Payment method (e.g. "gopay")
    pub payment_type: String,
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ItemBody>,
    pub customer_details: CustomerBody,
    /// Echoed back on status queries
    pub custom_field1: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub order_id: String,
    #[serde(serialize_with = "serialize_amount")]
    pub gross_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemBody {
    pub id: String,
    #[serde(serialize_with = "serialize_amount")]
    pub price: Decimal,
    pub quantity: i64,
    /// Truncated by the gateway to 50 characters
    pub name: String,
    pub merchant_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerBody {
    pub first_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: ShippingBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShippingBody {
    pub first_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
}

/// Whole amounts go out as JSON integers, fractional ones as strings.
fn serialize_amount<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    match amount.fract().is_zero().then(|| amount.to_i64()).flatten() {
        Some(whole) => serializer.serialize_i64(whole),
        None => serializer.serialize_str(&amount.to_string()),
    }
}

// =============================================================================
// Gateway Types (responses)
// =============================================================================

/// Charge, cancel and status responses share one shape.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayTransaction {
    /// HTTP-like code carried in the body ("200", "201", "404", ...)
    pub status_code: String,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub actions: Vec<GatewayAction>,
    /// Correlation value submitted with the charge
    #[serde(default)]
    pub custom_field1: Option<String>,
}

impl GatewayTransaction {
    /// Whether the body-level status code is 2xx
    pub fn is_success(&self) -> bool {
        self.status_code.len() == 3 && self.status_code.starts_with('2')
    }
}

/// Payer instruction returned with a charge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayAction {
    pub name: String,
    pub method: String,
    pub url: String,
}

// =============================================================================
// Tests
// =============================================================================
