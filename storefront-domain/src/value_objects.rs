//! Value Objects for the Storefront Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Price must be positive
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Gateway order id has an unsupported format
    #[error("Invalid gateway order id: {0}")]
    InvalidOrderId(String),

    /// Shipping address is missing a required field
    #[error("Invalid shipping address: {0}")]
    InvalidAddress(String),

    /// Unknown transaction status
    #[error("Invalid transaction status: {0}")]
    InvalidStatus(String),
}

// =============================================================================
// Price
// =============================================================================

/// Price represents a positive decimal amount in the store currency
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(format!("Price must be positive, got {}", value)));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a unit count, `None` past the decimal range
    pub fn checked_times(&self, quantity: i64) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }

    /// Price multiplied by a unit count, saturating at the decimal range
    pub fn times(&self, quantity: i64) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// GatewayOrderId
// =============================================================================

/// Order identifier shared with the payment gateway.
///
/// The gateway echoes back the id the charge was submitted with, and the
/// local Transaction is keyed by it. It is an external key, so its format is
/// checked whenever it crosses into the domain.
///
/// # Invariants
/// - 1 to 50 characters
/// - Only ASCII alphanumerics and `-`, `_`, `.`, `~`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GatewayOrderId(String);

impl GatewayOrderId {
    /// Maximum length accepted by the gateway
    pub const MAX_LEN: usize = 50;

    /// Create a GatewayOrderId with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidOrderId` if empty, too long, or containing
    /// characters outside the allowed set
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::InvalidOrderId("Order id must not be empty".to_string()));
        }
        if value.len() > Self::MAX_LEN {
            return Err(DomainError::InvalidOrderId(format!(
                "Order id exceeds {} characters: {}",
                Self::MAX_LEN,
                value
            )));
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')))
        {
            return Err(DomainError::InvalidOrderId(format!(
                "Order id contains invalid character {:?}: {}",
                bad, value
            )));
        }

        Ok(Self(value))
    }

    /// Mint a fresh order id for a new charge (UUID v7, time-ordered)
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GatewayOrderId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GatewayOrderId> for String {
    fn from(id: GatewayOrderId) -> Self {
        id.0
    }
}

impl FromStr for GatewayOrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// =============================================================================
// ShippingAddress
// =============================================================================

/// Free-form postal address captured at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Name of the person receiving the parcel
    pub recipient_name: String,
    /// Contact phone number
    pub phone: String,
    /// Street and house number
    pub street: String,
    /// City
    pub city: String,
    /// Province or state
    pub province: String,
    /// Postal code
    pub postal_code: String,
}

impl ShippingAddress {
    /// Check that every field is present
    ///
    /// # Errors
    /// Returns `DomainError::InvalidAddress` naming the first blank field
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("recipient_name", &self.recipient_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("province", &self.province),
            ("postal_code", &self.postal_code),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidAddress(format!("{} is required", name)));
            }
        }

        Ok(())
    }

    /// Single-line rendering for gateway payloads and logs
    pub fn one_line(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.province, self.postal_code)
    }
}

// =============================================================================
// TransactionStatus
// =============================================================================

/// Local lifecycle status of a payment transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Charge submitted, waiting for the gateway to confirm
    Pending,
    /// Funds collected
    Success,
    /// Payment denied, expired, cancelled or flagged
    Failed,
}

impl TransactionStatus {
    /// Whether this status ends the transaction lifecycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Lowercase name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
