//! Execution layer error types.

use thiserror::Error;

use storefront_engine::EngineError;
use storefront_store::StoreError;

/// Errors that can occur during execution operations.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Referenced customer, product, merchant or transaction is missing
    #[error("Not found: {entity_type} {id}")]
    NotFound {
        /// Type of entity
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Request rejected before any side effect
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Payment gateway call failed; carries the gateway's message
    #[error("Payment gateway error: {0}")]
    Upstream(String),

    /// Store or gateway call exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] storefront_domain::DomainError),

    /// Engine error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Failure class used at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Upstream,
    Timeout,
    Internal,
}

impl ExecError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Classify this error for the boundary layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::NotFound { .. } => ErrorKind::NotFound,
            ExecError::Validation(_) | ExecError::Domain(_) => ErrorKind::Validation,
            ExecError::Engine(EngineError::MissingProduct(_)) => ErrorKind::NotFound,
            ExecError::Engine(_) => ErrorKind::Validation,
            ExecError::Upstream(_) => ErrorKind::Upstream,
            ExecError::Timeout(_) => ErrorKind::Timeout,
            ExecError::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
            ExecError::Store(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;
