//! Storage layer errors

use thiserror::Error;

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document or row not found
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// customer, merchant, product, category, cart_item, transaction
        entity_type: String,
        id: String,
    },

    /// A keyed insert collided with an existing entry
    #[error("{entity_type} already exists: {id}")]
    Duplicate { entity_type: String, id: String },

    /// A stored value could not be decoded into its entity
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Pool exhausted or closed
    #[error("Connection error: {0}")]
    Connection(String),

    /// A column held a value the domain rejects
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// In-memory lock was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    Poisoned(String),

    #[error("Domain error: {0}")]
    Domain(#[from] storefront_domain::DomainError),
}

impl StoreError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound { entity_type: entity_type.into(), id: id.into() }
    }

    pub fn duplicate(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Duplicate { entity_type: entity_type.into(), id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::not_found("row", "unknown"),
            // 23505: unique_violation
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::duplicate("row", db_err.constraint().unwrap_or("unknown"))
            },
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Serialization(format!("column {}: {}", index, source))
            },
            sqlx::Error::Decode(source) => StoreError::Serialization(source.to_string()),
            sqlx::Error::PoolTimedOut => StoreError::Connection("pool timed out".to_string()),
            sqlx::Error::PoolClosed => StoreError::Connection("pool closed".to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("transaction", "T1");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "transaction not found: T1");
    }

    #[test]
    fn test_duplicate_is_not_not_found() {
        assert!(!StoreError::duplicate("cart_item", "p1").is_not_found());
    }
}
