//! Read models over the customer and merchant aggregates.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_domain::{Customer, CustomerId, ManageOrderProduct, MerchantId};
use storefront_store::Store;

use crate::deadline::Deadlines;
use crate::error::{ExecError, ExecResult};

/// A merchant's received orders and accumulated balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantOrders {
    pub merchant_id: MerchantId,
    pub balance: Decimal,
    pub orders: Vec<ManageOrderProduct>,
}

pub struct Queries<S: Store> {
    store: Arc<S>,
    deadlines: Deadlines,
}

impl<S: Store> Queries<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, deadlines: Deadlines::default() }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Customer with cart, pending transactions and orders
    pub async fn customer(&self, customer_id: CustomerId) -> ExecResult<Customer> {
        self.deadlines
            .store("find customer", self.store.customers().find_by_id(customer_id))
            .await?
            .ok_or_else(|| ExecError::not_found("customer", customer_id))
    }

    pub async fn merchant_orders(&self, merchant_id: MerchantId) -> ExecResult<MerchantOrders> {
        let merchant = self
            .deadlines
            .store("find merchant", self.store.merchants().find_by_id(merchant_id))
            .await?
            .ok_or_else(|| ExecError::not_found("merchant", merchant_id))?;

        Ok(MerchantOrders {
            merchant_id: merchant.id,
            balance: merchant.balance,
            orders: merchant.orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use storefront_domain::Merchant;
    use storefront_store::MemoryStore;

    #[tokio::test]
    async fn test_merchant_orders_start_empty() {
        let store = Arc::new(MemoryStore::new());
        let merchant = Merchant::new("Kopi Co", "kopi@example.com", "0813");
        store.merchants().save(&merchant).await.unwrap();

        let view = Queries::new(store).merchant_orders(merchant.id).await.unwrap();

        assert_eq!(view.merchant_id, merchant.id);
        assert_eq!(view.balance, Decimal::ZERO);
        assert!(view.orders.is_empty());
    }

    #[tokio::test]
    async fn test_missing_entities() {
        let queries = Queries::new(Arc::new(MemoryStore::new()));

        let err = queries.customer(uuid::Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = queries.merchant_orders(uuid::Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
