//! Storefront Execution Layer
//!
//! Drives a customer's cart through payment: checkout, gateway callbacks,
//! cancellation and the cart operations that feed them.
//!
//! # Architecture
//!
//! ```text
//! Cart → CheckoutOrchestrator → PaymentGateway → pending Transaction
//! Gateway callback → CallbackReconciler → PaymentGateway (re-verify) → Orders + Stock
//! ```
//!
//! # Components
//!
//! - **Ports**: The payment gateway interface and its wire-neutral types
//! - **Checkout**: Validates and prices the cart, drains it, submits the charge
//! - **Reconciler**: Re-verifies callbacks and settles or fails transactions
//! - **Cancel**: Asks the gateway to cancel a pending charge
//! - **Cart / Queries**: Cart operators and read models over the store
//! - **Deadline**: Explicit time limits on every store and gateway call
//! - **Stub**: In-process gateway for tests and local runs
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_exec::{CheckoutOrchestrator, CallbackReconciler, StubGateway};
//! use storefront_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let gateway = Arc::new(StubGateway::new());
//! let store = Arc::new(MemoryStore::new());
//!
//! let checkout = CheckoutOrchestrator::new(gateway.clone(), store.clone());
//! let summary = checkout.create(customer_id, address).await?;
//!
//! let reconciler = CallbackReconciler::new(gateway, store);
//! let outcome = reconciler.callback(&notification).await?;
//! ```

#![warn(clippy::all)]

pub mod cancel;
pub mod cart;
pub mod checkout;
pub mod deadline;
pub mod error;
pub mod ports;
pub mod queries;
pub mod reconciler;
pub mod stub;

// Re-exports for convenience
pub use cancel::TransactionCanceller;
pub use cart::CartService;
pub use checkout::{CheckoutOrchestrator, TransactionSummary};
pub use deadline::{with_deadline, Deadlines};
pub use error::{ErrorKind, ExecError, ExecResult};
pub use ports::{
    CancelResponse, ChargeItem, ChargeRequest, ChargeResponse, CustomerDetails, PaymentGateway,
    StatusNotification, StatusResponse,
};
pub use queries::{MerchantOrders, Queries};
pub use reconciler::{CallbackReconciler, Reconciliation};
pub use stub::StubGateway;
