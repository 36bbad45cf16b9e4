//! Storefront Payment Gateway Connectors
//!
//! Adapters for the payment gateway's core REST API.
//! Wire types mirror the gateway's JSON; mapping to execution types
//! happens in the daemon.

#![warn(clippy::all)]

// Public modules
pub mod gateway_rest;
pub mod signature;

// Re-exports
pub use gateway_rest::{
    ChargeBody, CustomerBody, GatewayAction, GatewayRestClient, GatewayRestError,
    GatewayTransaction, ItemBody, ShippingBody, TransactionDetails,
};
pub use signature::{notification_signature, verify_notification};
