//! Storefront Engine Layer
//!
//! Pure decision logic, deterministic, no I/O.
//! Takes loaded state → returns what should happen.
//!
//! - **Checkout planning**: validates a cart against live products and prices it
//! - **Payment classification**: maps gateway status pairs to a local outcome
//! - **Action filtering**: keeps only payer instructions the storefront understands

#![warn(clippy::all)]

pub mod checkout;
pub mod error;
pub mod payment;

pub use checkout::{plan_checkout, validate_quantity, CheckoutLine, CheckoutPlan};
pub use error::EngineError;
pub use payment::{classify, filter_actions, PaymentOutcome, ACTION_WHITELIST};
