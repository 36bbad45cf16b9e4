//! Storefront Daemon Library
//!
//! HTTP front end for the storefront checkout and payment flow.
//!
//! # Architecture
//!
//! ```text
//! HTTP → API → CartService / CheckoutOrchestrator / TransactionCanceller → Store
//!                                     ↓
//!                              PaymentGateway (stub | REST)
//!                                     ↑
//! Gateway callback → API → CallbackReconciler → Store
//! ```
//!
//! # Components
//!
//! - **Daemon**: Wires store, gateway and API server; graceful shutdown
//! - **API**: axum routes and error mapping
//! - **Gateway**: REST adapter and runtime gateway selection
//! - **Metrics**: Prometheus counters
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use storefrontd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     Daemon::in_memory(config)?.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod gateway;
pub mod metrics;

#[cfg(feature = "postgres")]
pub mod db;

// Re-exports for convenience
pub use api::{create_router, ApiState};
pub use config::{ApiConfig, Config, Environment, GatewayConfig};
pub use daemon::{select_gateway, Daemon};
pub use error::{DaemonError, DaemonResult};
pub use gateway::{DaemonGateway, RestGateway};
pub use metrics::Metrics;
