//! Daemon: wires the store, the gateway and the API server.
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Pick the gateway (stub or REST) and the store (memory or PostgreSQL)
//! 3. Start the API server
//! 4. Graceful shutdown on SIGINT

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use storefront_connectors::GatewayRestClient;
use storefront_exec::{
    CallbackReconciler, CartService, CheckoutOrchestrator, PaymentGateway, Queries, StubGateway,
    TransactionCanceller,
};
use storefront_store::{MemoryStore, Store};

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};
use crate::gateway::{DaemonGateway, RestGateway};
use crate::metrics::Metrics;

// =============================================================================
// Daemon
// =============================================================================

/// The storefront daemon.
pub struct Daemon<G: PaymentGateway + 'static, S: Store + 'static> {
    /// Configuration
    config: Config,
    gateway: Arc<G>,
    store: Arc<S>,
    metrics: Arc<Metrics>,
}

/// Build the gateway the configuration asks for.
pub fn select_gateway(config: &Config) -> DaemonGateway {
    match (&config.gateway.server_key, config.use_stub_gateway()) {
        (Some(server_key), false) => {
            info!(base_url = %config.gateway.base_url, "Using REST payment gateway");
            let client = GatewayRestClient::new(config.gateway.base_url.as_str(), server_key)
                .with_timeout(config.deadlines.gateway);
            DaemonGateway::Rest(RestGateway::new(client))
        },
        _ => {
            info!("Using stub payment gateway");
            DaemonGateway::Stub(StubGateway::new())
        },
    }
}

impl Daemon<DaemonGateway, MemoryStore> {
    /// Create a daemon over the in-memory store (for testing/development).
    pub fn in_memory(config: Config) -> DaemonResult<Self> {
        let gateway = Arc::new(select_gateway(&config));
        Self::new(config, gateway, Arc::new(MemoryStore::new()))
    }
}

#[cfg(feature = "postgres")]
impl Daemon<DaemonGateway, storefront_store::PgStore> {
    /// Create a daemon over PostgreSQL using `DATABASE_URL`.
    pub async fn connect_postgres(config: Config) -> DaemonResult<Self> {
        let url = config
            .database_url
            .clone()
            .ok_or_else(|| DaemonError::Config("DATABASE_URL is required".to_string()))?;

        let pool = sqlx::PgPool::connect(&url)
            .await
            .map_err(|e| DaemonError::Config(format!("Failed to connect to database: {}", e)))?;

        let gateway = Arc::new(select_gateway(&config));
        Self::new(config, gateway, Arc::new(storefront_store::PgStore::new(pool)))
    }
}

impl<G: PaymentGateway + 'static, S: Store + 'static> Daemon<G, S> {
    /// Create a new daemon with provided components.
    pub fn new(config: Config, gateway: Arc<G>, store: Arc<S>) -> DaemonResult<Self> {
        Ok(Self {
            config,
            gateway,
            store,
            metrics: Arc::new(Metrics::new()?),
        })
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            "Starting storefront daemon"
        );

        let shutdown = CancellationToken::new();
        let (api_addr, server) = self.start_api_server(shutdown.clone()).await?;
        info!(%api_addr, "API server started");

        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }

        shutdown.cancel();
        server
            .await
            .map_err(|e| DaemonError::Server(format!("API server task failed: {}", e)))?;

        info!("Shutdown complete");
        Ok(())
    }

    fn api_state(&self) -> Arc<ApiState<G, S>> {
        let deadlines = self.config.deadlines;

        Arc::new(ApiState {
            checkout: CheckoutOrchestrator::new(self.gateway.clone(), self.store.clone())
                .with_deadlines(deadlines)
                .with_payment_type(self.config.gateway.payment_type.as_str()),
            reconciler: CallbackReconciler::new(self.gateway.clone(), self.store.clone())
                .with_deadlines(deadlines),
            canceller: TransactionCanceller::new(self.gateway.clone(), self.store.clone())
                .with_deadlines(deadlines),
            carts: CartService::new(self.store.clone()).with_deadlines(deadlines),
            queries: Queries::new(self.store.clone()).with_deadlines(deadlines),
            metrics: self.metrics.clone(),
            server_key: self.config.gateway.server_key.clone(),
        })
    }

    /// Start the API server; it stops when `shutdown` is cancelled.
    pub async fn start_api_server(
        &self,
        shutdown: CancellationToken,
    ) -> DaemonResult<(SocketAddr, JoinHandle<()>)> {
        let router = create_router(self.api_state());
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            DaemonError::Config(format!("Failed to bind to {}: {}", addr, e))
        })?;

        let local_addr = listener.local_addr().map_err(|e| {
            DaemonError::Config(format!("Failed to get local address: {}", e))
        })?;

        // Spawn the server task
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "API server error");
            }
        });

        Ok((local_addr, handle))
    }
}

// =============================================================================
// Tests
// =============================================================================
