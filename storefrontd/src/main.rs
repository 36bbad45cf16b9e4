//! Storefront Daemon
//!
//! HTTP API for carts, checkout, cancellation and gateway callbacks.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration (in-memory store, stub gateway)
//! cargo run -p storefrontd
//!
//! # Start against the sandbox gateway
//! STOREFRONT_GATEWAY_SERVER_KEY=SB-Mid-server-xxx cargo run -p storefrontd
//!
//! # Database lifecycle (postgres feature)
//! cargo run -p storefrontd --features postgres -- db migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_ENV`: Environment (test, development, production)
//! - `STOREFRONT_API_HOST`: API host (default: 0.0.0.0)
//! - `STOREFRONT_API_PORT`: API port (default: 8080)
//! - `STOREFRONT_GATEWAY_URL`: Gateway core API base URL (default: sandbox)
//! - `STOREFRONT_GATEWAY_SERVER_KEY`: Gateway server key (unset: stub gateway)
//! - `STOREFRONT_PAYMENT_TYPE`: Payment type requested at checkout (default: gopay)
//! - `STOREFRONT_STORE_TIMEOUT_MS`: Store call deadline (default: 5000)
//! - `STOREFRONT_GATEWAY_TIMEOUT_MS`: Gateway call deadline (default: 15000)
//! - `STOREFRONT_LOG_FORMAT`: `json` for JSON logs
//! - `DATABASE_URL`: PostgreSQL connection string (postgres feature)

use storefrontd::{Config, Daemon};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("storefrontd=info".parse()?);
    let json = std::env::var("STOREFRONT_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry().with(fmt::layer().json()).with(filter).init();
    } else {
        tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the log format is read
    let _ = dotenvy::dotenv();
    init_tracing()?;

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("db") {
        return run_db(&args).await;
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        "Storefront Daemon"
    );

    serve(config).await
}

#[cfg(feature = "postgres")]
async fn serve(config: Config) -> anyhow::Result<()> {
    if config.database_url.is_some() {
        Daemon::connect_postgres(config).await?.run().await?;
    } else {
        Daemon::in_memory(config)?.run().await?;
    }
    Ok(())
}

#[cfg(not(feature = "postgres"))]
async fn serve(config: Config) -> anyhow::Result<()> {
    Daemon::in_memory(config)?.run().await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn run_db(args: &[String]) -> anyhow::Result<()> {
    storefrontd::db::run_db_command(args).await
}

#[cfg(not(feature = "postgres"))]
async fn run_db(_args: &[String]) -> anyhow::Result<()> {
    Err(anyhow::anyhow!("db commands require building with --features postgres"))
}
