//! Explicit deadlines for store and gateway calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ExecError, ExecResult};

/// Default limit on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default limit on a single gateway call
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Time limits applied by the orchestrator, reconciler and cart services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub store: Duration,
    pub gateway: Duration,
}

impl Deadlines {
    pub fn new(store: Duration, gateway: Duration) -> Self {
        Self { store, gateway }
    }

    /// Run a store call under the store deadline
    pub async fn store<T, E, F>(&self, what: &str, fut: F) -> ExecResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ExecError>,
    {
        with_deadline(self.store, what, fut).await
    }

    /// Run a gateway call under the gateway deadline
    pub async fn gateway<T, E, F>(&self, what: &str, fut: F) -> ExecResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ExecError>,
    {
        with_deadline(self.gateway, what, fut).await
    }
}

impl Default for Deadlines {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_TIMEOUT, DEFAULT_GATEWAY_TIMEOUT)
    }
}

/// Await `fut` for at most `limit`.
///
/// Elapsed deadlines surface as `ExecError::Timeout` naming the call.
pub async fn with_deadline<T, E, F>(limit: Duration, what: &str, fut: F) -> ExecResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ExecError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            warn!(call = what, limit_ms = limit.as_millis() as u64, "Deadline exceeded");
            Err(ExecError::Timeout(format!("{} exceeded {}ms", what, limit.as_millis())))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_store::StoreError;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result: ExecResult<u32> =
            with_deadline(Duration::from_millis(100), "fast", async { Ok::<_, ExecError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_inner_error_converted() {
        let result: ExecResult<()> = with_deadline(Duration::from_millis(100), "find", async {
            Err(StoreError::not_found("customer", "c1"))
        })
        .await;
        assert!(matches!(result, Err(ExecError::Store(StoreError::NotFound { .. }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_is_timeout() {
        let deadlines = Deadlines::new(Duration::from_millis(50), Duration::from_secs(1));

        let result: ExecResult<()> = deadlines
            .store("slow store", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, StoreError>(())
            })
            .await;

        match result {
            Err(ExecError::Timeout(msg)) => assert!(msg.contains("slow store")),
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }
}
