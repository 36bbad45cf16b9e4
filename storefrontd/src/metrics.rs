//! Prometheus counters for checkout and callback outcomes.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Daemon metrics, registered on a private registry.
pub struct Metrics {
    registry: Registry,
    checkouts_total: IntCounterVec,
    callbacks_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let checkouts_total = IntCounterVec::new(
            Opts::new("storefront_checkouts_total", "Checkout attempts partitioned by result."),
            &["result"],
        )?;
        let callbacks_total = IntCounterVec::new(
            Opts::new(
                "storefront_callbacks_total",
                "Gateway callbacks partitioned by reconciliation outcome.",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(checkouts_total.clone()))?;
        registry.register(Box::new(callbacks_total.clone()))?;

        Ok(Self { registry, checkouts_total, callbacks_total })
    }

    /// `result` is "created" or an error class
    pub fn record_checkout(&self, result: &str) {
        self.checkouts_total.with_label_values(&[result]).inc();
    }

    /// `outcome` is a reconciliation label or an error class
    pub fn record_callback(&self, outcome: &str) {
        self.callbacks_total.with_label_values(&[outcome]).inc();
    }

    /// Render the registry in the text exposition format.
    pub fn encode(&self) -> Result<(String, String), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_string(), String::from_utf8_lossy(&buffer).into_owned()))
    }
}
