//! Payment status classification and action filtering.

use serde::{Deserialize, Serialize};

use storefront_domain::{TransactionAction, TransactionStatus};

/// Action names the storefront knows how to present to a payer
pub const ACTION_WHITELIST: [&str; 4] = ["generate-qr-code", "deeplink-redirect", "get-status", "cancel"];

/// Local outcome of a gateway status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    /// Funds collected: materialize orders and decrement stock
    Success,
    /// Denied, expired, cancelled or flagged: drop the transaction
    Failed,
    /// Still waiting on the payer
    Pending,
}

impl PaymentOutcome {
    /// Transaction status matching this outcome
    pub fn as_status(&self) -> TransactionStatus {
        match self {
            PaymentOutcome::Success => TransactionStatus::Success,
            PaymentOutcome::Failed => TransactionStatus::Failed,
            PaymentOutcome::Pending => TransactionStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.as_status().as_str()
    }
}

/// Classify a gateway `(transaction_status, fraud_status)` pair.
///
/// | transaction_status | fraud_status | outcome |
/// |--------------------|--------------|---------|
/// | `capture`          | `accept`     | Success |
/// | `capture`          | anything else or absent | Failed |
/// | `settlement`       | any          | Success |
/// | `pending`          | any          | Pending |
/// | anything else      | any          | Failed  |
pub fn classify(transaction_status: &str, fraud_status: Option<&str>) -> PaymentOutcome {
    match transaction_status {
        "capture" => match fraud_status {
            Some("accept") => PaymentOutcome::Success,
            _ => PaymentOutcome::Failed,
        },
        "settlement" => PaymentOutcome::Success,
        "pending" => PaymentOutcome::Pending,
        _ => PaymentOutcome::Failed,
    }
}

/// Keep only whitelisted actions, preserving gateway order.
pub fn filter_actions(actions: Vec<TransactionAction>) -> Vec<TransactionAction> {
    actions
        .into_iter()
        .filter(|action| ACTION_WHITELIST.contains(&action.name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(name: &str) -> TransactionAction {
        TransactionAction {
            name: name.to_string(),
            method: "GET".to_string(),
            url: format!("https://gateway.test/{}", name),
        }
    }

    #[test]
    fn test_capture_depends_on_fraud_status() {
        assert_eq!(classify("capture", Some("accept")), PaymentOutcome::Success);
        assert_eq!(classify("capture", Some("challenge")), PaymentOutcome::Failed);
        assert_eq!(classify("capture", Some("deny")), PaymentOutcome::Failed);
        assert_eq!(classify("capture", None), PaymentOutcome::Failed);
    }

    #[test]
    fn test_settlement_and_pending() {
        assert_eq!(classify("settlement", None), PaymentOutcome::Success);
        assert_eq!(classify("settlement", Some("challenge")), PaymentOutcome::Success);
        assert_eq!(classify("pending", None), PaymentOutcome::Pending);
    }

    #[test]
    fn test_everything_else_fails() {
        for status in ["deny", "cancel", "expire", "refund", "failure", "", "SETTLEMENT"] {
            assert_eq!(classify(status, Some("accept")), PaymentOutcome::Failed, "{status}");
        }
    }

    #[test]
    fn test_outcome_maps_to_status() {
        assert_eq!(PaymentOutcome::Success.as_status(), TransactionStatus::Success);
        assert_eq!(PaymentOutcome::Failed.as_str(), "failed");
        assert_eq!(PaymentOutcome::Pending.as_status(), TransactionStatus::Pending);
    }

    #[test]
    fn test_filter_actions_drops_unknown() {
        let filtered = filter_actions(vec![
            action("generate-qr-code"),
            action("mystery"),
            action("deeplink-redirect"),
            action("get-status"),
            action("cancel"),
            action("Cancel"),
        ]);

        let names: Vec<_> = filtered.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["generate-qr-code", "deeplink-redirect", "get-status", "cancel"]);
    }
}
