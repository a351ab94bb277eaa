//! Alert and delivery types shared by the composer and the router

use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An actionable alert produced by a watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedAlert {
    /// Code as reported by the device
    pub code: String,
    pub severity: Severity,
    pub description: String,
    /// Pipe-separated message with readings, used by speak targets
    pub long_message: String,
    /// One-line message, used by push targets
    pub short_message: String,
    pub observed_at: DateTime<Utc>,
}

/// A host service call (`domain/service` plus payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub service: String,
    pub payload: serde_json::Value,
}

impl ServiceCall {
    pub fn new(service: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            service: service.into(),
            payload,
        }
    }
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// Delivered
    Sent,
    /// Not attempted (dry-run)
    Skipped(String),
    /// Attempted and failed
    Failed(String),
}

/// Delivery result for one target
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResult {
    pub target: String,
    pub service: String,
    pub result: SendResult,
}

impl DeliveryResult {
    pub fn is_sent(&self) -> bool {
        self.result == SendResult::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_call_new() {
        let call = ServiceCall::new("notify/pushover", serde_json::json!({"message": "hi"}));
        assert_eq!(call.service, "notify/pushover");
        assert_eq!(call.payload["message"], "hi");
    }

    #[test]
    fn test_delivery_result_is_sent() {
        let sent = DeliveryResult {
            target: "notify.a".to_string(),
            service: "notify/send_message".to_string(),
            result: SendResult::Sent,
        };
        assert!(sent.is_sent());

        let failed = DeliveryResult {
            result: SendResult::Failed("timeout".to_string()),
            ..sent
        };
        assert!(!failed.is_sent());
    }
}
