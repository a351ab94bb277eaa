//! Dry-run dispatcher: logs and records service calls instead of sending

use super::{HostError, ServiceDispatcher};
use crate::notification::channel::ServiceCall;
use serde_json::Value;
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Default)]
pub struct DryRunDispatcher {
    calls: Mutex<Vec<ServiceCall>>,
}

impl DryRunDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Drain the recorded calls
    pub fn take_calls(&self) -> Vec<ServiceCall> {
        self.calls
            .lock()
            .map(|mut c| std::mem::take(&mut *c))
            .unwrap_or_default()
    }
}

impl ServiceDispatcher for DryRunDispatcher {
    fn call_service(&self, service: &str, payload: &Value) -> Result<(), HostError> {
        info!(service, payload = %payload, "[DRY-RUN] Would call service");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ServiceCall::new(service, payload.clone()));
        }
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
