//! Host boundary
//!
//! The home-automation host owns the signal store and delivers messages.
//! The core only talks to it through these two traits, so it can be driven
//! by the Home Assistant REST binding, a dry-run recorder or an in-memory
//! snapshot in tests.

pub mod dry_run;
pub mod home_assistant;

pub use dry_run::DryRunDispatcher;
pub use home_assistant::{HomeAssistantClient, HomeAssistantConfig};

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by host bindings
#[derive(Debug, Error)]
pub enum HostError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("host returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid service path: {0}")]
    InvalidService(String),

    #[error("access token is required")]
    MissingToken,

    #[error("{0}")]
    Rejected(String),
}

/// Read access to the host's current signal snapshot
pub trait StateReader {
    /// Current state of an entity, `None` when the host has no usable value
    fn get_state(&self, entity_id: &str) -> Result<Option<String>, HostError>;
}

/// Outbound service dispatch
pub trait ServiceDispatcher: Send + Sync {
    /// Call `domain/service` with a backend-specific payload
    fn call_service(&self, service: &str, payload: &Value) -> Result<(), HostError>;

    /// True when calls are only logged, never delivered
    fn is_dry_run(&self) -> bool {
        false
    }
}

impl StateReader for HashMap<String, String> {
    fn get_state(&self, entity_id: &str) -> Result<Option<String>, HostError> {
        Ok(self.get(entity_id).cloned())
    }
}

/// Read an optional entity, treating read errors as "no value"
pub fn read_optional(reader: &dyn StateReader, entity_id: Option<&str>) -> Option<String> {
    let entity_id = entity_id?;
    match reader.get_state(entity_id) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(entity_id, error = %e, "Failed to read entity state");
            None
        }
    }
}

/// Split `domain/service` (or `domain.service`) into its parts
pub fn split_service(service: &str) -> Result<(&str, &str), HostError> {
    service
        .split_once('/')
        .or_else(|| service.split_once('.'))
        .filter(|(domain, name)| !domain.is_empty() && !name.is_empty())
        .ok_or_else(|| HostError::InvalidService(service.to_string()))
}
