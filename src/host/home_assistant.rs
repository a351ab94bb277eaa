//! Home Assistant REST binding
//!
//! Reads entity states with `GET /api/states/{entity_id}` and calls services
//! with `POST /api/services/{domain}/{service}`, authenticated with a
//! long-lived access token.

use super::{split_service, HostError, ServiceDispatcher, StateReader};
use crate::signal::value_to_string;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// States Home Assistant reports for entities without a real value
const UNAVAILABLE_STATES: [&str; 2] = ["unavailable", "unknown"];

/// Client configuration
#[derive(Debug, Clone)]
pub struct HomeAssistantConfig {
    /// Base URL, e.g. `http://homeassistant.local:8123`
    pub base_url: String,
    /// Long-lived access token
    pub token: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8123".to_string(),
            token: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Entity state as returned by `/api/states/{entity_id}`
#[derive(Debug, Deserialize)]
struct EntityState {
    state: Value,
}

/// Blocking Home Assistant REST client
#[derive(Debug)]
pub struct HomeAssistantClient {
    client: Client,
    config: HomeAssistantConfig,
}

impl HomeAssistantClient {
    pub fn new(config: HomeAssistantConfig) -> Result<Self, HostError> {
        if config.token.is_empty() {
            return Err(HostError::MissingToken);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

impl StateReader for HomeAssistantClient {
    fn get_state(&self, entity_id: &str) -> Result<Option<String>, HostError> {
        let response = self
            .client
            .get(self.url(&format!("states/{}", entity_id)))
            .bearer_auth(&self.config.token)
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(entity_id, "Entity not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(HostError::Status {
                status: response.status().as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let entity: EntityState = response.json()?;
        Ok(normalize_state(&entity.state))
    }
}

impl ServiceDispatcher for HomeAssistantClient {
    fn call_service(&self, service: &str, payload: &Value) -> Result<(), HostError> {
        let (domain, name) = split_service(service)?;
        let response = self
            .client
            .post(self.url(&format!("services/{}/{}", domain, name)))
            .bearer_auth(&self.config.token)
            .json(payload)
            .send()?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(HostError::Status {
                status: response.status().as_u16(),
                body: response.text().unwrap_or_default(),
            })
        }
    }
}

/// Map a raw state to a string, dropping Home Assistant's placeholders
fn normalize_state(state: &Value) -> Option<String> {
    value_to_string(state).filter(|s| !UNAVAILABLE_STATES.contains(&s.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_default() {
        let config = HomeAssistantConfig::default();
        assert_eq!(config.base_url, "http://localhost:8123");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_client_requires_token() {
        let result = HomeAssistantClient::new(HomeAssistantConfig::default());
        assert!(matches!(result, Err(HostError::MissingToken)));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = HomeAssistantClient::new(HomeAssistantConfig {
            base_url: "http://ha.local:8123/".to_string(),
            token: "secret".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(
            client.url("states/sensor.garth_battery"),
            "http://ha.local:8123/api/states/sensor.garth_battery"
        );
    }

    #[test]
    fn test_normalize_state() {
        assert_eq!(normalize_state(&json!("1005")), Some("1005".to_string()));
        assert_eq!(normalize_state(&json!("unavailable")), None);
        assert_eq!(normalize_state(&json!("unknown")), None);
        assert_eq!(normalize_state(&Value::Null), None);
        assert_eq!(normalize_state(&json!(false)), Some("False".to_string()));
    }

    #[test]
    fn test_entity_state_deserialize() {
        let entity: EntityState = serde_json::from_value(json!({
            "entity_id": "sensor.garth_last_error_code",
            "state": "1005",
            "attributes": {"friendly_name": "Garth last error"}
        }))
        .unwrap();
        assert_eq!(entity.state, json!("1005"));
    }
}
