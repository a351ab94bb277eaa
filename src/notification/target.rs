//! Notify targets and per-backend payload shaping
//!
//! The backend is resolved once, when the configuration is parsed. A target
//! either names its backend explicitly or is classified by its identifier
//! (anything mentioning `pushover` is a Pushover target).

use super::channel::{ResolvedAlert, ServiceCall};
use serde::{Deserialize, Serialize};
use serde_json::json;

const PUSHOVER_MARKER: &str = "pushover";
const PUSHOVER_SERVICE: &str = "notify/pushover";
const SPEAK_SERVICE: &str = "notify/send_message";

/// Notification backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Push notification with a title and the short message
    Pushover,
    /// `notify.send_message` speak request with the long message
    Speak,
}

impl Backend {
    pub fn detect(entity_id: &str) -> Self {
        if entity_id.contains(PUSHOVER_MARKER) {
            Backend::Pushover
        } else {
            Backend::Speak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Pushover => "pushover",
            Backend::Speak => "speak",
        }
    }
}

/// A resolved notify target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub entity_id: String,
    pub backend: Backend,
}

impl Target {
    /// Target with the backend detected from its identifier
    pub fn new(entity_id: impl Into<String>) -> Self {
        let entity_id = entity_id.into();
        let backend = Backend::detect(&entity_id);
        Self { entity_id, backend }
    }

    pub fn with_backend(entity_id: impl Into<String>, backend: Backend) -> Self {
        Self {
            entity_id: entity_id.into(),
            backend,
        }
    }

    /// Shape the service call for this target's backend
    pub fn service_call(&self, friendly_name: &str, alert: &ResolvedAlert) -> ServiceCall {
        match self.backend {
            // every Pushover-style target goes through the one pushover service
            Backend::Pushover => ServiceCall::new(
                PUSHOVER_SERVICE,
                json!({
                    "title": format!("{} Garth Alert", friendly_name),
                    "message": alert.short_message,
                }),
            ),
            Backend::Speak => ServiceCall::new(
                SPEAK_SERVICE,
                json!({
                    "message": "speak",
                    "entity_id": self.entity_id,
                    "message_body": alert.long_message,
                }),
            ),
        }
    }
}

/// Target as written in configuration: a bare identifier or a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetSpec {
    Bare(String),
    Record {
        #[serde(default)]
        entity: Option<String>,
        #[serde(default)]
        backend: Option<Backend>,
    },
}

impl TargetSpec {
    /// Resolve to a target; empty identifiers resolve to `None`
    pub fn resolve(&self) -> Option<Target> {
        let (entity, backend) = match self {
            TargetSpec::Bare(entity) => (entity.trim(), None),
            TargetSpec::Record { entity, backend } => (entity.as_deref()?.trim(), *backend),
        };
        if entity.is_empty() {
            return None;
        }
        Some(match backend {
            Some(backend) => Target::with_backend(entity, backend),
            None => Target::new(entity),
        })
    }
}

impl From<&str> for TargetSpec {
    fn from(entity: &str) -> Self {
        TargetSpec::Bare(entity.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::severity::Severity;
    use chrono::Utc;

    fn alert() -> ResolvedAlert {
        ResolvedAlert {
            code: "7".to_string(),
            severity: Severity::Error,
            description: "Blade motor stalled".to_string(),
            long_message: "ERROR for Garth mower. | - Blade motor stalled.".to_string(),
            short_message: "ERROR. Garth mower reported Blade motor stalled".to_string(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_backend_detect() {
        assert_eq!(Backend::detect("notify.pushover"), Backend::Pushover);
        assert_eq!(Backend::detect("notify.pushover_phone"), Backend::Pushover);
        assert_eq!(Backend::detect("notify.my_office_speak"), Backend::Speak);
    }

    #[test]
    fn test_pushover_payload_uses_short_message() {
        let call = Target::new("notify.pushover").service_call("Garth mower", &alert());
        assert_eq!(call.service, "notify/pushover");
        assert_eq!(
            call.payload,
            json!({
                "title": "Garth mower Garth Alert",
                "message": "ERROR. Garth mower reported Blade motor stalled",
            })
        );
    }

    #[test]
    fn test_speak_payload_uses_long_message() {
        let call = Target::new("notify.kitchen_echo").service_call("Garth mower", &alert());
        assert_eq!(call.service, "notify/send_message");
        assert_eq!(
            call.payload,
            json!({
                "message": "speak",
                "entity_id": "notify.kitchen_echo",
                "message_body": "ERROR for Garth mower. | - Blade motor stalled.",
            })
        );
    }

    #[test]
    fn test_explicit_backend_overrides_detection() {
        let spec: TargetSpec =
            serde_yaml::from_str("{entity: notify.phone, backend: pushover}").unwrap();
        let target = spec.resolve().unwrap();
        assert_eq!(target.backend, Backend::Pushover);
        assert_eq!(
            target.service_call("Garth", &alert()).service,
            "notify/pushover"
        );
    }

    #[test]
    fn test_target_spec_forms() {
        let specs: Vec<TargetSpec> = serde_yaml::from_str(
            "- notify.office\n- entity: notify.pushover\n- entity: ''\n- {}\n",
        )
        .unwrap();
        let targets: Vec<Target> = specs.iter().filter_map(TargetSpec::resolve).collect();
        assert_eq!(
            targets,
            vec![
                Target::with_backend("notify.office", Backend::Speak),
                Target::with_backend("notify.pushover", Backend::Pushover),
            ]
        );
    }

    #[test]
    fn test_pushover_service_is_fixed() {
        for entity in ["pushover", "notify.pushover", "notify.pushover_phone"] {
            let call = Target::new(entity).service_call("Garth", &alert());
            assert_eq!(call.service, "notify/pushover", "entity={entity}");
        }
    }
}
