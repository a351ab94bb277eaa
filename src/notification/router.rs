//! Notification router - picks the target list by severity and delivers
//!
//! INFO alerts go to the info targets, everything else to the error targets.
//! Each target is attempted once, in configured order; a failing target is
//! logged and the remaining targets are still attempted.

use super::channel::{DeliveryResult, ResolvedAlert, SendResult, ServiceCall};
use super::severity::RouteClass;
use super::target::Target;
use crate::host::ServiceDispatcher;
use tracing::{error, info, warn};

/// Routes alerts for one device
#[derive(Debug, Clone)]
pub struct NotificationRouter {
    friendly_name: String,
    error_targets: Vec<Target>,
    info_targets: Vec<Target>,
}

impl NotificationRouter {
    pub fn new(
        friendly_name: impl Into<String>,
        error_targets: Vec<Target>,
        info_targets: Vec<Target>,
    ) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            error_targets,
            info_targets,
        }
    }

    /// Target list for an alert, empty for IGNORE
    pub fn select_targets(&self, alert: &ResolvedAlert) -> &[Target] {
        match alert.severity.route_class() {
            Some(RouteClass::Info) => &self.info_targets,
            Some(RouteClass::Error) => &self.error_targets,
            None => &[],
        }
    }

    /// Service calls that `route` would make, in delivery order
    pub fn plan(&self, alert: &ResolvedAlert) -> Vec<(&Target, ServiceCall)> {
        self.select_targets(alert)
            .iter()
            .map(|target| (target, target.service_call(&self.friendly_name, alert)))
            .collect()
    }

    /// Deliver an alert to every selected target
    pub fn route(&self, alert: &ResolvedAlert, dispatcher: &dyn ServiceDispatcher) -> Vec<DeliveryResult> {
        let name = &self.friendly_name;

        match alert.severity.route_class() {
            None => {
                info!(watcher = %name, code = %alert.code, "Severity IGNORE; nothing to route");
                return Vec::new();
            }
            Some(RouteClass::Info) => {
                let targets: Vec<&str> = self.info_targets.iter().map(|t| t.entity_id.as_str()).collect();
                info!(
                    watcher = %name,
                    code = %alert.code,
                    severity = %alert.severity,
                    targets = ?targets,
                    "{}: info-level ({}) -> notifying",
                    name,
                    alert.code
                );
            }
            Some(RouteClass::Error) => {
                let targets: Vec<&str> = self.error_targets.iter().map(|t| t.entity_id.as_str()).collect();
                error!(
                    watcher = %name,
                    code = %alert.code,
                    severity = %alert.severity,
                    targets = ?targets,
                    "{}: error-level ({}) -> notifying",
                    name,
                    alert.code
                );
            }
        }

        let plan = self.plan(alert);
        if plan.is_empty() {
            warn!(
                watcher = %name,
                "No notify targets configured; message: {}",
                alert.long_message
            );
            return Vec::new();
        }

        plan.into_iter()
            .map(|(target, call)| {
                let result = match dispatcher.call_service(&call.service, &call.payload) {
                    Ok(()) if dispatcher.is_dry_run() => SendResult::Skipped("dry-run".to_string()),
                    Ok(()) => {
                        info!(
                            target = %target.entity_id,
                            backend = target.backend.as_str(),
                            service = %call.service,
                            "Notification sent"
                        );
                        SendResult::Sent
                    }
                    Err(e) => {
                        error!(
                            target = %target.entity_id,
                            service = %call.service,
                            error = %e,
                            "Failed to call notify service"
                        );
                        SendResult::Failed(e.to_string())
                    }
                };
                DeliveryResult {
                    target: target.entity_id.clone(),
                    service: call.service,
                    result,
                }
            })
            .collect()
    }

    pub fn error_targets(&self) -> &[Target] {
        &self.error_targets
    }

    pub fn info_targets(&self) -> &[Target] {
        &self.info_targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DryRunDispatcher, HostError};
    use crate::notification::severity::Severity;
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Records calls and fails for targets listed in `fail_for`
    #[derive(Default)]
    struct MockDispatcher {
        calls: Mutex<Vec<ServiceCall>>,
        fail_for: Vec<String>,
    }

    impl MockDispatcher {
        fn failing_for(entity: &str) -> Self {
            Self {
                fail_for: vec![entity.to_string()],
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<ServiceCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ServiceDispatcher for MockDispatcher {
        fn call_service(&self, service: &str, payload: &Value) -> Result<(), HostError> {
            self.calls
                .lock()
                .unwrap()
                .push(ServiceCall::new(service, payload.clone()));
            let entity = payload.get("entity_id").and_then(Value::as_str).unwrap_or("");
            if self.fail_for.iter().any(|f| f == entity) {
                return Err(HostError::Rejected(format!("{} unreachable", entity)));
            }
            Ok(())
        }
    }

    fn alert(severity: Severity) -> ResolvedAlert {
        ResolvedAlert {
            code: "7".to_string(),
            severity: severity.clone(),
            description: "Blade motor stalled".to_string(),
            long_message: format!("{} for Garth mower. | - Blade motor stalled.", severity),
            short_message: format!("{}. Garth mower reported Blade motor stalled", severity),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_info_with_no_info_targets_sends_nothing() {
        let router = NotificationRouter::new("Garth mower", vec![Target::new("notify.a")], vec![]);
        let dispatcher = MockDispatcher::default();

        let results = router.route(&alert(Severity::Info), &dispatcher);

        assert!(results.is_empty());
        assert!(dispatcher.calls().is_empty());
    }

    #[test]
    fn test_error_routes_to_error_targets_in_order() {
        let router = NotificationRouter::new(
            "Garth mower",
            vec![Target::new("notify.office_speak"), Target::new("notify.pushover")],
            vec![Target::new("notify.kitchen")],
        );
        let dispatcher = MockDispatcher::default();

        let results = router.route(&alert(Severity::Error), &dispatcher);

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(DeliveryResult::is_sent));
        let calls = dispatcher.calls();
        assert_eq!(calls[0].service, "notify/send_message");
        assert_eq!(calls[0].payload["entity_id"], "notify.office_speak");
        assert_eq!(calls[1].service, "notify/pushover");
        assert_eq!(calls[1].payload["title"], "Garth mower Garth Alert");
    }

    #[test]
    fn test_unknown_severity_routes_as_error() {
        let router = NotificationRouter::new("Garth", vec![Target::new("notify.a")], vec![Target::new("notify.b")]);
        let targets = router.select_targets(&alert(Severity::Other("WARNING".to_string())));
        assert_eq!(targets, &[Target::new("notify.a")]);
    }

    #[test]
    fn test_ignore_never_routes() {
        let router = NotificationRouter::new("Garth", vec![Target::new("notify.a")], vec![Target::new("notify.b")]);
        let dispatcher = MockDispatcher::default();

        assert!(router.route(&alert(Severity::Ignore), &dispatcher).is_empty());
        assert!(dispatcher.calls().is_empty());
    }

    #[test]
    fn test_failure_does_not_stop_remaining_targets() {
        let router = NotificationRouter::new(
            "Garth",
            vec![
                Target::new("notify.a"),
                Target::new("notify.b"),
                Target::new("notify.c"),
            ],
            vec![],
        );
        let dispatcher = MockDispatcher::failing_for("notify.b");

        let results = router.route(&alert(Severity::Error), &dispatcher);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].result, SendResult::Sent);
        assert_eq!(
            results[1].result,
            SendResult::Failed("notify.b unreachable".to_string())
        );
        assert_eq!(results[2].result, SendResult::Sent);
        assert_eq!(dispatcher.calls().len(), 3);
    }

    #[test]
    fn test_pushover_targets_share_one_service() {
        let router = NotificationRouter::new("Garth", vec![Target::new("notify.pushover_phone")], vec![]);
        let plan = router.plan(&alert(Severity::Error));
        assert_eq!(plan[0].1.service, "notify/pushover");
        assert_eq!(plan[0].1.payload["title"], "Garth Garth Alert");
    }

    #[test]
    fn test_dry_run_deliveries_are_skipped() {
        let router = NotificationRouter::new("Garth", vec![Target::new("notify.office")], vec![]);
        let dispatcher = DryRunDispatcher::new();

        let results = router.route(&alert(Severity::Error), &dispatcher);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result, SendResult::Skipped("dry-run".to_string()));
        assert!(!results[0].is_sent());
        // the call is still recorded for inspection
        assert_eq!(dispatcher.calls().len(), 1);
    }

    #[test]
    fn test_plan_matches_backends() {
        let router = NotificationRouter::new(
            "Garth",
            vec![],
            vec![Target::new("notify.pushover_phone"), Target::new("notify.echo")],
        );
        let plan = router.plan(&alert(Severity::Info));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].1.service, "notify/pushover");
        assert_eq!(plan[0].1.payload["message"], "INFO. Garth mower reported Blade motor stalled");
        assert_eq!(plan[1].1.payload["message"], "speak");
        assert_eq!(
            plan[1].1.payload["message_body"],
            "INFO for Garth mower. | - Blade motor stalled."
        );
    }
}
