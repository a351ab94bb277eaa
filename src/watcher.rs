//! Fault-code signal watcher
//!
//! One watcher per device. It is armed once at startup and then evaluates
//! every change of the fault-code signal:
//!
//! 1. null new value → ignored
//! 2. cleared value (`""`, `none`, `None`, `0`) → logged, nothing sent
//! 3. new value equal to the raw previous value → repeat, nothing sent
//! 4. catalog severity IGNORE → logged, nothing sent
//! 5. fault timestamp older than the staleness window → logged, nothing sent
//! 6. otherwise the alert is composed and routed
//!
//! Timestamp problems never suppress an alert: they are logged and the
//! transition continues to step 6.

use crate::catalog::CodeCatalog;
use crate::classifier::Classifier;
use crate::config::WatcherConfig;
use crate::host::{read_optional, ServiceDispatcher, StateReader};
use crate::notification::{
    DeliveryResult, MessageComposer, NotificationRouter, Readings, ResolvedAlert, Severity,
};
use crate::signal::{reading, FaultTransition, SignalValue};
use crate::staleness::{Freshness, StalenessFilter};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Not armed yet, or permanently disabled (no fault signal)
    Inert,
    Armed,
}

/// What arming found on the fault signal
#[derive(Debug, Clone, PartialEq)]
pub enum InitialState {
    /// No fault signal configured; the watcher stays disabled
    Disabled,
    /// No fault; `raw` is the value read (`None` when the host had none)
    Clear { raw: Option<String> },
    /// A fault was already present; logged only, never routed
    Existing {
        code: String,
        severity: Severity,
        raw: String,
    },
}

impl InitialState {
    /// Raw fault value read while arming
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            InitialState::Disabled => None,
            InitialState::Clear { raw } => raw.as_deref(),
            InitialState::Existing { raw, .. } => Some(raw),
        }
    }
}

/// Why a transition produced no alert
#[derive(Debug, Clone, PartialEq)]
pub enum Suppression {
    Inert,
    NullValue,
    Cleared,
    Repeat,
    IgnoredSeverity,
    Stale {
        reported_at: DateTime<Utc>,
        age: Duration,
    },
}

/// Result of evaluating one transition
#[derive(Debug, Clone)]
pub enum Evaluation {
    Suppressed(Suppression),
    Alert(ResolvedAlert),
}

impl Evaluation {
    pub fn alert(&self) -> Option<&ResolvedAlert> {
        match self {
            Evaluation::Alert(alert) => Some(alert),
            Evaluation::Suppressed(_) => None,
        }
    }
}

/// Everything one transition led to
#[derive(Debug, Clone)]
pub struct Outcome {
    pub evaluation: Evaluation,
    pub deliveries: Vec<DeliveryResult>,
}

pub struct SignalWatcher {
    config: WatcherConfig,
    catalog: Arc<CodeCatalog>,
    staleness: StalenessFilter,
    composer: MessageComposer,
    router: NotificationRouter,
    state: WatcherState,
}

impl SignalWatcher {
    pub fn new(config: WatcherConfig, catalog: Arc<CodeCatalog>) -> Self {
        let composer =
            MessageComposer::new(config.friendly_name.clone()).include_details(config.include_details);
        let router = NotificationRouter::new(
            config.friendly_name.clone(),
            config.error_targets.clone(),
            config.info_targets.clone(),
        );

        Self {
            config,
            catalog,
            staleness: StalenessFilter::default(),
            composer,
            router,
            state: WatcherState::Inert,
        }
    }

    /// Replace the staleness window
    pub fn with_staleness(mut self, staleness: StalenessFilter) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.router
    }

    /// Fault-code signal this watcher follows
    pub fn fault_signal(&self) -> Option<&str> {
        self.config.fault_signal.as_deref()
    }

    /// Arm the watcher and inspect the current fault value once.
    ///
    /// A pre-existing fault is logged but never routed; startup does not
    /// re-fire historical alerts.
    pub fn arm(&mut self, reader: &dyn StateReader) -> InitialState {
        let name = &self.config.friendly_name;
        let Some(signal) = self.config.fault_signal.as_deref() else {
            warn!(watcher = %self.config.name, "No 'error' entity configured; disabling");
            self.state = WatcherState::Inert;
            return InitialState::Disabled;
        };

        self.state = WatcherState::Armed;
        info!(watcher = %name, signal, "Watching fault code signal");

        let current = match reader.get_state(signal) {
            Ok(value) => value,
            Err(e) => {
                warn!(watcher = %name, signal, error = %e, "Could not read initial fault state");
                None
            }
        };

        let Some(raw) = current else {
            return InitialState::Clear { raw: None };
        };
        match SignalValue::from_raw(&raw) {
            SignalValue::Present(code) => {
                info!(watcher = %name, code = %code, "Initial error state {}; not re-notifying on startup", code);
                let severity = Classifier::new(&self.catalog).severity_of(&code);
                if severity.is_ignored() {
                    info!(watcher = %name, code = %code, "Ignoring error code {} (severity=IGNORE)", code);
                }
                InitialState::Existing { code, severity, raw }
            }
            SignalValue::Cleared => InitialState::Clear { raw: Some(raw) },
        }
    }

    /// Decide whether a transition is a new, actionable fault
    pub fn evaluate(&self, transition: &FaultTransition, reader: &dyn StateReader) -> Evaluation {
        let name = &self.config.friendly_name;

        if self.state == WatcherState::Inert {
            return Evaluation::Suppressed(Suppression::Inert);
        }

        let Some(raw) = transition.new_value.as_deref() else {
            debug!(watcher = %name, "Ignoring null fault value");
            return Evaluation::Suppressed(Suppression::NullValue);
        };

        let code = match SignalValue::from_raw(raw) {
            SignalValue::Cleared => {
                info!(watcher = %name, "{}: error cleared (was: {})", name, transition.old_as_str());
                return Evaluation::Suppressed(Suppression::Cleared);
            }
            SignalValue::Present(code) => code,
        };

        // compared against the raw previous value, not the normalized code
        if code == transition.old_as_str() {
            debug!(watcher = %name, code = %code, "Fault code unchanged");
            return Evaluation::Suppressed(Suppression::Repeat);
        }

        let classifier = Classifier::new(&self.catalog);
        if classifier.severity_of(&code).is_ignored() {
            info!(watcher = %name, code = %code, "{}: Ignoring error code {} (severity=IGNORE)", name, code);
            return Evaluation::Suppressed(Suppression::IgnoredSeverity);
        }

        if let Some(signal) = self.config.timestamp_signal.as_deref() {
            if let Some(suppression) = self.check_staleness(signal, &code, transition, reader) {
                return Evaluation::Suppressed(suppression);
            }
        }

        let classification = classifier.resolve(&code);
        if classification.severity.is_ignored() {
            info!(watcher = %name, code = %code, key = %classification.key, "Ignoring error code (severity=IGNORE)");
            return Evaluation::Suppressed(Suppression::IgnoredSeverity);
        }

        let readings = self.readings(reader);
        let message = self
            .composer
            .compose(&classification.severity, &classification.description, &readings);

        Evaluation::Alert(ResolvedAlert {
            code,
            severity: classification.severity,
            description: classification.description,
            long_message: message.long,
            short_message: message.short,
            observed_at: transition.observed_at,
        })
    }

    /// Evaluate a transition and route the alert, if any
    pub fn on_change(
        &self,
        transition: &FaultTransition,
        reader: &dyn StateReader,
        dispatcher: &dyn ServiceDispatcher,
    ) -> Outcome {
        let evaluation = self.evaluate(transition, reader);
        let deliveries = match &evaluation {
            Evaluation::Alert(alert) => self.router.route(alert, dispatcher),
            Evaluation::Suppressed(_) => Vec::new(),
        };
        Outcome {
            evaluation,
            deliveries,
        }
    }

    /// `Some` when the fault timestamp says the fault is stale.
    ///
    /// Read and parse errors are logged and treated as "not stale".
    fn check_staleness(
        &self,
        signal: &str,
        code: &str,
        transition: &FaultTransition,
        reader: &dyn StateReader,
    ) -> Option<Suppression> {
        let name = &self.config.friendly_name;

        let raw = match reader.get_state(signal) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(watcher = %name, signal, error = %e, "{}: could not evaluate error_date '{}'", name, signal);
                return None;
            }
        };

        match self.staleness.check(raw.as_deref(), transition.observed_at) {
            Ok(Freshness::Stale { reported_at, age }) => {
                info!(
                    watcher = %name,
                    code,
                    reported_at = %reported_at,
                    age_secs = age.num_seconds(),
                    "{}: Ignoring error code {} (reported at {} > {} min old)",
                    name,
                    code,
                    reported_at,
                    self.staleness.window().num_minutes()
                );
                Some(Suppression::Stale { reported_at, age })
            }
            Ok(_) => None,
            Err(e) => {
                warn!(watcher = %name, signal, error = %e, "{}: could not evaluate error_date '{}'", name, signal);
                None
            }
        }
    }

    fn readings(&self, reader: &dyn StateReader) -> Readings {
        let read = |signal: &Option<String>| reading(read_optional(reader, signal.as_deref()).as_deref());
        Readings {
            battery: read(&self.config.battery_signal),
            progress: read(&self.config.progress_signal),
            charging: read(&self.config.charge_signal),
            error_text: read(&self.config.error_text_signal),
        }
    }
}
