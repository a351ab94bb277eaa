//! Polling driver - turns host state snapshots into change events
//!
//! The host only reports current values, so the monitor remembers the last
//! raw fault value per watcher and synthesizes `(old, new)` transitions when
//! it changes. Watchers are evaluated one at a time; a transition and all of
//! its deliveries finish before the next one starts.

use crate::catalog::CodeCatalog;
use crate::config::WatcherConfig;
use crate::host::{ServiceDispatcher, StateReader};
use crate::signal::FaultTransition;
use crate::watcher::{InitialState, Outcome, SignalWatcher, WatcherState};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Monitor {
    watchers: Vec<SignalWatcher>,
    /// Last raw fault value seen per watcher name
    last_values: HashMap<String, Option<String>>,
}

impl Monitor {
    pub fn new(configs: Vec<WatcherConfig>, catalog: Arc<CodeCatalog>) -> Self {
        let watchers = configs
            .into_iter()
            .map(|config| SignalWatcher::new(config, catalog.clone()))
            .collect();
        Self {
            watchers,
            last_values: HashMap::new(),
        }
    }

    pub fn watchers(&self) -> &[SignalWatcher] {
        &self.watchers
    }

    /// Arm every watcher and record the fault values read while arming
    pub fn arm_all(&mut self, reader: &dyn StateReader) -> Vec<(String, InitialState)> {
        let mut initial = Vec::with_capacity(self.watchers.len());
        for watcher in &mut self.watchers {
            let name = watcher.config().name.clone();
            let state = watcher.arm(reader);

            if state != InitialState::Disabled {
                let current = state.raw_value().map(str::to_string);
                self.last_values.insert(name.clone(), current);
            }
            initial.push((name, state));
        }

        let armed = self
            .watchers
            .iter()
            .filter(|w| w.state() == WatcherState::Armed)
            .count();
        info!(armed, total = self.watchers.len(), "Watchers armed");
        initial
    }

    /// Read every armed watcher's fault signal once and evaluate changes
    pub fn poll_once(
        &mut self,
        reader: &dyn StateReader,
        dispatcher: &dyn ServiceDispatcher,
    ) -> Vec<(String, Outcome)> {
        let mut outcomes = Vec::new();

        for watcher in &self.watchers {
            if watcher.state() != WatcherState::Armed {
                continue;
            }
            let Some(signal) = watcher.fault_signal() else {
                continue;
            };
            let name = &watcher.config().name;

            let current = match reader.get_state(signal) {
                Ok(value) => value,
                Err(e) => {
                    warn!(watcher = %name, signal, error = %e, "Failed to poll fault signal");
                    continue;
                }
            };

            let previous = self.last_values.get(name).cloned().flatten();
            if previous == current {
                continue;
            }

            debug!(watcher = %name, old = ?previous, new = ?current, "Fault signal changed");
            let transition = FaultTransition::new(previous, current.clone());
            let outcome = watcher.on_change(&transition, reader, dispatcher);
            self.last_values.insert(name.clone(), current);
            outcomes.push((name.clone(), outcome));
        }

        outcomes
    }
}
