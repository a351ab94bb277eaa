//! Robot Alert - classify robot fault codes and route notifications
//!
//! A watcher follows one device's fault-code signal, resolves each new code
//! against the fault catalog, drops cleared, repeated, ignored and stale
//! codes, and delivers the remaining alerts to the configured notify targets.

pub mod catalog;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod host;
pub mod monitor;
pub mod notification;
pub mod signal;
pub mod staleness;
pub mod watcher;

pub use catalog::{CatalogError, CodeCatalog};
pub use classifier::{Classification, Classifier};
pub use config::{AppConfig, WatcherConfig, WatcherSettings};
pub use host::{DryRunDispatcher, HomeAssistantClient, HostError, ServiceDispatcher, StateReader};
pub use monitor::Monitor;
pub use notification::{
    Backend, DeliveryResult, MessageComposer, NotificationRouter, Readings, ResolvedAlert,
    SendResult, Severity, Target, TargetSpec,
};
pub use signal::{FaultTransition, SignalValue};
pub use staleness::{Freshness, StalenessFilter};
pub use watcher::{Evaluation, InitialState, Outcome, SignalWatcher, Suppression, WatcherState};
