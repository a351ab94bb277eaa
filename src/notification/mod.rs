//! Alert composition and notification routing
//!
//! # Flow
//! 1. `Severity` decides whether and where an alert goes
//! 2. `MessageComposer` builds the long and short messages
//! 3. `NotificationRouter` selects targets and shapes one service call per
//!    target according to its `Backend`

pub mod channel;
pub mod composer;
pub mod router;
pub mod severity;
pub mod target;

pub use channel::{DeliveryResult, ResolvedAlert, SendResult, ServiceCall};
pub use composer::{ComposedMessage, MessageComposer, Readings};
pub use router::NotificationRouter;
pub use severity::{RouteClass, Severity};
pub use target::{Backend, Target, TargetSpec};
