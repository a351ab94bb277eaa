//! Alert message composition
//!
//! Produces the long pipe-separated message used by speak targets and the
//! one-line message used by push targets. Readings that are unavailable are
//! left out entirely.

use super::severity::Severity;

/// Auxiliary readings, already passed through the null-safe accessor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings {
    pub battery: Option<String>,
    pub progress: Option<String>,
    pub charging: Option<String>,
    /// Device-supplied error text, only shown when details are enabled
    pub error_text: Option<String>,
}

/// Long and short form of one alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub long: String,
    pub short: String,
}

/// Builds alert messages for one device
#[derive(Debug, Clone)]
pub struct MessageComposer {
    friendly_name: String,
    include_details: bool,
}

impl MessageComposer {
    pub fn new(friendly_name: impl Into<String>) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            include_details: false,
        }
    }

    /// Append the device's error text to the long message
    pub fn include_details(mut self, include: bool) -> Self {
        self.include_details = include;
        self
    }

    pub fn compose(&self, severity: &Severity, description: &str, readings: &Readings) -> ComposedMessage {
        let name = &self.friendly_name;

        let mut parts = vec![format!("{} for {}.", severity, name)];
        if !description.is_empty() {
            parts.push(format!("- {}.", description));
        }
        if let Some(battery) = &readings.battery {
            parts.push(format!("Battery is {}%", battery));
        }
        if let Some(progress) = &readings.progress {
            parts.push(format!("Task is {}% complete.", progress));
        }
        if let Some(charging) = &readings.charging {
            parts.push(format!("Charging is {}", charging));
        }
        if self.include_details {
            if let Some(text) = &readings.error_text {
                parts.push(format!("Details: {}", text));
            }
        }

        ComposedMessage {
            long: parts.join(" | "),
            short: format!("{}. {} reported {}", severity, name, description),
        }
    }
}
