//! Signal value normalization
//!
//! Host values arrive loosely typed: JSON null, `"None"`, `"none"`, `""` and,
//! for the fault code, `"0"` all mean "nothing to report". They are
//! normalized once here so the rest of the pipeline matches on
//! [`SignalValue`] instead of comparing strings.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Fault code values that mean "no fault"
const CLEARED_CODES: [&str; 4] = ["", "none", "None", "0"];

/// Auxiliary reading values that mean "unavailable"
const MISSING_READINGS: [&str; 3] = ["", "none", "None"];

/// Normalized fault-code value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalValue {
    Cleared,
    /// Trimmed code as issued (leading zeros preserved)
    Present(String),
}

impl SignalValue {
    /// Normalize a raw fault-code payload
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if CLEARED_CODES.contains(&trimmed) {
            SignalValue::Cleared
        } else {
            SignalValue::Present(trimmed.to_string())
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            SignalValue::Cleared => None,
            SignalValue::Present(code) => Some(code),
        }
    }
}

/// One observed change of the fault-code signal
#[derive(Debug, Clone)]
pub struct FaultTransition {
    /// Previous raw value, `None` when the host had none
    pub old_value: Option<String>,
    /// New raw value, `None` when the host sent null
    pub new_value: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl FaultTransition {
    pub fn new(old_value: Option<String>, new_value: Option<String>) -> Self {
        Self {
            old_value,
            new_value,
            observed_at: Utc::now(),
        }
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }

    /// Previous value as the host would stringify it (`None` → `"None"`)
    pub fn old_as_str(&self) -> &str {
        self.old_value.as_deref().unwrap_or("None")
    }
}

/// Null-safe accessor for auxiliary readings: `None` when unavailable,
/// otherwise the value verbatim (`"0"` and `"False"` included)
pub fn reading(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(v) if !MISSING_READINGS.contains(&v) => Some(v.to_string()),
        _ => None,
    }
}

/// Stringify a JSON state value the way it is displayed to users
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_values() {
        for raw in ["", "none", "None", "0", "  0 ", "   "] {
            assert_eq!(SignalValue::from_raw(raw), SignalValue::Cleared, "raw={raw:?}");
        }
    }

    #[test]
    fn test_present_values_are_trimmed() {
        assert_eq!(
            SignalValue::from_raw(" 007 "),
            SignalValue::Present("007".to_string())
        );
        // only the exact cleared set counts as cleared
        assert_eq!(
            SignalValue::from_raw("NONE"),
            SignalValue::Present("NONE".to_string())
        );
        assert_eq!(SignalValue::from_raw("00").code(), Some("00"));
    }

    #[test]
    fn test_reading_accessor() {
        assert_eq!(reading(None), None);
        assert_eq!(reading(Some("None")), None);
        assert_eq!(reading(Some("none")), None);
        assert_eq!(reading(Some("")), None);
        assert_eq!(reading(Some("0")), Some("0".to_string()));
        assert_eq!(reading(Some("False")), Some("False".to_string()));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&Value::Null), None);
        assert_eq!(value_to_string(&serde_json::json!(42)), Some("42".to_string()));
        assert_eq!(value_to_string(&serde_json::json!(false)), Some("False".to_string()));
        assert_eq!(value_to_string(&serde_json::json!("on")), Some("on".to_string()));
    }

    #[test]
    fn test_transition_old_as_str() {
        let transition = FaultTransition::new(None, Some("7".to_string()));
        assert_eq!(transition.old_as_str(), "None");
    }
}
