//! # Accessor Options
//!
//! Knobs for how a declarative map resolves against an environment.
//! `ConfigOptions::default()` reproduces the classic behaviour.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// When a declared leaf falls back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Fall back when the env value is missing or falsy: `null`, `false`,
    /// a zero number, or `""`. An explicit `PORT=0` or `NAME=` is replaced
    /// by the default.
    #[default]
    Falsy,
    /// Fall back only when the key is missing.
    Absent,
}

impl FallbackPolicy {
    /// Whether `value` counts as missing under this policy.
    pub fn treats_as_missing(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (_, None) => true,
            (Self::Falsy, Some(value)) => is_falsy(value),
            (Self::Absent, Some(_)) => false,
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Falsy => "falsy",
            Self::Absent => "absent",
        })
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "falsy" => Ok(Self::Falsy),
            "absent" => Ok(Self::Absent),
            other => Err(format!(
                "unknown fallback policy '{other}', expected 'falsy' or 'absent'"
            )),
        }
    }
}

/// `null`, `false`, numeric zero and the empty string. Arrays and objects
/// are never falsy, even when empty.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Options applied when a [`Config`](crate::Config) compiles its trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOptions {
    /// When declared leaves use their default.
    pub fallback: FallbackPolicy,
}

impl ConfigOptions {
    /// Options with the given fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_values() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!(-0.0), json!("")] {
            assert!(is_falsy(&value), "{value} should be falsy");
        }
        for value in [json!(true), json!(1), json!("0"), json!(" "), json!([]), json!({})] {
            assert!(!is_falsy(&value), "{value} should be truthy");
        }
    }

    #[test]
    fn test_policies_disagree_on_empty_string() {
        let empty = json!("");
        assert!(FallbackPolicy::Falsy.treats_as_missing(Some(&empty)));
        assert!(!FallbackPolicy::Absent.treats_as_missing(Some(&empty)));
        assert!(FallbackPolicy::Absent.treats_as_missing(None));
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("Absent".parse::<FallbackPolicy>(), Ok(FallbackPolicy::Absent));
        assert_eq!(FallbackPolicy::Falsy.to_string(), "falsy");
        assert!("sometimes".parse::<FallbackPolicy>().is_err());
    }

    #[test]
    fn test_options_deserialize() {
        let options: ConfigOptions = serde_json::from_value(json!({"fallback": "absent"})).unwrap();
        assert_eq!(options.fallback, FallbackPolicy::Absent);

        let options: ConfigOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, ConfigOptions::default());
    }
}
