//! # Environment Source
//!
//! An immutable flat mapping from key to raw value. Values are
//! `serde_json::Value` so callers can supply non-string values; values
//! snapshotted from the process environment are always strings.
//!
//! Where the values come from is the caller's business. Once an
//! [`Environment`] is handed to a [`Config`](crate::Config) it is shared
//! behind an `Arc` and never changes.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ConfigError;

/// A flat key-value lookup supplying raw config values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: BTreeMap<String, Value>,
}

impl Environment {
    /// An environment with no keys.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Build from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` if `value` is not an object.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(object) = value else {
            return Err(ConfigError::InvalidEnvironment(format!(
                "expected an object, got {value}"
            )));
        };
        Ok(object.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Whether `key` is present, whatever its value.
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
