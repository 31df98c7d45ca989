//! # Declarative Map
//!
//! Caller-authored nested structure naming which environment key feeds
//! which config path. Every entry is exactly one [`Declaration`]:
//!
//! - `DirectKey(name)` — read `name` from the environment, no schema, no default.
//! - `Declared { env_key, schema, default }` — read `env_key`, fall back to
//!   `default`, validate against `schema`. Schema and default are independent.
//! - `Group(map)` — a nested map; not a leaf.
//!
//! ## JSON Form
//!
//! [`DeclarativeMap::from_json`] accepts the structural spelling: a string
//! is a direct key, an array is `[envKey, schema, default]`, an object is a
//! group. It is permissive about shape. Missing array positions, `null` and
//! `false` are absent, extra positions are ignored, a non-string env key is
//! read under its JSON text, and any other scalar becomes an empty group.
//! Only a schema that fails to build is an error.

use indexmap::IndexMap;
use serde_json::Value;

use envmap_schema::Schema;

use crate::error::ConfigError;

/// One entry of a [`DeclarativeMap`].
#[derive(Debug, Clone)]
pub enum Declaration {
    /// Read this environment key as-is.
    DirectKey(String),
    /// Read `env_key`, falling back to `default`, checked by `schema`.
    Declared {
        /// Environment key to read.
        env_key: String,
        /// Validation rule for the resolved value.
        schema: Option<Schema>,
        /// Value used when the environment does not supply one.
        default: Option<Value>,
    },
    /// A nested map.
    Group(DeclarativeMap),
}

impl Declaration {
    /// A leaf with no schema and no default.
    pub fn direct(env_key: impl Into<String>) -> Self {
        Self::DirectKey(env_key.into())
    }

    /// A leaf with an optional schema and an optional default.
    pub fn declared(
        env_key: impl Into<String>,
        schema: Option<Schema>,
        default: Option<Value>,
    ) -> Self {
        Self::Declared {
            env_key: env_key.into(),
            schema,
            default,
        }
    }

    /// Whether this declaration is a leaf.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Group(_))
    }

    fn from_json(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::String(key) => Ok(Self::DirectKey(key.clone())),
            Value::Array(items) => {
                let env_key = match items.first() {
                    Some(Value::String(key)) => key.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                let schema = match items.get(1) {
                    None | Some(Value::Null) | Some(Value::Bool(false)) => None,
                    Some(rule) => Some(Schema::new(rule.clone())?),
                };
                let default = match items.get(2) {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(value.clone()),
                };
                Ok(Self::Declared {
                    env_key,
                    schema,
                    default,
                })
            }
            Value::Object(_) => Ok(Self::Group(DeclarativeMap::from_json(value)?)),
            _ => Ok(Self::Group(DeclarativeMap::new())),
        }
    }
}

impl From<&str> for Declaration {
    fn from(env_key: &str) -> Self {
        Self::DirectKey(env_key.to_string())
    }
}

impl From<String> for Declaration {
    fn from(env_key: String) -> Self {
        Self::DirectKey(env_key)
    }
}

impl From<DeclarativeMap> for Declaration {
    fn from(map: DeclarativeMap) -> Self {
        Self::Group(map)
    }
}

/// Insertion-ordered map from config key to [`Declaration`].
#[derive(Debug, Clone, Default)]
pub struct DeclarativeMap {
    entries: IndexMap<String, Declaration>,
}

impl DeclarativeMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`DeclarativeMap::insert`].
    pub fn with(mut self, key: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        self.insert(key, declaration);
        self
    }

    /// Insert or replace an entry, returning the replaced declaration.
    ///
    /// A replaced key keeps its original position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        declaration: impl Into<Declaration>,
    ) -> Option<Declaration> {
        self.entries.insert(key.into(), declaration.into())
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Declaration> {
        self.entries.get(key)
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Declaration)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every leaf path, depth-first in declaration order.
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        collect_leaf_paths(self, &mut Vec::new(), &mut paths);
        paths
    }

    /// Parse the structural JSON form.
    ///
    /// A non-object top level is an empty map.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Schema` if a schema position holds a rule that
    /// does not build.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let mut map = Self::new();
        if let Value::Object(object) = value {
            for (key, entry) in object {
                map.insert(key.clone(), Declaration::from_json(entry)?);
            }
        }
        Ok(map)
    }
}

fn collect_leaf_paths(map: &DeclarativeMap, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    for (key, declaration) in map.iter() {
        prefix.push(key.to_string());
        match declaration {
            Declaration::Group(inner) => collect_leaf_paths(inner, prefix, out),
            Declaration::DirectKey(_) | Declaration::Declared { .. } => out.push(prefix.clone()),
        }
        prefix.pop();
    }
}
