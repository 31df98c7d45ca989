//! # Config Accessor
//!
//! Wraps the compiled data and schema trees and serves path-based reads.
//!
//! ## Validation State
//!
//! ```text
//! Unverified ──validate()──▶ Verified
//! ```
//!
//! While `Unverified`, every [`Config::get`] checks the value it returns
//! against the schema at that path and fails with
//! `Invalid config for <key>!`. [`Config::validate`] checks the whole tree
//! once, reports failures to `invalid` listeners instead of returning them,
//! and moves the accessor to `Verified` whatever the outcome. From then on
//! reads are never checked again. There is no transition back.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use envmap_schema::{Schema, ValidationViolations};

use crate::compile::{compile, DataMode, SchemaMode};
use crate::env::Environment;
use crate::error::ConfigError;
use crate::events::{ConfigEvent, EventKind, ListenerId, Listeners};
use crate::map::DeclarativeMap;
use crate::options::ConfigOptions;
use crate::tree::{walk, DataTree, Node, SchemaTree};

/// Whether whole-tree validation has run on an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationState {
    /// No whole-tree validation yet; reads are checked.
    Unverified,
    /// Whole-tree validation has run (terminal); reads are not checked.
    Verified,
}

impl ValidationState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unverified => "UNVERIFIED",
            Self::Verified => "VERIFIED",
        })
    }
}

/// Read accessor over a declarative map resolved against one environment.
#[derive(Debug)]
pub struct Config {
    map: Arc<DeclarativeMap>,
    env: Arc<Environment>,
    options: ConfigOptions,
    data: DataTree,
    schemas: SchemaTree,
    state: ValidationState,
    listeners: Listeners,
}

impl Config {
    /// Compile `map` against `env` (empty when `None`) with default options.
    ///
    /// Never fails and never validates.
    pub fn new(map: impl Into<Arc<DeclarativeMap>>, env: Option<Environment>) -> Self {
        Self::with_options(map, env, ConfigOptions::default())
    }

    /// Compile `map` against `env` (empty when `None`).
    pub fn with_options(
        map: impl Into<Arc<DeclarativeMap>>,
        env: Option<Environment>,
        options: ConfigOptions,
    ) -> Self {
        Self::from_shared(map.into(), Arc::new(env.unwrap_or_default()), options)
    }

    pub(crate) fn from_shared(
        map: Arc<DeclarativeMap>,
        env: Arc<Environment>,
        options: ConfigOptions,
    ) -> Self {
        let schemas = compile(&map, &env, &SchemaMode);
        let data = compile(&map, &env, &DataMode::new(options.fallback));

        debug!(
            leaves = data.leaf_paths().len(),
            resolved = data.resolved_leaves(),
            fallback = %options.fallback,
            "compiled config trees"
        );

        Self {
            map,
            env,
            options,
            data,
            schemas,
            state: ValidationState::Unverified,
            listeners: Listeners::new(),
        }
    }

    /// Read the value at `path`.
    ///
    /// A path ending on a group returns the group as a JSON object. An empty
    /// or undeclared path reads as `None`.
    ///
    /// # Errors
    ///
    /// While [`ValidationState::Unverified`], returns
    /// `ConfigError::InvalidConfig` naming the first path segment if the
    /// value fails a schema at or below `path`.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Result<Option<Value>, ConfigError> {
        let Some((datum, schema)) = walk(&self.data, &self.schemas, path) else {
            return Ok(None);
        };

        if self.state == ValidationState::Unverified {
            let mut prefix: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
            let mut violations = ValidationViolations::new();
            check_node(datum, schema, &mut prefix, &mut violations);

            if !violations.is_empty() {
                let key = path.first().map(|s| s.as_ref().to_string()).unwrap_or_default();
                debug!(key = %key, %violations, "config read failed validation");
                return Err(ConfigError::InvalidConfig { key });
            }
        }

        Ok(datum.to_json())
    }

    /// Read the value at `path` and deserialize it.
    ///
    /// # Errors
    ///
    /// Everything [`Config::get`] returns, plus `ConfigError::Deserialize`
    /// when the value does not have type `T`.
    pub fn get_as<T, S>(&self, path: &[S]) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        self.get(path)?
            .map(|value| {
                serde_json::from_value(value).map_err(|source| ConfigError::Deserialize {
                    path: path.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join("."),
                    source,
                })
            })
            .transpose()
    }

    /// Validate the whole data tree against the schema tree.
    ///
    /// Failures are not returned. Each call that finds violations emits one
    /// [`ConfigEvent::Invalid`] to the registered handlers before returning,
    /// with the message ``<violations> — got `<data tree>` ``. The accessor is
    /// [`ValidationState::Verified`] afterwards, whatever the outcome.
    pub fn validate(&mut self) {
        let mut violations = ValidationViolations::new();
        let mut prefix = Vec::new();
        for (key, schema) in self.schemas.iter() {
            if let Some(datum) = self.data.get(key) {
                prefix.push(key.to_string());
                check_node(datum, schema, &mut prefix, &mut violations);
                prefix.pop();
            }
        }

        if !violations.is_empty() {
            let message = format!("{violations} — got `{}`", self.data);
            warn!(violations = violations.len(), %message, "config validation failed");
            let delivered = self.listeners.emit(&ConfigEvent::Invalid { message });
            debug!(delivered, "invalid config event dispatched");
        }

        if self.state == ValidationState::Unverified {
            debug!(from = %self.state, to = %ValidationState::Verified, "config validation latched");
        }
        self.state = ValidationState::Verified;
    }

    /// Register a handler for `invalid` messages.
    pub fn on_invalid<F>(&mut self, mut handler: F) -> ListenerId
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.listeners
            .subscribe(EventKind::Invalid, move |event| match event {
                ConfigEvent::Invalid { message } => handler(message),
            })
    }

    /// Register a handler for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&ConfigEvent) + Send + 'static,
    {
        self.listeners.subscribe(kind, handler)
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Current validation state.
    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Whether whole-tree validation has run.
    pub fn is_verified(&self) -> bool {
        self.state.is_terminal()
    }

    /// The compiled data tree.
    pub fn data(&self) -> &DataTree {
        &self.data
    }

    /// The compiled schema tree.
    pub fn schemas(&self) -> &SchemaTree {
        &self.schemas
    }

    /// The declarative map this accessor was compiled from.
    pub fn map(&self) -> &DeclarativeMap {
        &self.map
    }

    /// The environment this accessor was compiled against.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// The options used at compilation.
    pub fn options(&self) -> ConfigOptions {
        self.options
    }
}

/// Collect violations of every schema at or below a node pair.
fn check_node(
    datum: &Node<Value>,
    schema: &Node<Schema>,
    path: &mut Vec<String>,
    out: &mut ValidationViolations,
) {
    match (datum, schema) {
        (Node::Leaf(value), Node::Leaf(Some(schema))) => {
            if let Err(violations) = schema.check(path.as_slice(), value.as_ref()) {
                out.extend(violations);
            }
        }
        (Node::Group(data), Node::Group(schemas)) => {
            for (key, schema) in schemas.iter() {
                if let Some(datum) = data.get(key) {
                    path.push(key.to_string());
                    check_node(datum, schema, path, out);
                    path.pop();
                }
            }
        }
        // Unchecked leaf, or shapes that cannot differ when both trees come
        // from the same map.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Declaration;
    use serde_json::json;
    use std::sync::Mutex;

    fn required_string() -> Schema {
        Schema::new(json!({"type": "string"})).unwrap().required()
    }

    fn capture(config: &mut Config) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        config.on_invalid(move |message| sink.lock().unwrap().push(message.to_string()));
        seen
    }

    #[test]
    fn test_starts_unverified() {
        let config = Config::new(DeclarativeMap::new(), None);
        assert_eq!(config.state(), ValidationState::Unverified);
        assert!(!config.is_verified());
        assert!(config.environment().is_empty());
    }

    #[test]
    fn test_get_unknown_and_empty_paths_read_as_none() {
        let config = Config::new(DeclarativeMap::new().with("a", "A"), None);
        assert_eq!(config.get(&["missing"]).unwrap(), None);
        assert_eq!(config.get(&["a", "below_leaf"]).unwrap(), None);
        assert_eq!(config.get::<&str>(&[]).unwrap(), None);
    }

    #[test]
    fn test_get_group_returns_object() {
        let map = DeclarativeMap::new().with(
            "db",
            DeclarativeMap::new().with("host", "DB_HOST").with("port", "DB_PORT"),
        );
        let env: Environment = [("DB_HOST", "localhost")].into_iter().collect();
        let config = Config::new(map, Some(env));
        assert_eq!(config.get(&["db"]).unwrap(), Some(json!({"host": "localhost"})));
    }

    #[test]
    fn test_get_group_checks_schemas_below() {
        let map = DeclarativeMap::new().with(
            "db",
            DeclarativeMap::new().with("host", Declaration::declared("DB_HOST", Some(required_string()), None)),
        );
        let config = Config::new(map, None);
        let err = config.get(&["db"]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid config for db!");
    }

    #[test]
    fn test_get_rejects_wrong_type_before_validate() {
        let schema = Schema::new(json!({"type": "integer"})).unwrap();
        let map = DeclarativeMap::new().with("port", Declaration::declared("PORT", Some(schema), None));
        let env: Environment = [("PORT", "8080")].into_iter().collect();
        let config = Config::new(map, Some(env));

        let err = config.get(&["port"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { ref key } if key == "port"));
    }

    #[test]
    fn test_validate_latches_even_on_success() {
        let map = DeclarativeMap::new().with("s3", Declaration::declared("S3", Some(required_string()), None));
        let env: Environment = [("S3", "s3://bucket")].into_iter().collect();
        let mut config = Config::new(map, Some(env));
        let seen = capture(&mut config);

        config.validate();

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(config.state(), ValidationState::Verified);
        assert_eq!(config.get(&["s3"]).unwrap(), Some(json!("s3://bucket")));
    }

    #[test]
    fn test_validate_without_schemas_is_silent() {
        let mut config = Config::new(DeclarativeMap::new().with("a", "A"), None);
        let seen = capture(&mut config);
        config.validate();
        assert!(seen.lock().unwrap().is_empty());
        assert!(config.is_verified());
    }

    #[test]
    fn test_validate_aggregates_all_violations() {
        let map = DeclarativeMap::new()
            .with("s3", Declaration::declared("S3", Some(required_string()), None))
            .with(
                "AWS",
                DeclarativeMap::new().with("ec2", Declaration::declared("EC2", Some(required_string()), None)),
            );
        let mut config = Config::new(map, None);
        let seen = capture(&mut config);

        config.validate();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            "s3: \"s3\" is required; AWS.ec2: \"ec2\" is required \
             — got `{ s3: undefined, AWS: { ec2: undefined } }`"
        );
    }

    #[test]
    fn test_unsubscribed_handler_is_not_called() {
        let map = DeclarativeMap::new().with("s3", Declaration::declared("S3", Some(required_string()), None));
        let mut config = Config::new(map, None);
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = config.on_invalid(move |_| *sink.lock().unwrap() += 1);

        assert!(config.unsubscribe(id));
        config.validate();
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn test_get_as_deserializes() {
        let map = DeclarativeMap::new()
            .with("port", Declaration::declared("PORT", None, Some(json!(8080))))
            .with("name", "NAME");
        let env: Environment = [("NAME", "svc")].into_iter().collect();
        let config = Config::new(map, Some(env));

        assert_eq!(config.get_as::<u16, _>(&["port"]).unwrap(), Some(8080));
        assert_eq!(config.get_as::<String, _>(&["missing"]).unwrap(), None);

        let err = config.get_as::<u16, _>(&["name"]).unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize { ref path, .. } if path == "name"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ValidationState::Unverified.to_string(), "UNVERIFIED");
        assert!(ValidationState::Verified.is_terminal());
    }
}
