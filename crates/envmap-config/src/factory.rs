//! # Config Factory
//!
//! Separates what keys exist from what values are present now: a factory
//! holds one declarative map and builds an independent [`Config`] per
//! environment. The map is shared between every accessor it builds.

use std::sync::Arc;

use crate::accessor::Config;
use crate::env::Environment;
use crate::map::DeclarativeMap;
use crate::options::ConfigOptions;

/// Builds accessors for one declarative map.
#[derive(Debug, Clone)]
pub struct ConfigFactory {
    map: Arc<DeclarativeMap>,
    options: ConfigOptions,
}

impl ConfigFactory {
    /// A factory with default options.
    pub fn new(map: DeclarativeMap) -> Self {
        Self::with_options(map, ConfigOptions::default())
    }

    /// A factory whose accessors compile with `options`.
    pub fn with_options(map: DeclarativeMap, options: ConfigOptions) -> Self {
        Self {
            map: Arc::new(map),
            options,
        }
    }

    /// Build an accessor over `env`.
    pub fn build(&self, env: Environment) -> Config {
        Config::from_shared(Arc::clone(&self.map), Arc::new(env), self.options)
    }

    /// Build an accessor over an empty environment.
    pub fn build_empty(&self) -> Config {
        self.build(Environment::empty())
    }

    /// The shared declarative map.
    pub fn map(&self) -> &DeclarativeMap {
        &self.map
    }

    /// Options applied to every accessor.
    pub fn options(&self) -> ConfigOptions {
        self.options
    }
}

/// Curried constructor: `config_factory(map)(env)`.
pub fn config_factory(map: DeclarativeMap) -> impl Fn(Environment) -> Config {
    let factory = ConfigFactory::new(map);
    move |env| factory.build(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FallbackPolicy;
    use serde_json::json;

    #[test]
    fn test_accessors_are_independent() {
        let factory = ConfigFactory::new(DeclarativeMap::new().with("svc", "SERVICE"));
        let mut first = factory.build([("SERVICE", "a")].into_iter().collect());
        let second = factory.build([("SERVICE", "b")].into_iter().collect());

        first.validate();
        assert!(first.is_verified());
        assert!(!second.is_verified());
        assert_eq!(first.get(&["svc"]).unwrap(), Some(json!("a")));
        assert_eq!(second.get(&["svc"]).unwrap(), Some(json!("b")));
    }

    #[test]
    fn test_build_empty() {
        let factory = ConfigFactory::new(DeclarativeMap::new().with("svc", "SERVICE"));
        let config = factory.build_empty();
        assert!(config.environment().is_empty());
        assert_eq!(config.get(&["svc"]).unwrap(), None);
    }

    #[test]
    fn test_options_flow_into_accessors() {
        let map = DeclarativeMap::new().with(
            "name",
            crate::map::Declaration::declared("NAME", None, Some(json!("default"))),
        );
        let options = ConfigOptions::default().with_fallback(FallbackPolicy::Absent);
        let factory = ConfigFactory::with_options(map, options);
        let config = factory.build([("NAME", "")].into_iter().collect());

        assert_eq!(config.options().fallback, FallbackPolicy::Absent);
        assert_eq!(config.get(&["name"]).unwrap(), Some(json!("")));
    }

    #[test]
    fn test_curried_form() {
        let make = config_factory(DeclarativeMap::new().with("a", "A"));
        let config = make([("A", 1)].into_iter().collect());
        assert_eq!(config.get(&["a"]).unwrap(), Some(json!(1)));
    }
}
