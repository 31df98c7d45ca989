//! # envmap-config — Declarative Environment Config
//!
//! Maps a declarative nested structure of key names, with optional schemas
//! and defaults, onto values from a flat environment source.
//!
//! ## Pipeline
//!
//! 1. **Map compiler** (`compile`): resolves a [`DeclarativeMap`] against an
//!    [`Environment`] twice, once into a [`DataTree`] of values and once into
//!    a [`SchemaTree`] of rules, both shaped exactly like the map.
//!
//! 2. **Accessor** (`accessor`): [`Config::get`] walks both trees in
//!    lockstep and checks each read until [`Config::validate`] has run once;
//!    `validate` reports whole-tree failures to `invalid` listeners rather
//!    than returning them.
//!
//! ## Example
//!
//! ```
//! use envmap_config::{config_factory, DeclarativeMap, Declaration, Environment};
//! use serde_json::json;
//!
//! let map = DeclarativeMap::new()
//!     .with("service", "SERVICE")
//!     .with("aws", DeclarativeMap::new().with(
//!         "s3",
//!         Declaration::declared("S3", None, Some(json!("s3://blah"))),
//!     ));
//! let make = config_factory(map);
//! let config = make([("SERVICE", "billing")].into_iter().collect::<Environment>());
//!
//! assert_eq!(config.get(&["service"]).unwrap(), Some(json!("billing")));
//! assert_eq!(config.get(&["aws", "s3"]).unwrap(), Some(json!("s3://blah")));
//! ```
//!
//! ## Crate Policy
//!
//! - Construction never fails and never validates.
//! - Unknown paths and malformed declarations read as absent, not as errors.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Logging goes through `tracing`; installing a subscriber is the host
//!   application's job.

pub mod accessor;
pub mod compile;
pub mod env;
pub mod error;
pub mod events;
pub mod factory;
pub mod map;
pub mod options;
pub mod tree;

pub use accessor::{Config, ValidationState};
pub use compile::{compile, CompileMode, DataMode, SchemaMode};
pub use env::Environment;
pub use error::ConfigError;
pub use events::{ConfigEvent, EventKind, ListenerId, Listeners};
pub use factory::{config_factory, ConfigFactory};
pub use map::{DeclarativeMap, Declaration};
pub use options::{is_falsy, ConfigOptions, FallbackPolicy};
pub use tree::{walk, DataTree, Node, SchemaTree, Tree};

pub use envmap_schema::{Schema, SchemaError, ValidationViolations, Violation};
