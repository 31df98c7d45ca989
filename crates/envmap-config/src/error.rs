//! # Error Types
//!
//! Two failure channels exist and only one of them is an error type:
//!
//! - A per-read check in [`Config::get`](crate::Config::get) fails with
//!   [`ConfigError::InvalidConfig`], naming only the top-level key.
//! - Whole-tree validation never fails; it notifies `invalid` listeners.
//!
//! Malformed declarative maps and unknown paths are not errors either; they
//! read as absent values.

use envmap_schema::SchemaError;
use thiserror::Error;

/// Error type for config construction helpers and reads.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A per-read schema check failed. Carries only the first path segment.
    #[error("Invalid config for {key}!")]
    InvalidConfig {
        /// First segment of the path that was read.
        key: String,
    },

    /// A schema in a declarative map could not be built.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// An environment source was not a flat key-value object.
    #[error("invalid environment source: {0}")]
    InvalidEnvironment(String),

    /// A value read through [`Config::get_as`](crate::Config::get_as) did not
    /// have the requested type.
    #[error("cannot deserialize config at {path}: {source}")]
    Deserialize {
        /// Dotted path that was read.
        path: String,
        /// Underlying conversion error.
        source: serde_json::Error,
    },
}
