//! # envmap-schema — Leaf Validation Rules
//!
//! Provides the validation layer behind envmap config accessors: one
//! [`Schema`] per declared config leaf, compiled from a JSON Schema
//! (Draft 2020-12) document when the leaf is declared.
//!
//! ## Runtime Validation (`validate`)
//!
//! - [`Schema::new`] — compiles a rule, lifting a boolean `"required"` into
//!   the schema's required flag.
//! - [`Schema::check`] — validates one value (or its absence) and reports
//!   structured [`Violation`]s named by dotted config path.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `envmap-*` crates.
//! - No type coercion: values are checked exactly as the environment holds
//!   them.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod validate;

pub use validate::{Schema, SchemaError, ValidationViolations, Violation};
