//! # Map Compiler
//!
//! Turns a [`DeclarativeMap`] plus an [`Environment`] into a tree with the
//! same key structure. The [`CompileMode`] decides what a leaf becomes:
//!
//! | Declaration    | [`DataMode`]                         | [`SchemaMode`]  |
//! |----------------|--------------------------------------|-----------------|
//! | `DirectKey(k)` | `env[k]`                             | absent          |
//! | `Declared`     | `env[k]`, else `default` per policy  | `schema`        |
//! | `Group(m)`     | recurse                              | recurse         |
//!
//! Compilation is pure: neither input is modified, and the output follows
//! the map's declaration order.

use serde_json::Value;

use envmap_schema::Schema;

use crate::env::Environment;
use crate::map::{DeclarativeMap, Declaration};
use crate::options::FallbackPolicy;
use crate::tree::{Node, Tree};

/// What a compilation pass extracts from each leaf declaration.
pub trait CompileMode {
    /// Leaf type of the output tree.
    type Leaf;

    /// Resolve a `DirectKey` leaf.
    fn direct(&self, env_key: &str, env: &Environment) -> Option<Self::Leaf>;

    /// Resolve a `Declared` leaf.
    fn declared(
        &self,
        env_key: &str,
        schema: Option<&Schema>,
        default: Option<&Value>,
        env: &Environment,
    ) -> Option<Self::Leaf>;
}

/// Resolve leaves to values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataMode {
    /// When a declared leaf uses its default.
    pub fallback: FallbackPolicy,
}

impl DataMode {
    /// Data mode with the given fallback policy.
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self { fallback }
    }
}

impl CompileMode for DataMode {
    type Leaf = Value;

    fn direct(&self, env_key: &str, env: &Environment) -> Option<Value> {
        env.get(env_key).cloned()
    }

    fn declared(
        &self,
        env_key: &str,
        _schema: Option<&Schema>,
        default: Option<&Value>,
        env: &Environment,
    ) -> Option<Value> {
        let raw = env.get(env_key);
        if self.fallback.treats_as_missing(raw) {
            default.cloned()
        } else {
            raw.cloned()
        }
    }
}

/// Resolve leaves to their schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaMode;

impl CompileMode for SchemaMode {
    type Leaf = Schema;

    fn direct(&self, _env_key: &str, _env: &Environment) -> Option<Schema> {
        None
    }

    fn declared(
        &self,
        _env_key: &str,
        schema: Option<&Schema>,
        _default: Option<&Value>,
        _env: &Environment,
    ) -> Option<Schema> {
        schema.cloned()
    }
}

/// Compile `map` against `env` in the given mode.
pub fn compile<M: CompileMode>(map: &DeclarativeMap, env: &Environment, mode: &M) -> Tree<M::Leaf> {
    let mut tree = Tree::default();
    for (key, declaration) in map.iter() {
        let node = match declaration {
            Declaration::DirectKey(env_key) => Node::Leaf(mode.direct(env_key, env)),
            Declaration::Declared {
                env_key,
                schema,
                default,
            } => Node::Leaf(mode.declared(env_key, schema.as_ref(), default.as_ref(), env)),
            Declaration::Group(inner) => Node::Group(compile(inner, env, mode)),
        };
        tree.insert(key, node);
    }
    tree
}
