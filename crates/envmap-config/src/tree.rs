//! # Compiled Trees
//!
//! The map compiler produces two trees shaped exactly like the declarative
//! map: a [`DataTree`] of resolved values and a [`SchemaTree`] of rules.
//! Both are [`Tree`]s; only the leaf type differs. A leaf holds `None` when
//! nothing resolved (no env value and no default, or no schema).
//!
//! Trees are built once and never mutated afterwards.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use envmap_schema::Schema;

/// A node of a compiled tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<T> {
    /// A resolved leaf, `None` when absent.
    Leaf(Option<T>),
    /// A nested tree.
    Group(Tree<T>),
}

/// An insertion-ordered tree with leaves of type `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree<T> {
    nodes: IndexMap<String, Node<T>>,
}

/// Resolved config values.
pub type DataTree = Tree<Value>;

/// Validation rules, parallel to a [`DataTree`].
pub type SchemaTree = Tree<Schema>;

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }
}

impl<T> Tree<T> {
    /// Look up a direct child.
    pub fn get(&self, key: &str) -> Option<&Node<T>> {
        self.nodes.get(key)
    }

    /// Iterate direct children in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node<T>)> {
        self.nodes.iter().map(|(k, n)| (k.as_str(), n))
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Follow `path` from the root. An empty path finds nothing.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node<T>> {
        let (head, rest) = path.split_first()?;
        let node = self.get(head.as_ref())?;
        if rest.is_empty() {
            return Some(node);
        }
        match node {
            Node::Group(inner) => inner.lookup(rest),
            Node::Leaf(_) => None,
        }
    }

    /// Every leaf path, depth-first in declaration order.
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        self.collect_leaf_paths(&mut Vec::new(), &mut paths);
        paths
    }

    /// Number of leaves holding a value.
    pub fn resolved_leaves(&self) -> usize {
        self.nodes
            .values()
            .map(|node| match node {
                Node::Leaf(Some(_)) => 1,
                Node::Leaf(None) => 0,
                Node::Group(inner) => inner.resolved_leaves(),
            })
            .sum()
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, node: Node<T>) {
        self.nodes.insert(key.into(), node);
    }

    fn collect_leaf_paths(&self, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        for (key, node) in &self.nodes {
            prefix.push(key.clone());
            match node {
                Node::Leaf(_) => out.push(prefix.clone()),
                Node::Group(inner) => inner.collect_leaf_paths(prefix, out),
            }
            prefix.pop();
        }
    }
}

impl Node<Value> {
    /// JSON rendering of the node. An absent leaf is `None`; absent leaves
    /// inside a group are omitted.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Leaf(datum) => datum.clone(),
            Self::Group(inner) => Some(inner.to_json()),
        }
    }
}

impl DataTree {
    /// JSON object rendering; absent leaves are omitted.
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .nodes
            .iter()
            .filter_map(|(k, node)| Some((k.clone(), node.to_json()?)))
            .collect();
        Value::Object(object)
    }
}

/// Inspect-style rendering: `{ s3: undefined, AWS: { ec2: "x" } }`.
impl fmt::Display for DataTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for (i, (key, node)) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: ")?;
            match node {
                Node::Leaf(Some(value)) => write!(f, "{value}")?,
                Node::Leaf(None) => f.write_str("undefined")?,
                Node::Group(inner) => write!(f, "{inner}")?,
            }
        }
        f.write_str(" }")
    }
}

/// Walk a data tree and its schema tree in lockstep.
///
/// Returns the node pair at the end of `path`, or `None` when the path is
/// empty, names an undeclared key, or descends through a leaf.
pub fn walk<'a, S: AsRef<str>>(
    data: &'a DataTree,
    schemas: &'a SchemaTree,
    path: &[S],
) -> Option<(&'a Node<Value>, &'a Node<Schema>)> {
    let (head, rest) = path.split_first()?;
    let datum = data.get(head.as_ref())?;
    let schema = schemas.get(head.as_ref())?;
    if rest.is_empty() {
        return Some((datum, schema));
    }
    match (datum, schema) {
        (Node::Group(data), Node::Group(schemas)) => walk(data, schemas, rest),
        _ => None,
    }
}
