//! # Leaf Schema Validation
//!
//! Runtime validation of single configuration values against JSON Schema
//! definitions (Draft 2020-12).
//!
//! ## Required vs. Present
//!
//! JSON Schema expresses "required" on the parent object, but a config leaf
//! has no parent document of its own. A [`Schema`] therefore carries the
//! flag itself: an absent value fails only a required schema, and a present
//! value is always checked against the compiled rule.
//!
//! The draft-3 spelling `"required": true` at the top of a rule is accepted
//! and lifted into the flag before compilation. An array-valued `required`
//! keeps its Draft 2020-12 meaning.
//!
//! ## Coercion
//!
//! None. `"42"` is a string and fails `{"type": "integer"}`.

use std::fmt;
use std::sync::Arc;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

/// Keyword lifted out of a rule into [`Schema::is_required`].
const REQUIRED_KEYWORD: &str = "required";

/// Error building a [`Schema`].
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The rule is not a valid JSON Schema document.
    #[error("schema build error: {reason}")]
    Build {
        /// Reason reported by the schema compiler.
        reason: String,
    },

    /// The rule has a shape that cannot describe a leaf.
    #[error("invalid schema rule: {reason}")]
    InvalidRule {
        /// What was wrong with the rule.
        reason: String,
    },
}

/// A single validation violation at a config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted config path of the violating value, e.g. `AWS.ec2`.
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Ordered collection of validation violations.
///
/// Displays as a single aggregated message, violations joined by `"; "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Append a single violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Ok when empty, otherwise Err(self).
    pub fn into_result(self) -> Result<(), ValidationViolations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Extend<Violation> for ValidationViolations {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        self.violations.extend(iter);
    }
}

impl IntoIterator for ValidationViolations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A validation rule for one config leaf.
///
/// The rule is compiled once, when the schema is built, so checking a value
/// never fails for reasons other than the value itself. Cloning shares the
/// compiled validator.
#[derive(Clone)]
pub struct Schema {
    rule: Arc<Value>,
    /// `None` accepts every present value.
    validator: Option<Arc<Validator>>,
    required: bool,
}

impl Schema {
    /// Compile a JSON Schema rule.
    ///
    /// A top-level boolean `"required"` is removed from the rule and becomes
    /// the required flag.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidRule` if `"required"` is neither a
    /// boolean nor an array, and `SchemaError::Build` if the remaining rule
    /// does not compile.
    pub fn new(rule: Value) -> Result<Self, SchemaError> {
        let (rule, required) = lift_required(rule)?;
        let validator = build_validator(&rule)?;
        Ok(Self {
            rule: Arc::new(rule),
            validator: Some(Arc::new(validator)),
            required,
        })
    }

    /// The permissive rule `{}`: any present value passes.
    pub fn any() -> Self {
        Self {
            rule: Arc::new(Value::Object(serde_json::Map::new())),
            validator: None,
            required: false,
        }
    }

    /// Mark the schema as required: an absent value fails it.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the schema as optional: an absent value passes it.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Whether an absent value fails this schema.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The compiled rule, without the lifted `required` flag.
    pub fn rule(&self) -> &Value {
        &self.rule
    }

    /// Check a value found at `path`.
    ///
    /// `path` is the sequence of config keys leading to the value; it names
    /// the violations. An absent `datum` fails only a required schema.
    ///
    /// # Errors
    ///
    /// Returns every violation found, in the order the validator reports
    /// them.
    pub fn check<S: AsRef<str>>(
        &self,
        path: &[S],
        datum: Option<&Value>,
    ) -> Result<(), ValidationViolations> {
        let dotted = join_path(path);

        let Some(datum) = datum else {
            if !self.required {
                return Ok(());
            }
            let name = path.last().map(|s| s.as_ref()).unwrap_or_default();
            return Err(ValidationViolations::from(vec![Violation {
                path: dotted,
                message: format!("\"{name}\" is required"),
            }]));
        };

        let Some(validator) = &self.validator else {
            return Ok(());
        };

        let violations: Vec<Violation> = validator
            .iter_errors(datum)
            .map(|e| Violation {
                path: extend_path(&dotted, &e.instance_path.to_string()),
                message: e.to_string(),
            })
            .collect();

        ValidationViolations::from(violations).into_result()
    }

    /// Boolean form of [`Schema::check`].
    pub fn is_satisfied_by(&self, datum: Option<&Value>) -> bool {
        match datum {
            None => !self.required,
            Some(value) => self
                .validator
                .as_ref()
                .map_or(true, |validator| validator.is_valid(value)),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("rule", &self.rule)
            .field("required", &self.required)
            .finish()
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaError;

    fn try_from(rule: Value) -> Result<Self, Self::Error> {
        Self::new(rule)
    }
}

/// Split a boolean `required` out of an object rule.
fn lift_required(rule: Value) -> Result<(Value, bool), SchemaError> {
    let mut object = match rule {
        Value::Object(object) => object,
        other => return Ok((other, false)),
    };

    let required = match object.remove(REQUIRED_KEYWORD) {
        Some(Value::Bool(flag)) => flag,
        Some(names @ Value::Array(_)) => {
            object.insert(REQUIRED_KEYWORD.to_string(), names);
            false
        }
        None => false,
        Some(other) => {
            return Err(SchemaError::InvalidRule {
                reason: format!("\"required\" must be a boolean or an array, got {other}"),
            })
        }
    };

    Ok((Value::Object(object), required))
}

fn build_validator(rule: &Value) -> Result<Validator, SchemaError> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.build(rule).map_err(|e| SchemaError::Build {
        reason: e.to_string(),
    })
}

fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(".")
}

/// Append a JSON Pointer (`/items/0`) to a dotted path.
fn extend_path(dotted: &str, pointer: &str) -> String {
    let tail = pointer.trim_start_matches('/');
    if tail.is_empty() {
        return dotted.to_string();
    }
    let tail = tail.replace('/', ".");
    if dotted.is_empty() {
        tail
    } else {
        format!("{dotted}.{tail}")
    }
}
