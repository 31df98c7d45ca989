//! Integration test: leaf rules built from realistic config schemas.

use envmap_schema::{Schema, SchemaError};
use serde_json::json;

#[test]
fn test_url_pattern_rule() {
    let schema = Schema::new(json!({
        "type": "string",
        "pattern": "^s3://",
        "required": true
    }))
    .unwrap();

    assert!(schema.check(&["AWS", "s3"], Some(&json!("s3://bucket"))).is_ok());

    let violations = schema
        .check(&["AWS", "s3"], Some(&json!("https://bucket")))
        .unwrap_err();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations.violations()[0].path, "AWS.s3");

    let violations = schema.check(&["AWS", "s3"], None).unwrap_err();
    assert_eq!(violations.to_string(), "AWS.s3: \"s3\" is required");
}

#[test]
fn test_enum_rule_reports_each_violation() {
    let schema = Schema::new(json!({
        "type": "array",
        "items": {"enum": ["debug", "info", "warn"]}
    }))
    .unwrap();

    let violations = schema
        .check(&["levels"], Some(&json!(["info", "loud", "quiet"])))
        .unwrap_err();
    let paths: Vec<&str> = violations.violations().iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["levels.1", "levels.2"]);
}

#[test]
fn test_strings_are_not_coerced() {
    let schema = Schema::new(json!({"type": "integer"})).unwrap();
    assert!(!schema.is_satisfied_by(Some(&json!("42"))));
    assert!(schema.is_satisfied_by(Some(&json!(42))));
}

#[test]
fn test_try_from_value() {
    let schema: Result<Schema, SchemaError> = json!({"type": "boolean", "required": false}).try_into();
    let schema = schema.unwrap();
    assert!(!schema.is_required());
    assert!(schema.is_satisfied_by(None));
    assert!(!schema.is_satisfied_by(Some(&json!("true"))));
}
