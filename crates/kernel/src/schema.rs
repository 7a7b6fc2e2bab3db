//! Declarative record schemas and the validator that checks JSON payloads
//! against them.
//!
//! Validation never stops at the first problem: every rule is evaluated and
//! each violation contributes one message, in the order the fields were
//! declared. Callers surface the whole list to clients.

use std::fmt;

use serde_json::{Map, Value};

/// Primitive type a field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => as_integer(value).is_some(),
        }
    }
}

/// Whole-number view of a JSON number. Integral floats such as `2.0` count
/// as integers when they fit in an `i64`.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Integer => f.write_str("integer"),
        }
    }
}

/// Rule set for a single field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    /// Inclusive lower bound, only meaningful for integer fields.
    pub minimum: Option<i64>,
}

impl FieldRule {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::String,
            required: false,
            minimum: None,
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Integer,
            required: false,
            minimum: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }
}

/// How strictly a candidate is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Required fields must be present; used when creating records.
    Strict,
    /// Only fields present in the candidate are checked; used for updates.
    Partial,
}

/// Immutable description of a record shape.
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Rewrite integral floats held by integer fields as JSON integers, so a
    /// validated candidate deserializes into `i64` fields.
    pub fn normalize(&self, candidate: &mut Value) {
        let Some(object) = candidate.as_object_mut() else {
            return;
        };
        for rule in self.fields.iter().filter(|r| r.ty == FieldType::Integer) {
            if let Some(value) = object.get_mut(rule.name) {
                if let Some(n) = as_integer(value) {
                    *value = Value::from(n);
                }
            }
        }
    }
}

/// Every violation found in a candidate, in schema declaration order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} validation error(s): {}", .0.len(), .0.join("; "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Check `candidate` against `schema`.
///
/// Unknown fields are ignored. `null` never satisfies a type, so a field
/// cannot be cleared by sending `null`.
pub fn validate(schema: &Schema, candidate: &Value, mode: Mode) -> Result<(), ValidationErrors> {
    let Some(object) = candidate.as_object() else {
        return Err(ValidationErrors(vec![
            "instance is not of a type(s) object".to_string(),
        ]));
    };

    let mut messages = Vec::new();
    for rule in &schema.fields {
        check_field(rule, object, mode, &mut messages);
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(messages))
    }
}

fn check_field(rule: &FieldRule, object: &Map<String, Value>, mode: Mode, out: &mut Vec<String>) {
    let Some(value) = object.get(rule.name) else {
        if rule.required && mode == Mode::Strict {
            out.push(format!("instance requires property \"{}\"", rule.name));
        }
        return;
    };

    if !rule.ty.accepts(value) {
        out.push(format!(
            "instance.{} is not of a type(s) {}",
            rule.name, rule.ty
        ));
        return;
    }

    if let (Some(minimum), Some(n)) = (rule.minimum, as_integer(value)) {
        if n < minimum {
            out.push(format!(
                "instance.{} must be greater than or equal to {}",
                rule.name, minimum
            ));
        }
    }
}
