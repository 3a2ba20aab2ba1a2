//! Response validation against a schema descriptor.
//!
//! Validation is a pure function of its input. The returned value contains
//! exactly the declared fields (defaults filled in, unknown fields dropped
//! unless the object rejects them), so validating it again yields the same
//! value.

use crate::error::ValidationError;
use crate::schema::{
    join_path, AdditionalFields, Constraint, FieldType, ObjectSpec, SchemaDescriptor, ValueSpec,
};
use serde_json::{Map, Value};

/// Parse backend text and check it against `schema`.
pub fn validate(text: &str, schema: &SchemaDescriptor) -> Result<Value, ValidationError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ValidationError::NotParseable("empty response".into()));
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| ValidationError::NotParseable(e.to_string()))?;
    validate_value(&value, schema)
}

/// Check an already parsed value against `schema`.
pub fn validate_value(value: &Value, schema: &SchemaDescriptor) -> Result<Value, ValidationError> {
    check_object(schema.root(), value, "")
}

/// Models often wrap JSON in a single markdown fence despite instructions.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['{', '[']) => body.trim(),
        _ => inner.trim(),
    }
}

pub(crate) fn check_value(
    spec: &ValueSpec,
    value: &Value,
    path: &str,
) -> Result<Value, ValidationError> {
    if value.is_null() {
        return if spec.nullable {
            Ok(Value::Null)
        } else {
            Err(ValidationError::type_mismatch(display(path), spec.ty.name(), "null"))
        };
    }

    let checked = match &spec.ty {
        FieldType::Object(object) => check_object(object, value, path)?,
        FieldType::Array(items) => {
            let elements = value.as_array().ok_or_else(|| mismatch(&spec.ty, value, path))?;
            let checked = elements
                .iter()
                .enumerate()
                .map(|(i, element)| check_value(items, element, &format!("{}[{i}]", display(path))))
                .collect::<Result<Vec<_>, _>>()?;
            Value::Array(checked)
        }
        FieldType::Map(values) => {
            let entries = value.as_object().ok_or_else(|| mismatch(&spec.ty, value, path))?;
            let checked = entries
                .iter()
                .map(|(key, entry)| {
                    check_value(values, entry, &join_path(path, key)).map(|v| (key.clone(), v))
                })
                .collect::<Result<Map<_, _>, _>>()?;
            Value::Object(checked)
        }
        ty if matches_type(ty, value) => value.clone(),
        ty => return Err(mismatch(ty, value, path)),
    };

    for constraint in &spec.constraints {
        check_constraint(constraint, &checked, path)?;
    }
    Ok(checked)
}

fn check_object(object: &ObjectSpec, value: &Value, path: &str) -> Result<Value, ValidationError> {
    let map = value
        .as_object()
        .ok_or_else(|| ValidationError::type_mismatch(display(path), "object", json_type(value)))?;

    if object.additional == AdditionalFields::Reject {
        if let Some(unknown) = map.keys().find(|key| object.get(key).is_none()) {
            return Err(ValidationError::UnexpectedField(join_path(path, unknown)));
        }
    }

    let mut out = Map::new();
    for field in &object.fields {
        let field_path = join_path(path, &field.name);
        match (map.get(&field.name), &field.default) {
            (Some(present), _) => {
                out.insert(field.name.clone(), check_value(&field.spec, present, &field_path)?);
            }
            (None, Some(default)) => {
                out.insert(field.name.clone(), default.clone());
            }
            (None, None) if field.required => {
                return Err(ValidationError::MissingField(field_path));
            }
            (None, None) => {}
        }
    }
    Ok(Value::Object(out))
}

fn check_constraint(
    constraint: &Constraint,
    value: &Value,
    path: &str,
) -> Result<(), ValidationError> {
    if value.is_null() {
        return Ok(());
    }
    match constraint {
        Constraint::Range { min, max } => {
            let Some(n) = value.as_f64() else {
                return Ok(());
            };
            if let Some(min) = min.filter(|min| n < *min) {
                return Err(ValidationError::constraint(
                    display(path),
                    format!("{value} is less than minimum {min}"),
                ));
            }
            if let Some(max) = max.filter(|max| n > *max) {
                return Err(ValidationError::constraint(
                    display(path),
                    format!("{value} is greater than maximum {max}"),
                ));
            }
        }
        Constraint::OneOf(allowed) => {
            if !allowed.iter().any(|member| same_value(member, value)) {
                let listed = allowed.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
                return Err(ValidationError::constraint(
                    display(path),
                    format!("{value} is not one of [{listed}]"),
                ));
            }
        }
        Constraint::Length { min, max } => {
            let len = match value {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                _ => return Ok(()),
            };
            if min.is_some_and(|min| len < min) || max.is_some_and(|max| len > max) {
                return Err(ValidationError::constraint(
                    display(path),
                    format!(
                        "length {len} is outside [{}, {}]",
                        min.map_or("0".to_string(), |v| v.to_string()),
                        max.map_or("unbounded".to_string(), |v| v.to_string()),
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Enumeration membership; numbers compare by value so `1` matches `1.0`.
fn same_value(member: &Value, value: &Value) -> bool {
    match (member.as_f64(), value.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => member == value,
    }
}

/// Whether `value` has the JSON type `ty` asks for, ignoring constraints.
pub(crate) fn matches_type(ty: &FieldType, value: &Value) -> bool {
    match ty {
        FieldType::String => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array(_) => value.is_array(),
        FieldType::Object(_) | FieldType::Map(_) => value.is_object(),
    }
}

fn mismatch(ty: &FieldType, value: &Value, path: &str) -> ValidationError {
    ValidationError::type_mismatch(display(path), ty.name(), json_type(value))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display(path: &str) -> &str {
    if path.is_empty() {
        "$"
    } else {
        path
    }
}
