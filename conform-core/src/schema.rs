//! Schema descriptors: the declared shape a completion must conform to.
//!
//! A [`SchemaDescriptor`] is a named set of typed fields, each with a list of
//! constraints. It is built once, checked for internal consistency, and then
//! shared read-only (usually behind an `Arc`) by every invocation that uses it.
//!
//! ```
//! use conform_core::schema::{FieldSpec, SchemaDescriptor};
//!
//! let schema = SchemaDescriptor::builder("sentiment")
//!     .field(FieldSpec::string("label").one_of(["positive", "negative", "neutral"]))
//!     .field(FieldSpec::number("confidence").range(0.0, 1.0))
//!     .build()
//!     .unwrap();
//!
//! let value = schema.validate(r#"{"label": "positive", "confidence": 0.9}"#).unwrap();
//! assert_eq!(value["label"], "positive");
//! ```

use crate::error::{SchemaError, ValidationError};
use crate::validate;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// JSON type of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ValueSpec>),
    Object(ObjectSpec),
    /// Object with arbitrary keys whose values all share one spec
    Map(Box<ValueSpec>),
}

impl FieldType {
    /// JSON Schema name of the type
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) | Self::Map(_) => "object",
        }
    }
}

/// Predicate a value must satisfy on top of its type.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive numeric bounds
    Range { min: Option<f64>, max: Option<f64> },
    /// Value must equal one of the listed values
    OneOf(Vec<Value>),
    /// Character count for strings, item count for arrays
    Length { min: Option<usize>, max: Option<usize> },
}

/// Type plus constraints for a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub ty: FieldType,
    pub constraints: Vec<Constraint>,
    /// Whether `null` is accepted in place of a value
    pub nullable: bool,
    pub description: Option<String>,
}

impl ValueSpec {
    pub fn new(ty: FieldType) -> Self {
        Self {
            ty,
            constraints: Vec::new(),
            nullable: false,
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn array(items: ValueSpec) -> Self {
        Self::new(FieldType::Array(Box::new(items)))
    }

    pub fn object(object: ObjectSpec) -> Self {
        Self::new(FieldType::Object(object))
    }

    /// String-keyed dictionary of `values`
    pub fn map(values: ValueSpec) -> Self {
        Self::new(FieldType::Map(Box::new(values)))
    }

    /// Inclusive lower and upper bound
    pub fn range(self, min: f64, max: f64) -> Self {
        self.constrain(Constraint::Range {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn minimum(self, min: f64) -> Self {
        self.constrain(Constraint::Range {
            min: Some(min),
            max: None,
        })
    }

    pub fn maximum(self, max: f64) -> Self {
        self.constrain(Constraint::Range {
            min: None,
            max: Some(max),
        })
    }

    /// Restrict the value to an enumeration
    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.constrain(Constraint::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// Bound string length (characters) or array length (items)
    pub fn length(self, min: Option<usize>, max: Option<usize>) -> Self {
        self.constrain(Constraint::Length { min, max })
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// What to do with response fields the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdditionalFields {
    /// Drop them from the validated value
    #[default]
    Ignore,
    /// Fail validation
    Reject,
}

/// An ordered set of named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSpec {
    pub fields: Vec<FieldSpec>,
    pub additional: AdditionalFields,
}

impl ObjectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn reject_unknown(mut self) -> Self {
        self.additional = AdditionalFields::Reject;
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named field inside an object.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub spec: ValueSpec,
    pub required: bool,
    /// Filled in when the field is absent; implies optional
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, spec: ValueSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            required: true,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueSpec::string())
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ValueSpec::integer())
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ValueSpec::number())
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueSpec::boolean())
    }

    pub fn array(name: impl Into<String>, items: ValueSpec) -> Self {
        Self::new(name, ValueSpec::array(items))
    }

    pub fn object(name: impl Into<String>, object: ObjectSpec) -> Self {
        Self::new(name, ValueSpec::object(object))
    }

    pub fn map(name: impl Into<String>, values: ValueSpec) -> Self {
        Self::new(name, ValueSpec::map(values))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(default.into());
        self
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.map_spec(|s| s.range(min, max))
    }

    pub fn minimum(self, min: f64) -> Self {
        self.map_spec(|s| s.minimum(min))
    }

    pub fn maximum(self, max: f64) -> Self {
        self.map_spec(|s| s.maximum(max))
    }

    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.map_spec(|s| s.one_of(values))
    }

    pub fn length(self, min: Option<usize>, max: Option<usize>) -> Self {
        self.map_spec(|s| s.length(min, max))
    }

    pub fn nullable(self) -> Self {
        self.map_spec(ValueSpec::nullable)
    }

    pub fn describe(self, description: impl Into<String>) -> Self {
        self.map_spec(|s| s.describe(description))
    }

    fn map_spec(mut self, f: impl FnOnce(ValueSpec) -> ValueSpec) -> Self {
        self.spec = f(self.spec);
        self
    }
}

/// Immutable, validated description of the expected response shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    name: String,
    description: Option<String>,
    root: ObjectSpec,
    rendered: String,
}

impl SchemaDescriptor {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            description: None,
            root: ObjectSpec::new(),
        }
    }

    /// Build a descriptor from a JSON Schema document.
    ///
    /// The root must describe an object. Local `$ref`s into `$defs` or
    /// `definitions` are resolved.
    pub fn from_json_schema(
        name: impl Into<String>,
        document: &Value,
    ) -> Result<SchemaDescriptor, SchemaError> {
        let converter = JsonSchemaConverter { document };
        let root = converter.value_spec(document, "$", 0)?;
        let FieldType::Object(object) = root.ty else {
            return Err(SchemaError::unsupported("$", "root schema must be an object"));
        };
        SchemaBuilder {
            name: name.into(),
            description: root.description,
            root: object,
        }
        .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn root(&self) -> &ObjectSpec {
        &self.root
    }

    /// JSON Schema rendering of this descriptor.
    pub fn render(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("title".into(), Value::String(self.name.clone()));
        if let Some(description) = &self.description {
            doc.insert("description".into(), Value::String(description.clone()));
        }
        if let Value::Object(body) = render_object(&self.root) {
            doc.extend(body);
        }
        Value::Object(doc)
    }

    /// Pretty-printed [`render`](Self::render) output, computed once at build time.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Parse and validate backend text against this descriptor.
    pub fn validate(&self, text: &str) -> Result<Value, ValidationError> {
        validate::validate(text, self)
    }

    /// Validate an already parsed value.
    pub fn validate_value(&self, value: &Value) -> Result<Value, ValidationError> {
        validate::validate_value(value, self)
    }

    /// Serialize a validated value back to the text form the validator accepts.
    pub fn render_value(&self, value: &Value) -> String {
        value.to_string()
    }
}

/// Builder for [`SchemaDescriptor`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    description: Option<String>,
    root: ObjectSpec,
}

impl SchemaBuilder {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.root.fields.push(field);
        self
    }

    pub fn additional_fields(mut self, additional: AdditionalFields) -> Self {
        self.root.additional = additional;
        self
    }

    /// Check the definition and freeze it.
    pub fn build(self) -> Result<SchemaDescriptor, SchemaError> {
        check_object(&self.name, &self.root, "")?;

        let mut descriptor = SchemaDescriptor {
            name: self.name,
            description: self.description,
            root: self.root,
            rendered: String::new(),
        };
        descriptor.rendered = serde_json::to_string_pretty(&descriptor.render())
            .map_err(|e| SchemaError::Render(e.to_string()))?;
        Ok(descriptor)
    }
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn check_object(schema: &str, object: &ObjectSpec, path: &str) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in &object.fields {
        if field.name.is_empty() {
            return Err(SchemaError::EmptyFieldName(schema.to_string()));
        }
        let field_path = join_path(path, &field.name);
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField(field_path));
        }
        check_value(schema, &field.spec, &field_path)?;
        if let Some(default) = &field.default {
            validate::check_value(&field.spec, default, &field_path).map_err(|source| {
                SchemaError::InvalidDefault {
                    path: field_path.clone(),
                    source,
                }
            })?;
        }
    }
    Ok(())
}

fn check_value(schema: &str, spec: &ValueSpec, path: &str) -> Result<(), SchemaError> {
    for constraint in &spec.constraints {
        match constraint {
            Constraint::Range { min, max } => {
                if !matches!(spec.ty, FieldType::Integer | FieldType::Number) {
                    return Err(SchemaError::invalid_constraint(
                        path,
                        format!("range applies to numbers, not {}", spec.ty.name()),
                    ));
                }
                if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) {
                    return Err(SchemaError::invalid_constraint(
                        path,
                        "range bounds must be finite",
                    ));
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(SchemaError::invalid_constraint(
                            path,
                            format!("range minimum {lo} exceeds maximum {hi}"),
                        ));
                    }
                }
            }
            Constraint::Length { min, max } => {
                if !matches!(spec.ty, FieldType::String | FieldType::Array(_)) {
                    return Err(SchemaError::invalid_constraint(
                        path,
                        format!("length applies to strings and arrays, not {}", spec.ty.name()),
                    ));
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(SchemaError::invalid_constraint(
                            path,
                            format!("length minimum {lo} exceeds maximum {hi}"),
                        ));
                    }
                }
            }
            Constraint::OneOf(values) => {
                if values.is_empty() {
                    return Err(SchemaError::invalid_constraint(path, "enumeration is empty"));
                }
                if let Some(bad) = values.iter().find(|v| !validate::matches_type(&spec.ty, v)) {
                    return Err(SchemaError::invalid_constraint(
                        path,
                        format!("enumeration member {bad} is not a {}", spec.ty.name()),
                    ));
                }
            }
        }
    }

    match &spec.ty {
        FieldType::Array(items) => check_value(schema, items, &format!("{path}[]")),
        FieldType::Object(object) => check_object(schema, object, path),
        FieldType::Map(values) => check_value(schema, values, &format!("{path}.*")),
        _ => Ok(()),
    }
}

fn render_value(spec: &ValueSpec) -> Value {
    let mut out = match &spec.ty {
        FieldType::Object(object) => render_object(object),
        FieldType::Array(items) => json!({ "type": "array", "items": render_value(items) }),
        FieldType::Map(values) => {
            json!({ "type": "object", "additionalProperties": render_value(values) })
        }
        other => json!({ "type": other.name() }),
    };
    let Value::Object(map) = &mut out else {
        return out;
    };

    if spec.nullable {
        map.insert("type".into(), json!([spec.ty.name(), "null"]));
    }
    if let Some(description) = &spec.description {
        map.insert("description".into(), Value::String(description.clone()));
    }
    for constraint in &spec.constraints {
        match constraint {
            Constraint::Range { min, max } => {
                if let Some(min) = min {
                    map.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    map.insert("maximum".into(), json!(max));
                }
            }
            Constraint::OneOf(values) => {
                map.insert("enum".into(), Value::Array(values.clone()));
            }
            Constraint::Length { min, max } => {
                let (min_key, max_key) = match spec.ty {
                    FieldType::Array(_) => ("minItems", "maxItems"),
                    _ => ("minLength", "maxLength"),
                };
                if let Some(min) = min {
                    map.insert(min_key.into(), json!(min));
                }
                if let Some(max) = max {
                    map.insert(max_key.into(), json!(max));
                }
            }
        }
    }
    out
}

fn render_object(object: &ObjectSpec) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in &object.fields {
        let mut rendered = render_value(&field.spec);
        if let (Some(default), Value::Object(map)) = (&field.default, &mut rendered) {
            map.insert("default".into(), default.clone());
        }
        properties.insert(field.name.clone(), rendered);
        if field.required {
            required.push(field.name.clone());
        }
    }

    required.sort();

    let mut out = Map::new();
    out.insert("type".into(), json!("object"));
    out.insert("properties".into(), Value::Object(properties));
    out.insert("required".into(), json!(required));
    if object.additional == AdditionalFields::Reject {
        out.insert("additionalProperties".into(), Value::Bool(false));
    }
    Value::Object(out)
}

const MAX_REF_DEPTH: usize = 32;

/// Walks a JSON Schema document and produces value specs.
struct JsonSchemaConverter<'a> {
    document: &'a Value,
}

impl<'a> JsonSchemaConverter<'a> {
    fn resolve(&self, reference: &str, path: &str) -> Result<&'a Value, SchemaError> {
        let pointer = reference.strip_prefix('#').ok_or_else(|| {
            SchemaError::unsupported(path, format!("non-local $ref `{reference}`"))
        })?;
        self.document.pointer(pointer).ok_or_else(|| {
            SchemaError::unsupported(path, format!("unresolved $ref `{reference}`"))
        })
    }

    fn value_spec(&self, node: &Value, path: &str, depth: usize) -> Result<ValueSpec, SchemaError> {
        if depth > MAX_REF_DEPTH {
            return Err(SchemaError::unsupported(path, "schema nesting is too deep or recursive"));
        }
        let Value::Object(map) = node else {
            return Err(SchemaError::unsupported(path, "schema node must be an object"));
        };
        let description = map.get("description").and_then(Value::as_str).map(str::to_string);

        let mut spec = if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            let target = self.resolve(reference, path)?;
            self.value_spec(target, path, depth + 1)?
        } else if let Some(members) = map
            .get("anyOf")
            .or_else(|| map.get("oneOf"))
            .and_then(Value::as_array)
        {
            self.union_spec(members, path, depth)?
        } else if let Some(constant) = map.get("const") {
            let ty = infer_type(std::slice::from_ref(constant), path)?;
            ValueSpec::new(ty).one_of([constant.clone()])
        } else if let Some(values) = map.get("enum").and_then(Value::as_array) {
            self.enum_spec(map, values, path)?
        } else {
            self.typed_spec(map, path, depth)?
        };

        if description.is_some() {
            spec.description = description;
        }
        Ok(spec)
    }

    fn union_spec(
        &self,
        members: &[Value],
        path: &str,
        depth: usize,
    ) -> Result<ValueSpec, SchemaError> {
        let is_null = |m: &Value| m.get("type").and_then(Value::as_str) == Some("null");
        let nullable = members.iter().any(is_null);
        let rest: Vec<&Value> = members.iter().filter(|m| !is_null(*m)).collect();

        let consts: Option<Vec<Value>> = rest.iter().map(|m| m.get("const").cloned()).collect();
        let mut spec = match (consts, rest.as_slice()) {
            (Some(values), _) if !values.is_empty() => {
                ValueSpec::new(infer_type(&values, path)?).one_of(values)
            }
            (_, [single]) => self.value_spec(single, path, depth + 1)?,
            _ => {
                return Err(SchemaError::unsupported(
                    path,
                    "unions are only supported with null or const members",
                ))
            }
        };
        spec.nullable |= nullable;
        Ok(spec)
    }

    fn enum_spec(
        &self,
        map: &Map<String, Value>,
        values: &[Value],
        path: &str,
    ) -> Result<ValueSpec, SchemaError> {
        let (nulls, values): (Vec<Value>, Vec<Value>) =
            values.iter().cloned().partition(Value::is_null);
        let (declared, declared_nullable) = declared_type(map, path)?;
        let ty = match declared {
            Some(name) => primitive_type(name, path)?,
            None => infer_type(&values, path)?,
        };
        let mut spec = ValueSpec::new(ty).one_of(values);
        spec.nullable = declared_nullable || !nulls.is_empty();
        Ok(spec)
    }

    fn typed_spec(
        &self,
        map: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<ValueSpec, SchemaError> {
        let (declared, nullable) = declared_type(map, path)?;
        let name = match declared {
            Some(name) => name,
            None if map.contains_key("properties") => "object",
            None => return Err(SchemaError::unsupported(path, "missing `type`")),
        };

        for key in ["exclusiveMinimum", "exclusiveMaximum", "pattern", "patternProperties"] {
            if map.contains_key(key) {
                return Err(SchemaError::unsupported(path, format!("`{key}` is not supported")));
            }
        }

        let mut spec = match name {
            "object" => match map.get("additionalProperties") {
                Some(values @ Value::Object(_)) => self.dictionary_spec(map, values, path, depth)?,
                _ => ValueSpec::object(self.object_spec(map, path, depth)?),
            },
            "array" => {
                let items = map
                    .get("items")
                    .ok_or_else(|| SchemaError::unsupported(path, "array without `items`"))?;
                let items = self.value_spec(items, &format!("{path}[]"), depth + 1)?;
                let spec = ValueSpec::array(items);
                with_length(spec, map, "minItems", "maxItems")
            }
            "string" => with_length(ValueSpec::string(), map, "minLength", "maxLength"),
            other => {
                let spec = ValueSpec::new(primitive_type(other, path)?);
                let min = map.get("minimum").and_then(Value::as_f64);
                let max = map.get("maximum").and_then(Value::as_f64);
                if min.is_some() || max.is_some() {
                    spec.constrain(Constraint::Range { min, max })
                } else {
                    spec
                }
            }
        };
        spec.nullable = nullable;
        Ok(spec)
    }

    fn dictionary_spec(
        &self,
        map: &Map<String, Value>,
        values: &Value,
        path: &str,
        depth: usize,
    ) -> Result<ValueSpec, SchemaError> {
        let has_properties = map
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|properties| !properties.is_empty());
        if has_properties {
            return Err(SchemaError::unsupported(
                path,
                "declared properties alongside a schema-valued `additionalProperties`",
            ));
        }
        let values = self.value_spec(values, &format!("{path}.*"), depth + 1)?;
        Ok(ValueSpec::map(values))
    }

    fn object_spec(
        &self,
        map: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<ObjectSpec, SchemaError> {
        let required: HashSet<&str> = map
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut object = ObjectSpec::new();
        if map.get("additionalProperties") == Some(&Value::Bool(false)) {
            object.additional = AdditionalFields::Reject;
        }
        if let Some(Value::Object(properties)) = map.get("properties") {
            for (name, node) in properties {
                let field_path = if path == "$" {
                    name.clone()
                } else {
                    join_path(path, name)
                };
                let spec = self.value_spec(node, &field_path, depth + 1)?;
                let mut field = FieldSpec::new(name.clone(), spec);
                field.required = required.contains(name.as_str());
                if let Some(default) = node.get("default") {
                    field = field.with_default(default.clone());
                }
                object.fields.push(field);
            }
        }
        Ok(object)
    }
}

/// Returns the single non-null type name and whether `null` was listed.
fn declared_type<'v>(
    map: &'v Map<String, Value>,
    path: &str,
) -> Result<(Option<&'v str>, bool), SchemaError> {
    match map.get("type") {
        None => Ok((None, false)),
        Some(Value::String(name)) => Ok((Some(name.as_str()), false)),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let rest: Vec<&str> = names.into_iter().filter(|n| *n != "null").collect();
            match rest.as_slice() {
                [single] => Ok((Some(*single), nullable)),
                _ => Err(SchemaError::unsupported(path, "multi-typed values are not supported")),
            }
        }
        Some(_) => Err(SchemaError::unsupported(path, "`type` must be a string or array")),
    }
}

fn primitive_type(name: &str, path: &str) -> Result<FieldType, SchemaError> {
    match name {
        "string" => Ok(FieldType::String),
        "integer" => Ok(FieldType::Integer),
        "number" => Ok(FieldType::Number),
        "boolean" => Ok(FieldType::Boolean),
        other => Err(SchemaError::unsupported(
            path,
            format!("type `{other}` cannot be enumerated"),
        )),
    }
}

fn infer_type(values: &[Value], path: &str) -> Result<FieldType, SchemaError> {
    if values.iter().all(Value::is_string) {
        Ok(FieldType::String)
    } else if values.iter().all(Value::is_boolean) {
        Ok(FieldType::Boolean)
    } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
        Ok(FieldType::Integer)
    } else if values.iter().all(Value::is_number) {
        Ok(FieldType::Number)
    } else {
        Err(SchemaError::unsupported(path, "enumeration mixes value types"))
    }
}

fn with_length(
    spec: ValueSpec,
    map: &Map<String, Value>,
    min_key: &str,
    max_key: &str,
) -> ValueSpec {
    let as_len = |key: &str| map.get(key).and_then(Value::as_u64).map(|n| n as usize);
    let (min, max) = (as_len(min_key), as_len(max_key));
    if min.is_some() || max.is_some() {
        spec.length(min, max)
    } else {
        spec
    }
}
