//! Descriptors derived from Rust types.

use crate::{ConformError, SchemaDescriptor};
use schemars::JsonSchema;

/// Build a [`SchemaDescriptor`] from a type deriving [`JsonSchema`].
///
/// The descriptor is named after the schema's `title` (the type name).
/// Doc comments become field descriptions and `#[schemars(range(..))]`
/// becomes a range constraint.
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct Review {
///     #[schemars(range(min = 0.0, max = 1.0))]
///     confidence: f64,
/// }
///
/// let schema = Arc::new(conform::descriptor_for::<Review>()?);
/// ```
pub fn descriptor_for<T: JsonSchema>() -> Result<SchemaDescriptor, ConformError> {
    let schema = schemars::schema_for!(T);
    let name = schema
        .get("title")
        .and_then(|title| title.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| T::schema_name().into_owned());

    Ok(SchemaDescriptor::from_json_schema(name, schema.as_value())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(rename_all = "lowercase")]
    #[allow(dead_code)]
    enum Sentiment {
        Positive,
        Negative,
        Neutral,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Span {
        start: u32,
        end: u32,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Review {
        /// Overall sentiment
        sentiment: Sentiment,
        #[schemars(range(min = 0.0, max = 1.0))]
        confidence: f64,
        spans: Vec<Span>,
        summary: Option<String>,
    }

    #[test]
    fn test_descriptor_for_derived_type() {
        let schema = descriptor_for::<Review>().unwrap();
        assert_eq!(schema.name(), "Review");

        let value = schema
            .validate(
                r#"{"sentiment":"positive","confidence":0.9,"spans":[{"start":0,"end":4}]}"#,
            )
            .unwrap();
        assert_eq!(value["spans"][0]["end"], 4);
    }

    #[test]
    fn test_derived_constraints_are_enforced() {
        let schema = descriptor_for::<Review>().unwrap();

        let err = schema
            .validate(r#"{"sentiment":"positive","confidence":1.5,"spans":[]}"#)
            .unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintViolation { .. }), "{err}");

        let err = schema
            .validate(r#"{"sentiment":"ecstatic","confidence":0.5,"spans":[]}"#)
            .unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintViolation { .. }), "{err}");

        let err = schema
            .validate(r#"{"sentiment":"neutral","confidence":0.5,"spans":[{"start":1}]}"#)
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("spans[0].end".to_string()));
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Inventory {
        counts: HashMap<String, u32>,
    }

    #[test]
    fn test_derived_map_fields_validate_each_value() {
        let schema = descriptor_for::<Inventory>().unwrap();

        let value = schema
            .validate(r#"{"counts": {"apples": 3, "pears": 0}}"#)
            .unwrap();
        assert_eq!(value["counts"]["apples"], 3);
        assert_eq!(value["counts"]["pears"], 0);

        let err = schema
            .validate(r#"{"counts": {"apples": "three"}}"#)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::type_mismatch("counts.apples", "integer", "string")
        );
    }
}
