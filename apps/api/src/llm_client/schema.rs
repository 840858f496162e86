//! Output-schema descriptor sent with every generation call, and the structural
//! validator the Result Mapper runs against raw model output.
//!
//! A domain's `Schema` is the single definition of what a valid result looks like:
//! it is serialized into the provider request as `responseSchema` and checked again
//! locally before any typed Plan is built.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Primitive and structural types understood by the provider's schema dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Declaration order of `properties`; the provider emits fields in this order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_ordering: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// First structural mismatch found, with a JSON path such as `$.days[2].exercises`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {reason}")]
pub struct SchemaViolation {
    pub path: String,
    pub reason: String,
}

impl Schema {
    fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            enum_values: Vec::new(),
            properties: BTreeMap::new(),
            property_ordering: Vec::new(),
            items: None,
            required: Vec::new(),
        }
    }

    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn integer() -> Self {
        Self::of(SchemaType::Integer)
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    /// A string restricted to a fixed value set.
    pub fn string_enum(values: &[&str]) -> Self {
        Self {
            enum_values: values.iter().map(|v| v.to_string()).collect(),
            ..Self::of(SchemaType::String)
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn property(mut self, name: &str, schema: Schema) -> Self {
        self.property_ordering.push(name.to_string());
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Marks every declared property as required.
    pub fn require_all(mut self) -> Self {
        self.required = self.property_ordering.clone();
        self
    }

    /// Serializes into the provider's `responseSchema` JSON.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Checks `value` against this schema. Extra object fields are tolerated;
    /// missing required fields, wrong types and out-of-set enum values are not.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        match self.kind {
            SchemaType::Object => {
                let map = value
                    .as_object()
                    .ok_or_else(|| violation(path, "expected an object"))?;

                for name in &self.required {
                    match map.get(name) {
                        Some(v) if !v.is_null() => {}
                        _ => {
                            return Err(violation(
                                path,
                                &format!("missing required field '{name}'"),
                            ))
                        }
                    }
                }

                for (name, schema) in &self.properties {
                    match map.get(name) {
                        Some(Value::Null) | None => {}
                        Some(v) => schema.validate_at(v, &format!("{path}.{name}"))?,
                    }
                }
                Ok(())
            }
            SchemaType::Array => {
                let items = value
                    .as_array()
                    .ok_or_else(|| violation(path, "expected an array"))?;
                if let Some(item_schema) = &self.items {
                    for (index, item) in items.iter().enumerate() {
                        item_schema.validate_at(item, &format!("{path}[{index}]"))?;
                    }
                }
                Ok(())
            }
            SchemaType::String => {
                let text = value
                    .as_str()
                    .ok_or_else(|| violation(path, "expected a string"))?;
                if !self.enum_values.is_empty() && !self.enum_values.iter().any(|v| v == text) {
                    return Err(violation(
                        path,
                        &format!(
                            "'{text}' is not one of [{}]",
                            self.enum_values.join(", ")
                        ),
                    ));
                }
                Ok(())
            }
            SchemaType::Integer => {
                if value.is_i64() || value.is_u64() {
                    Ok(())
                } else {
                    Err(violation(path, "expected an integer"))
                }
            }
        }
    }
}

fn violation(path: &str, reason: &str) -> SchemaViolation {
    SchemaViolation {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exercise_schema() -> Schema {
        Schema::object()
            .property("planName", Schema::string())
            .property("durationWeeks", Schema::integer())
            .property(
                "days",
                Schema::array(
                    Schema::object()
                        .property("day", Schema::integer())
                        .property("name", Schema::string())
                        .require_all(),
                ),
            )
            .property("level", Schema::string_enum(&["Low", "High"]))
            .required(&["planName", "durationWeeks", "days"])
    }

    #[test]
    fn test_serializes_in_provider_dialect() {
        let value = exercise_schema().to_value();
        assert_eq!(value["type"], "OBJECT");
        assert_eq!(value["properties"]["days"]["type"], "ARRAY");
        assert_eq!(value["properties"]["days"]["items"]["type"], "OBJECT");
        assert_eq!(value["properties"]["level"]["enum"], json!(["Low", "High"]));
        assert_eq!(
            value["propertyOrdering"],
            json!(["planName", "durationWeeks", "days", "level"])
        );
        assert_eq!(value["required"], json!(["planName", "durationWeeks", "days"]));
        assert!(value["properties"]["planName"].get("enum").is_none());
    }

    #[test]
    fn test_valid_document_passes() {
        let doc = json!({
            "planName": "Iron Start",
            "durationWeeks": 4,
            "days": [{"day": 1, "name": "Push"}],
            "level": "High"
        });
        assert!(exercise_schema().validate(&doc).is_ok());
    }

    #[test]
    fn test_missing_required_field_reports_path() {
        let doc = json!({"planName": "Iron Start", "days": []});
        let err = exercise_schema().validate(&doc).unwrap_err();
        assert_eq!(err.path, "$");
        assert!(err.reason.contains("durationWeeks"));
    }

    #[test]
    fn test_null_required_field_is_missing() {
        let doc = json!({"planName": null, "durationWeeks": 4, "days": []});
        assert!(exercise_schema().validate(&doc).is_err());
    }

    #[test]
    fn test_nested_type_mismatch_reports_index() {
        let doc = json!({
            "planName": "Iron Start",
            "durationWeeks": 4,
            "days": [{"day": 1, "name": "Push"}, {"day": "two", "name": "Pull"}]
        });
        let err = exercise_schema().validate(&doc).unwrap_err();
        assert_eq!(err.path, "$.days[1].day");
    }

    #[test]
    fn test_fractional_number_is_not_integer() {
        let doc = json!({"planName": "x", "durationWeeks": 4.5, "days": []});
        let err = exercise_schema().validate(&doc).unwrap_err();
        assert_eq!(err.path, "$.durationWeeks");
    }

    #[test]
    fn test_enum_value_outside_set_rejected() {
        let doc = json!({"planName": "x", "durationWeeks": 4, "days": [], "level": "Extreme"});
        let err = exercise_schema().validate(&doc).unwrap_err();
        assert_eq!(err.path, "$.level");
        assert!(err.reason.contains("Extreme"));
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let doc = json!({"planName": "x", "durationWeeks": 4, "days": []});
        assert!(exercise_schema().validate(&doc).is_ok());
    }

    #[test]
    fn test_top_level_array_rejected_for_object_schema() {
        let err = exercise_schema().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.reason, "expected an object");
    }
}
