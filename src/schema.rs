//! Document fragments: schemas, parameters, request bodies and responses.
//!
//! These are the small subset of OpenAPI objects the synthesizer produces.
//! Keywords it does not model are carried in `extra` and serialized inline.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Media type used for request bodies and default responses.
pub const JSON: &str = "application/json";

/// A schema fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Properties in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Schema {
    /// A schema with only a `type`.
    pub fn of(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// An empty object schema, as used for request bodies.
    pub fn object() -> Self {
        Self::of("object")
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Build a fragment from raw JSON (e.g. a schemars-generated schema).
    ///
    /// `type` is lifted only when it is a single string; other shapes such
    /// as `["string", "null"]` stay in `extra` untouched.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let mut take_str = |key: &str| match map.shift_remove(key) {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                map.insert(key.to_string(), other);
                None
            }
            None => None,
        };
        let kind = take_str("type");
        let format = take_str("format");
        let description = take_str("description");
        let example = map.shift_remove("example");
        map.shift_remove("$schema");
        map.shift_remove("title");
        Self {
            kind,
            format,
            description,
            example,
            properties: IndexMap::new(),
            required: Vec::new(),
            extra: map,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind.as_deref(), Some("number" | "integer"))
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Path,
    Query,
    Header,
    Cookie,
}

/// A documented operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: Location,
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: Location, schema: Schema) -> Self {
        Self {
            name: name.into(),
            location,
            schema,
            description: None,
            example: None,
            required: None,
            deprecated: None,
        }
    }

    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }

    pub fn required(mut self, r: bool) -> Self {
        self.required = Some(r);
        self
    }
}

/// Content of one media type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// A request body. Only produced when an endpoint declares body properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    /// A JSON body with an empty object schema.
    pub fn object() -> Self {
        let mut content = BTreeMap::new();
        content.insert(
            JSON.to_string(),
            MediaType {
                schema: Some(Schema::object()),
            },
        );
        Self { content }
    }

    /// The JSON object schema, if the body has one.
    pub fn schema(&self) -> Option<&Schema> {
        self.content
            .get(JSON)
            .and_then(|m| m.schema.as_ref())
            .filter(|s| s.kind.as_deref() == Some("object"))
    }

    pub fn schema_mut(&mut self) -> Option<&mut Schema> {
        self.content
            .get_mut(JSON)
            .and_then(|m| m.schema.as_mut())
            .filter(|s| s.kind.as_deref() == Some("object"))
    }
}

/// A documented response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub description: String,
    pub content: BTreeMap<String, MediaType>,
}

impl Response {
    /// A JSON response with no schema.
    pub fn json(description: impl Into<String>) -> Self {
        let mut content = BTreeMap::new();
        content.insert(JSON.to_string(), MediaType::default());
        Self {
            description: description.into(),
            content,
        }
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.content
            .insert(JSON.to_string(), MediaType { schema: Some(schema) });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_serializes_compactly() {
        let schema = Schema::of("string").with_format("date-time");
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "type": "string", "format": "date-time" })
        );
    }

    #[test]
    fn from_value_keeps_unmodelled_keywords() {
        let schema = Schema::from_value(json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "Tags",
            "type": "array",
            "items": { "type": "string" }
        }));
        assert_eq!(schema.kind.as_deref(), Some("array"));
        assert_eq!(schema.extra["items"], json!({ "type": "string" }));
        assert!(!schema.extra.contains_key("title"));
    }

    #[test]
    fn from_value_leaves_union_types_alone() {
        let schema = Schema::from_value(json!({ "type": ["string", "null"] }));
        assert!(schema.kind.is_none());
        assert_eq!(schema.extra["type"], json!(["string", "null"]));
    }

    #[test]
    fn default_response_shape() {
        let value = serde_json::to_value(Response::json("Success")).unwrap();
        assert_eq!(
            value,
            json!({ "description": "Success", "content": { "application/json": {} } })
        );
    }
}
