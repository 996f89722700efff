//! Operation documents, one per endpoint and one merged per route.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{Parameter, RequestBody, Response};

/// The description of one operation (a method on a path).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Operation {
    /// Shallow merge: every top-level key `other` sets replaces ours.
    ///
    /// Synthesized documents always carry `parameters` and `responses`, so
    /// those two are taken from `other` wholesale.
    pub fn merge(&mut self, other: &Operation) {
        if other.summary.is_some() {
            self.summary.clone_from(&other.summary);
        }
        if other.description.is_some() {
            self.description.clone_from(&other.description);
        }
        if other.operation_id.is_some() {
            self.operation_id.clone_from(&other.operation_id);
        }
        if other.tags.is_some() {
            self.tags.clone_from(&other.tags);
        }
        if other.deprecated.is_some() {
            self.deprecated = other.deprecated;
        }
        if other.request_body.is_some() {
            self.request_body.clone_from(&other.request_body);
        }
        self.parameters.clone_from(&other.parameters);
        self.responses.clone_from(&other.responses);
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Merge a sequence of documents in order.
    pub fn merged<'a>(docs: impl IntoIterator<Item = &'a Operation>) -> Operation {
        docs.into_iter().fold(Operation::default(), |mut acc, doc| {
            acc.merge(doc);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Location, Schema};
    use serde_json::json;

    fn doc(summary: Option<&str>, param: &str) -> Operation {
        let mut op = Operation {
            summary: summary.map(str::to_string),
            parameters: vec![Parameter::new(param, Location::Query, Schema::of("string"))],
            ..Default::default()
        };
        op.responses.insert("200".into(), Response::json("Success"));
        op
    }

    #[test]
    fn later_keys_override() {
        let merged = Operation::merged([&doc(Some("first"), "a"), &doc(Some("second"), "b")]);
        assert_eq!(merged.summary.as_deref(), Some("second"));
        assert_eq!(merged.parameters.len(), 1);
        assert_eq!(merged.parameters[0].name, "b");
    }

    #[test]
    fn unset_keys_keep_earlier_values() {
        let merged = Operation::merged([&doc(Some("first"), "a"), &doc(None, "b")]);
        assert_eq!(merged.summary.as_deref(), Some("first"));
    }

    #[test]
    fn serializes_camel_case() {
        let op = Operation {
            operation_id: Some("getUser".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value, json!({ "operationId": "getUser", "responses": {} }));
    }
}
