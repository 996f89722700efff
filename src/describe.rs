//! Operation-level metadata for an endpoint type.

use serde_json::Value;

use crate::operation::Operation;
use crate::schema::{Parameter, Response};

/// Operation fragment builder.
///
/// Setting a key twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct Describe {
    op: Operation,
}

impl Describe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, s: impl Into<String>) -> Self {
        self.op.summary = Some(s.into());
        self
    }

    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.op.description = Some(d.into());
        self
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.op.operation_id = Some(id.into());
        self
    }

    pub fn tag(mut self, t: impl Into<String>) -> Self {
        self.op.tags.get_or_insert_with(Vec::new).push(t.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.op.deprecated = Some(true);
        self
    }

    /// A parameter not backed by a field, e.g. a header.
    /// Listed before field parameters.
    pub fn parameter(mut self, p: Parameter) -> Self {
        self.op.parameters.push(p);
        self
    }

    /// Declare a response up front. Any declared response replaces the
    /// default `200 Success` entry.
    pub fn response(mut self, status: u16, r: Response) -> Self {
        self.op.responses.insert(status.to_string(), r);
        self
    }

    /// An extension key; `x-` is prepended when missing.
    pub fn extension(mut self, key: &str, value: impl Into<Value>) -> Self {
        let key = if key.starts_with("x-") {
            key.to_string()
        } else {
            format!("x-{key}")
        };
        self.op.extra.insert(key, value.into());
        self
    }

    pub(crate) fn into_operation(self) -> Operation {
        self.op
    }
}
