//! OpenAPI 3.0 document generation from the router's path map.

use serde_json::{Map, Value, json};

use crate::router::Paths;

/// Version written to the `openapi` field.
pub const OPENAPI_VERSION: &str = "3.0.1";

/// Top-level API info for the OpenAPI document.
#[derive(Debug, Clone)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
        }
    }

    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }
}

impl From<&crate::config::Docs> for Info {
    fn from(docs: &crate::config::Docs) -> Self {
        Self {
            title: docs.title.clone(),
            version: docs.version.clone(),
            description: docs.description.clone(),
        }
    }
}

/// Build an OpenAPI JSON document around documented paths.
pub fn generate(info: &Info, paths: &Paths) -> Value {
    let mut info_obj = Map::new();
    if let Some(description) = &info.description {
        info_obj.insert("description".into(), Value::String(description.clone()));
    }
    info_obj.insert("title".into(), Value::String(info.title.clone()));
    info_obj.insert("version".into(), Value::String(info.version.clone()));

    let paths = serde_json::to_value(paths).unwrap_or_else(|e| {
        tracing::error!("failed to serialize paths: {e}");
        json!({})
    });

    json!({
        "openapi": OPENAPI_VERSION,
        "info": info_obj,
        "paths": paths,
    })
}
