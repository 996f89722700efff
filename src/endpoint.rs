//! Endpoints: a handler plus the metadata its document is derived from.
//!
//! An [`Endpoint`] type declares an operation fragment ([`Describe`]) and a
//! field table ([`Fields`]). Wrapping a value in [`Documented`] gives it a
//! lazily synthesized [`Operation`] and the ability to bind request values.
//!
//! Synthesis walks the fields in declaration order. Each field is claimed by
//! the first matching category, checked in this order:
//!
//! 1. error response: documented only if the instance currently holds an
//!    error in that field (see [`Endpoint::error`]);
//! 2. path or query parameter;
//! 3. body property, which creates the JSON object body on first use.
//!
//! The document is built once per [`Documented`] value. Error fields must
//! therefore be populated before the first call to
//! [`document`](Documented::document), typically in the constructor.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::describe::Describe;
use crate::error::{Error, HttpError, Result};
use crate::field::{Fields, TypeSpec};
use crate::format::{Format, Invalid};
use crate::operation::Operation;
use crate::response::HttpResponse;
use crate::router::{BoxFuture, Context};
use crate::schema::{Location, Parameter, RequestBody, Response, Schema};
use crate::values::{FieldValue, Values};

/// What an endpoint in a chain decided.
#[derive(Debug)]
pub enum Flow {
    /// Run the next endpoint of the route.
    Next,
    /// Finish the request with this response.
    Respond(HttpResponse),
}

impl From<HttpResponse> for Flow {
    fn from(response: HttpResponse) -> Self {
        Flow::Respond(response)
    }
}

/// A documented request handler.
pub trait Endpoint: Send + Sync + 'static {
    /// Operation-level metadata.
    fn describe() -> Describe {
        Describe::new()
    }

    /// Field declarations in declaration order.
    fn fields() -> Fields {
        Fields::new()
    }

    /// The error currently held by an error-response field, if any.
    fn error(&self, _field: &str) -> Option<&dyn HttpError> {
        None
    }

    /// Handle a request with the values bound for it.
    fn handle(
        &self,
        ctx: &mut Context,
        values: Values,
    ) -> impl Future<Output = Result<Flow>> + Send;
}

struct Built {
    doc: Operation,
    formats: HashMap<String, Arc<dyn Format>>,
}

/// An endpoint with its document cache.
pub struct Documented<E> {
    endpoint: E,
    fields: Fields,
    built: OnceLock<Built>,
}

impl<E: Endpoint> Documented<E> {
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            fields: E::fields(),
            built: OnceLock::new(),
        }
    }

    pub fn inner(&self) -> &E {
        &self.endpoint
    }

    /// Mutable access to the endpoint. The document, once built, is not
    /// affected by later changes.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    /// The operation document, synthesized on first access.
    pub fn document(&self) -> &Operation {
        &self.built().doc
    }

    fn built(&self) -> &Built {
        self.built.get_or_init(|| self.synthesize())
    }

    fn synthesize(&self) -> Built {
        let mut doc = E::describe().into_operation();
        if doc.responses.is_empty() {
            doc.responses.insert("200".into(), Response::json("Success"));
        }
        let mut formats = HashMap::new();

        for name in self.fields.names() {
            if let Some(declared) = self.fields.errors.get(name) {
                if let Some(err) = self.endpoint.error(name) {
                    let status = err.status().unwrap_or(500);
                    let description = declared
                        .description
                        .clone()
                        .unwrap_or_else(|| err.to_string());
                    let mut response = Response::json(description);
                    if let Some(schema) = &declared.schema {
                        response = response.schema(schema.clone());
                    }
                    doc.responses.insert(status.to_string(), response);
                }
                continue;
            }

            if let Some(param) = self.fields.params.get(name) {
                let schema = resolve(name, param.kind.as_ref(), &mut formats);
                let required = match param.location {
                    Location::Path => param.required.or(Some(true)),
                    _ => param.required,
                };
                doc.parameters.push(Parameter {
                    name: name.to_string(),
                    location: param.location,
                    schema,
                    description: param.description.clone(),
                    example: param.example.clone(),
                    required,
                    deprecated: param.deprecated,
                });
                continue;
            }

            if let Some(prop) = self.fields.props.get(name) {
                let mut schema = resolve(name, prop.kind.as_ref(), &mut formats);
                if prop.description.is_some() {
                    schema.description.clone_from(&prop.description);
                }
                if prop.example.is_some() {
                    schema.example.clone_from(&prop.example);
                }
                let body = doc
                    .request_body
                    .get_or_insert_with(RequestBody::object)
                    .schema_mut();
                if let Some(body) = body {
                    body.properties.insert(name.to_string(), schema);
                    if prop.required {
                        body.required.push(name.to_string());
                    }
                }
            }
        }

        tracing::debug!(
            endpoint = std::any::type_name::<E>(),
            parameters = doc.parameters.len(),
            body = doc.request_body.is_some(),
            "synthesized operation document"
        );
        Built { doc, formats }
    }

    /// Decode the request's path, query, header and body values for the
    /// fields this endpoint documents.
    pub fn bind(&self, ctx: &Context) -> Result<Values> {
        let built = self.built();
        let mut values = Values::new();

        if !built.doc.parameters.is_empty() {
            let query = ctx.query();
            for param in &built.doc.parameters {
                let raw = match param.location {
                    Location::Path | Location::Query => ctx
                        .param(&param.name)
                        .map(|v| Value::String(v.to_string()))
                        .or_else(|| query.get(&param.name).cloned()),
                    Location::Header => ctx
                        .header(&param.name)
                        .map(|v| Value::String(v.to_string())),
                    Location::Cookie => None,
                };
                if let Some(raw) = raw
                    && let Some(value) = decode(&built.formats, &param.name, raw, &param.schema)?
                {
                    values.insert(param.name.clone(), value);
                }
            }
        }

        if let Some(schema) = built.doc.request_body.as_ref().and_then(RequestBody::schema)
            && !schema.properties.is_empty()
            && !ctx.body.is_empty()
            && let Value::Object(mut body) = ctx.json::<Value>()?
        {
            for (name, prop) in &schema.properties {
                if let Some(raw) = body.remove(name)
                    && let Some(value) = decode(&built.formats, name, raw, prop)?
                {
                    values.insert(name.clone(), value);
                }
            }
        }

        tracing::debug!(bound = values.len(), "bound request values");
        Ok(values)
    }
}

impl<E: Endpoint + Default> Default for Documented<E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

/// Schema for a declared type; formats are registered by discriminator.
fn resolve(
    field: &str,
    kind: Option<&TypeSpec>,
    formats: &mut HashMap<String, Arc<dyn Format>>,
) -> Schema {
    match kind {
        Some(TypeSpec::Primitive(kind)) => Schema::of(kind.clone()),
        Some(TypeSpec::Schema(schema)) => schema.clone(),
        Some(TypeSpec::Format(format)) => {
            let schema = format.schema();
            if let Some(discriminator) = &schema.format {
                formats.insert(discriminator.clone(), Arc::clone(format));
            }
            schema
        }
        None => {
            tracing::debug!(field, "no declared type, documenting as string");
            Schema::of("string")
        }
    }
}

fn decode(
    formats: &HashMap<String, Arc<dyn Format>>,
    field: &str,
    raw: Value,
    schema: &Schema,
) -> Result<Option<FieldValue>> {
    if raw.is_null() {
        return Ok(None);
    }
    let invalid = |source| Error::Decode {
        field: field.to_string(),
        source,
    };
    if let Some(format) = schema.format.as_deref().and_then(|f| formats.get(f)) {
        return format.decode(&raw).map_err(invalid);
    }
    if schema.is_numeric() {
        return coerce_number(&raw)
            .map(|n| Some(FieldValue::Json(n)))
            .map_err(invalid);
    }
    Ok(Some(FieldValue::Json(raw)))
}

fn coerce_number(raw: &Value) -> std::result::Result<Value, Invalid> {
    match raw {
        Value::Number(_) => Ok(raw.clone()),
        Value::Bool(b) => Ok(Value::from(u8::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| Invalid::new("number", s.clone()))
        }
        other => Err(Invalid::new("number", other.to_string())),
    }
}

/// Type-erased endpoint, as stored in a route's chain.
pub trait Dispatch: Send + Sync {
    fn document(&self) -> &Operation;

    /// Bind the request, then run the handler.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Flow>>;
}

impl<E: Endpoint> Dispatch for Documented<E> {
    fn document(&self) -> &Operation {
        Documented::document(self)
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(async move {
            let values = self.bind(ctx)?;
            self.endpoint.handle(ctx, values).await
        })
    }
}

/// Anything that can be registered as a route's endpoint chain.
pub trait IntoChain {
    fn into_chain(self) -> Vec<Arc<dyn Dispatch>>;
}

impl<E: Endpoint> IntoChain for Documented<E> {
    fn into_chain(self) -> Vec<Arc<dyn Dispatch>> {
        vec![Arc::new(self) as Arc<dyn Dispatch>]
    }
}

impl<E: Endpoint> IntoChain for Arc<Documented<E>> {
    fn into_chain(self) -> Vec<Arc<dyn Dispatch>> {
        vec![self as Arc<dyn Dispatch>]
    }
}

impl IntoChain for Vec<Arc<dyn Dispatch>> {
    fn into_chain(self) -> Vec<Arc<dyn Dispatch>> {
        self
    }
}

macro_rules! chain_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoChain),+> IntoChain for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_chain(self) -> Vec<Arc<dyn Dispatch>> {
                let ($($name,)+) = self;
                let mut chain = Vec::new();
                $(chain.extend($name.into_chain());)+
                chain
            }
        }
    };
}

chain_tuple!(A, B);
chain_tuple!(A, B, C);
chain_tuple!(A, B, C, D);
chain_tuple!(A, B, C, D, E);
