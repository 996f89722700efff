//! HTTP routing with matchit, plus the path document built from endpoints.
//!
//! Endpoint chains are registered per method and path. Each registration
//! merges its endpoints' documents into one [`Operation`] and records it under
//! the path in document syntax (`/users/:id` is documented as `/users/{id}`).

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use hyper::http::Extensions;
use hyper::{Method, Request, Uri};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::endpoint::{Dispatch, Flow, IntoChain};
use crate::operation::Operation;
use crate::response::HttpResponse;

/// Boxed future for async handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Documented operations keyed by path, then by lower-case method.
pub type Paths = BTreeMap<String, BTreeMap<String, Operation>>;

/// Handler context passed to route handlers and endpoints.
pub struct Context {
    /// The HTTP method.
    pub method: Method,
    /// The request URI.
    pub uri: Uri,
    /// The request headers.
    pub headers: hyper::http::HeaderMap,
    /// Route parameters (e.g., {id} from path).
    pub params: HashMap<String, String>,
    /// The request body, pre-read as bytes.
    pub body: Bytes,
    /// Per-request values shared by the endpoints of one chain.
    pub extensions: Extensions,
}

impl Context {
    /// A context with no headers, params or body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: hyper::http::HeaderMap::new(),
            params: HashMap::new(),
            body: Bytes::new(),
            extensions: Extensions::new(),
        }
    }

    /// Build a context from a collected request and matched route params.
    pub fn from_request(request: Request<Bytes>, params: HashMap<String, String>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body,
            extensions: parts.extensions,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Parse the request body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            serde_json::from_value(Value::Null)
                .map_err(|e| crate::Error::BadRequest(format!("Invalid request body: {e}")))
        } else {
            serde_json::from_slice(&self.body)
                .map_err(|e| crate::Error::BadRequest(format!("Invalid request body: {e}")))
        }
    }

    /// Query string values. Keys given more than once map to an array.
    pub fn query(&self) -> HashMap<String, Value> {
        let mut query: HashMap<String, Value> = HashMap::new();
        let Some(raw) = self.uri.query() else {
            return query;
        };
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let value = Value::String(value.into_owned());
            match query.get_mut(key.as_ref()) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    query.insert(key.into_owned(), value);
                }
            }
        }
        query
    }

    /// Get a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a route parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Get a required route parameter, returning BadRequest if missing.
    pub fn require_param(&self, name: &str) -> Result<&str> {
        self.param(name)
            .ok_or_else(|| crate::Error::BadRequest(format!("Missing parameter: {name}")))
    }
}

/// Handler function type.
/// Takes a Context and returns a future resolving to a Response.
pub type Handler = Box<dyn Fn(Context) -> BoxFuture<'static, Result<HttpResponse>> + Send + Sync>;

/// A handler with the parameter names of the path it was registered under.
///
/// Paths that differ only in parameter names share one matcher route, so
/// matched values are renamed by position.
struct Registered {
    handler: Handler,
    names: Vec<String>,
}

/// A registered route with method-specific handlers.
struct RouteEntry {
    /// Document key of the first registration.
    doc_path: String,
    handlers: HashMap<Method, Registered>,
}

/// Method and router-syntax path of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub method: Method,
}

/// One registration of an endpoint chain.
pub struct EndpointInstance {
    pub route: Route,
    /// Documents of `endpoints`, merged in order.
    pub doc: Operation,
    /// Endpoints in invocation order.
    pub endpoints: Vec<Arc<dyn Dispatch>>,
}

/// HTTP router for registering and dispatching requests.
pub struct Router {
    routes: matchit::Router<usize>,
    patterns: HashMap<String, usize>,
    entries: Vec<RouteEntry>,
    instances: Vec<EndpointInstance>,
    paths: Paths,
}

impl Router {
    /// Create a new router.
    pub fn new() -> Self {
        Self {
            routes: matchit::Router::new(),
            patterns: HashMap::new(),
            entries: Vec::new(),
            instances: Vec::new(),
            paths: Paths::new(),
        }
    }

    /// Register a plain handler for a method and path.
    ///
    /// Plain handlers are not documented.
    ///
    /// # Example
    /// ```ignore
    /// router.route(Method::GET, "/health", |_ctx| async move {
    ///     response::ok(&json!({ "status": "ok" }))
    /// });
    /// ```
    pub fn route<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        let boxed: Handler =
            Box::new(move |ctx| -> BoxFuture<'static, Result<HttpResponse>> {
                Box::pin(handler(ctx))
            });
        self.register(method, path, boxed);
        self
    }

    /// Add a handler to the route for `path`, creating the route if needed.
    ///
    /// Returns the route's index, or `None` when the matcher refuses the
    /// pattern. A refused registration is dropped.
    fn register(&mut self, method: Method, path: &str, handler: Handler) -> Option<usize> {
        let pattern = route_pattern(path);
        let shape = route_shape(&pattern);
        let entry_idx = match self.patterns.get(&shape) {
            Some(idx) => *idx,
            None => {
                let idx = self.entries.len();
                if let Err(e) = self.routes.insert(pattern.clone(), idx) {
                    tracing::error!(path, "route rejected, not registered: {e}");
                    return None;
                }
                self.entries.push(RouteEntry {
                    doc_path: document_path(path),
                    handlers: HashMap::new(),
                });
                self.patterns.insert(shape, idx);
                idx
            }
        };

        let entry = &mut self.entries[entry_idx];
        let names = param_names(&pattern);
        if document_path(path) != entry.doc_path {
            tracing::warn!(
                path,
                documented = %entry.doc_path,
                "parameter names differ from the first registration of this route"
            );
        }
        entry.handlers.insert(method, Registered { handler, names });
        Some(entry_idx)
    }

    /// Register an endpoint chain and document it.
    ///
    /// Endpoints run in order; each one binds and handles before the next
    /// starts. A chain in which no endpoint responds yields 404.
    pub fn endpoint(&mut self, method: Method, path: &str, chain: impl IntoChain) -> &mut Self {
        let endpoints = chain.into_chain();
        let doc = Operation::merged(endpoints.iter().map(|e| e.document()));

        let chain: Arc<[Arc<dyn Dispatch>]> = endpoints.iter().cloned().collect();
        let handler: Handler = Box::new(move |mut ctx| -> BoxFuture<'static, Result<HttpResponse>> {
            let chain = Arc::clone(&chain);
            Box::pin(async move { run_chain(&chain, &mut ctx).await })
        });
        let Some(idx) = self.register(method.clone(), path, handler) else {
            return self;
        };

        let key = self.entries[idx].doc_path.clone();
        tracing::debug!(%method, path = %key, endpoints = endpoints.len(), "registered endpoint");
        self.paths
            .entry(key)
            .or_default()
            .insert(method.as_str().to_lowercase(), doc.clone());

        self.instances.push(EndpointInstance {
            route: Route {
                path: path.to_string(),
                method,
            },
            doc,
            endpoints,
        });
        self
    }

    pub fn get(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::GET, path, chain)
    }

    pub fn put(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::PUT, path, chain)
    }

    pub fn post(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::POST, path, chain)
    }

    pub fn delete(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::DELETE, path, chain)
    }

    pub fn options(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::OPTIONS, path, chain)
    }

    pub fn head(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::HEAD, path, chain)
    }

    pub fn patch(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::PATCH, path, chain)
    }

    pub fn trace(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
        self.endpoint(Method::TRACE, path, chain)
    }

    /// Documented operations, keyed by `{param}`-style path.
    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Registrations in the order they were made.
    pub fn endpoint_instances(&self) -> &[EndpointInstance] {
        &self.instances
    }

    /// The full OpenAPI document for what is registered so far.
    pub fn document(&self, info: &crate::openapi::Info) -> Value {
        crate::openapi::generate(info, &self.paths)
    }

    /// Register a GET route that serves the OpenAPI JSON document built from
    /// all previously registered endpoints.
    pub fn openapi(&mut self, path: &str, info: crate::openapi::Info) -> &mut Self {
        let json = Bytes::from(self.document(&info).to_string());
        self.route(Method::GET, path, move |_ctx| {
            let json = json.clone();
            async move { Ok(crate::response::raw_json(json)) }
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_chain(chain: &[Arc<dyn Dispatch>], ctx: &mut Context) -> Result<HttpResponse> {
    for endpoint in chain {
        if let Flow::Respond(response) = endpoint.call(ctx).await? {
            return Ok(response);
        }
    }
    Ok(crate::response::not_found("Not found"))
}

/// Convert a router path to document syntax: `:id` and `*rest` become
/// `{id}` and `{rest}`. Braced segments are kept.
pub fn document_path(path: &str) -> String {
    convert_segments(path, |name| format!("{{{name}}}"), |name| format!("{{{name}}}"))
}

/// Convert a router path to the matcher's syntax (`{id}`, `{*rest}`).
fn route_pattern(path: &str) -> String {
    convert_segments(path, |name| format!("{{{name}}}"), |name| format!("{{*{name}}}"))
}

/// Lookup key for a matcher pattern: parameter names are dropped, so
/// `/users/{id}` and `/users/{name}` are one route.
fn route_shape(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|part| match segment_param(part) {
            Some((true, _)) => "{*}",
            Some((false, _)) => "{}",
            None => part,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Parameter names of a matcher pattern, in path order.
fn param_names(pattern: &str) -> Vec<String> {
    pattern
        .split('/')
        .filter_map(segment_param)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// `{name}` or `{*name}` as `(is_wildcard, name)`.
fn segment_param(part: &str) -> Option<(bool, &str)> {
    let inner = part.strip_prefix('{')?.strip_suffix('}')?;
    match inner.strip_prefix('*') {
        Some(name) => Some((true, name)),
        None => Some((false, inner)),
    }
}

fn convert_segments(
    path: &str,
    param: impl Fn(&str) -> String,
    wildcard: impl Fn(&str) -> String,
) -> String {
    path.split('/')
        .map(|part| {
            if let Some(name) = part.strip_prefix(':') {
                param(name)
            } else if let Some(name) = part.strip_prefix('*') {
                wildcard(name)
            } else if let Some(name) = part.strip_prefix("{*").and_then(|p| p.strip_suffix('}')) {
                wildcard(name)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Thread-safe router handle for use in request handling.
pub struct RouterHandle {
    routes: matchit::Router<usize>,
    entries: Vec<RouteEntry>,
}

impl Router {
    /// Convert to a thread-safe handle for use in request handling.
    pub fn into_handle(self) -> Arc<RouterHandle> {
        Arc::new(RouterHandle {
            routes: self.routes,
            entries: self.entries,
        })
    }
}

/// Result of matching a request to a route.
pub enum RouteMatch<'a> {
    /// Route matched with handler.
    Matched {
        handler: &'a Handler,
        params: HashMap<String, String>,
    },
    /// A path parameter is not valid percent-encoded UTF-8.
    InvalidParam(String),
    /// Path matched but method not allowed.
    MethodNotAllowed,
    /// Path not found.
    NotFound,
}

impl RouterHandle {
    /// Match a request to a route.
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        match self.routes.at(path) {
            Ok(matched) => {
                let entry = &self.entries[*matched.value];
                let Some(registered) = entry.handlers.get(method) else {
                    return RouteMatch::MethodNotAllowed;
                };

                // Decode values and rename them to this handler's names
                let mut params = HashMap::new();
                for (i, (key, value)) in matched.params.iter().enumerate() {
                    let name = registered.names.get(i).map_or(key, String::as_str);
                    match percent_decode_str(value).decode_utf8() {
                        Ok(decoded) => {
                            params.insert(name.to_string(), decoded.into_owned());
                        }
                        Err(_) => return RouteMatch::InvalidParam(name.to_string()),
                    }
                }

                RouteMatch::Matched {
                    handler: &registered.handler,
                    params,
                }
            }
            Err(_) => RouteMatch::NotFound,
        }
    }

    /// Route a collected request and produce its response.
    ///
    /// Handler errors become error responses.
    pub async fn dispatch(&self, request: Request<Bytes>) -> HttpResponse {
        let path = request.uri().path().to_string();
        match self.match_route(request.method(), &path) {
            RouteMatch::Matched { handler, params } => {
                let ctx = Context::from_request(request, params);
                match handler(ctx).await {
                    Ok(response) => response,
                    Err(e) => e.into_response(),
                }
            }
            RouteMatch::InvalidParam(name) => {
                crate::Error::BadRequest(format!("Invalid path parameter: {name}")).into_response()
            }
            RouteMatch::MethodNotAllowed => crate::response::method_not_allowed(),
            RouteMatch::NotFound => crate::response::not_found("Not found"),
        }
    }
}
