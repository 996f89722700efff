//! Waypoint - documented endpoints for hyper services.
//!
//! Endpoint types declare their metadata once and get two things from it:
//! an OpenAPI operation document, and request values decoded into a
//! per-request [`Values`] map.
//!
//! - **Field**: path/query/body/error-response declarations per endpoint type
//! - **Describe**: operation-level metadata (summary, tags, ...)
//! - **Format**: wire formats such as `date-time` that decode bound values
//! - **Endpoint**: document synthesis and request binding
//! - **Router**: registers endpoint chains and collects the path document
//! - **Server**: Hyper-based HTTP server
//!
//! # Example
//!
//! ```ignore
//! use waypoint::{Context, Describe, Documented, Endpoint, Fields, Flow, Param, Router, Values};
//!
//! struct HelloWorld;
//!
//! impl Endpoint for HelloWorld {
//!     fn describe() -> Describe {
//!         Describe::new().summary("This endpoint will display Hello world.")
//!     }
//!
//!     fn fields() -> Fields {
//!         Fields::new().query(Param::new("name").of::<String>().example("Alex"))
//!     }
//!
//!     async fn handle(&self, _ctx: &mut Context, values: Values) -> waypoint::Result<Flow> {
//!         let name = values.str("name").unwrap_or("world");
//!         Ok(waypoint::response::text(format!("Hello {name}")).into())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> waypoint::Result<()> {
//!     let config = waypoint::ConfigLoader::new("HELLO").load(None, None, None)?;
//!
//!     let mut router = Router::new();
//!     router.get("/api/hello", Documented::new(HelloWorld));
//!     router.openapi(&config.docs.path, (&config.docs).into());
//!
//!     waypoint::server::run(&config, router.into_handle()).await
//! }
//! ```

pub mod config;
pub mod describe;
pub mod endpoint;
pub mod error;
pub mod field;
pub mod format;
pub mod openapi;
pub mod operation;
pub mod response;
pub mod router;
pub mod schema;
pub mod server;
pub mod values;

// Re-export main types at crate root
pub use config::{Config, ConfigLoader};
pub use describe::Describe;
pub use endpoint::{Dispatch, Documented, Endpoint, Flow, IntoChain};
pub use error::{Error, HttpError, Result};
pub use field::{ErrorResponse, Fields, Param, Prop, SchemaType};
pub use format::{DateFormat, DateTimeFormat, Format};
pub use openapi::Info;
pub use operation::Operation;
pub use router::{Context, Router};
pub use schema::{Location, Schema};
pub use values::{FieldValue, Values};

// Re-export commonly used dependencies for convenience
pub use hyper::Method;
pub use serde_json::json;
