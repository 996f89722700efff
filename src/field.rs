//! Field declarations: where each field of an endpoint is documented and bound.
//!
//! An endpoint returns a [`Fields`] table listing its fields in declaration
//! order. Each field is placed as a path or query parameter, a body property,
//! or an error-response source.
//!
//! ```ignore
//! Fields::new()
//!     .path(Param::new("id").of::<u64>())
//!     .query(Param::new("since").format(DateTimeFormat))
//!     .body(Prop::new("age").of::<u32>().required())
//!     .error(ErrorResponse::new("not_found"))
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde_json::Value;

use crate::format::Format;
use crate::schema::{Location, Schema};

/// Maps a Rust type to a coarse schema type name.
pub trait SchemaType {
    fn schema_type() -> &'static str;
}

macro_rules! schema_type {
    ($name:literal => $($ty:ty),+) => {
        $(impl SchemaType for $ty {
            fn schema_type() -> &'static str {
                $name
            }
        })+
    };
}

schema_type!("string" => String, &str, char, jiff::Timestamp, jiff::civil::Date);
schema_type!("integer" => i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);
schema_type!("number" => f32, f64);
schema_type!("boolean" => bool);
schema_type!("object" => Value);

impl<T: SchemaType> SchemaType for Option<T> {
    fn schema_type() -> &'static str {
        T::schema_type()
    }
}

impl<T> SchemaType for Vec<T> {
    fn schema_type() -> &'static str {
        "array"
    }
}

/// The declared type of a field.
#[derive(Clone)]
pub enum TypeSpec {
    /// A primitive type name such as `"integer"`.
    Primitive(String),
    /// A wire format; its schema is used and it decodes bound values.
    Format(Arc<dyn Format>),
    /// An explicit schema fragment.
    Schema(Schema),
}

impl std::fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeSpec::Primitive(p) => f.debug_tuple("Primitive").field(p).finish(),
            TypeSpec::Format(fmt) => f.debug_tuple("Format").field(&fmt.schema()).finish(),
            TypeSpec::Schema(s) => f.debug_tuple("Schema").field(s).finish(),
        }
    }
}

/// Schema for `T` with subschemas inlined, so it can sit in a property.
fn schema_for<T: JsonSchema>() -> Schema {
    let generator = SchemaSettings::draft2020_12()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    let root = generator.into_root_schema_for::<T>();
    Schema::from_value(serde_json::to_value(root).unwrap_or(Value::Null))
}

macro_rules! typed_builder {
    () => {
        /// Type from a primitive name, e.g. `"integer"`.
        pub fn kind(mut self, kind: impl Into<String>) -> Self {
            self.kind = Some(TypeSpec::Primitive(kind.into()));
            self
        }

        /// Type inferred from a Rust type.
        pub fn of<T: SchemaType>(mut self) -> Self {
            self.kind = Some(TypeSpec::Primitive(T::schema_type().to_string()));
            self
        }

        /// Type from a wire format.
        pub fn format(mut self, format: impl Format) -> Self {
            self.kind = Some(TypeSpec::Format(Arc::new(format)));
            self
        }

        /// An explicit schema fragment.
        pub fn schema(mut self, schema: Schema) -> Self {
            self.kind = Some(TypeSpec::Schema(schema));
            self
        }

        /// Structural schema derived from `T`.
        pub fn json_schema<T: JsonSchema>(mut self) -> Self {
            self.kind = Some(TypeSpec::Schema(schema_for::<T>()));
            self
        }

        pub fn description(mut self, d: impl Into<String>) -> Self {
            self.description = Some(d.into());
            self
        }

        pub fn example(mut self, e: impl Into<Value>) -> Self {
            self.example = Some(e.into());
            self
        }
    };
}

/// A path or query parameter declaration.
#[derive(Debug, Clone)]
pub struct Param {
    pub(crate) name: String,
    pub(crate) location: Location,
    pub(crate) kind: Option<TypeSpec>,
    pub(crate) description: Option<String>,
    pub(crate) example: Option<Value>,
    pub(crate) required: Option<bool>,
    pub(crate) deprecated: Option<bool>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: Location::Query,
            kind: None,
            description: None,
            example: None,
            required: None,
            deprecated: None,
        }
    }

    typed_builder!();

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = Some(true);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A body property declaration.
#[derive(Debug, Clone)]
pub struct Prop {
    pub(crate) name: String,
    pub(crate) kind: Option<TypeSpec>,
    pub(crate) description: Option<String>,
    pub(crate) example: Option<Value>,
    pub(crate) required: bool,
}

impl Prop {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            description: None,
            example: None,
            required: false,
        }
    }

    typed_builder!();

    /// List the property in the body's `required` array.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An error-response source.
///
/// When the endpoint's field holds an error at first document access, the
/// operation gets a response keyed by the error's status. `description`
/// defaults to the error message.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) schema: Option<Schema>,
}

impl ErrorResponse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema: None,
        }
    }

    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered field declarations of one endpoint type.
///
/// Path and query parameters share one category, so re-declaring a field
/// within a category replaces the earlier declaration. Names keep the order
/// of their first declaration.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    order: Vec<String>,
    pub(crate) errors: HashMap<String, ErrorResponse>,
    pub(crate) params: HashMap<String, Param>,
    pub(crate) props: HashMap<String, Prop>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, name: &str) {
        if !self.order.iter().any(|n| n == name) {
            self.order.push(name.to_string());
        }
    }

    pub fn path(self, mut param: Param) -> Self {
        param.location = Location::Path;
        self.param(param)
    }

    pub fn query(self, mut param: Param) -> Self {
        param.location = Location::Query;
        self.param(param)
    }

    fn param(mut self, param: Param) -> Self {
        self.record(&param.name);
        self.params.insert(param.name.clone(), param);
        self
    }

    pub fn body(mut self, prop: Prop) -> Self {
        self.record(&prop.name);
        self.props.insert(prop.name.clone(), prop);
        self
    }

    pub fn error(mut self, error: ErrorResponse) -> Self {
        self.record(&error.name);
        self.errors.insert(error.name.clone(), error);
        self
    }

    /// Append another table, e.g. a derived type's fields after its base's.
    pub fn extend(mut self, other: Fields) -> Self {
        for name in &other.order {
            self.record(name);
        }
        self.errors.extend(other.errors);
        self.params.extend(other.params);
        self.props.extend(other.props);
        self
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
