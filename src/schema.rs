//! Per-type property descriptors: the engine's substitute for runtime
//! reflection.
//!
//! A bound type implements [`BindForm`] and declares a [`FormSchema`]: one
//! [`PropertyDescriptor`] per writable property, carrying the declared
//! [`TypeDescriptor`] and the failure-tolerance flag. The binder consults
//! the schema while it applies raw parameters into the working value tree,
//! so every coercion decision (checkbox boolean, classification lookup,
//! element types one level down) is made against declared types rather than
//! guessed from the raw strings.
//!
//! Schemas are derived once per concrete type and cached process-wide.
//! Concurrent first-time derivation for the same type may race, but the
//! produced descriptors are equivalent and interchangeable, so the cache
//! needs no locking beyond what its own store guarantees.

use std::{any::TypeId, collections::BTreeMap, sync::Arc};

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;

/// A closed, code-backed enumeration with a verified code table.
///
/// Raw parameter values are matched against `codes` exactly; an unmatched
/// code is a coercion failure, never a silent default.
#[derive(Debug)]
pub struct Classification {
    pub name: &'static str,
    pub codes: &'static [&'static str],
}

impl Classification {
    /// Looks up a raw code, returning the canonical table entry on a match.
    pub fn code_of(&self, raw: &str) -> Option<&'static str> {
        self.codes.iter().copied().find(|code| *code == raw)
    }
}

/// Document shape declared for a JSON-flagged property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// A single JSON object bound into a bean-typed property.
    Object,
    /// A JSON array bound into a list-of-bean property.
    Array,
}

/// Whole-request-body JSON mode declared on a form's schema. Mutually
/// exclusive with path-based parameter binding for that form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonBodyMode {
    /// The raw body is one JSON object deserialized into the form type.
    Object,
    /// The raw body is a JSON array of the form type.
    List,
}

/// Declared type of a property slot, driving coercion and traversal.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// Checkbox-convention boolean: `"on"` is true, empty is unset.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer; negative input is a coercion failure.
    UInt,
    /// Floating-point number.
    Float,
    /// Text; empty input collapses to unset unless configured otherwise.
    Text,
    /// Calendar date, flexible input formats.
    Date,
    /// Date-time without offset, flexible input formats.
    DateTime,
    /// Time of day, flexible input formats.
    Time,
    /// Date-time with offset; requires the configured strict format.
    ZonedDateTime,
    /// Code-backed enumeration with verified lookup.
    Classification(&'static Classification),
    /// Nested bean with its own schema.
    Bean(fn() -> Arc<FormSchema>),
    /// Fixed-size array of the element type.
    Array(Box<TypeDescriptor>),
    /// Ordered, growable list of the element type.
    List(Box<TypeDescriptor>),
    /// Caller-registered ordered-collection type, grown through a working
    /// list and converted once by the named adapter.
    CustomList {
        adapter: &'static str,
        element: Box<TypeDescriptor>,
    },
    /// Raw multi-value string group (`Vec<String>` slot).
    StringArray,
    /// String-keyed map of the value type.
    Map(Box<TypeDescriptor>),
    /// JSON-carrying leaf: the raw string is parsed as a JSON document of
    /// the declared shape.
    Json(JsonShape),
    /// Opaque pass-through (uploaded-file handles and the like).
    Opaque,
}

impl TypeDescriptor {
    /// Convenience constructor for a nested-bean descriptor.
    pub fn bean<T: BindForm>() -> Self {
        TypeDescriptor::Bean(schema_of::<T>)
    }

    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    pub fn map(value: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(value))
    }

    pub fn custom_list(adapter: &'static str, element: TypeDescriptor) -> Self {
        TypeDescriptor::CustomList {
            adapter,
            element: Box::new(element),
        }
    }

    /// Human-readable type name used in errors and failure records.
    pub fn render(&self) -> String {
        match self {
            TypeDescriptor::Bool => "boolean".to_string(),
            TypeDescriptor::Int => "integer".to_string(),
            TypeDescriptor::UInt => "unsigned integer".to_string(),
            TypeDescriptor::Float => "float".to_string(),
            TypeDescriptor::Text => "text".to_string(),
            TypeDescriptor::Date => "date".to_string(),
            TypeDescriptor::DateTime => "date-time".to_string(),
            TypeDescriptor::Time => "time".to_string(),
            TypeDescriptor::ZonedDateTime => "zoned date-time".to_string(),
            TypeDescriptor::Classification(cls) => format!("classification {}", cls.name),
            TypeDescriptor::Bean(schema) => format!("bean {}", schema().type_name),
            TypeDescriptor::Array(el) => format!("array of {}", el.render()),
            TypeDescriptor::List(el) => format!("list of {}", el.render()),
            TypeDescriptor::CustomList { adapter, element } => {
                format!("{adapter} of {}", element.render())
            }
            TypeDescriptor::StringArray => "string array".to_string(),
            TypeDescriptor::Map(value) => format!("map of {}", value.render()),
            TypeDescriptor::Json(JsonShape::Object) => "json object".to_string(),
            TypeDescriptor::Json(JsonShape::Array) => "json array".to_string(),
            TypeDescriptor::Opaque => "opaque".to_string(),
        }
    }
}

/// One writable property slot on a form type.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub ty: TypeDescriptor,
    /// Whether coercion failures on this slot defer into the failure
    /// registry instead of aborting the binding call.
    pub tolerant: bool,
}

/// Descriptor table for one form type.
#[derive(Debug)]
pub struct FormSchema {
    pub type_name: &'static str,
    properties: BTreeMap<&'static str, PropertyDescriptor>,
    json_body: Option<JsonBodyMode>,
}

impl FormSchema {
    pub fn builder(type_name: &'static str) -> FormSchemaBuilder {
        FormSchemaBuilder {
            type_name,
            properties: BTreeMap::new(),
            json_body: None,
        }
    }

    /// Descriptor for a property name, if the form declares it.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    /// Declared whole-body JSON mode, if any.
    pub fn json_body(&self) -> Option<JsonBodyMode> {
        self.json_body
    }

    /// All declared properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values()
    }
}

/// Builder for [`FormSchema`], used from [`BindForm::schema`].
pub struct FormSchemaBuilder {
    type_name: &'static str,
    properties: BTreeMap<&'static str, PropertyDescriptor>,
    json_body: Option<JsonBodyMode>,
}

impl FormSchemaBuilder {
    /// Declares a property whose coercion failures are fatal.
    pub fn property(self, name: &'static str, ty: TypeDescriptor) -> Self {
        self.declare(name, ty, false)
    }

    /// Declares a failure-tolerant property: coercion failures become
    /// failure-registry records and the slot is left unset.
    pub fn tolerant(self, name: &'static str, ty: TypeDescriptor) -> Self {
        self.declare(name, ty, true)
    }

    fn declare(mut self, name: &'static str, ty: TypeDescriptor, tolerant: bool) -> Self {
        self.properties
            .insert(name, PropertyDescriptor { name, ty, tolerant });
        self
    }

    /// Declares the form as whole-body JSON mapped (one object).
    pub fn json_body(mut self) -> Self {
        self.json_body = Some(JsonBodyMode::Object);
        self
    }

    /// Declares the form as whole-body JSON list mapped.
    pub fn json_body_list(mut self) -> Self {
        self.json_body = Some(JsonBodyMode::List);
        self
    }

    pub fn build(self) -> FormSchema {
        FormSchema {
            type_name: self.type_name,
            properties: self.properties,
            json_body: self.json_body,
        }
    }
}

/// A type the binder can populate from request parameters.
pub trait BindForm: DeserializeOwned + 'static {
    /// Declares the property descriptor table for this type. Called at
    /// most a handful of times per process; the result is cached.
    fn schema() -> FormSchema;
}

static SCHEMA_CACHE: Lazy<scc::HashMap<TypeId, Arc<FormSchema>>> = Lazy::new(scc::HashMap::new);

/// Cached schema lookup for a form type.
///
/// First-time population for the same type may race across threads; both
/// derivations are equivalent, so whichever insert wins is used.
pub fn schema_of<T: BindForm>() -> Arc<FormSchema> {
    let key = TypeId::of::<T>();
    if let Some(schema) = SCHEMA_CACHE.read(&key, |_, v| Arc::clone(v)) {
        return schema;
    }
    let schema = Arc::new(T::schema());
    let _ = SCHEMA_CACHE.insert(key, Arc::clone(&schema));
    SCHEMA_CACHE
        .read(&key, |_, v| Arc::clone(v))
        .unwrap_or(schema)
}
