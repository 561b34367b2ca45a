//! Typed request-parameter binding.
//!
//! `formbind` populates an arbitrary form type from a flat, possibly
//! multi-valued, string-keyed parameter set (query string, urlencoded
//! body) or from a JSON request body. Composite keys address nested beans
//! (`sea.land`), ordered containers (`sea[0][1]`) and string-keyed maps
//! (`sea(over)`); raw strings are coerced against per-property declared
//! types, containers grow sparsely to the highest addressed index, and
//! coercion failures on failure-tolerant properties are collected per call
//! instead of aborting the request.

/// Top-level binding orchestration and entry points.
pub mod binder;

/// Raw-string to declared-type coercion.
mod coerce;

/// Error taxonomy.
pub mod error;

/// Sparse container growth.
mod expand;

/// Deferred type-failure registry.
pub mod failures;

/// Whole-body and per-property JSON delegation.
mod jsonbody;

/// Map-typed property storage.
mod mapbind;

/// Binder configuration.
pub mod options;

/// Parameter names and raw values.
pub mod params;

/// Composite-key parsing.
pub mod path;

/// Per-type property descriptors and the schema cache.
pub mod schema;

pub use binder::{Bound, FormBinder, RequestInput};
pub use error::BindError;
pub use failures::{FailureCause, TypeFailureRecord, TypeFailureRegistry};
pub use options::{BindOptions, CollectionAdapter};
pub use params::{ParameterMap, ParameterValue};
pub use path::{PropertyPath, Segment};
pub use schema::{
    BindForm, Classification, FormSchema, FormSchemaBuilder, JsonBodyMode, JsonShape,
    PropertyDescriptor, TypeDescriptor, schema_of,
};
