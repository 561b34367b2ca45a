//! Top-level binding orchestration.
//!
//! [`FormBinder`] receives the flat parameter set and drives the whole
//! pipeline: path parsing, schema-guided recursive descent through the
//! working value tree, container growth, map storage, scalar coercion or
//! JSON delegation at the terminal segment, and finally materialization of
//! the finished tree into the target type. The binder itself is stateless
//! and safely shared across concurrently handled requests; all per-call
//! state lives in an explicit [`BindingContext`] threaded through the
//! recursion.
//!
//! # Examples
//!
//! ```rust
//! use formbind::{BindForm, FormBinder, FormSchema, ParameterMap, TypeDescriptor};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct ProductSearchForm {
//!     #[serde(rename = "productName")]
//!     product_name: Option<String>,
//!     #[serde(rename = "purchaseCount")]
//!     purchase_count: Option<i64>,
//! }
//!
//! impl BindForm for ProductSearchForm {
//!     fn schema() -> FormSchema {
//!         FormSchema::builder("ProductSearchForm")
//!             .property("productName", TypeDescriptor::Text)
//!             .tolerant("purchaseCount", TypeDescriptor::Int)
//!             .build()
//!     }
//! }
//!
//! let params = ParameterMap::from_query_string("productName=orleans&purchaseCount=3");
//! let bound = FormBinder::new().bind::<ProductSearchForm>(&params).unwrap();
//! assert_eq!(bound.form.purchase_count, Some(3));
//! assert!(!bound.failures.has_failures());
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::{
    coerce,
    error::BindError,
    expand,
    failures::{BindingContext, FailureCause, TypeFailureRecord, TypeFailureRegistry},
    jsonbody, mapbind,
    options::BindOptions,
    params::{ParameterMap, ParameterValue},
    path::{PropertyPath, Segment},
    schema::{BindForm, FormSchema, JsonBodyMode, TypeDescriptor, schema_of},
};

/// Result of one binding call: the populated form plus the per-call
/// failure registry snapshot.
#[derive(Debug)]
pub struct Bound<T> {
    pub form: T,
    pub failures: TypeFailureRegistry,
}

/// Request-level input for [`FormBinder::bind_request`]: the parameter map
/// plus the raw body when the surrounding pipeline captured one. Which
/// source is consulted depends on how the target form declares itself.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    pub params: ParameterMap,
    pub body: Option<String>,
}

/// How a name is resolved on the current tree node during descent.
enum NodeKind {
    /// Bean node: names resolve through the schema's descriptor table.
    Bean(Arc<FormSchema>),
    /// Map node: any name is a literal key of the declared value type,
    /// inheriting the map property's failure tolerance.
    MapValue {
        value_ty: TypeDescriptor,
        tolerant: bool,
    },
}

/// The request-parameter binding engine.
///
/// Stateless and cheap to clone; one instance can serve every request of
/// a process. Per-call state (the working tree and the failure registry)
/// is created fresh inside each `bind*` call.
#[derive(Debug, Clone, Default)]
pub struct FormBinder {
    options: BindOptions,
}

impl FormBinder {
    /// Binder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BindOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Binds a flat parameter set onto a form through path-based traversal.
    ///
    /// Structural errors abort the call; coercion failures on tolerant
    /// properties are deferred into the returned registry and leave their
    /// slot unset.
    pub fn bind<T: BindForm>(&self, params: &ParameterMap) -> Result<Bound<T>, BindError> {
        let schema = schema_of::<T>();
        debug!(
            form = schema.type_name,
            parameters = params.len(),
            "binding parameter set"
        );
        let mut ctx = BindingContext::new(&self.options);
        let mut root = Value::Object(Map::new());
        for (name, raw) in params.iter() {
            self.apply_entry(&schema, &mut root, name, raw, &mut ctx)?;
        }
        if ctx.failures.has_failures() {
            debug!(
                form = schema.type_name,
                failures = ctx.failures.len(),
                "binding completed with deferred type failures"
            );
        }
        let form = serde_json::from_value(root).map_err(|e| BindError::Schema {
            reason: format!("materialization of {} failed: {e}", schema.type_name),
        })?;
        Ok(Bound {
            form,
            failures: ctx.failures,
        })
    }

    /// Binds a whole request body as one JSON object. No path-based
    /// traversal happens; a parse failure is always fatal.
    pub fn bind_json_body<T: BindForm>(&self, body: &str) -> Result<Bound<T>, BindError> {
        let schema = schema_of::<T>();
        debug!(form = schema.type_name, "binding whole-body JSON");
        let document = jsonbody::parse_body_object(body)?;
        let form = serde_json::from_value(document).map_err(|e| BindError::JsonParse {
            path: "<body>".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Bound {
            form,
            failures: TypeFailureRegistry::default(),
        })
    }

    /// Binds a whole request body as a JSON array of the form type.
    pub fn bind_json_list<T: BindForm>(&self, body: &str) -> Result<Bound<Vec<T>>, BindError> {
        let schema = schema_of::<T>();
        debug!(form = schema.type_name, "binding whole-body JSON list");
        let items = jsonbody::parse_body_list(body)?;
        let mut forms = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let form = serde_json::from_value(item).map_err(|e| BindError::JsonParse {
                path: format!("<body>[{i}]"),
                reason: e.to_string(),
            })?;
            forms.push(form);
        }
        Ok(Bound {
            form: forms,
            failures: TypeFailureRegistry::default(),
        })
    }

    /// Content-negotiated entry point: a form declared as whole-body JSON
    /// consumes the body and ignores the parameter map entirely; any other
    /// form binds from the parameters.
    pub fn bind_request<T: BindForm>(&self, input: &RequestInput) -> Result<Bound<T>, BindError> {
        let schema = schema_of::<T>();
        match schema.json_body() {
            Some(JsonBodyMode::Object) => {
                let body = input.body.as_deref().ok_or_else(|| BindError::JsonParse {
                    path: "<body>".to_string(),
                    reason: "missing request body".to_string(),
                })?;
                self.bind_json_body(body)
            }
            Some(JsonBodyMode::List) => Err(BindError::Schema {
                reason: format!(
                    "{} is JSON-list mapped; use bind_json_list",
                    schema.type_name
                ),
            }),
            None => self.bind(&input.params),
        }
    }

    fn apply_entry(
        &self,
        schema: &Arc<FormSchema>,
        root: &mut Value,
        name: &str,
        raw: &ParameterValue,
        ctx: &mut BindingContext<'_>,
    ) -> Result<(), BindError> {
        trace!(parameter = name, "applying parameter");
        let path = PropertyPath::parse(name, ctx.options)?;
        let kind = NodeKind::Bean(Arc::clone(schema));
        self.apply_segments(&kind, root, path.segments(), name, raw, ctx)
    }

    /// One recursion step: resolve the leading segment against the current
    /// node, then either assign the terminal value or descend.
    fn apply_segments(
        &self,
        kind: &NodeKind,
        node: &mut Value,
        segments: &[Segment],
        full: &str,
        raw: &ParameterValue,
        ctx: &mut BindingContext<'_>,
    ) -> Result<(), BindError> {
        let Some((segment, rest)) = segments.split_first() else {
            return Err(BindError::Schema {
                reason: format!("empty path for parameter `{full}`"),
            });
        };

        let (ty, tolerant) = match kind {
            NodeKind::Bean(schema) => match schema.property(segment.name()) {
                Some(descriptor) => (descriptor.ty.clone(), descriptor.tolerant),
                None => {
                    if ctx.options.undefined_is_fatal(full) {
                        return Err(BindError::UndefinedProperty {
                            name: full.to_string(),
                        });
                    }
                    trace!(parameter = full, "dropping undefined parameter");
                    return Ok(());
                }
            },
            NodeKind::MapValue { value_ty, tolerant } => (value_ty.clone(), *tolerant),
        };

        let slot = if matches!(kind, NodeKind::MapValue { .. }) {
            mapbind::entry_node(node, segment.name(), &ty)?
        } else {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(entries) = node else {
                return Err(BindError::Schema {
                    reason: format!("bean node for `{full}` is not an object"),
                });
            };
            entries
                .entry(segment.name().to_string())
                .or_insert(Value::Null)
        };

        match segment {
            Segment::Indexed { indices, .. } => {
                if expand::element_type(&ty).is_err() {
                    // indexed access to a non-container slot is a naming
                    // problem, handled by the undefined-parameter policy
                    if ctx.options.undefined_is_fatal(full) {
                        return Err(BindError::UndefinedProperty {
                            name: full.to_string(),
                        });
                    }
                    trace!(parameter = full, "dropping indexed access to non-container");
                    return Ok(());
                }
                if let TypeDescriptor::CustomList { adapter, element } = &ty {
                    return self.bind_custom_list(
                        slot, adapter, element, indices, rest, tolerant, full, raw, ctx,
                    );
                }
                self.bind_indexed(slot, &ty, indices, rest, tolerant, full, raw, ctx)
            }
            Segment::Field { .. } => {
                if rest.is_empty() {
                    self.assign_terminal(slot, &ty, tolerant, full, raw, ctx)
                } else {
                    self.descend(slot, &ty, tolerant, rest, full, raw, ctx)
                }
            }
        }
    }

    /// Addresses one element through an index chain, then assigns or keeps
    /// descending.
    #[allow(clippy::too_many_arguments)]
    fn bind_indexed(
        &self,
        slot: &mut Value,
        container_ty: &TypeDescriptor,
        indices: &[usize],
        rest: &[Segment],
        tolerant: bool,
        full: &str,
        raw: &ParameterValue,
        ctx: &mut BindingContext<'_>,
    ) -> Result<(), BindError> {
        let (element_slot, element_ty) =
            expand::ensure_element(slot, container_ty, indices, full, ctx.options)?;
        if rest.is_empty() {
            self.assign_terminal(element_slot, &element_ty, tolerant, full, raw, ctx)
        } else {
            self.descend(element_slot, &element_ty, tolerant, rest, full, raw, ctx)
        }
    }

    /// Custom ordered-collection growth: unwrap the stored value into a
    /// mutable working list, bind into it as a native list, and convert
    /// back exactly once. Immutable collection representations are never
    /// mutated in place.
    #[allow(clippy::too_many_arguments)]
    fn bind_custom_list(
        &self,
        slot: &mut Value,
        adapter_name: &str,
        element: &TypeDescriptor,
        indices: &[usize],
        rest: &[Segment],
        tolerant: bool,
        full: &str,
        raw: &ParameterValue,
        ctx: &mut BindingContext<'_>,
    ) -> Result<(), BindError> {
        let adapter = ctx.options.adapter(adapter_name).ok_or_else(|| BindError::Schema {
            reason: format!("no collection adapter registered for `{adapter_name}`"),
        })?;
        let from_working = adapter.from_working;
        let working = match std::mem::take(slot) {
            Value::Null => Vec::new(),
            stored => (adapter.to_working)(&stored).ok_or_else(|| BindError::Schema {
                reason: format!(
                    "stored value for `{full}` does not match adapter `{adapter_name}`"
                ),
            })?,
        };
        let mut tree = Value::Array(working);
        let list_ty = TypeDescriptor::List(Box::new(element.clone()));
        let result = self.bind_indexed(&mut tree, &list_ty, indices, rest, tolerant, full, raw, ctx);
        let Value::Array(working) = tree else {
            return Err(BindError::Schema {
                reason: format!("working list for `{full}` lost its array shape"),
            });
        };
        *slot = from_working(working);
        result
    }

    /// Descends into a nested bean or map node, lazily materializing it.
    #[allow(clippy::too_many_arguments)]
    fn descend(
        &self,
        slot: &mut Value,
        ty: &TypeDescriptor,
        tolerant: bool,
        rest: &[Segment],
        full: &str,
        raw: &ParameterValue,
        ctx: &mut BindingContext<'_>,
    ) -> Result<(), BindError> {
        match ty {
            TypeDescriptor::Bean(schema_fn) => {
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                self.apply_segments(&NodeKind::Bean(schema_fn()), slot, rest, full, raw, ctx)
            }
            TypeDescriptor::Map(value_ty) => {
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                let kind = NodeKind::MapValue {
                    value_ty: value_ty.as_ref().clone(),
                    tolerant,
                };
                self.apply_segments(&kind, slot, rest, full, raw, ctx)
            }
            _ => {
                if ctx.options.undefined_is_fatal(full) {
                    Err(BindError::UndefinedProperty {
                        name: full.to_string(),
                    })
                } else {
                    trace!(parameter = full, "dropping descent into scalar slot");
                    Ok(())
                }
            }
        }
    }

    /// Terminal assignment with the fatal-vs-deferred policy applied.
    fn assign_terminal(
        &self,
        slot: &mut Value,
        ty: &TypeDescriptor,
        tolerant: bool,
        full: &str,
        raw: &ParameterValue,
        ctx: &mut BindingContext<'_>,
    ) -> Result<(), BindError> {
        match coerce::coerce_terminal(ty, raw, full, ctx.options) {
            Ok(value) => {
                *slot = value;
                Ok(())
            }
            Err(err) if tolerant && err.is_deferrable() => {
                warn!(parameter = full, error = %err, "deferring type failure");
                let (cause, reason) = match &err {
                    BindError::JsonParse { reason, .. } => {
                        (FailureCause::JsonParse, reason.clone())
                    }
                    BindError::TypeCoercion { reason, .. } => {
                        (FailureCause::Coercion, reason.clone())
                    }
                    other => (FailureCause::Coercion, other.to_string()),
                };
                ctx.failures.register(TypeFailureRecord {
                    property_path: full.to_string(),
                    target_type: ty.render(),
                    raw_value: raw.clone(),
                    cause,
                    reason,
                });
                // failed slot stays unset; success and failure are mutually
                // exclusive per path
                *slot = Value::Null;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
