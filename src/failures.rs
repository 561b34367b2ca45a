//! Deferred type-failure collection for one binding call.
//!
//! Coercion failures on failure-tolerant properties do not abort the
//! request; they are recorded here and the addressed slot is left unset.
//! The downstream validation stage reads the registry after binding and
//! turns each record into an ordinary field-level validation message.
//! This is the mechanism that lets "the user typed `abc` into a number
//! field" become a message instead of a 500.
//!
//! The registry is carried in an explicit [`BindingContext`] threaded
//! through the recursive descent, so its lifetime matches the call stack
//! exactly and no ambient per-request state exists.

use std::collections::BTreeMap;

use crate::{options::BindOptions, params::ParameterValue};

/// What kind of conversion produced a deferred failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// Scalar coercion against the declared type failed.
    Coercion,
    /// A JSON-flagged property value failed to parse.
    JsonParse,
}

/// One deferred conversion failure.
#[derive(Debug, Clone)]
pub struct TypeFailureRecord {
    /// Composite key of the slot that failed, as sent by the client.
    pub property_path: String,
    /// Rendered declared type of the slot.
    pub target_type: String,
    /// The raw value exactly as received, for diagnostics.
    pub raw_value: ParameterValue,
    pub cause: FailureCause,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Per-binding-call accumulator of deferred failures.
///
/// Created lazily in the sense that a clean bind allocates nothing beyond
/// the empty registry; read by the validation stage after binding
/// completes; discarded with the call's [`Bound`] result.
///
/// [`Bound`]: crate::binder::Bound
#[derive(Debug, Default)]
pub struct TypeFailureRegistry {
    records: Vec<TypeFailureRecord>,
}

impl TypeFailureRegistry {
    pub fn register(&mut self, record: TypeFailureRecord) {
        self.records.push(record);
    }

    pub fn has_failures(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in registration order (deterministic: parameters are
    /// applied in key order).
    pub fn records(&self) -> &[TypeFailureRecord] {
        &self.records
    }

    /// Records grouped by property path.
    pub fn records_by_path(&self) -> BTreeMap<&str, Vec<&TypeFailureRecord>> {
        let mut grouped: BTreeMap<&str, Vec<&TypeFailureRecord>> = BTreeMap::new();
        for record in &self.records {
            grouped
                .entry(record.property_path.as_str())
                .or_default()
                .push(record);
        }
        grouped
    }
}

/// Per-call state threaded through the recursive descent.
pub(crate) struct BindingContext<'a> {
    pub options: &'a BindOptions,
    pub failures: TypeFailureRegistry,
}

impl<'a> BindingContext<'a> {
    pub fn new(options: &'a BindOptions) -> Self {
        Self {
            options,
            failures: TypeFailureRegistry::default(),
        }
    }
}
