//! Binding configuration recognized by [`FormBinder`].
//!
//! [`FormBinder`]: crate::binder::FormBinder

use std::collections::BTreeSet;

use serde_json::Value;

/// Conversion hooks for a caller-registered ordered-collection type that
/// is not a native list but converts to and from one.
///
/// Growth always happens on a mutable working list; the stored value is
/// produced by one `from_working` call at the end of the growth-and-write
/// sequence, so immutable collection representations are never mutated in
/// place.
#[derive(Debug, Clone)]
pub struct CollectionAdapter {
    /// Adapter name referenced by `TypeDescriptor::CustomList`.
    pub type_name: &'static str,
    /// Unwraps a stored value into a working list. `None` means the stored
    /// value does not have this adapter's shape.
    pub to_working: fn(&Value) -> Option<Vec<Value>>,
    /// Converts the finished working list back into the stored shape.
    pub from_working: fn(Vec<Value>) -> Value,
}

/// Options for one binder instance.
#[derive(Debug, Clone)]
pub struct BindOptions {
    /// Treat parameter names with no matching writable slot as fatal.
    pub undefined_parameter_is_error: bool,
    /// Parameter names exempt from the strict undefined-parameter policy.
    pub indefinable_parameter_names: BTreeSet<String>,
    /// Keep empty text input as an empty string instead of collapsing it
    /// to unset.
    pub keep_empty_string: bool,
    /// Exclusive ceiling for bracketed indices; checked before any
    /// allocation.
    pub index_size_limit: usize,
    /// Strict `chrono` format for zoned date-time input.
    pub zoned_date_time_format: String,
    /// Maximum number of path segments in one composite key.
    pub max_path_depth: usize,
    /// Registered custom ordered-collection adapters.
    pub collection_adapters: Vec<CollectionAdapter>,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            undefined_parameter_is_error: true,
            indefinable_parameter_names: BTreeSet::new(),
            keep_empty_string: false,
            index_size_limit: 256,
            zoned_date_time_format: "%Y-%m-%dT%H:%M:%S%.f%:z".to_string(),
            max_path_depth: 16,
            collection_adapters: Vec::new(),
        }
    }
}

impl BindOptions {
    /// Looks up a registered collection adapter by name.
    pub fn adapter(&self, type_name: &str) -> Option<&CollectionAdapter> {
        self.collection_adapters
            .iter()
            .find(|adapter| adapter.type_name == type_name)
    }

    /// Whether an unknown parameter name should abort the binding call.
    pub(crate) fn undefined_is_fatal(&self, name: &str) -> bool {
        self.undefined_parameter_is_error && !self.indefinable_parameter_names.contains(name)
    }
}
