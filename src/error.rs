//! Error taxonomy for the binding engine.
//!
//! Structural errors (malformed composite keys, out-of-range indices,
//! unknown parameter names under strict policy) are always fatal and abort
//! the whole binding call. Conversion errors (`TypeCoercion`, `JsonParse`)
//! are fatal only when the addressed property is not failure-tolerant;
//! tolerant properties convert them into [`TypeFailureRecord`] entries
//! instead and binding continues.
//!
//! [`TypeFailureRecord`]: crate::failures::TypeFailureRecord

use thiserror::Error;

/// Errors raised while binding a parameter set onto a form.
///
/// Every variant carries enough context (parameter name or path, raw value,
/// declared type) for the caller to produce a diagnostic without re-running
/// the bind. Structural variants map naturally to a 4xx-class rejection;
/// deferred conversion failures never surface here at all; they land in
/// the per-call failure registry.
#[derive(Debug, Error)]
pub enum BindError {
    /// The composite parameter name does not follow the path grammar
    /// (unbalanced brackets or parens, non-numeric index token, trailing
    /// delimiter, pathological depth).
    #[error("malformed parameter name `{name}`: {reason}")]
    PathSyntax { name: String, reason: String },

    /// A bracketed index is negative or exceeds the configured ceiling.
    /// Treated as a possible abuse signal; no allocation has happened when
    /// this is raised.
    #[error("index {index} out of range for parameter `{name}` (limit {limit})")]
    IndexRange {
        name: String,
        index: i64,
        limit: usize,
    },

    /// The parameter name has no matching writable slot on the target form
    /// and the strict undefined-parameter policy is in effect.
    #[error("no writable property for parameter `{name}`")]
    UndefinedProperty { name: String },

    /// The raw value is present but cannot be converted to the declared
    /// type of the addressed slot.
    #[error("cannot convert `{raw}` into {target_type} at `{path}`: {reason}")]
    TypeCoercion {
        path: String,
        target_type: String,
        raw: String,
        reason: String,
    },

    /// A JSON body or JSON-flagged property value failed to parse, or its
    /// document shape does not match the declared one.
    #[error("malformed JSON at `{path}`: {reason}")]
    JsonParse { path: String, reason: String },

    /// The schema declared for a form is inconsistent with how it is used
    /// (missing collection adapter, non-container declared for indexed
    /// access, materialization mismatch). This is a programming error in
    /// the form declaration, not a client problem.
    #[error("schema inconsistency: {reason}")]
    Schema { reason: String },
}

impl BindError {
    /// Whether this error may be deferred into the failure registry when
    /// the addressed property is failure-tolerant.
    pub(crate) fn is_deferrable(&self) -> bool {
        matches!(
            self,
            BindError::TypeCoercion { .. } | BindError::JsonParse { .. }
        )
    }
}
