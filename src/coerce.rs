//! Raw-string to declared-type coercion.
//!
//! The coercion table runs in a fixed priority order: checkbox booleans,
//! numerics, text with empty-string collapsing, the date-time kinds,
//! classification code lookup, and opaque pass-through. Multi-value raw
//! input is normalized first: a one-element group becomes its single
//! element, a larger group is kept whole only for container-typed slots
//! and narrowed to its first element for scalar slots.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

use crate::{
    error::BindError,
    options::BindOptions,
    params::ParameterValue,
    schema::TypeDescriptor,
};

/// Coerces the raw value of a terminal path segment into the declared
/// slot type, producing the tree value to store.
pub(crate) fn coerce_terminal(
    ty: &TypeDescriptor,
    raw: &ParameterValue,
    path: &str,
    options: &BindOptions,
) -> Result<Value, BindError> {
    match ty {
        TypeDescriptor::Array(element) | TypeDescriptor::List(element) => {
            let mut items = Vec::with_capacity(raw.len());
            for s in raw.as_list() {
                items.push(coerce_scalar(element, s, path, options)?);
            }
            Ok(Value::Array(items))
        }
        TypeDescriptor::CustomList { adapter, element } => {
            let adapter = options.adapter(adapter).ok_or_else(|| BindError::Schema {
                reason: format!("no collection adapter registered for `{adapter}`"),
            })?;
            let mut items = Vec::with_capacity(raw.len());
            for s in raw.as_list() {
                items.push(coerce_scalar(element, s, path, options)?);
            }
            Ok((adapter.from_working)(items))
        }
        TypeDescriptor::StringArray => Ok(Value::Array(
            raw.as_list()
                .into_iter()
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
        TypeDescriptor::Map(_) => Err(fail(
            path,
            ty,
            &raw.render(),
            "map-typed property requires `(key)` access",
        )),
        TypeDescriptor::Json(shape) => match raw.first() {
            Some(s) => crate::jsonbody::parse_property(s, *shape, path),
            None => Ok(Value::Null),
        },
        TypeDescriptor::Opaque => Ok(match raw {
            ParameterValue::Single(s) => Value::String(s.clone()),
            ParameterValue::Multi(v) => {
                Value::Array(v.iter().map(|s| Value::String(s.clone())).collect())
            }
        }),
        other => match raw.first() {
            Some(s) => coerce_scalar(other, s, path, options),
            None => Ok(Value::Null),
        },
    }
}

/// Coerces one raw string into a scalar declared type.
pub(crate) fn coerce_scalar(
    ty: &TypeDescriptor,
    raw: &str,
    path: &str,
    options: &BindOptions,
) -> Result<Value, BindError> {
    match ty {
        TypeDescriptor::Bool => {
            // checkbox convention: "on" is true, absent-but-sent-empty is
            // unset rather than false
            if raw == "on" {
                Ok(Value::Bool(true))
            } else if raw.is_empty() {
                Ok(Value::Null)
            } else {
                raw.parse::<bool>()
                    .map(Value::Bool)
                    .map_err(|_| fail(path, ty, raw, "not a boolean"))
            }
        }
        TypeDescriptor::Int => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            raw.parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|_| fail(path, ty, raw, "not an integer"))
        }
        TypeDescriptor::UInt => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            raw.parse::<u64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|_| fail(path, ty, raw, "not an unsigned integer"))
        }
        TypeDescriptor::Float => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            let parsed = raw
                .parse::<f64>()
                .map_err(|_| fail(path, ty, raw, "not a number"))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| fail(path, ty, raw, "not a finite number"))
        }
        TypeDescriptor::Text => {
            if raw.is_empty() && !options.keep_empty_string {
                Ok(Value::Null)
            } else {
                Ok(Value::String(raw.to_string()))
            }
        }
        TypeDescriptor::Date => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            parse_date(raw)
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| fail(path, ty, raw, "unparseable date"))
        }
        TypeDescriptor::DateTime => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            parse_date_time(raw)
                .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
                .ok_or_else(|| fail(path, ty, raw, "unparseable date-time"))
        }
        TypeDescriptor::Time => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            parse_time(raw)
                .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
                .ok_or_else(|| fail(path, ty, raw, "unparseable time"))
        }
        TypeDescriptor::ZonedDateTime => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            // ambiguity is unacceptable here, so only the configured strict
            // offset format is accepted
            DateTime::parse_from_str(raw, &options.zoned_date_time_format)
                .map(|dt| Value::String(dt.to_rfc3339()))
                .map_err(|_| fail(path, ty, raw, "not a strict offset date-time"))
        }
        TypeDescriptor::Classification(cls) => {
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            cls.code_of(raw)
                .map(|code| Value::String(code.to_string()))
                .ok_or_else(|| {
                    fail(path, ty, raw, "code not found in classification table")
                })
        }
        TypeDescriptor::Opaque => Ok(Value::String(raw.to_string())),
        other => Err(fail(
            path,
            other,
            raw,
            "scalar value cannot populate this type",
        )),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    const FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

fn fail(path: &str, ty: &TypeDescriptor, raw: &str, reason: &str) -> BindError {
    BindError::TypeCoercion {
        path: path.to_string(),
        target_type: ty.render(),
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}
