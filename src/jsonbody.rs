//! JSON delegation: whole-body documents and JSON-flagged properties.
//!
//! Whole-body modes bypass path-based traversal entirely: the raw request
//! body is one JSON document deserialized straight into the root target
//! type (or a homogeneous list of it). A parse failure there is always
//! fatal, since there is no partial form to fall back to. A JSON-flagged
//! leaf property instead parses its raw scalar string into the declared
//! document shape; its failures follow the property's failure-tolerance
//! like any other coercion.

use serde_json::Value;

use crate::{error::BindError, schema::JsonShape};

/// Parses a whole request body that must be a single JSON object.
pub(crate) fn parse_body_object(body: &str) -> Result<Value, BindError> {
    let value = parse(body, "<body>")?;
    if !value.is_object() {
        return Err(BindError::JsonParse {
            path: "<body>".to_string(),
            reason: "document is not a JSON object".to_string(),
        });
    }
    Ok(value)
}

/// Parses a whole request body that must be a JSON array, returning its
/// elements.
pub(crate) fn parse_body_list(body: &str) -> Result<Vec<Value>, BindError> {
    let value = parse(body, "<body>")?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(BindError::JsonParse {
            path: "<body>".to_string(),
            reason: "document is not a JSON array".to_string(),
        }),
    }
}

/// Parses the raw string of a JSON-flagged property into its declared
/// document shape.
pub(crate) fn parse_property(raw: &str, shape: JsonShape, path: &str) -> Result<Value, BindError> {
    let value = parse(raw, path)?;
    let matches_shape = match shape {
        JsonShape::Object => value.is_object(),
        JsonShape::Array => value.is_array(),
    };
    if !matches_shape {
        return Err(BindError::JsonParse {
            path: path.to_string(),
            reason: format!(
                "document shape mismatch: expected {}",
                match shape {
                    JsonShape::Object => "an object",
                    JsonShape::Array => "an array",
                }
            ),
        });
    }
    Ok(value)
}

fn parse(raw: &str, path: &str) -> Result<Value, BindError> {
    serde_json::from_str(raw).map_err(|e| BindError::JsonParse {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn body_object_rejects_non_objects() {
        assert_eq!(
            parse_body_object(r#"{"sea":"mystic"}"#).unwrap(),
            json!({ "sea": "mystic" })
        );
        assert!(matches!(
            parse_body_object("[1,2]"),
            Err(BindError::JsonParse { .. })
        ));
        assert!(matches!(
            parse_body_object("{broken"),
            Err(BindError::JsonParse { .. })
        ));
    }

    #[test]
    fn body_list_rejects_non_arrays() {
        assert_eq!(parse_body_list("[1,2]").unwrap(), vec![json!(1), json!(2)]);
        assert!(matches!(
            parse_body_list("{}"),
            Err(BindError::JsonParse { .. })
        ));
    }

    #[test]
    fn property_shape_is_enforced() {
        assert!(parse_property("{}", JsonShape::Object, "p").is_ok());
        assert!(parse_property("[]", JsonShape::Array, "p").is_ok());
        assert!(parse_property("[]", JsonShape::Object, "p").is_err());
        assert!(parse_property("42", JsonShape::Array, "p").is_err());
    }
}
