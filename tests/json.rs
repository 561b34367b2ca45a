//! Whole-body JSON modes and JSON-flagged properties.

use formbind::{
    BindError, BindForm, FormBinder, FormSchema, JsonShape, ParameterMap, RequestInput,
    TypeDescriptor,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct WhaleForm {
    name: Option<String>,
    size: Option<i64>,
}

impl BindForm for WhaleForm {
    fn schema() -> FormSchema {
        FormSchema::builder("WhaleForm")
            .json_body()
            .property("name", TypeDescriptor::Text)
            .property("size", TypeDescriptor::Int)
            .build()
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Payload {
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MixedForm {
    title: Option<String>,
    payload: Option<Payload>,
    items: Option<Vec<Payload>>,
}

impl BindForm for MixedForm {
    fn schema() -> FormSchema {
        FormSchema::builder("MixedForm")
            .property("title", TypeDescriptor::Text)
            .tolerant("payload", TypeDescriptor::Json(JsonShape::Object))
            .property("items", TypeDescriptor::Json(JsonShape::Array))
            .build()
    }
}

#[test]
fn whole_body_object_binds_without_paths() {
    let bound = FormBinder::new()
        .bind_json_body::<WhaleForm>(r#"{"name":"moby","size":3}"#)
        .unwrap();
    assert_eq!(bound.form.name.as_deref(), Some("moby"));
    assert_eq!(bound.form.size, Some(3));
    assert!(!bound.failures.has_failures());
}

#[test]
fn whole_body_parse_failure_is_fatal() {
    let err = FormBinder::new()
        .bind_json_body::<WhaleForm>("{broken")
        .unwrap_err();
    assert!(matches!(err, BindError::JsonParse { .. }));

    // shape mismatch is just as fatal; there is no partial form to keep
    let err = FormBinder::new()
        .bind_json_body::<WhaleForm>("[1,2]")
        .unwrap_err();
    assert!(matches!(err, BindError::JsonParse { .. }));
}

#[test]
fn whole_body_list_binds_each_element() {
    let bound = FormBinder::new()
        .bind_json_list::<WhaleForm>(r#"[{"name":"a"},{"name":"b","size":9}]"#)
        .unwrap();
    assert_eq!(bound.form.len(), 2);
    assert_eq!(bound.form[1].size, Some(9));

    let err = FormBinder::new()
        .bind_json_list::<WhaleForm>("{}")
        .unwrap_err();
    assert!(matches!(err, BindError::JsonParse { .. }));
}

#[test]
fn json_body_mode_ignores_path_parameters() {
    let input = RequestInput {
        params: ParameterMap::from_query_string("name=ignored&size=999"),
        body: Some(r#"{"name":"moby","size":3}"#.to_string()),
    };
    let bound = FormBinder::new().bind_request::<WhaleForm>(&input).unwrap();
    assert_eq!(bound.form.name.as_deref(), Some("moby"));
    assert_eq!(bound.form.size, Some(3));
}

#[test]
fn json_body_mode_requires_a_body() {
    let input = RequestInput {
        params: ParameterMap::from_query_string("name=ignored"),
        body: None,
    };
    let err = FormBinder::new()
        .bind_request::<WhaleForm>(&input)
        .unwrap_err();
    assert!(matches!(err, BindError::JsonParse { .. }));
}

#[test]
fn path_mapped_forms_bind_from_parameters() {
    let input = RequestInput {
        params: ParameterMap::from_query_string("title=hello"),
        body: None,
    };
    let bound = FormBinder::new().bind_request::<MixedForm>(&input).unwrap();
    assert_eq!(bound.form.title.as_deref(), Some("hello"));
}

#[test]
fn json_flagged_property_parses_into_declared_type() {
    let mut params = ParameterMap::new();
    params.insert("payload", r#"{"label":"sea"}"#);
    params.insert("items", r#"[{"label":"a"},{"label":"b"}]"#);
    let bound = FormBinder::new().bind::<MixedForm>(&params).unwrap();
    assert_eq!(
        bound.form.payload,
        Some(Payload {
            label: Some("sea".to_string())
        })
    );
    assert_eq!(bound.form.items.map(|v| v.len()), Some(2));
}

#[test]
fn tolerant_json_property_defers_parse_failures() {
    let mut params = ParameterMap::new();
    params.insert("payload", "{broken");
    let bound = FormBinder::new().bind::<MixedForm>(&params).unwrap();
    assert_eq!(bound.form.payload, None);
    assert!(bound.failures.has_failures());
    let record = &bound.failures.records()[0];
    assert_eq!(record.property_path, "payload");
    assert_eq!(record.cause, formbind::FailureCause::JsonParse);
}

#[test]
fn tolerant_json_property_defers_shape_mismatches() {
    let mut params = ParameterMap::new();
    params.insert("payload", "[1,2,3]");
    let bound = FormBinder::new().bind::<MixedForm>(&params).unwrap();
    assert_eq!(bound.form.payload, None);
    assert!(bound.failures.has_failures());
}

#[test]
fn strict_json_property_failure_is_fatal() {
    let mut params = ParameterMap::new();
    params.insert("items", "{broken");
    let err = FormBinder::new().bind::<MixedForm>(&params).unwrap_err();
    assert!(matches!(err, BindError::JsonParse { .. }));
}
