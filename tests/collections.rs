//! Sparse growth of arrays, lists, and custom ordered collections.

use formbind::{
    BindError, BindForm, BindOptions, CollectionAdapter, FormBinder, FormSchema, ParameterMap,
    TypeDescriptor,
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize, PartialEq)]
struct PurchaseLine {
    product: Option<String>,
    quantity: Option<i64>,
}

impl BindForm for PurchaseLine {
    fn schema() -> FormSchema {
        FormSchema::builder("PurchaseLine")
            .property("product", TypeDescriptor::Text)
            .tolerant("quantity", TypeDescriptor::Int)
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct OrderForm {
    tags: Option<Vec<Option<String>>>,
    lines: Option<Vec<PurchaseLine>>,
    grid: Option<Vec<Vec<Option<i64>>>>,
    codes: Option<Vec<String>>,
    wishes: Option<Value>,
}

impl BindForm for OrderForm {
    fn schema() -> FormSchema {
        FormSchema::builder("OrderForm")
            .property("tags", TypeDescriptor::list(TypeDescriptor::Text))
            .property(
                "lines",
                TypeDescriptor::list(TypeDescriptor::bean::<PurchaseLine>()),
            )
            .property(
                "grid",
                TypeDescriptor::list(TypeDescriptor::list(TypeDescriptor::Int)),
            )
            .property("codes", TypeDescriptor::StringArray)
            .property(
                "wishes",
                TypeDescriptor::custom_list("ImmutableList", TypeDescriptor::Text),
            )
            .build()
    }
}

fn immutable_list_adapter() -> CollectionAdapter {
    fn to_working(stored: &Value) -> Option<Vec<Value>> {
        stored.get("immutable")?.as_array().cloned()
    }
    fn from_working(items: Vec<Value>) -> Value {
        json!({ "immutable": items })
    }
    CollectionAdapter {
        type_name: "ImmutableList",
        to_working,
        from_working,
    }
}

#[test]
fn sparse_growth_of_a_scalar_list() {
    let params = ParameterMap::from_query_string("tags%5B5%5D=x");
    let bound = FormBinder::new().bind::<OrderForm>(&params).unwrap();
    let tags = bound.form.tags.unwrap();
    assert_eq!(tags.len(), 6);
    assert!(tags[..5].iter().all(Option::is_none));
    assert_eq!(tags[5].as_deref(), Some("x"));
}

#[test]
fn sparse_growth_of_a_bean_list_default_constructs_gaps() {
    let mut params = ParameterMap::new();
    params.insert("lines[2].product", "latte");
    let bound = FormBinder::new().bind::<OrderForm>(&params).unwrap();
    let lines = bound.form.lines.unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        PurchaseLine {
            product: None,
            quantity: None
        }
    );
    assert_eq!(lines[2].product.as_deref(), Some("latte"));
}

#[test]
fn out_of_order_indices_converge() {
    let mut params = ParameterMap::new();
    params.insert("lines[1].product", "mocha");
    params.insert("lines[0].product", "espresso");
    params.insert("lines[0].quantity", "2");
    let bound = FormBinder::new().bind::<OrderForm>(&params).unwrap();
    let lines = bound.form.lines.unwrap();
    assert_eq!(lines[0].product.as_deref(), Some("espresso"));
    assert_eq!(lines[0].quantity, Some(2));
    assert_eq!(lines[1].product.as_deref(), Some("mocha"));
}

#[test]
fn multi_dimensional_indices() {
    let mut params = ParameterMap::new();
    params.insert("grid[1][2]", "7");
    let bound = FormBinder::new().bind::<OrderForm>(&params).unwrap();
    let grid = bound.form.grid.unwrap();
    assert_eq!(grid.len(), 2);
    assert!(grid[0].is_empty());
    assert_eq!(grid[1], vec![None, None, Some(7)]);
}

#[test]
fn index_ceiling_rejects_huge_indices() {
    let mut options = BindOptions::default();
    options.index_size_limit = 256;
    let mut params = ParameterMap::new();
    params.insert("tags[10000]", "x");
    let err = FormBinder::with_options(options)
        .bind::<OrderForm>(&params)
        .unwrap_err();
    assert!(matches!(
        err,
        BindError::IndexRange { index: 10000, limit: 256, .. }
    ));
}

#[test]
fn unindexed_multi_value_binds_the_whole_list() {
    let params = ParameterMap::from_query_string("tags=a&tags=b");
    let bound = FormBinder::new().bind::<OrderForm>(&params).unwrap();
    assert_eq!(
        bound.form.tags,
        Some(vec![Some("a".to_string()), Some("b".to_string())])
    );
}

#[test]
fn string_array_keeps_raw_groups() {
    let multi = ParameterMap::from_query_string("codes=A&codes=B");
    let bound = FormBinder::new().bind::<OrderForm>(&multi).unwrap();
    assert_eq!(
        bound.form.codes,
        Some(vec!["A".to_string(), "B".to_string()])
    );

    // a scalar raw value still becomes a one-element group
    let single = ParameterMap::from_query_string("codes=A");
    let bound = FormBinder::new().bind::<OrderForm>(&single).unwrap();
    assert_eq!(bound.form.codes, Some(vec!["A".to_string()]));
}

#[test]
fn custom_collection_grows_through_working_list() {
    let mut options = BindOptions::default();
    options.collection_adapters.push(immutable_list_adapter());
    let binder = FormBinder::with_options(options);

    let mut params = ParameterMap::new();
    params.insert("wishes[0]", "rainbow");
    params.insert("wishes[2]", "dragon");
    let bound = binder.bind::<OrderForm>(&params).unwrap();
    assert_eq!(
        bound.form.wishes,
        Some(json!({ "immutable": ["rainbow", null, "dragon"] }))
    );
}

#[test]
fn custom_collection_without_adapter_is_a_schema_error() {
    let mut params = ParameterMap::new();
    params.insert("wishes[0]", "rainbow");
    let err = FormBinder::new().bind::<OrderForm>(&params).unwrap_err();
    assert!(matches!(err, BindError::Schema { .. }));
}
