//! Sparse growth of array- and list-typed slots in the working tree.
//!
//! Binding `list[5]=x` against an empty list grows it to length six,
//! filling the gap with default-constructed elements: an empty object for
//! bean elements, an empty array for nested containers, and unset for
//! scalars. Multi-dimensional index chains recurse one container level per
//! index. The index ceiling was already enforced while parsing the path;
//! it is re-checked here so no growth can ever precede the check.

use serde_json::{Map, Value};

use crate::{error::BindError, options::BindOptions, schema::TypeDescriptor};

/// Element type one generic level below a container descriptor.
pub(crate) fn element_type(ty: &TypeDescriptor) -> Result<TypeDescriptor, BindError> {
    match ty {
        TypeDescriptor::Array(element) | TypeDescriptor::List(element) => {
            Ok(element.as_ref().clone())
        }
        TypeDescriptor::CustomList { element, .. } => Ok(element.as_ref().clone()),
        TypeDescriptor::StringArray => Ok(TypeDescriptor::Text),
        other => Err(BindError::Schema {
            reason: format!("{} is not an indexable container", other.render()),
        }),
    }
}

/// Default value for a gap element created during sparse growth.
pub(crate) fn default_element(ty: &TypeDescriptor) -> Value {
    match ty {
        TypeDescriptor::Bean(_) | TypeDescriptor::Map(_) => Value::Object(Map::new()),
        TypeDescriptor::Array(_)
        | TypeDescriptor::List(_)
        | TypeDescriptor::CustomList { .. }
        | TypeDescriptor::StringArray => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

/// Walks an index chain into a container slot, growing each level as
/// needed, and returns the addressed element slot together with its
/// declared type.
///
/// The container slot is materialized to an empty array first if it is
/// still unset; each index level must be a container type one deeper.
pub(crate) fn ensure_element<'a>(
    slot: &'a mut Value,
    container_ty: &TypeDescriptor,
    indices: &[usize],
    name: &str,
    options: &BindOptions,
) -> Result<(&'a mut Value, TypeDescriptor), BindError> {
    let mut node = slot;
    let mut ty = container_ty.clone();

    for &index in indices {
        if index >= options.index_size_limit {
            return Err(BindError::IndexRange {
                name: name.to_string(),
                index: index as i64,
                limit: options.index_size_limit,
            });
        }
        let element = element_type(&ty)?;
        if !node.is_array() {
            *node = Value::Array(Vec::new());
        }
        let Value::Array(items) = node else {
            return Err(BindError::Schema {
                reason: format!("indexed slot in `{name}` is not an array"),
            });
        };
        while items.len() <= index {
            items.push(default_element(&element));
        }
        node = &mut items[index];
        ty = element;
    }

    Ok((node, ty))
}
