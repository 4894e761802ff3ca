//! Typed Lists
//!
//! List container that coerces every inserted element into its declared
//! element type. Raw maps are merged into a freshly constructed instance of
//! the element type; anything else that is not already an instance fails with
//! a coercion error. Untyped lists (scalar element types) skip coercion.

use crate::error::{ObjectError, ObjectResult};
use crate::object::value::Value;
use crate::object::{TypeSpec, TypedObject};

/// A list whose elements are coerced on insertion
#[derive(Debug, Clone, Default)]
pub struct TypedList {
    /// Element type; `None` for untyped lists
    elem: Option<&'static TypeSpec>,
    items: Vec<Value>,
}

impl TypedList {
    /// An empty list with a declared element type
    pub fn typed(elem: &'static TypeSpec) -> Self {
        Self { elem: Some(elem), items: Vec::new() }
    }

    /// An untyped list (scalar or free-form elements)
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn untyped_from(items: impl IntoIterator<Item = Value>) -> Self {
        Self { elem: None, items: items.into_iter().collect() }
    }

    /// Build a typed list, coercing every element
    pub fn typed_from(
        elem: &'static TypeSpec,
        items: impl IntoIterator<Item = Value>,
    ) -> ObjectResult<Self> {
        let mut list = Self::typed(elem);
        for item in items {
            list.push(item)?;
        }
        Ok(list)
    }

    pub fn element_type(&self) -> Option<&'static TypeSpec> {
        self.elem
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Append an element, coercing it into the element type
    pub fn push(&mut self, value: Value) -> ObjectResult<()> {
        let coerced = self.coerce(value)?;
        self.items.push(coerced);
        Ok(())
    }

    /// Insert an element at `index`, coercing it into the element type
    pub fn insert(&mut self, index: usize, value: Value) -> ObjectResult<()> {
        let coerced = self.coerce(value)?;
        self.items.insert(index, coerced);
        Ok(())
    }

    /// Replace the element at `index`, coercing the new value
    pub fn set_item(&mut self, index: usize, value: Value) -> ObjectResult<()> {
        let coerced = self.coerce(value)?;
        self.items[index] = coerced;
        Ok(())
    }

    /// Append many elements; each one goes through the same coercion as
    /// [`push`](Self::push)
    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) -> ObjectResult<()> {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Consume the list, yielding its raw items
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.items.iter_mut()
    }

    /// Coerce one element into the declared element type
    fn coerce(&self, value: Value) -> ObjectResult<Value> {
        let Some(elem) = self.elem else {
            return Ok(value);
        };
        match value {
            // Already an instance of the element type
            Value::Object(obj) if std::ptr::eq(obj.spec(), elem) => Ok(Value::Object(obj)),
            // A raw map merges into a fresh instance
            Value::Map(map) => {
                let mut fresh = TypedObject::new(elem);
                fresh.merge_values(map)?;
                Ok(Value::Object(fresh))
            }
            other => Err(ObjectError::TypeCoercion {
                expected: elem.name.to_string(),
                given: other.kind_name().to_string(),
            }),
        }
    }
}

impl PartialEq for TypedList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{FieldDescriptor, ValueKind};
    use indexmap::IndexMap;

    static ITEM: TypeSpec = TypeSpec {
        name: "Item",
        fields: &[FieldDescriptor {
            name: "name",
            wire: None,
            kind: ValueKind::Scalar,
            required: true,
        }],
        api: None,
    };

    #[test]
    fn test_push_keeps_instances() {
        let mut list = TypedList::typed(&ITEM);
        let mut item = TypedObject::new(&ITEM);
        item.set("name", "a").unwrap();
        list.push(Value::Object(item)).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_push_coerces_maps() {
        let mut list = TypedList::typed(&ITEM);
        let mut map = IndexMap::new();
        map.insert("name".to_string(), Value::from("a"));
        list.push(Value::Map(map)).unwrap();

        match list.get(0).unwrap() {
            Value::Object(obj) => {
                assert_eq!(obj.spec().name, "Item");
            }
            other => panic!("expected coerced object, got {other:?}"),
        }
    }

    #[test]
    fn test_push_rejects_scalars() {
        let mut list = TypedList::typed(&ITEM);
        let err = list.push(Value::Int(3)).unwrap_err();
        assert!(matches!(err, ObjectError::TypeCoercion { .. }));
    }

    #[test]
    fn test_untyped_list_accepts_anything() {
        let mut list = TypedList::untyped();
        list.push(Value::Int(1)).unwrap();
        list.push(Value::from("two")).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_extend_funnels_through_coercion() {
        let mut list = TypedList::typed(&ITEM);
        let mut map = IndexMap::new();
        map.insert("name".to_string(), Value::from("a"));
        let err = list.extend(vec![Value::Map(map), Value::Bool(true)]).unwrap_err();
        assert!(matches!(err, ObjectError::TypeCoercion { .. }));
        // First element landed before the failure surfaced
        assert_eq!(list.len(), 1);
    }
}
