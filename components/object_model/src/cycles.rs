//! Manual cycle breaking
//!
//! Ownership is plain reference counting, so a cycle (an object storing
//! itself, two closures reachable from each other's static data, a type
//! holding an instance of itself) is never reclaimed on its own. Hosts break
//! such cycles explicitly with [`break_references`].

use std::rc::Rc;

use crate::value::Value;

/// Drop every outgoing reference held directly by `value`
///
/// Clears own attribute maps, container contents, trait snapshots and, for
/// functions, the shared static data slots. Only the given node is cleared;
/// values it referenced are left intact. Returns the number of references
/// released.
///
/// ```
/// use object_model::{break_references, reference_count, Value};
///
/// let arr = Value::array(vec![]);
/// if let Value::Array(items) = &arr {
///     items.borrow_mut().push(arr.clone());
/// }
/// assert_eq!(reference_count(&arr), 2);
/// assert_eq!(break_references(&arr), 1);
/// assert_eq!(reference_count(&arr), 1);
/// ```
pub fn break_references(value: &Value) -> usize {
    match value {
        Value::Array(items) => {
            let taken = std::mem::take(&mut *items.borrow_mut());
            taken.len()
        }
        Value::Map(entries) => {
            let taken = std::mem::take(&mut *entries.borrow_mut());
            taken.len()
        }
        Value::Object(obj) => obj.take_attributes().len(),
        Value::Function(func) => {
            let released = func.take_attributes().len() + func.static_data().len();
            func.static_data().clear();
            released
        }
        Value::Type(t) => t.take_attributes().len(),
        Value::Trait(bundle) => bundle.take_attributes().len(),
        _ => 0,
    }
}

/// Strong reference count of a reference value; 0 for primitives
pub fn reference_count(value: &Value) -> usize {
    match value {
        Value::Void | Value::Bool(_) | Value::Number(_) | Value::String(_) => 0,
        Value::Array(rc) => Rc::strong_count(rc),
        Value::Map(rc) => Rc::strong_count(rc),
        Value::Object(rc) => Rc::strong_count(rc),
        Value::Function(rc) => Rc::strong_count(rc),
        Value::Native(rc) => Rc::strong_count(rc),
        Value::Bound(rc) => Rc::strong_count(rc),
        Value::Type(rc) => Rc::strong_count(rc),
        Value::Trait(rc) => Rc::strong_count(rc),
        Value::Wrapped(rc) => Rc::strong_count(rc),
    }
}
