//! Introspection over the object graph
//!
//! Serialization layers and debuggers walk values through these functions
//! rather than through the concrete object types.

use std::collections::HashMap;
use std::rc::Rc;

use crate::attribute::{Attribute, AttributeMap};
use crate::builtins::BuiltinTypes;
use crate::resolver::type_chain_of;
use crate::types::TypeRef;
use crate::value::Value;

/// Own attributes of a value in insertion order
///
/// Returns `None` for values without an own attribute map.
pub fn own_attributes(value: &Value) -> Option<Vec<(String, Attribute)>> {
    match value {
        Value::Object(obj) => Some(entries(&obj.attributes())),
        Value::Function(func) => Some(entries(&func.attributes())),
        Value::Type(t) => Some(entries(&t.attributes())),
        Value::Trait(bundle) => Some(entries(&bundle.attributes())),
        _ => None,
    }
}

fn entries(map: &AttributeMap) -> Vec<(String, Attribute)> {
    map.iter()
        .map(|(name, attr)| (name.clone(), attr.clone()))
        .collect()
}

/// The type describing a value
pub fn type_of(value: &Value, builtins: &BuiltinTypes) -> TypeRef {
    builtins.type_of(value)
}

/// The value's type followed by its bases up to the root
pub fn type_chain(value: &Value, builtins: &BuiltinTypes) -> Vec<TypeRef> {
    type_chain_of(&builtins.type_of(value))
}

/// Whether `t` is in the value's type chain
///
/// ```
/// use object_model::{is_instance_of, BuiltinTypes, Value};
///
/// let builtins = BuiltinTypes::new();
/// assert!(is_instance_of(&Value::Number(1.0), &builtins.object, &builtins));
/// assert!(!is_instance_of(&Value::Number(1.0), &builtins.string, &builtins));
/// ```
pub fn is_instance_of(value: &Value, t: &TypeRef, builtins: &BuiltinTypes) -> bool {
    builtins.type_of(value).is_subtype_of(t)
}

/// Address identifying a reference value; `None` for primitives
pub fn identity_of(value: &Value) -> Option<usize> {
    let addr = match value {
        Value::Void | Value::Bool(_) | Value::Number(_) | Value::String(_) => return None,
        Value::Array(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Map(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Object(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Function(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Native(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Bound(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Type(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Trait(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Wrapped(rc) => Rc::as_ptr(rc) as *const () as usize,
    };
    Some(addr)
}

/// Stable ids for reference values seen during a graph walk
///
/// Registered values are kept alive by the registry, so an address can
/// never be reused for a different object while the registry exists.
///
/// ```
/// use object_model::{IdentityRegistry, Value};
///
/// let mut registry = IdentityRegistry::new();
/// let arr = Value::array(vec![]);
/// assert_eq!(registry.register(&arr), Some((0, true)));
/// assert_eq!(registry.register(&arr.clone()), Some((0, false)));
/// assert_eq!(registry.register(&Value::Number(1.0)), None);
/// ```
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    ids: HashMap<usize, u32>,
    values: HashMap<u32, Value>,
    next_id: u32,
}

impl IdentityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of a reference value, and whether it was newly assigned
    ///
    /// Returns `None` for primitives and once every id below `u32::MAX`
    /// is taken.
    pub fn register(&mut self, value: &Value) -> Option<(u32, bool)> {
        let addr = identity_of(value)?;
        if let Some(id) = self.ids.get(&addr) {
            return Some((*id, false));
        }
        let id = self.next_id;
        self.next_id = id.checked_add(1)?;
        self.ids.insert(addr, id);
        self.values.insert(id, value.clone());
        Some((id, true))
    }

    /// Associate a value with an externally chosen id
    ///
    /// Returns false if the id is already bound or is `u32::MAX`, which is
    /// never handed out.
    pub fn bind(&mut self, id: u32, value: &Value) -> bool {
        let Some(next) = id.checked_add(1) else {
            return false;
        };
        if self.values.contains_key(&id) {
            return false;
        }
        if let Some(addr) = identity_of(value) {
            self.ids.insert(addr, id);
        }
        self.values.insert(id, value.clone());
        self.next_id = self.next_id.max(next);
        true
    }

    /// Id previously assigned to a value
    pub fn id_of(&self, value: &Value) -> Option<u32> {
        identity_of(value).and_then(|addr| self.ids.get(&addr).copied())
    }

    /// Value registered under an id
    pub fn get(&self, id: u32) -> Option<&Value> {
        self.values.get(&id)
    }

    /// Number of registered values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
