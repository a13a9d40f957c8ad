//! Extensible objects

use std::cell::{Ref, RefCell};

use bytecode_system::AttributeFlags;

use crate::attribute::{Attribute, AttributeMap};
use crate::resolver::type_chain_of;
use crate::types::TypeRef;
use crate::value::Value;

/// An object with its own attribute map and a type pointer
///
/// Own attributes shadow anything the type chain provides.
#[derive(Debug)]
pub struct ExtObject {
    type_ref: TypeRef,
    attributes: RefCell<AttributeMap>,
}

impl ExtObject {
    /// Create an object of `type_ref` with an empty attribute map
    pub fn new(type_ref: TypeRef) -> Self {
        Self {
            type_ref,
            attributes: RefCell::new(AttributeMap::new()),
        }
    }

    /// Create an instance of `type_ref` with its data slots initialized
    ///
    /// Init declarations are copied from the whole type chain, base first,
    /// so a derived type's declaration replaces the base's. Within one type
    /// the composed traits are applied in composition order before the
    /// type's own map.
    pub fn instantiate(type_ref: &TypeRef) -> Self {
        let mut attributes = AttributeMap::new();
        let chain = type_chain_of(type_ref);
        for t in chain.iter().rev() {
            for composed in t.composed_traits().iter() {
                copy_init(&composed.attributes, &mut attributes);
            }
            copy_init(&t.attributes(), &mut attributes);
        }
        Self {
            type_ref: type_ref.clone(),
            attributes: RefCell::new(attributes),
        }
    }

    /// The object's type
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Borrow the own attribute map
    pub fn attributes(&self) -> Ref<'_, AttributeMap> {
        self.attributes.borrow()
    }

    /// Own attribute by name
    pub fn get_own(&self, name: &str) -> Option<Attribute> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Insert or replace an own attribute
    pub fn define(&self, name: &str, value: Value, flags: AttributeFlags) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), Attribute::new(value, flags));
    }

    /// Replace the value of an existing own attribute, keeping its flags
    ///
    /// Returns false if there is no such attribute.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        match self.attributes.borrow_mut().get_mut(name) {
            Some(attr) => {
                attr.value = value;
                true
            }
            None => false,
        }
    }

    /// Remove every own attribute, returning them
    pub fn take_attributes(&self) -> AttributeMap {
        std::mem::take(&mut *self.attributes.borrow_mut())
    }
}

fn copy_init(from: &AttributeMap, into: &mut AttributeMap) {
    for (name, attr) in from.iter().filter(|(_, a)| a.is_init()) {
        into.insert(name.clone(), attr.instance_copy());
    }
}
