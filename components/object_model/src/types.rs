//! Types and trait bundles
//!
//! A type owns an attribute map, an optional base type and an ordered list
//! of composed trait snapshots. Composition copies the trait's attributes at
//! that moment; later edits to the trait are not seen by the type.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use bytecode_system::AttributeFlags;
use tracing::debug;

use crate::attribute::{Attribute, AttributeMap};
use crate::value::Value;

/// Shared handle to a type
pub type TypeRef = Rc<TypeObject>;

/// Snapshot of a trait taken when it was composed into a type
#[derive(Debug, Clone)]
pub struct ComposedTrait {
    /// Name of the trait at composition time
    pub name: String,
    /// Attributes copied from the trait
    pub attributes: AttributeMap,
}

/// A type: name, single optional base, own attributes and composed traits
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use object_model::{AttributeFlags, TraitBundle, TypeObject, Value};
///
/// let shape = Rc::new(TypeObject::new("Shape", None));
/// let named = TraitBundle::new("Named");
/// named.define("label", Value::string("shape"), AttributeFlags::NONE);
/// shape.compose(&named);
///
/// // Later additions to the trait are not visible to the type
/// named.define("late", Value::Void, AttributeFlags::NONE);
/// assert_eq!(shape.composed_trait_names(), vec!["Named"]);
/// assert!(shape.composed_traits()[0].attributes.get("late").is_none());
/// ```
#[derive(Debug)]
pub struct TypeObject {
    name: String,
    base: Option<TypeRef>,
    attributes: RefCell<AttributeMap>,
    traits: RefCell<Vec<ComposedTrait>>,
}

impl TypeObject {
    /// Create a type deriving from `base`
    pub fn new(name: &str, base: Option<TypeRef>) -> Self {
        Self {
            name: name.to_string(),
            base,
            attributes: RefCell::new(AttributeMap::new()),
            traits: RefCell::new(Vec::new()),
        }
    }

    /// Name of the type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base type, `None` only for a root type
    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Borrow the type's own attribute map
    pub fn attributes(&self) -> Ref<'_, AttributeMap> {
        self.attributes.borrow()
    }

    /// Own attribute by name (traits and base not consulted)
    pub fn get_own(&self, name: &str) -> Option<Attribute> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Insert or replace an attribute in the type's own map
    pub fn define(&self, name: &str, value: Value, flags: AttributeFlags) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), Attribute::new(value, flags));
    }

    /// Replace the value of an own attribute, keeping its flags
    pub fn assign(&self, name: &str, value: Value) -> bool {
        match self.attributes.borrow_mut().get_mut(name) {
            Some(attr) => {
                attr.value = value;
                true
            }
            None => false,
        }
    }

    /// Copy the trait's current attributes into this type
    ///
    /// Composing the same trait again appends another snapshot; the most
    /// recent composition wins on name conflicts.
    pub fn compose(&self, bundle: &TraitBundle) {
        let snapshot = ComposedTrait {
            name: bundle.name().to_string(),
            attributes: bundle.attributes().clone(),
        };
        debug!(
            type_name = %self.name,
            trait_name = %snapshot.name,
            attributes = snapshot.attributes.len(),
            "composing trait"
        );
        self.traits.borrow_mut().push(snapshot);
    }

    /// Borrow composed trait snapshots in composition order
    pub fn composed_traits(&self) -> Ref<'_, Vec<ComposedTrait>> {
        self.traits.borrow()
    }

    /// Names of composed traits in composition order
    pub fn composed_trait_names(&self) -> Vec<String> {
        self.traits.borrow().iter().map(|t| t.name.clone()).collect()
    }

    /// Whether this type is `other` or derives from it
    pub fn is_subtype_of(&self, other: &TypeObject) -> bool {
        let mut current = Some(self);
        while let Some(t) = current {
            if std::ptr::eq(t, other) {
                return true;
            }
            current = t.base.as_deref();
        }
        false
    }

    /// Remove own attributes and trait snapshots, returning the attributes
    pub fn take_attributes(&self) -> AttributeMap {
        self.traits.borrow_mut().clear();
        std::mem::take(&mut *self.attributes.borrow_mut())
    }
}

/// A named set of attribute definitions that can be composed into types
#[derive(Debug)]
pub struct TraitBundle {
    name: String,
    attributes: RefCell<AttributeMap>,
}

impl TraitBundle {
    /// Create an empty trait
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: RefCell::new(AttributeMap::new()),
        }
    }

    /// Name of the trait
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the trait's attributes
    pub fn attributes(&self) -> Ref<'_, AttributeMap> {
        self.attributes.borrow()
    }

    /// Attribute by name
    pub fn get(&self, name: &str) -> Option<Attribute> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Insert or replace an attribute
    pub fn define(&self, name: &str, value: Value, flags: AttributeFlags) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), Attribute::new(value, flags));
    }

    /// Remove every attribute, returning them
    pub fn take_attributes(&self) -> AttributeMap {
        std::mem::take(&mut *self.attributes.borrow_mut())
    }
}
