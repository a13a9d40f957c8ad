//! Attribute slots stored in object, type and trait maps

use indexmap::IndexMap;

use bytecode_system::AttributeFlags;

use crate::value::Value;

/// Insertion-ordered attribute map
pub type AttributeMap = IndexMap<String, Attribute>;

/// A value together with its declaration flags
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Stored value
    pub value: Value,
    /// Visibility, mutability and per-instance flags
    pub flags: AttributeFlags,
}

impl Attribute {
    /// Create an attribute
    pub fn new(value: Value, flags: AttributeFlags) -> Self {
        Self { value, flags }
    }

    /// Public mutable attribute
    pub fn public(value: Value) -> Self {
        Self::new(value, AttributeFlags::NONE)
    }

    /// Whether the attribute is private
    pub fn is_private(&self) -> bool {
        self.flags.private
    }

    /// Whether the attribute is constant
    pub fn is_constant(&self) -> bool {
        self.flags.constant
    }

    /// Whether the attribute is a per-instance data slot declaration
    pub fn is_init(&self) -> bool {
        self.flags.init
    }

    /// Per-instance copy of an init declaration
    ///
    /// Arrays and mappings are copied shallowly so instances never share a
    /// container; every other value is shared.
    pub fn instance_copy(&self) -> Attribute {
        let value = match &self.value {
            Value::Array(items) => Value::array(items.borrow().clone()),
            Value::Map(entries) => Value::map(entries.borrow().clone()),
            other => other.clone(),
        };
        Attribute {
            value,
            flags: AttributeFlags {
                init: false,
                ..self.flags
            },
        }
    }
}
