//! Attribute resolution
//!
//! Lookup order for a receiver: its own attribute map, then its type's own
//! map, then that type's composed traits most recent first, then the base
//! type recursively. Resolution is purely by name.
//!
//! Callables found this way are returned bound to the receiver.

use std::rc::Rc;

use bytecode_system::AttributeFlags;
use core_types::ScriptError;

use crate::attribute::{Attribute, AttributeMap};
use crate::builtins::BuiltinTypes;
use crate::function::{BoundMethod, UserFunction};
use crate::types::TypeRef;
use crate::value::Value;

/// Where a resolved attribute was found
#[derive(Debug, Clone)]
pub enum Origin {
    /// The receiver's own attribute map
    Own,
    /// A type's own map
    Type(TypeRef),
    /// A trait snapshot composed into a type
    Trait {
        /// Type the trait was composed into
        type_ref: TypeRef,
        /// Name of the composed trait
        trait_name: String,
    },
}

/// A resolved attribute and its origin
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The attribute as stored
    pub attribute: Attribute,
    /// Where it was found
    pub origin: Origin,
}

/// Who is performing an access
///
/// Private attributes of a type are reachable only from method bodies that
/// the type declares itself, in its own map or through a composed trait.
/// The receiver may be any instance, not just the caller's `self`. Methods
/// of a subtype, free functions and functions stored on an instance do not
/// qualify.
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
    caller_self: Option<Value>,
    running: Option<Rc<UserFunction>>,
}

impl AccessContext {
    /// Access from host code, outside any method body
    pub fn host() -> Self {
        Self::default()
    }

    /// Access from a method declared by the type of `self_value`
    ///
    /// For a type value the method is one the type itself declares.
    pub fn within(self_value: Value) -> Self {
        Self {
            caller_self: Some(self_value),
            running: None,
        }
    }

    /// Access from `function` running with `self_value` as `self`
    ///
    /// The owning type is the one in `self_value`'s chain that declares
    /// `function`; it is looked up only when a private attribute is touched.
    pub fn running(self_value: Value, function: Rc<UserFunction>) -> Self {
        Self {
            caller_self: Some(self_value),
            running: Some(function),
        }
    }

    /// The caller's `self`, if any
    pub fn caller_self(&self) -> Option<&Value> {
        self.caller_self.as_ref()
    }

    /// Whether this context may touch private attributes of `defining`
    pub fn may_access_private(&self, defining: &TypeRef, builtins: &BuiltinTypes) -> bool {
        let Some(caller) = &self.caller_self else {
            return false;
        };
        let owner = match &self.running {
            Some(function) => method_owner(caller, function, builtins),
            None => Some(type_of_self(caller, builtins)),
        };
        owner.is_some_and(|owner| Rc::ptr_eq(&owner, defining))
    }
}

fn type_of_self(self_value: &Value, builtins: &BuiltinTypes) -> TypeRef {
    match self_value {
        Value::Type(t) => t.clone(),
        other => builtins.type_of(other),
    }
}

/// Type in `self_value`'s chain that declares `function` as a method
pub fn method_owner(
    self_value: &Value,
    function: &Rc<UserFunction>,
    builtins: &BuiltinTypes,
) -> Option<TypeRef> {
    let declares = |attributes: &AttributeMap| {
        attributes
            .values()
            .any(|attr| matches!(&attr.value, Value::Function(f) if Rc::ptr_eq(f, function)))
    };
    type_chain_of(&type_of_self(self_value, builtins))
        .into_iter()
        .find(|t| {
            declares(&*t.attributes())
                || t.composed_traits().iter().any(|c| declares(&c.attributes))
        })
}

/// Types from `type_ref` up to the root, most derived first
pub fn type_chain_of(type_ref: &TypeRef) -> Vec<TypeRef> {
    let mut chain = Vec::new();
    let mut current = Some(type_ref.clone());
    while let Some(t) = current {
        current = t.base().cloned();
        chain.push(t);
    }
    chain
}

/// Resolve `name` through a type chain only
pub fn lookup_in_type(type_ref: &TypeRef, name: &str) -> Option<Resolved> {
    let mut current = Some(type_ref.clone());
    while let Some(t) = current {
        if let Some(attribute) = t.get_own(name) {
            return Some(Resolved {
                attribute,
                origin: Origin::Type(t),
            });
        }
        let from_trait = {
            let traits = t.composed_traits();
            traits.iter().rev().find_map(|composed| {
                composed
                    .attributes
                    .get(name)
                    .map(|attr| (composed.name.clone(), attr.clone()))
            })
        };
        if let Some((trait_name, attribute)) = from_trait {
            return Some(Resolved {
                attribute,
                origin: Origin::Trait {
                    type_ref: t,
                    trait_name,
                },
            });
        }
        current = t.base().cloned();
    }
    None
}

/// Resolve `name` on `receiver` without access checks or binding
///
/// A type value's own map is its whole chain; the `Type` meta type follows.
///
/// ```
/// use std::rc::Rc;
/// use object_model::{resolver, AttributeFlags, BuiltinTypes, ExtObject, Origin, TypeObject, Value};
///
/// let builtins = BuiltinTypes::new();
/// let t = Rc::new(TypeObject::new("T", Some(builtins.object.clone())));
/// t.define("kind", Value::string("type"), AttributeFlags::NONE);
/// let obj = ExtObject::instantiate(&t);
/// obj.define("kind", Value::string("own"), AttributeFlags::NONE);
///
/// let found = resolver::resolve(&Value::Object(Rc::new(obj)), "kind", &builtins).unwrap();
/// assert!(matches!(found.origin, Origin::Own));
/// assert_eq!(found.attribute.value, Value::string("own"));
/// ```
pub fn resolve(receiver: &Value, name: &str, builtins: &BuiltinTypes) -> Option<Resolved> {
    let own = match receiver {
        Value::Object(obj) => obj.get_own(name),
        Value::Function(func) => func.get_own(name),
        Value::Trait(bundle) => bundle.get(name),
        Value::Type(t) => {
            if let Some(found) = lookup_in_type(t, name) {
                return Some(found);
            }
            None
        }
        _ => None,
    };
    if let Some(attribute) = own {
        return Some(Resolved {
            attribute,
            origin: Origin::Own,
        });
    }
    lookup_in_type(&builtins.type_of(receiver), name)
}

/// Type whose method bodies own a resolved attribute
///
/// An instance's own copy belongs to the type in its chain that declares
/// the name, so per-instance copies of inherited attributes keep their
/// declaring type.
fn defining_type(receiver: &Value, name: &str, resolved: &Resolved, builtins: &BuiltinTypes) -> TypeRef {
    match &resolved.origin {
        Origin::Own => match receiver {
            Value::Type(t) => t.clone(),
            _ => {
                let own_type = builtins.type_of(receiver);
                match lookup_in_type(&own_type, name).map(|found| found.origin) {
                    Some(Origin::Type(t)) => t,
                    Some(Origin::Trait { type_ref, .. }) => type_ref,
                    _ => own_type,
                }
            }
        },
        Origin::Type(t) => t.clone(),
        Origin::Trait { type_ref, .. } => type_ref.clone(),
    }
}

fn check_read(
    receiver: &Value,
    name: &str,
    resolved: &Resolved,
    ctx: &AccessContext,
    builtins: &BuiltinTypes,
) -> Result<(), ScriptError> {
    if resolved.attribute.is_private() {
        let defining = defining_type(receiver, name, resolved, builtins);
        if !ctx.may_access_private(&defining, builtins) {
            return Err(ScriptError::access(
                name,
                &format!("private to {}", defining.name()),
            ));
        }
    }
    Ok(())
}

fn check_write(
    receiver: &Value,
    name: &str,
    resolved: &Resolved,
    ctx: &AccessContext,
    builtins: &BuiltinTypes,
) -> Result<(), ScriptError> {
    check_read(receiver, name, resolved, ctx, builtins)?;
    if resolved.attribute.is_constant() {
        return Err(ScriptError::access(name, "attribute is constant"));
    }
    Ok(())
}

fn not_found(receiver: &Value, name: &str, builtins: &BuiltinTypes) -> ScriptError {
    ScriptError::attribute_not_found(name, builtins.type_of(receiver).name())
}

/// Bind a callable to `receiver`; other values pass through
pub fn bind(receiver: &Value, value: Value) -> Value {
    match value {
        Value::Function(_) | Value::Native(_) => {
            Value::Bound(Rc::new(BoundMethod::new(receiver.clone(), value)))
        }
        other => other,
    }
}

/// Resolve and check an attribute, binding callables to the receiver
pub fn get_attribute(
    receiver: &Value,
    name: &str,
    ctx: &AccessContext,
    builtins: &BuiltinTypes,
) -> Result<Value, ScriptError> {
    let value = find_method(receiver, name, ctx, builtins)?;
    Ok(bind(receiver, value))
}

/// Resolve and check an attribute without binding
///
/// Used for method calls, where the receiver is passed separately.
pub fn find_method(
    receiver: &Value,
    name: &str,
    ctx: &AccessContext,
    builtins: &BuiltinTypes,
) -> Result<Value, ScriptError> {
    let resolved = resolve(receiver, name, builtins).ok_or_else(|| not_found(receiver, name, builtins))?;
    check_read(receiver, name, &resolved, ctx, builtins)?;
    Ok(resolved.attribute.value)
}

/// Flags an assignment inherits from the attribute it shadows
fn inherited(flags: AttributeFlags) -> AttributeFlags {
    AttributeFlags {
        init: false,
        ..flags
    }
}

/// Assign `receiver.name = value`
///
/// Existing own attributes keep their flags. A name found further up the
/// chain is shadowed in the receiver's own map with the same flags; a new
/// name is created public and mutable. Values without an own attribute map
/// cannot be assigned to.
pub fn set_attribute(
    receiver: &Value,
    name: &str,
    value: Value,
    ctx: &AccessContext,
    builtins: &BuiltinTypes,
) -> Result<(), ScriptError> {
    match receiver {
        Value::Object(obj) => {
            match resolve(receiver, name, builtins) {
                Some(found) => {
                    check_write(receiver, name, &found, ctx, builtins)?;
                    if !obj.assign(name, value.clone()) {
                        obj.define(name, value, inherited(found.attribute.flags));
                    }
                }
                None => obj.define(name, value, AttributeFlags::NONE),
            }
            Ok(())
        }
        Value::Function(func) => {
            match resolve(receiver, name, builtins) {
                Some(found) => {
                    check_write(receiver, name, &found, ctx, builtins)?;
                    if !func.assign(name, value.clone()) {
                        func.define(name, value, inherited(found.attribute.flags));
                    }
                }
                None => func.define(name, value, AttributeFlags::NONE),
            }
            Ok(())
        }
        Value::Type(t) => {
            match lookup_in_type(t, name) {
                Some(found) => {
                    check_write(receiver, name, &found, ctx, builtins)?;
                    if !t.assign(name, value.clone()) {
                        t.define(name, value, inherited(found.attribute.flags));
                    }
                }
                None => t.define(name, value, AttributeFlags::NONE),
            }
            Ok(())
        }
        Value::Trait(bundle) => {
            match bundle.get(name) {
                Some(attribute) => {
                    let found = Resolved {
                        attribute,
                        origin: Origin::Own,
                    };
                    check_write(receiver, name, &found, ctx, builtins)?;
                    bundle.define(name, value, found.attribute.flags);
                }
                None => bundle.define(name, value, AttributeFlags::NONE),
            }
            Ok(())
        }
        other => Err(ScriptError::type_mismatch(
            &format!("set attribute '{}'", name),
            other.kind_name(),
        )),
    }
}

/// Define `target.name = value` with explicit flags
///
/// Definitions replace any existing attribute regardless of its flags; they
/// are how type and trait bodies declare their members.
pub fn define_attribute(
    target: &Value,
    name: &str,
    value: Value,
    flags: AttributeFlags,
) -> Result<(), ScriptError> {
    match target {
        Value::Object(obj) => obj.define(name, value, flags),
        Value::Function(func) => func.define(name, value, flags),
        Value::Type(t) => t.define(name, value, flags),
        Value::Trait(bundle) => bundle.define(name, value, flags),
        other => {
            return Err(ScriptError::type_mismatch(
                &format!("define attribute '{}'", name),
                other.kind_name(),
            ))
        }
    }
    Ok(())
}
