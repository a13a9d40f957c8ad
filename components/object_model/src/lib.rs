//! Object model for the script engine
//!
//! This component provides:
//! - The tagged runtime [`Value`] with inline primitives and reference-counted objects
//! - Types with single inheritance and copy-composed trait bundles
//! - Function objects sharing a per-fragment [`StaticData`] block
//! - Attribute resolution with visibility and mutability checks
//! - Built-in types with their native methods
//! - Introspection and manual cycle breaking for reference-counted graphs
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use object_model::{resolver, AccessContext, AttributeFlags, BuiltinTypes, ExtObject, TypeObject, Value};
//!
//! let builtins = BuiltinTypes::new();
//! let point = Rc::new(TypeObject::new("Point", Some(builtins.object.clone())));
//! point.define("x", Value::Number(0.0), AttributeFlags::INIT);
//!
//! let p = Value::Object(Rc::new(ExtObject::instantiate(&point)));
//! let x = resolver::get_attribute(&p, "x", &AccessContext::host(), &builtins).unwrap();
//! assert_eq!(x, Value::Number(0.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attribute;
pub mod builtins;
pub mod cycles;
pub mod function;
pub mod introspection;
pub mod object;
pub mod resolver;
pub mod signal;
pub mod types;
pub mod value;
pub mod wrapped;

// Re-export main types
pub use attribute::{Attribute, AttributeMap};
pub use builtins::BuiltinTypes;
pub use bytecode_system::AttributeFlags;
pub use cycles::{break_references, reference_count};
pub use function::{BoundMethod, NativeFn, NativeFunction, StaticData, UserFunction};
pub use introspection::{is_instance_of, own_attributes, type_chain, type_of, IdentityRegistry};
pub use object::ExtObject;
pub use resolver::{AccessContext, Origin, Resolved};
pub use signal::{Invoker, Signal};
pub use types::{ComposedTrait, TraitBundle, TypeObject, TypeRef};
pub use value::Value;
pub use wrapped::WrappedValue;
