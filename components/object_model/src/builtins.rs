//! Built-in types and their native methods
//!
//! Every value's type pointer resolves to one of these types (or to a
//! script type deriving from `Object`). The root `Object` type has no base.

use std::cell::RefCell;
use std::rc::Rc;

use bytecode_system::AttributeFlags;
use core_types::{ErrorKind, ScriptError};
use indexmap::IndexMap;

use crate::function::NativeFunction;
use crate::introspection::is_instance_of;
use crate::object::ExtObject;
use crate::signal::{Invoker, Signal};
use crate::types::{TypeObject, TypeRef};
use crate::value::Value;

/// Registry of the built-in types
#[derive(Debug, Clone)]
pub struct BuiltinTypes {
    /// Root of every type chain
    pub object: TypeRef,
    /// Type of type objects
    pub type_type: TypeRef,
    /// Type of trait bundles
    pub trait_type: TypeRef,
    /// Type of `void`
    pub void: TypeRef,
    /// Type of booleans
    pub bool: TypeRef,
    /// Type of numbers
    pub number: TypeRef,
    /// Type of strings
    pub string: TypeRef,
    /// Type of arrays
    pub array: TypeRef,
    /// Type of mappings
    pub map: TypeRef,
    /// Common base of callables
    pub function: TypeRef,
    /// Type of script functions
    pub user_function: TypeRef,
    /// Type of host functions
    pub native_function: TypeRef,
    /// Type of bound methods
    pub bound_method: TypeRef,
    /// Type of exception objects, both raised by scripts and built from
    /// caught engine errors
    pub exception: TypeRef,
}

fn derived(name: &str, base: &TypeRef) -> TypeRef {
    Rc::new(TypeObject::new(name, Some(base.clone())))
}

impl BuiltinTypes {
    /// Create the built-in types and install their native methods
    pub fn new() -> Self {
        let object = Rc::new(TypeObject::new("Object", None));
        let function = derived("Function", &object);
        let builtins = Self {
            type_type: derived("Type", &object),
            trait_type: derived("Trait", &object),
            void: derived("Void", &object),
            bool: derived("Bool", &object),
            number: derived("Number", &object),
            string: derived("String", &object),
            array: derived("Array", &object),
            map: derived("Map", &object),
            user_function: derived("UserFunction", &function),
            native_function: derived("NativeFunction", &function),
            bound_method: derived("BoundMethod", &function),
            exception: derived("Exception", &object),
            function,
            object,
        };
        builtins.install_object_methods();
        builtins.install_type_methods();
        builtins.install_array_methods();
        builtins.install_map_methods();
        builtins.install_string_methods();
        builtins.install_function_methods();
        builtins.install_exception();
        builtins
    }

    /// Every built-in type
    pub fn all(&self) -> Vec<TypeRef> {
        vec![
            self.object.clone(),
            self.type_type.clone(),
            self.trait_type.clone(),
            self.void.clone(),
            self.bool.clone(),
            self.number.clone(),
            self.string.clone(),
            self.array.clone(),
            self.map.clone(),
            self.function.clone(),
            self.user_function.clone(),
            self.native_function.clone(),
            self.bound_method.clone(),
            self.exception.clone(),
        ]
    }

    /// Built-in type by name
    pub fn by_name(&self, name: &str) -> Option<TypeRef> {
        self.all().into_iter().find(|t| t.name() == name)
    }

    /// The type describing a value's attribute surface
    pub fn type_of(&self, value: &Value) -> TypeRef {
        match value {
            Value::Void => self.void.clone(),
            Value::Bool(_) => self.bool.clone(),
            Value::Number(_) => self.number.clone(),
            Value::String(_) => self.string.clone(),
            Value::Array(_) => self.array.clone(),
            Value::Map(_) => self.map.clone(),
            Value::Object(obj) => obj.type_ref().clone(),
            Value::Function(_) => self.user_function.clone(),
            Value::Native(_) => self.native_function.clone(),
            Value::Bound(_) => self.bound_method.clone(),
            Value::Type(_) => self.type_type.clone(),
            Value::Trait(_) => self.trait_type.clone(),
            Value::Wrapped(w) => w.type_ref().clone(),
        }
    }

    /// Build an exception object
    ///
    /// Caught engine errors reach scripts in this form.
    pub fn make_exception(&self, kind: &str, message: &str, line: Option<u32>) -> Value {
        let obj = ExtObject::instantiate(&self.exception);
        obj.define("kind", Value::string(kind), AttributeFlags::NONE);
        obj.define("message", Value::string(message), AttributeFlags::NONE);
        let line = line.map_or(Value::Void, |l| Value::Number(l as f64));
        obj.define("line", line, AttributeFlags::NONE);
        Value::Object(Rc::new(obj))
    }

    fn install_object_methods(&self) {
        native(&self.object, "getType", 0, Some(0), |inv, this, _| {
            Ok(Value::Type(inv.builtins().type_of(this)))
        });
        native(&self.object, "isA", 1, Some(1), |inv, this, args| match &args[0] {
            Value::Type(t) => Ok(Value::Bool(is_instance_of(this, t, inv.builtins()))),
            other => Err(mismatch("isA", other)),
        });
        native(&self.object, "toString", 0, Some(0), |_, this, _| {
            Ok(Value::string(&this.to_string()))
        });
    }

    fn install_type_methods(&self) {
        native(&self.type_type, "getName", 0, Some(0), |_, this, _| {
            Ok(Value::string(this_type(this, "getName")?.name()))
        });
        native(&self.type_type, "getBaseType", 0, Some(0), |_, this, _| {
            Ok(this_type(this, "getBaseType")?
                .base()
                .map_or(Value::Void, |b| Value::Type(b.clone())))
        });
        native(&self.type_type, "getTraits", 0, Some(0), |_, this, _| {
            let names = this_type(this, "getTraits")?
                .composed_trait_names()
                .iter()
                .map(|n| Value::string(n))
                .collect();
            Ok(Value::array(names))
        });
    }

    fn install_array_methods(&self) {
        native(&self.array, "size", 0, Some(0), |_, this, _| {
            Ok(Value::Number(this_array(this, "size")?.borrow().len() as f64))
        });
        native(&self.array, "push", 1, None, |_, this, args| {
            this_array(this, "push")?.borrow_mut().extend(args.iter().cloned());
            Ok(this.clone())
        });
        native(&self.array, "pop", 0, Some(0), |_, this, _| {
            Ok(this_array(this, "pop")?.borrow_mut().pop().unwrap_or(Value::Void))
        });
        native(&self.array, "get", 1, Some(1), |_, this, args| {
            let idx = index_arg(&args[0], "get")?;
            Ok(this_array(this, "get")?
                .borrow()
                .get(idx)
                .cloned()
                .unwrap_or(Value::Void))
        });
        native(&self.array, "set", 2, Some(2), |_, this, args| {
            let idx = index_arg(&args[0], "set")?;
            let items = this_array(this, "set")?;
            store_index(&items, idx, args[1].clone())?;
            Ok(this.clone())
        });
    }

    fn install_map_methods(&self) {
        native(&self.map, "size", 0, Some(0), |_, this, _| {
            Ok(Value::Number(this_map(this, "size")?.borrow().len() as f64))
        });
        native(&self.map, "get", 1, Some(1), |_, this, args| {
            let key = key_arg(&args[0], "get")?;
            Ok(this_map(this, "get")?
                .borrow()
                .get(&key)
                .cloned()
                .unwrap_or(Value::Void))
        });
        native(&self.map, "set", 2, Some(2), |_, this, args| {
            let key = key_arg(&args[0], "set")?;
            this_map(this, "set")?.borrow_mut().insert(key, args[1].clone());
            Ok(this.clone())
        });
        native(&self.map, "contains", 1, Some(1), |_, this, args| {
            let key = key_arg(&args[0], "contains")?;
            Ok(Value::Bool(this_map(this, "contains")?.borrow().contains_key(&key)))
        });
        native(&self.map, "keys", 0, Some(0), |_, this, _| {
            let keys = this_map(this, "keys")?
                .borrow()
                .keys()
                .map(|k| Value::string(k))
                .collect();
            Ok(Value::array(keys))
        });
    }

    fn install_string_methods(&self) {
        native(&self.string, "length", 0, Some(0), |_, this, _| match this {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(mismatch("length", other)),
        });
    }

    fn install_function_methods(&self) {
        let t = &self.user_function;
        native(t, "getParamCount", 0, Some(0), |_, this, _| {
            Ok(Value::Number(this_function(this)?.param_count as f64))
        });
        native(t, "getMinParamCount", 0, Some(0), |_, this, _| {
            Ok(Value::Number(this_function(this)?.min_args as f64))
        });
        // -1 marks a variadic function
        native(t, "getMaxParamCount", 0, Some(0), |_, this, _| {
            let arity = this_function(this)?;
            Ok(Value::Number(
                arity.max_bound().map_or(-1.0, |max| max as f64),
            ))
        });
        native(t, "getMultiParam", 0, Some(0), |_, this, _| {
            Ok(this_function(this)?
                .variadic
                .map_or(Value::Void, |slot| Value::Number(slot as f64)))
        });
        native(t, "getLine", 0, Some(0), |_, this, _| match this {
            Value::Function(func) => Ok(Value::Number(func.line() as f64)),
            other => Err(mismatch("getLine", other)),
        });
        native(t, "clone", 0, Some(0), |_, this, _| match this {
            Value::Function(func) => Ok(Value::Function(Rc::new(func.clone_function()))),
            other => Err(mismatch("clone", other)),
        });
    }

    fn install_exception(&self) {
        let t = &self.exception;
        t.define(
            "kind",
            Value::string(ErrorKind::UserRaisedException.name()),
            AttributeFlags::INIT,
        );
        t.define("message", Value::string(""), AttributeFlags::INIT);
        t.define("line", Value::Void, AttributeFlags::INIT);
        native(t, "_constructor", 0, Some(1), |_, this, args| {
            if let (Value::Object(obj), Some(message)) = (this, args.first()) {
                obj.assign("message", Value::string(&message.to_string()));
            }
            Ok(Value::Void)
        });
        native(t, "getMessage", 0, Some(0), |_, this, _| {
            match this {
                Value::Object(obj) => Ok(obj.get_own("message").map_or(Value::Void, |a| a.value)),
                other => Err(mismatch("getMessage", other)),
            }
        });
    }
}

impl Default for BuiltinTypes {
    fn default() -> Self {
        Self::new()
    }
}

/// Define a native method on a type
fn native<F>(t: &TypeRef, name: &str, min_args: usize, max_args: Option<usize>, func: F)
where
    F: Fn(&mut dyn Invoker, &Value, &[Value]) -> Result<Value, Signal> + 'static,
{
    let f = NativeFunction::new(name, min_args, max_args, func);
    t.define(name, Value::Native(Rc::new(f)), AttributeFlags::NONE);
}

fn mismatch(op: &str, found: &Value) -> Signal {
    ScriptError::type_mismatch(op, found.kind_name()).into()
}

fn this_type(this: &Value, op: &str) -> Result<TypeRef, Signal> {
    match this {
        Value::Type(t) => Ok(t.clone()),
        other => Err(mismatch(op, other)),
    }
}

fn this_array(this: &Value, op: &str) -> Result<Rc<RefCell<Vec<Value>>>, Signal> {
    match this {
        Value::Array(items) => Ok(items.clone()),
        other => Err(mismatch(op, other)),
    }
}

fn this_map(this: &Value, op: &str) -> Result<Rc<RefCell<IndexMap<String, Value>>>, Signal> {
    match this {
        Value::Map(entries) => Ok(entries.clone()),
        other => Err(mismatch(op, other)),
    }
}

fn this_function(this: &Value) -> Result<bytecode_system::Arity, Signal> {
    match this {
        Value::Function(func) => Ok(func.arity()),
        other => Err(mismatch("function introspection", other)),
    }
}

fn index_arg(arg: &Value, op: &str) -> Result<usize, Signal> {
    arg.as_index().ok_or_else(|| mismatch(op, arg))
}

fn key_arg(arg: &Value, op: &str) -> Result<String, Signal> {
    arg.as_map_key().ok_or_else(|| mismatch(op, arg))
}

/// Largest number of void slots a single store may add past the end
pub const MAX_INDEX_GAP: usize = 1 << 16;

/// Store into an array, growing it with void as needed
///
/// Stores more than [`MAX_INDEX_GAP`] slots past the end are rejected
/// with a type mismatch.
pub fn store_index(items: &RefCell<Vec<Value>>, idx: usize, value: Value) -> Result<(), ScriptError> {
    let mut items = items.borrow_mut();
    let len = items.len();
    if idx < len {
        items[idx] = value;
        return Ok(());
    }
    if idx - len > MAX_INDEX_GAP {
        return Err(ScriptError::new(
            ErrorKind::TypeMismatchError,
            format!("index {} is out of range for array of length {}", idx, len),
        ));
    }
    items.resize(idx, Value::Void);
    items.push(value);
    Ok(())
}
