//! Runtime value representation
//!
//! Primitives are stored inline; everything else is a reference-counted
//! object. Equality is by value for primitives and by identity for objects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::function::{BoundMethod, NativeFunction, UserFunction};
use crate::object::ExtObject;
use crate::types::{TraitBundle, TypeRef};
use crate::wrapped::WrappedValue;

/// Maximum container nesting rendered by `Display` before eliding
const DISPLAY_DEPTH: usize = 8;

/// Tagged runtime value
///
/// # Examples
///
/// ```
/// use object_model::Value;
///
/// let a = Value::array(vec![Value::Number(1.0)]);
/// let b = a.clone();
/// assert_eq!(a, b);
/// assert_ne!(a, Value::array(vec![Value::Number(1.0)]));
/// assert!(!Value::Number(0.0).is_truthy());
/// ```
#[derive(Clone)]
pub enum Value {
    /// Absence of a value
    Void,
    /// Boolean
    Bool(bool),
    /// IEEE 754 double
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Growable array
    Array(Rc<RefCell<Vec<Value>>>),
    /// Insertion-ordered mapping from string keys
    Map(Rc<RefCell<IndexMap<String, Value>>>),
    /// Extensible object
    Object(Rc<ExtObject>),
    /// Script function (closure over a static data block)
    Function(Rc<UserFunction>),
    /// Host function
    Native(Rc<NativeFunction>),
    /// Callable bound to a receiver
    Bound(Rc<BoundMethod>),
    /// Type object
    Type(TypeRef),
    /// Trait bundle
    Trait(Rc<TraitBundle>),
    /// Host value wrapped for scripts
    Wrapped(Rc<WrappedValue>),
}

impl Value {
    /// Create a string value
    pub fn string(s: &str) -> Value {
        Value::String(Rc::from(s))
    }

    /// Create an array value
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Create a mapping value
    pub fn map(entries: IndexMap<String, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "Void",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Object(_) => "Object",
            Value::Function(_) => "UserFunction",
            Value::Native(_) => "NativeFunction",
            Value::Bound(_) => "BoundMethod",
            Value::Type(_) => "Type",
            Value::Trait(_) => "Trait",
            Value::Wrapped(_) => "Wrapped",
        }
    }

    /// Truthiness: void, false, zero and NaN are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Void => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            _ => true,
        }
    }

    /// Whether the value is stored inline rather than by reference
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Void | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    /// Whether the value can be called directly
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Native(_) | Value::Bound(_)
        )
    }

    /// Number payload, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Non-negative integral number as an index
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && n.is_finite() => {
                Some(*n as usize)
            }
            _ => None,
        }
    }

    /// Key used when the value indexes a mapping
    pub fn as_map_key(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.to_string()),
            Value::Number(_) | Value::Bool(_) => Some(self.to_string()),
            _ => None,
        }
    }

    /// Identity comparison (`===`): same primitive value, or same object
    pub fn identical(&self, other: &Value) -> bool {
        self == other
    }

    fn fmt_depth(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                if depth >= DISPLAY_DEPTH {
                    return f.write_str("[...]");
                }
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_depth(f, depth + 1)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                if depth >= DISPLAY_DEPTH {
                    return f.write_str("{...}");
                }
                f.write_str("{")?;
                for (i, (key, item)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    item.fmt_depth(f, depth + 1)?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => write!(f, "<{} object>", obj.type_ref().name()),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Native(native) => write!(f, "<native {}>", native.name()),
            Value::Bound(bound) => write!(f, "<bound {}>", bound.method),
            Value::Type(t) => write!(f, "<type {}>", t.name()),
            Value::Trait(t) => write!(f, "<trait {}>", t.name()),
            Value::Wrapped(w) => write!(f, "<{} native>", w.type_ref().name()),
        }
    }
}

/// Shortest round-trip rendering; integral values print without a fraction
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        ryu::Buffer::new().format_finite(n).to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Bound(a), Value::Bound(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => Rc::ptr_eq(a, b),
            (Value::Trait(a), Value::Trait(b)) => Rc::ptr_eq(a, b),
            (Value::Wrapped(a), Value::Wrapped(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_depth(f, 0)
    }
}

// Shallow on purpose: object graphs may be cyclic.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(items) => write!(f, "Array(len={})", items.borrow().len()),
            Value::Map(entries) => write!(f, "Map(len={})", entries.borrow().len()),
            other => write!(f, "{}({})", other.kind_name(), other),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<&bytecode_system::Constant> for Value {
    fn from(constant: &bytecode_system::Constant) -> Self {
        use bytecode_system::Constant;
        match constant {
            Constant::Void => Value::Void,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Number(n) => Value::Number(*n),
            Constant::String(s) => Value::string(s),
        }
    }
}
