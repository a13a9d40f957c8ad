//! Callable objects and the shared static data block
//!
//! Every [`UserFunction`] instantiated from one compiled fragment holds the
//! same `Rc<StaticData>`, so static slots written through one closure are
//! seen by all of its siblings.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use bytecode_system::{Arity, AttributeFlags, CompiledFragment, FunctionTemplate};
use core_types::ScriptError;

use crate::attribute::{Attribute, AttributeMap};
use crate::signal::{Invoker, Signal};
use crate::value::Value;

/// Per-fragment static variable storage
///
/// Slot names are fixed when the block is created; values start unset and
/// persist across calls.
///
/// ```
/// use object_model::{StaticData, Value};
///
/// let data = StaticData::new(vec!["counter".to_string()]);
/// assert_eq!(data.slot_of("counter"), Some(0));
/// assert!(!data.is_initialized(0));
/// data.set(0, Value::Number(1.0)).unwrap();
/// assert_eq!(data.get(0), Some(Value::Number(1.0)));
/// ```
#[derive(Debug, Default)]
pub struct StaticData {
    source_name: Option<String>,
    names: Vec<String>,
    values: RefCell<Vec<Option<Value>>>,
}

impl StaticData {
    /// Create a block with the given slot names, all unset
    pub fn new(names: Vec<String>) -> Self {
        let values = vec![None; names.len()];
        Self {
            source_name: None,
            names,
            values: RefCell::new(values),
        }
    }

    /// Create the static block for a compiled fragment
    pub fn for_fragment(fragment: &CompiledFragment) -> Self {
        Self {
            source_name: Some(fragment.source_name.clone()),
            ..Self::new(fragment.static_names.clone())
        }
    }

    /// Name of the fragment this block belongs to
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the block has no slots
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slot index of a declared name
    pub fn slot_of(&self, name: &str) -> Option<u32> {
        self.names.iter().position(|n| n == name).map(|i| i as u32)
    }

    /// Declared name of a slot
    pub fn name_of(&self, slot: u32) -> Option<&str> {
        self.names.get(slot as usize).map(String::as_str)
    }

    /// Current value of a slot, `None` while unset
    pub fn get(&self, slot: u32) -> Option<Value> {
        self.values.borrow().get(slot as usize).cloned().flatten()
    }

    /// Whether a slot has been assigned
    pub fn is_initialized(&self, slot: u32) -> bool {
        matches!(self.values.borrow().get(slot as usize), Some(Some(_)))
    }

    /// Assign a slot
    pub fn set(&self, slot: u32, value: Value) -> Result<(), ScriptError> {
        match self.values.borrow_mut().get_mut(slot as usize) {
            Some(entry) => {
                *entry = Some(value);
                Ok(())
            }
            None => Err(ScriptError::internal(format!(
                "static slot {} not declared",
                slot
            ))),
        }
    }

    /// Unset every slot
    pub fn clear(&self) {
        for entry in self.values.borrow_mut().iter_mut() {
            *entry = None;
        }
    }
}

/// A script function: shared template and static data, own attributes
#[derive(Debug)]
pub struct UserFunction {
    template: Rc<FunctionTemplate>,
    static_data: Rc<StaticData>,
    attributes: RefCell<AttributeMap>,
}

impl UserFunction {
    /// Instantiate a function from a template and a static data block
    pub fn instantiate(template: Rc<FunctionTemplate>, static_data: Rc<StaticData>) -> Self {
        Self {
            template,
            static_data,
            attributes: RefCell::new(AttributeMap::new()),
        }
    }

    /// Copy of this function with its own attribute map
    ///
    /// The instruction block and static data stay shared.
    pub fn clone_function(&self) -> Self {
        Self {
            template: self.template.clone(),
            static_data: self.static_data.clone(),
            attributes: RefCell::new(self.attributes.borrow().clone()),
        }
    }

    /// The compiled template
    pub fn template(&self) -> &Rc<FunctionTemplate> {
        &self.template
    }

    /// The shared static data block
    pub fn static_data(&self) -> &Rc<StaticData> {
        &self.static_data
    }

    /// Parameter metadata
    pub fn arity(&self) -> Arity {
        self.template.arity
    }

    /// Declaration line
    pub fn line(&self) -> u32 {
        self.template.line
    }

    /// Name for diagnostics
    pub fn name(&self) -> &str {
        self.template.display_name()
    }

    /// Whether both functions share one static data block
    pub fn shares_static_data(&self, other: &UserFunction) -> bool {
        Rc::ptr_eq(&self.static_data, &other.static_data)
    }

    /// Whether both functions run the same template
    pub fn shares_template(&self, other: &UserFunction) -> bool {
        Rc::ptr_eq(&self.template, &other.template)
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

    /// Remove every own attribute, returning them
    pub fn take_attributes(&self) -> AttributeMap {
        std::mem::take(&mut *self.attributes.borrow_mut())
    }
}

/// Signature of a host function: invoker, receiver (`Void` when unbound), arguments
pub type NativeFn = dyn Fn(&mut dyn Invoker, &Value, &[Value]) -> Result<Value, Signal>;

/// A host function callable from scripts
pub struct NativeFunction {
    name: String,
    min_args: usize,
    max_args: Option<usize>,
    func: Box<NativeFn>,
}

impl NativeFunction {
    /// Create a native function accepting `min_args..=max_args` arguments
    /// (`None` for no upper bound)
    pub fn new<F>(name: &str, min_args: usize, max_args: Option<usize>, func: F) -> Self
    where
        F: Fn(&mut dyn Invoker, &Value, &[Value]) -> Result<Value, Signal> + 'static,
    {
        Self {
            name: name.to_string(),
            min_args,
            max_args,
            func: Box::new(func),
        }
    }

    /// Name for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum argument count
    pub fn min_args(&self) -> usize {
        self.min_args
    }

    /// Maximum argument count, `None` if unbounded
    pub fn max_args(&self) -> Option<usize> {
        self.max_args
    }

    /// Check the argument count and run the function
    pub fn invoke(
        &self,
        invoker: &mut dyn Invoker,
        this: &Value,
        args: &[Value],
    ) -> Result<Value, Signal> {
        let too_many = self.max_args.map_or(false, |max| args.len() > max);
        if args.len() < self.min_args || too_many {
            return Err(ScriptError::arity(&self.name, self.min_args, self.max_args, args.len()).into());
        }
        (self.func)(invoker, this, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

/// A callable bound to the receiver it was resolved on
#[derive(Debug, Clone)]
pub struct BoundMethod {
    /// Receiver passed as `self`
    pub receiver: Value,
    /// Underlying callable
    pub method: Value,
}

impl BoundMethod {
    /// Bind `method` to `receiver`
    pub fn new(receiver: Value, method: Value) -> Self {
        Self { receiver, method }
    }
}
