//! Execution engine
//!
//! Main entry point for running compiled fragments and calling script
//! values from the host.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use bytecode_system::{CompiledFragment, FunctionTemplate, Verifier};
use core_types::{ErrorKind, ScriptError, SourcePosition, StackFrame};
use object_model::{
    resolver, AccessContext, BuiltinTypes, Invoker, NativeFunction, Signal, StaticData,
    TraitBundle, TypeObject, TypeRef, UserFunction, Value, WrappedValue,
};
use tracing::{debug, trace, warn};

use crate::call_frame::CallFrame;
use crate::config::EngineConfig;
use crate::failure::Failure;

/// Hook run on every call-frame entry with the new depth and function name
///
/// Returning an error aborts the call with that error.
pub type FrameGuard = dyn FnMut(usize, &str) -> Result<(), ScriptError>;

/// Result of starting a call
pub(crate) enum CallStart {
    /// A script frame was pushed and must be run
    Pushed,
    /// The call completed immediately (native callee)
    Done(Value),
}

/// Stack-machine execution engine
///
/// One engine owns its globals, frame arena and operand stack. Engines are
/// `!Send`: the object graph is reference counted without atomics.
///
/// # Example
///
/// ```
/// use bytecode_system::{Arity, CompiledFragment, Constant, FunctionTemplate, InstructionBlock, Opcode};
/// use interpreter::Engine;
/// use object_model::Value;
///
/// let mut block = InstructionBlock::new();
/// let a = block.add_constant(Constant::Number(40.0));
/// let b = block.add_constant(Constant::Number(2.0));
/// block.emit(Opcode::PushConstant(a));
/// block.emit(Opcode::PushConstant(b));
/// block.emit(Opcode::Add);
/// block.emit(Opcode::Return);
///
/// let fragment = CompiledFragment::new("answer", FunctionTemplate::new(None, block, Arity::fixed(0)));
/// let mut engine = Engine::new();
/// assert_eq!(engine.execute_fragment(&fragment).unwrap(), Value::Number(42.0));
/// ```
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) builtins: BuiltinTypes,
    pub(crate) globals: HashMap<String, Value>,
    /// Frame arena, innermost last
    pub(crate) frames: Vec<CallFrame>,
    /// Operand stack shared by all frames
    pub(crate) stack: Vec<Value>,
    pub(crate) frame_guard: Option<Box<FrameGuard>>,
    pub(crate) instructions_executed: u64,
    /// Frames unwound by the raise in flight
    pub(crate) raise_trace: Vec<StackFrame>,
    /// Position of the raise in flight
    pub(crate) raise_position: Option<SourcePosition>,
}

impl Engine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let builtins = BuiltinTypes::new();
        let globals = builtins
            .all()
            .into_iter()
            .map(|t| (t.name().to_string(), Value::Type(t)))
            .collect();
        Self {
            config,
            builtins,
            globals,
            frames: Vec::with_capacity(64),
            stack: Vec::with_capacity(256),
            frame_guard: None,
            instructions_executed: 0,
            raise_trace: Vec::new(),
            raise_position: None,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The built-in types
    pub fn builtins(&self) -> &BuiltinTypes {
        &self.builtins
    }

    /// Turn a compiled fragment into a callable function with a fresh
    /// static data block
    pub fn load_fragment(&mut self, fragment: &CompiledFragment) -> Result<Value, Failure> {
        if self.config.verify_fragments {
            Verifier::verify_fragment(fragment)?;
        }
        debug!(
            source = %fragment.source_name,
            statics = fragment.static_names.len(),
            "loading fragment"
        );
        let static_data = Rc::new(StaticData::for_fragment(fragment));
        Ok(self.instantiate(&fragment.main, &static_data))
    }

    /// Load a fragment and run its top-level function
    pub fn execute_fragment(&mut self, fragment: &CompiledFragment) -> Result<Value, Failure> {
        let main = self.load_fragment(fragment)?;
        self.call(&main, Vec::new())
    }

    /// Instantiate a function from a template and an existing static data
    /// block
    pub fn instantiate(&self, template: &Rc<FunctionTemplate>, static_data: &Rc<StaticData>) -> Value {
        Value::Function(Rc::new(UserFunction::instantiate(
            template.clone(),
            static_data.clone(),
        )))
    }

    /// Call a callable value without a receiver
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, Failure> {
        self.call_top_level(callee, None, args)
    }

    /// Call the method `name` of `receiver`
    pub fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, Failure> {
        let method = resolver::find_method(receiver, name, &AccessContext::host(), &self.builtins)?;
        self.call_top_level(&method, Some(receiver.clone()), args)
    }

    /// Read an attribute as host code
    pub fn get_attribute(&self, receiver: &Value, name: &str) -> Result<Value, Failure> {
        Ok(resolver::get_attribute(receiver, name, &AccessContext::host(), &self.builtins)?)
    }

    /// Assign an attribute as host code
    pub fn set_attribute(&self, receiver: &Value, name: &str, value: Value) -> Result<(), Failure> {
        Ok(resolver::set_attribute(
            receiver,
            name,
            value,
            &AccessContext::host(),
            &self.builtins,
        )?)
    }

    /// Create a type and publish it as a global
    ///
    /// Types without an explicit base derive from `Object`.
    pub fn declare_type(&mut self, name: &str, base: Option<&TypeRef>) -> TypeRef {
        let base = base.cloned().unwrap_or_else(|| self.builtins.object.clone());
        let t = Rc::new(TypeObject::new(name, Some(base)));
        self.globals.insert(name.to_string(), Value::Type(t.clone()));
        t
    }

    /// Create a trait and publish it as a global
    pub fn declare_trait(&mut self, name: &str) -> Rc<TraitBundle> {
        let bundle = Rc::new(TraitBundle::new(name));
        self.globals
            .insert(name.to_string(), Value::Trait(bundle.clone()));
        bundle
    }

    /// Copy a trait's current attributes into a type
    pub fn compose_trait(&self, type_ref: &TypeRef, bundle: &TraitBundle) {
        type_ref.compose(bundle);
    }

    /// Register a host function as a method of `type_ref`
    pub fn declare_native_method<F>(
        &self,
        type_ref: &TypeRef,
        name: &str,
        min_args: usize,
        max_args: Option<usize>,
        func: F,
    ) where
        F: Fn(&mut dyn Invoker, &Value, &[Value]) -> Result<Value, Signal> + 'static,
    {
        let native = NativeFunction::new(name, min_args, max_args, func);
        type_ref.define(
            name,
            Value::Native(Rc::new(native)),
            object_model::AttributeFlags::NONE,
        );
    }

    /// Wrap a host value as an instance of `type_ref`
    pub fn wrap_native<T: Any>(&self, type_ref: &TypeRef, inner: T) -> Value {
        Value::Wrapped(Rc::new(WrappedValue::new(type_ref.clone(), inner)))
    }

    /// Read a global variable
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).cloned()
    }

    /// Set a global variable
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    /// Install a hook run on every call-frame entry
    pub fn set_frame_guard<F>(&mut self, guard: F)
    where
        F: FnMut(usize, &str) -> Result<(), ScriptError> + 'static,
    {
        self.frame_guard = Some(Box::new(guard));
    }

    /// Remove the frame guard
    pub fn clear_frame_guard(&mut self) {
        self.frame_guard = None;
    }

    /// Instructions executed by the current or last top-level call
    pub fn instructions_executed(&self) -> u64 {
        self.instructions_executed
    }

    /// Number of active script frames
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Access rights of the code currently running
    pub(crate) fn access_context(&self) -> AccessContext {
        match self.frames.last() {
            Some(frame) => AccessContext::running(frame.this.clone(), frame.function.clone()),
            None => AccessContext::host(),
        }
    }

    fn call_top_level(
        &mut self,
        callee: &Value,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, Failure> {
        if self.frames.is_empty() {
            self.instructions_executed = 0;
        }
        let stack_height = self.stack.len();
        self.invoke(callee, this, args).map_err(|signal| {
            self.stack.truncate(stack_height);
            self.failure(signal)
        })
    }

    /// Call a value to completion, running any script frames it pushes
    pub(crate) fn invoke(
        &mut self,
        callee: &Value,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, Signal> {
        let base_depth = self.frames.len();
        match self.begin_call(callee, this, args, None)? {
            CallStart::Done(value) => Ok(value),
            CallStart::Pushed => self.run(base_depth),
        }
    }

    /// Start a call: push a frame for script functions, run natives directly
    pub(crate) fn begin_call(
        &mut self,
        callee: &Value,
        this: Option<Value>,
        args: Vec<Value>,
        constructing: Option<Value>,
    ) -> Result<CallStart, Signal> {
        match callee {
            Value::Function(func) => {
                self.push_frame(func.clone(), this.unwrap_or(Value::Void), args, constructing)?;
                Ok(CallStart::Pushed)
            }
            Value::Native(native) => {
                let native = native.clone();
                let this = this.unwrap_or(Value::Void);
                let result = native.invoke(self, &this, &args)?;
                // A native constructor may return a replacement instance
                Ok(CallStart::Done(match constructing {
                    Some(obj) if matches!(result, Value::Void) => obj,
                    _ => result,
                }))
            }
            Value::Bound(bound) => {
                let bound = bound.clone();
                self.begin_call(&bound.method, Some(bound.receiver.clone()), args, constructing)
            }
            Value::Object(_) => {
                let handler = resolver::find_method(callee, "_call", &self.access_context(), &self.builtins)?;
                // Handlers must be functions so an object cannot dispatch to itself
                if !is_plain_function(&handler) {
                    return Err(ScriptError::type_mismatch("_call", handler.kind_name()).into());
                }
                self.begin_call(&handler, Some(callee.clone()), args, constructing)
            }
            other => Err(ScriptError::type_mismatch("call", other.kind_name()).into()),
        }
    }

    /// Bind arguments and push a frame for a script function
    fn push_frame(
        &mut self,
        func: Rc<UserFunction>,
        this: Value,
        args: Vec<Value>,
        constructing: Option<Value>,
    ) -> Result<(), Signal> {
        let depth = self.frames.len() + 1;
        if depth > self.config.max_call_depth {
            return Err(ScriptError::internal(format!(
                "maximum call depth of {} exceeded",
                self.config.max_call_depth
            ))
            .into());
        }
        if let Some(guard) = self.frame_guard.as_mut() {
            if let Err(error) = guard(depth, func.name()) {
                warn!(function = func.name(), depth, error = %error, "frame guard aborted call");
                return Err(error.into());
            }
        }

        let arity = func.arity();
        let given = args.len();
        if given < arity.min_args {
            return Err(ScriptError::arity(func.name(), arity.min_args, arity.max_bound(), given).into());
        }

        let mut locals = vec![Value::Void; func.template().frame_size()];
        let limit = arity.positional_limit();
        let mut args = args.into_iter();
        for (slot, value) in locals.iter_mut().zip(args.by_ref().take(limit)) {
            *slot = value;
        }
        let rest: Vec<Value> = args.collect();
        match arity.variadic {
            Some(slot) if slot < arity.param_count => {
                if let Some(local) = locals.get_mut(slot) {
                    *local = Value::array(rest);
                }
            }
            Some(_) => {}
            None if !rest.is_empty() => {
                trace!(
                    function = func.name(),
                    discarded = rest.len(),
                    "discarding excess arguments"
                );
            }
            None => {}
        }

        trace!(function = func.name(), depth, args = given, "enter");
        let mut frame = CallFrame::new(func, locals, this, self.stack.len());
        frame.supplied_args = given.min(limit);
        frame.constructing = constructing;
        self.frames.push(frame);
        Ok(())
    }

    /// Convert a signal that escaped the outermost call into a failure
    fn failure(&mut self, signal: Signal) -> Failure {
        match signal {
            Signal::Error(error) => Failure::from_error(error),
            Signal::Raise(value) => {
                let message = match resolver::resolve(&value, "message", &self.builtins) {
                    Some(found) if matches!(value, Value::Object(_)) && !found.attribute.value.is_callable() => {
                        format!("uncaught exception: {}", found.attribute.value)
                    }
                    _ => format!("uncaught exception: {}", value),
                };
                let mut error = ScriptError::new(ErrorKind::UnhandledException, message);
                error.stack = std::mem::take(&mut self.raise_trace);
                error.source_position = self.raise_position.take();
                Failure {
                    error,
                    thrown: Some(value),
                }
            }
        }
    }
}

fn is_plain_function(value: &Value) -> bool {
    match value {
        Value::Function(_) | Value::Native(_) => true,
        Value::Bound(bound) => matches!(bound.method, Value::Function(_) | Value::Native(_)),
        _ => false,
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("globals", &self.globals.len())
            .field("frames", &self.frames.len())
            .field("stack", &self.stack.len())
            .field("has_frame_guard", &self.frame_guard.is_some())
            .finish()
    }
}

impl Invoker for Engine {
    fn call_value(
        &mut self,
        callee: &Value,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, Signal> {
        self.invoke(callee, this, args)
    }

    fn call_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> Result<Value, Signal> {
        let method = resolver::find_method(receiver, name, &self.access_context(), &self.builtins)?;
        self.invoke(&method, Some(receiver.clone()), args)
    }

    fn builtins(&self) -> &BuiltinTypes {
        &self.builtins
    }
}
