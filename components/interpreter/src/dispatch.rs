//! Dispatch loop for bytecode execution
//!
//! Script-to-script calls do not recurse on the host stack: a call pushes a
//! frame onto the engine's arena and the loop continues in the callee. Only
//! native functions calling back into scripts start a nested loop.

use std::rc::Rc;

use bytecode_system::{LocalId, Opcode};
use core_types::{ScriptError, SourcePosition, StackFrame};
use indexmap::IndexMap;
use object_model::{
    builtins::store_index, is_instance_of, resolver, AccessContext, ExtObject, Signal,
    TraitBundle, TypeObject, TypeRef, UserFunction, Value,
};
use tracing::{debug, trace};

use crate::call_frame::{CallFrame, TryHandler};
use crate::engine::{CallStart, Engine};
use crate::operators;

/// Outcome of executing one instruction
pub(crate) enum Step {
    /// Continue with the next instruction of the top frame
    Continue,
    /// The top frame returned a value
    Return(Value),
}

fn underflow() -> ScriptError {
    ScriptError::internal("operand stack underflow")
}

fn bad_local(slot: u32) -> ScriptError {
    ScriptError::internal(format!("local slot {} out of range", slot))
}

impl Engine {
    /// Run until the frame count drops back to `base_depth`
    ///
    /// Returns the value produced by the frame that was on top of
    /// `base_depth` when the loop started, or the signal that unwound it.
    pub(crate) fn run(&mut self, base_depth: usize) -> Result<Value, Signal> {
        loop {
            let outcome = match self.fetch() {
                Ok(Some((opcode, position))) => self
                    .execute(opcode)
                    .map_err(|signal| self.locate(signal, position)),
                Ok(None) => Ok(Step::Return(Value::Void)),
                Err(error) => Err(Signal::Error(error)),
            };

            match outcome {
                Ok(Step::Continue) => {}
                Ok(Step::Return(value)) => {
                    if let Some(result) = self.finish_frame(value, base_depth) {
                        return Ok(result);
                    }
                }
                Err(signal) => self.unwind(signal, base_depth)?,
            }
        }
    }

    /// Fetch the next instruction of the top frame, `None` at the end of
    /// its block
    fn fetch(&mut self) -> Result<Option<(Opcode, Option<SourcePosition>)>, ScriptError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| ScriptError::internal("no active call frame"))?;
        let fetched = match frame.function.template().block.instructions.get(frame.pc) {
            Some(instruction) => (instruction.opcode.clone(), instruction.source_position),
            None => return Ok(None),
        };
        frame.pc += 1;

        self.instructions_executed += 1;
        if let Some(limit) = self.config.instruction_limit {
            if self.instructions_executed > limit {
                return Err(ScriptError::internal(format!(
                    "instruction limit of {} exceeded",
                    limit
                )));
            }
        }
        Ok(Some(fetched))
    }

    /// Attach the faulting position to a signal
    fn locate(&mut self, signal: Signal, position: Option<SourcePosition>) -> Signal {
        let position = position.or_else(|| {
            self.frames
                .last()
                .map(|frame| SourcePosition::line(frame.function.line()))
        });
        match (signal, position) {
            (Signal::Error(error), Some(position)) => Signal::Error(error.with_position(position)),
            (Signal::Raise(value), position) => {
                if self.raise_position.is_none() {
                    self.raise_position = position;
                }
                Signal::Raise(value)
            }
            (signal, None) => signal,
        }
    }

    /// Pop the top frame after it returned
    ///
    /// Returns the result when the loop's base frame finished; otherwise the
    /// result is pushed for the caller.
    fn finish_frame(&mut self, value: Value, base_depth: usize) -> Option<Value> {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return Some(value),
        };
        self.stack.truncate(frame.stack_base);
        trace!(function = frame.function.name(), depth = self.frames.len() + 1, "exit");
        let value = frame.constructing.unwrap_or(value);
        if self.frames.len() <= base_depth {
            Some(value)
        } else {
            self.stack.push(value);
            None
        }
    }

    /// Unwind frames until a catch region takes the signal
    ///
    /// Returns `Ok` when a handler in a frame above `base_depth` was entered,
    /// or the signal once every frame of this loop has been popped.
    fn unwind(&mut self, mut signal: Signal, base_depth: usize) -> Result<(), Signal> {
        loop {
            let catchable = signal.is_catchable();
            let frame = match self.frames.last_mut() {
                Some(frame) => frame,
                None => return Err(signal),
            };

            if catchable {
                if let Some(handler) = frame.handlers.pop() {
                    frame.pc = handler.target;
                    let function = frame.function.clone();
                    self.stack.truncate(handler.stack_height);
                    let exception = match signal {
                        Signal::Raise(value) => value,
                        Signal::Error(error) => self.builtins.make_exception(
                            error.kind.name(),
                            &error.message,
                            error.line(),
                        ),
                    };
                    debug!(
                        function = function.name(),
                        handler = handler.target,
                        exception = %exception,
                        "exception caught"
                    );
                    self.stack.push(exception);
                    self.raise_trace.clear();
                    self.raise_position = None;
                    return Ok(());
                }
            }

            let line = frame.current_line();
            let frame = match self.frames.pop() {
                Some(frame) => frame,
                None => return Err(signal),
            };
            self.stack.truncate(frame.stack_base);
            debug!(function = frame.function.name(), line, "unwinding frame");
            let record = StackFrame {
                function_name: Some(frame.function.name().to_string()),
                source_url: frame
                    .function
                    .static_data()
                    .source_name()
                    .map(str::to_string),
                line,
            };
            match &mut signal {
                Signal::Error(error) => error.push_frame(record),
                Signal::Raise(_) => self.raise_trace.push(record),
            }

            if self.frames.len() <= base_depth {
                return Err(signal);
            }
        }
    }

    fn frame(&self) -> Result<&CallFrame, ScriptError> {
        self.frames
            .last()
            .ok_or_else(|| ScriptError::internal("no active call frame"))
    }

    fn frame_mut(&mut self) -> Result<&mut CallFrame, ScriptError> {
        self.frames
            .last_mut()
            .ok_or_else(|| ScriptError::internal("no active call frame"))
    }

    fn stack_floor(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.stack_base)
    }

    fn pop(&mut self) -> Result<Value, ScriptError> {
        if self.stack.len() <= self.stack_floor() {
            return Err(underflow());
        }
        self.stack.pop().ok_or_else(underflow)
    }

    fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, ScriptError> {
        let len = self.stack.len();
        if len < self.stack_floor() + count {
            return Err(underflow());
        }
        Ok(self.stack.split_off(len - count))
    }

    fn jump(&mut self, target: usize) -> Result<(), ScriptError> {
        self.frame_mut()?.pc = target;
        Ok(())
    }

    /// String constant naming a global or attribute
    fn name(&self, idx: usize) -> Result<String, ScriptError> {
        self.frame()?
            .function
            .template()
            .block
            .name_at(idx)
            .map(str::to_string)
            .ok_or_else(|| ScriptError::internal(format!("constant {} is not a name", idx)))
    }

    /// Start a call and leave its result on the stack once it completes
    fn call_and_continue(
        &mut self,
        callee: &Value,
        this: Option<Value>,
        args: Vec<Value>,
        constructing: Option<Value>,
    ) -> Result<Step, Signal> {
        if let CallStart::Done(value) = self.begin_call(callee, this, args, constructing)? {
            self.stack.push(value);
        }
        Ok(Step::Continue)
    }

    /// Dispatch an operator to the method of the same name on `receiver`
    fn call_operator(&mut self, opcode: &Opcode, receiver: Value, args: Vec<Value>) -> Result<Step, Signal> {
        let op = opcode
            .operator_name()
            .ok_or_else(|| ScriptError::internal(format!("{:?} has no operator method", opcode)))?;
        if resolver::resolve(&receiver, op, &self.builtins).is_none() {
            return Err(ScriptError::type_mismatch(op, receiver.kind_name()).into());
        }
        let method = resolver::find_method(&receiver, op, &self.access_context(), &self.builtins)?;
        self.call_and_continue(&method, Some(receiver), args, None)
    }

    /// Whether `==` on this value goes through an operator method
    fn has_equality_method(&self, value: &Value) -> bool {
        !operators::has_builtin_equality(value)
            && resolver::resolve(value, "==", &self.builtins).is_some()
    }

    fn execute(&mut self, opcode: Opcode) -> Result<Step, Signal> {
        match opcode {
            Opcode::PushConstant(idx) => {
                let value = self
                    .frame()?
                    .function
                    .template()
                    .block
                    .constants
                    .get(idx)
                    .map(Value::from)
                    .ok_or_else(|| ScriptError::internal(format!("constant {} out of range", idx)))?;
                self.stack.push(value);
            }
            Opcode::PushVoid => self.stack.push(Value::Void),
            Opcode::PushTrue => self.stack.push(Value::Bool(true)),
            Opcode::PushFalse => self.stack.push(Value::Bool(false)),

            Opcode::LoadLocal(LocalId(slot)) => {
                let value = self
                    .frame()?
                    .locals
                    .get(slot as usize)
                    .cloned()
                    .ok_or_else(|| bad_local(slot))?;
                self.stack.push(value);
            }
            Opcode::StoreLocal(LocalId(slot)) => {
                let value = self.pop()?;
                match self.frame_mut()?.locals.get_mut(slot as usize) {
                    Some(local) => *local = value,
                    None => return Err(bad_local(slot).into()),
                }
            }
            Opcode::LoadThis => {
                let this = self.frame()?.this.clone();
                self.stack.push(this);
            }
            Opcode::LoadStatic(slot) => {
                let value = self
                    .frame()?
                    .function
                    .static_data()
                    .get(slot)
                    .unwrap_or(Value::Void);
                self.stack.push(value);
            }
            Opcode::StoreStatic(slot) => {
                let value = self.pop()?;
                self.frame()?.function.static_data().set(slot, value)?;
            }
            Opcode::JumpIfStaticInitialized { slot, target } => {
                let frame = self.frame_mut()?;
                if frame.function.static_data().is_initialized(slot) {
                    frame.pc = target;
                }
            }
            Opcode::LoadGlobal(idx) => {
                let name = self.name(idx)?;
                let value = self
                    .globals
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| ScriptError::attribute_not_found(&name, "global scope"))?;
                self.stack.push(value);
            }
            Opcode::StoreGlobal(idx) => {
                let name = self.name(idx)?;
                let value = self.pop()?;
                self.globals.insert(name, value);
            }

            Opcode::GetAttribute(idx) => {
                let name = self.name(idx)?;
                let receiver = self.pop()?;
                let value = resolver::get_attribute(&receiver, &name, &self.access_context(), &self.builtins)?;
                self.stack.push(value);
            }
            Opcode::SetAttribute(idx) => {
                let name = self.name(idx)?;
                let value = self.pop()?;
                let target = self.pop()?;
                resolver::set_attribute(&target, &name, value, &self.access_context(), &self.builtins)?;
            }
            Opcode::DefineAttribute(idx, flags) => {
                let name = self.name(idx)?;
                let value = self.pop()?;
                let target = self.pop()?;
                resolver::define_attribute(&target, &name, value, flags)?;
                self.stack.push(target);
            }
            Opcode::GetIndex => {
                let index = self.pop()?;
                let container = self.pop()?;
                let value = read_index(&container, &index)?;
                self.stack.push(value);
            }
            Opcode::SetIndex => {
                let value = self.pop()?;
                let index = self.pop()?;
                let container = self.pop()?;
                write_index(&container, &index, value)?;
            }

            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Less
            | Opcode::LessEqual
            | Opcode::Greater
            | Opcode::GreaterEqual => {
                let b = self.pop()?;
                let a = self.pop()?;
                match operators::binary(&opcode, &a, &b) {
                    Some(value) => self.stack.push(value),
                    None => return self.call_operator(&opcode, a, vec![b]),
                }
            }
            Opcode::Neg => {
                let a = self.pop()?;
                match operators::negate(&a) {
                    Some(value) => self.stack.push(value),
                    None => return self.call_operator(&opcode, a, Vec::new()),
                }
            }
            Opcode::Not => {
                let a = self.pop()?;
                self.stack.push(Value::Bool(!a.is_truthy()));
            }
            Opcode::Equal => {
                let b = self.pop()?;
                let a = self.pop()?;
                if self.has_equality_method(&a) {
                    return self.call_operator(&opcode, a, vec![b]);
                }
                self.stack.push(Value::Bool(a == b));
            }
            Opcode::NotEqual => {
                let b = self.pop()?;
                let a = self.pop()?;
                let equal = if self.has_equality_method(&a) {
                    let method = resolver::find_method(&a, "==", &self.access_context(), &self.builtins)?;
                    self.invoke(&method, Some(a), vec![b])?.is_truthy()
                } else {
                    a == b
                };
                self.stack.push(Value::Bool(!equal));
            }
            Opcode::Identical => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.stack.push(Value::Bool(a.identical(&b)));
            }
            Opcode::IsInstanceOf => {
                let t = self.pop()?;
                let value = self.pop()?;
                match t {
                    Value::Type(t) => {
                        let result = is_instance_of(&value, &t, &self.builtins);
                        self.stack.push(Value::Bool(result));
                    }
                    other => return Err(ScriptError::type_mismatch("instanceof", other.kind_name()).into()),
                }
            }

            Opcode::Jump(target) => self.jump(target)?,
            Opcode::JumpIfTrue(target) => {
                if self.pop()?.is_truthy() {
                    self.jump(target)?;
                }
            }
            Opcode::JumpIfFalse(target) => {
                if !self.pop()?.is_truthy() {
                    self.jump(target)?;
                }
            }
            Opcode::JumpIfArgumentSupplied { param, target } => {
                let frame = self.frame_mut()?;
                if (param as usize) < frame.supplied_args {
                    frame.pc = target;
                }
            }
            Opcode::Return => {
                let value = if self.stack.len() > self.stack_floor() {
                    self.pop()?
                } else {
                    Value::Void
                };
                return Ok(Step::Return(value));
            }

            Opcode::Call(argc) => {
                let args = self.pop_n(argc as usize)?;
                let callee = self.pop()?;
                return self.call_and_continue(&callee, None, args, None);
            }
            Opcode::CallMethod(idx, argc) => {
                let name = self.name(idx)?;
                let args = self.pop_n(argc as usize)?;
                let receiver = self.pop()?;
                let method = resolver::find_method(&receiver, &name, &self.access_context(), &self.builtins)?;
                return self.call_and_continue(&method, Some(receiver), args, None);
            }
            Opcode::Instantiate(argc) => {
                let args = self.pop_n(argc as usize)?;
                let target = self.pop()?;
                return self.construct(target, args);
            }
            Opcode::CreateArray(count) => {
                let items = self.pop_n(count)?;
                self.stack.push(Value::array(items));
            }
            Opcode::CreateMap(count) => {
                let mut items = self.pop_n(count * 2)?.into_iter();
                let mut entries = IndexMap::with_capacity(count);
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    let key = key
                        .as_map_key()
                        .ok_or_else(|| ScriptError::type_mismatch("map key", key.kind_name()))?;
                    entries.insert(key, value);
                }
                self.stack.push(Value::map(entries));
            }
            Opcode::CreateClosure(idx) => {
                let function = {
                    let current = &self.frame()?.function;
                    let template = current
                        .template()
                        .block
                        .nested_function(idx)
                        .cloned()
                        .ok_or_else(|| ScriptError::internal(format!("nested function {} out of range", idx)))?;
                    UserFunction::instantiate(template, current.static_data().clone())
                };
                self.stack.push(Value::Function(Rc::new(function)));
            }
            Opcode::CreateType { name, has_base } => {
                let name = self.name(name)?;
                let base = if has_base {
                    match self.pop()? {
                        Value::Type(t) => t,
                        other => return Err(ScriptError::type_mismatch("base type", other.kind_name()).into()),
                    }
                } else {
                    self.builtins.object.clone()
                };
                self.stack
                    .push(Value::Type(Rc::new(TypeObject::new(&name, Some(base)))));
            }
            Opcode::CreateTrait(idx) => {
                let name = self.name(idx)?;
                self.stack.push(Value::Trait(Rc::new(TraitBundle::new(&name))));
            }
            Opcode::ComposeTrait => {
                let bundle = self.pop()?;
                let target = self.pop()?;
                match (&target, &bundle) {
                    (Value::Type(t), Value::Trait(b)) => t.compose(b),
                    (Value::Type(_), other) | (other, _) => {
                        return Err(ScriptError::type_mismatch("compose trait", other.kind_name()).into())
                    }
                }
                self.stack.push(target);
            }

            Opcode::Throw => {
                let value = self.pop()?;
                self.raise_trace.clear();
                self.raise_position = None;
                return Err(Signal::Raise(value));
            }
            Opcode::PushTry(target) => {
                let stack_height = self.stack.len();
                self.frame_mut()?.handlers.push(TryHandler {
                    target,
                    stack_height,
                });
            }
            Opcode::PopTry => {
                self.frame_mut()?.handlers.pop();
            }

            Opcode::Pop => {
                self.pop()?;
            }
            Opcode::Dup => {
                let value = self.pop()?;
                self.stack.push(value.clone());
                self.stack.push(value);
            }
        }
        Ok(Step::Continue)
    }

    /// Built-in types whose values cannot be created by `Instantiate`
    fn is_sealed(&self, t: &TypeRef) -> bool {
        let b = &self.builtins;
        [
            &b.void,
            &b.bool,
            &b.number,
            &b.string,
            &b.function,
            &b.user_function,
            &b.native_function,
            &b.bound_method,
            &b.type_type,
            &b.trait_type,
        ]
        .iter()
        .any(|sealed| Rc::ptr_eq(sealed, t))
    }

    /// Create an instance of `target` and run its constructor
    fn construct(&mut self, target: Value, args: Vec<Value>) -> Result<Step, Signal> {
        let type_ref = match target {
            Value::Type(t) => t,
            other => return Err(ScriptError::type_mismatch("instantiate", other.kind_name()).into()),
        };
        if Rc::ptr_eq(&type_ref, &self.builtins.array) {
            self.stack.push(Value::array(args));
            return Ok(Step::Continue);
        }
        if Rc::ptr_eq(&type_ref, &self.builtins.map) {
            self.stack.push(Value::map(IndexMap::new()));
            return Ok(Step::Continue);
        }
        if self.is_sealed(&type_ref) {
            return Err(ScriptError::type_mismatch("instantiate", type_ref.name()).into());
        }

        let obj = Value::Object(Rc::new(ExtObject::instantiate(&type_ref)));
        if resolver::resolve(&obj, "_constructor", &self.builtins).is_none() {
            self.stack.push(obj);
            return Ok(Step::Continue);
        }
        let ctx = AccessContext::within(obj.clone());
        let constructor = resolver::find_method(&obj, "_constructor", &ctx, &self.builtins)?;
        self.call_and_continue(&constructor, Some(obj.clone()), args, Some(obj))
    }
}

/// `container[index]`; out-of-range reads give void
fn read_index(container: &Value, index: &Value) -> Result<Value, ScriptError> {
    match container {
        Value::Array(items) => {
            if index.as_number().is_none() {
                return Err(ScriptError::type_mismatch("array index", index.kind_name()));
            }
            Ok(index
                .as_index()
                .and_then(|i| items.borrow().get(i).cloned())
                .unwrap_or(Value::Void))
        }
        Value::Map(entries) => {
            let key = index
                .as_map_key()
                .ok_or_else(|| ScriptError::type_mismatch("map key", index.kind_name()))?;
            Ok(entries.borrow().get(&key).cloned().unwrap_or(Value::Void))
        }
        Value::String(s) => {
            if index.as_number().is_none() {
                return Err(ScriptError::type_mismatch("string index", index.kind_name()));
            }
            Ok(index
                .as_index()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::string(c.encode_utf8(&mut [0; 4])))
                .unwrap_or(Value::Void))
        }
        other => Err(ScriptError::type_mismatch("index", other.kind_name())),
    }
}

/// `container[index] = value`; arrays grow with void
fn write_index(container: &Value, index: &Value, value: Value) -> Result<(), ScriptError> {
    match container {
        Value::Array(items) => {
            let i = index
                .as_index()
                .ok_or_else(|| ScriptError::type_mismatch("array index", index.kind_name()))?;
            store_index(items, i, value)
        }
        Value::Map(entries) => {
            let key = index
                .as_map_key()
                .ok_or_else(|| ScriptError::type_mismatch("map key", index.kind_name()))?;
            entries.borrow_mut().insert(key, value);
            Ok(())
        }
        other => Err(ScriptError::type_mismatch("index assignment", other.kind_name())),
    }
}
