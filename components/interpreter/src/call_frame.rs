//! Call frame for function call stack management

use std::rc::Rc;

use object_model::{UserFunction, Value};

/// Catch region registered by `PushTry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryHandler {
    /// Offset of the catch code
    pub target: usize,
    /// Operand stack height when the region was entered
    pub stack_height: usize,
}

/// Call frame representing one active script call
///
/// Frames live in the engine's frame arena; the operand stack segment above
/// `stack_base` belongs to this frame.
#[derive(Debug)]
pub struct CallFrame {
    /// Function being executed
    pub function: Rc<UserFunction>,
    /// Local variable slots, parameters first
    pub locals: Vec<Value>,
    /// Number of parameters the caller supplied positionally
    pub supplied_args: usize,
    /// Receiver bound to the call
    pub this: Value,
    /// Offset of the next instruction
    pub pc: usize,
    /// Operand stack height at frame entry
    pub stack_base: usize,
    /// Active catch regions, innermost last
    pub handlers: Vec<TryHandler>,
    /// Object under construction; replaces the return value
    pub constructing: Option<Value>,
}

impl CallFrame {
    /// Create a frame positioned at the first instruction
    pub fn new(function: Rc<UserFunction>, locals: Vec<Value>, this: Value, stack_base: usize) -> Self {
        Self {
            function,
            locals,
            supplied_args: 0,
            this,
            pc: 0,
            stack_base,
            handlers: Vec::new(),
            constructing: None,
        }
    }

    /// Source line of the instruction being executed
    pub fn current_line(&self) -> u32 {
        let template = self.function.template();
        template
            .block
            .line_at(self.pc.saturating_sub(1))
            .unwrap_or(template.line)
    }
}
