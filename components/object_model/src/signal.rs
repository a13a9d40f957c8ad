//! Non-local outcomes and the callback surface native code runs against

use core_types::ScriptError;

use crate::builtins::BuiltinTypes;
use crate::value::Value;

/// Outcome that unwinds the call chain
///
/// Engine errors and script raises travel separately: an error carries its
/// kind, a raise carries the raised value untouched.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Engine-detected failure
    Error(ScriptError),
    /// Value raised by a script
    Raise(Value),
}

impl Signal {
    /// Whether an enclosing catch region may handle this signal
    pub fn is_catchable(&self) -> bool {
        match self {
            Signal::Error(error) => error.kind.is_recoverable(),
            Signal::Raise(_) => true,
        }
    }
}

impl From<ScriptError> for Signal {
    fn from(error: ScriptError) -> Self {
        Signal::Error(error)
    }
}

/// Callback surface handed to native functions
///
/// Implemented by the execution engine so host code can call back into
/// scripts without knowing the engine type.
pub trait Invoker {
    /// Call any callable value with an optional receiver
    fn call_value(
        &mut self,
        callee: &Value,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, Signal>;

    /// Resolve `name` on `receiver` and call it with `receiver` as `self`
    fn call_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>)
        -> Result<Value, Signal>;

    /// Built-in type registry
    fn builtins(&self) -> &BuiltinTypes;
}
