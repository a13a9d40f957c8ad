//! Failures surfaced to the host

use core_types::{ErrorKind, ScriptError, StackFrame};
use object_model::Value;

/// A call that ended in an engine error or an uncaught raise
///
/// For an uncaught raise the kind is `UnhandledException` and `thrown`
/// holds the raised value unchanged.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct Failure {
    /// Kind, message, position and unwound frames
    pub error: ScriptError,
    /// The raised value, for script raises
    pub thrown: Option<Value>,
}

impl Failure {
    /// Failure from an engine error
    pub fn from_error(error: ScriptError) -> Self {
        Self {
            error,
            thrown: None,
        }
    }

    /// Kind of the failure
    pub fn kind(&self) -> ErrorKind {
        self.error.kind
    }

    /// Message of the failure
    pub fn message(&self) -> &str {
        &self.error.message
    }

    /// Source line where the failure originated
    pub fn line(&self) -> Option<u32> {
        self.error.line()
    }

    /// Frames unwound, innermost first
    pub fn stack(&self) -> &[StackFrame] {
        &self.error.stack
    }

    /// The raised value, if this was an uncaught raise
    pub fn thrown(&self) -> Option<&Value> {
        self.thrown.as_ref()
    }
}

impl From<ScriptError> for Failure {
    fn from(error: ScriptError) -> Self {
        Self::from_error(error)
    }
}
