//! Script error types and error handling.
//!
//! Every failure the engine can report is a [`ScriptError`] tagged with an
//! [`ErrorKind`]. Errors are scoped to the call chain that produced them and
//! never poison unrelated interpreter state.

use std::fmt;

use crate::{SourcePosition, StackFrame};

/// The kind of a script-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Argument count outside the declared bounds of a callable
    ArityError,
    /// Attribute resolution chain exhausted without a match
    AttributeNotFound,
    /// Visibility or mutability violation on attribute access
    AccessError,
    /// Built-in operation given an operand of an unsupported kind
    TypeMismatchError,
    /// Explicit raise from script code, converted to an error
    UserRaisedException,
    /// A raise that left the outermost call without a matching catch
    UnhandledException,
    /// Malformed instruction stream or exceeded engine limit
    InternalError,
}

impl ErrorKind {
    /// Returns the name exposed to scripts (e.g. on caught exception objects).
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::ArityError => "ArityError",
            ErrorKind::AttributeNotFound => "AttributeNotFound",
            ErrorKind::AccessError => "AccessError",
            ErrorKind::TypeMismatchError => "TypeMismatchError",
            ErrorKind::UserRaisedException => "UserRaisedException",
            ErrorKind::UnhandledException => "UnhandledException",
            ErrorKind::InternalError => "InternalError",
        }
    }

    /// Whether an enclosing catch region in the same call chain may handle
    /// an error of this kind.
    ///
    /// ```
    /// use core_types::ErrorKind;
    ///
    /// assert!(ErrorKind::ArityError.is_recoverable());
    /// assert!(!ErrorKind::UnhandledException.is_recoverable());
    /// assert!(!ErrorKind::InternalError.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ErrorKind::UnhandledException | ErrorKind::InternalError
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script failure with message, stack trace and source position.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, ScriptError, SourcePosition};
///
/// let error = ScriptError::new(ErrorKind::TypeMismatchError, "cannot add Void")
///     .with_position(SourcePosition::new(12, 4));
///
/// assert_eq!(error.line(), Some(12));
/// assert_eq!(error.to_string(), "TypeMismatchError: cannot add Void");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ScriptError {
    /// The category of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Frames unwound while the error propagated, innermost first
    pub stack: Vec<StackFrame>,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
}

impl ScriptError {
    /// Create an error without position or stack information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
            source_position: None,
        }
    }

    /// Argument count outside `[min, max]`.
    pub fn arity(callee: &str, min: usize, max: Option<usize>, given: usize) -> Self {
        let expected = match max {
            Some(max) if max == min => format!("{}", min),
            Some(max) => format!("{} to {}", min, max),
            None => format!("at least {}", min),
        };
        Self::new(
            ErrorKind::ArityError,
            format!(
                "'{}' expects {} argument(s), {} given",
                callee, expected, given
            ),
        )
    }

    /// Attribute `name` could not be resolved on a value of type `on`.
    pub fn attribute_not_found(name: &str, on: &str) -> Self {
        Self::new(
            ErrorKind::AttributeNotFound,
            format!("attribute '{}' not found on {}", name, on),
        )
    }

    /// Visibility or mutability violation on attribute `name`.
    pub fn access(name: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::AccessError,
            format!("cannot access attribute '{}': {}", name, reason),
        )
    }

    /// Operation `op` does not support an operand of type `found`.
    pub fn type_mismatch(op: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatchError,
            format!("'{}' is not supported for {}", op, found),
        )
    }

    /// Malformed instruction stream or engine limit.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Attach the position where the error occurred, unless one is set.
    pub fn with_position(mut self, position: SourcePosition) -> Self {
        if self.source_position.is_none() {
            self.source_position = Some(position);
        }
        self
    }

    /// Record a frame the error unwound through.
    pub fn push_frame(&mut self, frame: StackFrame) {
        self.stack.push(frame);
    }

    /// Source line of the error, if known.
    pub fn line(&self) -> Option<u32> {
        self.source_position.as_ref().map(|pos| pos.line)
    }
}
