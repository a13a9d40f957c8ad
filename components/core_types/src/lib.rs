//! Core error and diagnostic types shared by every engine component.
//!
//! This crate has no knowledge of runtime values; it only describes what can
//! go wrong during execution and where.
//!
//! # Overview
//!
//! - [`ErrorKind`] - Category of a failure (arity, attribute miss, ...)
//! - [`ScriptError`] - A failure with message, stack trace and position
//! - [`SourcePosition`] - Source code location
//! - [`StackFrame`] - Call stack frame information
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, ScriptError};
//!
//! let error = ScriptError::attribute_not_found("size", "Number");
//! assert_eq!(error.kind, ErrorKind::AttributeNotFound);
//! assert!(error.kind.is_recoverable());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;

pub use error::{ErrorKind, ScriptError};
pub use source::{SourcePosition, StackFrame};
