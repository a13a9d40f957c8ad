//! Source position and stack frame types for error diagnostics.

use std::fmt;

/// Represents a position in source code.
///
/// # Examples
///
/// ```
/// use core_types::SourcePosition;
///
/// let pos = SourcePosition::new(10, 5);
/// assert_eq!(pos.line, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based, 0 when unknown)
    pub column: u32,
}

impl SourcePosition {
    /// Create a new source position
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Position known only by line
    pub fn line(line: u32) -> Self {
        Self { line, column: 0 }
    }
}

/// A single frame in a script call stack.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("extract".to_string()),
///     source_url: Some("queue.escript".to_string()),
///     line: 25,
/// };
///
/// assert_eq!(frame.to_string(), "extract (queue.escript:25)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for anonymous functions
    pub function_name: Option<String>,
    /// Name of the source fragment, or None if not available
    pub source_url: Option<String>,
    /// Line that was executing in this frame
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<anonymous>");
        match &self.source_url {
            Some(url) => write!(f, "{} ({}:{})", name, url, self.line),
            None => write!(f, "{} (line {})", name, self.line),
        }
    }
}
