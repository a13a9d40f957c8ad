//! Function templates and compiled fragments
//!
//! A [`FunctionTemplate`] is what the compiler hands over for one function
//! body: the instruction block plus arity metadata. A [`CompiledFragment`]
//! groups the top-level template of one source fragment with the static
//! variable names declared anywhere inside it.

use std::rc::Rc;

use crate::block::InstructionBlock;

/// Parameter arity metadata
///
/// Arguments fill slots `0..positional_limit()`. With a variadic marker the
/// remaining arguments are collected into an array bound to the marker slot;
/// without one they are discarded.
///
/// ```
/// use bytecode_system::Arity;
///
/// let arity = Arity::new(2, 1, 2);
/// assert!(!arity.admits(0));
/// assert!(arity.admits(3));
/// assert_eq!(arity.positional_limit(), 2);
///
/// let rest = Arity::new(2, 1, 1).with_variadic(1);
/// assert_eq!(rest.max_bound(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    /// Number of declared parameters (slots reserved for them)
    pub param_count: usize,
    /// Minimum number of arguments a call must supply
    pub min_args: usize,
    /// Maximum number of positional arguments bound to parameter slots
    pub max_args: usize,
    /// Slot collecting the variadic tail; a slot at or past `param_count`
    /// marks a tail whose values are ignored
    pub variadic: Option<usize>,
}

impl Arity {
    /// `count` mandatory parameters
    pub fn fixed(count: usize) -> Self {
        Self {
            param_count: count,
            min_args: count,
            max_args: count,
            variadic: None,
        }
    }

    /// Parameters with defaulted tail: `min_args..=max_args` arguments
    pub fn new(param_count: usize, min_args: usize, max_args: usize) -> Self {
        Self {
            param_count,
            min_args,
            max_args,
            variadic: None,
        }
    }

    /// Mark `slot` as the variadic parameter
    pub fn with_variadic(mut self, slot: usize) -> Self {
        self.variadic = Some(slot);
        self.max_args = slot;
        self
    }

    /// Number of arguments bound one-to-one to parameter slots
    pub fn positional_limit(&self) -> usize {
        self.variadic.unwrap_or(self.max_args)
    }

    /// Upper bound on useful arguments, `None` for variadic functions
    pub fn max_bound(&self) -> Option<usize> {
        match self.variadic {
            Some(_) => None,
            None => Some(self.max_args),
        }
    }

    /// Whether a call with `argc` arguments satisfies the minimum
    pub fn admits(&self, argc: usize) -> bool {
        argc >= self.min_args
    }

    /// Check internal consistency of the counts
    pub fn validate(&self) -> Result<(), String> {
        if self.min_args > self.positional_limit() {
            return Err(format!(
                "minimum argument count {} exceeds positional limit {}",
                self.min_args,
                self.positional_limit()
            ));
        }
        if self.positional_limit() > self.param_count {
            return Err(format!(
                "positional limit {} exceeds parameter count {}",
                self.positional_limit(),
                self.param_count
            ));
        }
        Ok(())
    }
}

/// Compiled function body plus metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTemplate {
    /// Declared name, if any
    pub name: Option<String>,
    /// Function body
    pub block: InstructionBlock,
    /// Parameter metadata
    pub arity: Arity,
    /// Source line of the declaration
    pub line: u32,
}

impl FunctionTemplate {
    /// Create a template from a block and arity
    pub fn new(name: Option<&str>, block: InstructionBlock, arity: Arity) -> Self {
        Self {
            name: name.map(str::to_string),
            block,
            arity,
            line: 0,
        }
    }

    /// Set the declaration line
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Number of local slots a frame for this template needs
    pub fn frame_size(&self) -> usize {
        (self.block.local_count as usize).max(self.arity.param_count)
    }

    /// Display name for diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

/// The compiler's output for one source fragment
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFragment {
    /// Name of the source (file name or label) for diagnostics
    pub source_name: String,
    /// Top-level function of the fragment
    pub main: Rc<FunctionTemplate>,
    /// Static variables declared anywhere in the fragment, by slot
    pub static_names: Vec<String>,
}

impl CompiledFragment {
    /// Create a fragment without static variables
    pub fn new(source_name: &str, main: FunctionTemplate) -> Self {
        Self {
            source_name: source_name.to_string(),
            main: Rc::new(main),
            static_names: Vec::new(),
        }
    }

    /// Declare a static variable and return its slot
    pub fn declare_static(&mut self, name: &str) -> u32 {
        self.static_names.push(name.to_string());
        (self.static_names.len() - 1) as u32
    }
}
