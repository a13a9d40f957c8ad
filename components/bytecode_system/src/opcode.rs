//! Bytecode opcodes for the stack machine
//!
//! Defines all instructions understood by the execution engine. Operands are
//! small integers: local slot ids, static slot ids, constant-pool indices,
//! jump targets and argument counts.

/// Local variable slot identifier within a call frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

/// Declaration flags carried by `DefineAttribute`
///
/// ```
/// use bytecode_system::AttributeFlags;
///
/// let flags = AttributeFlags::PRIVATE.with(AttributeFlags::CONSTANT);
/// assert!(flags.private && flags.constant && !flags.init);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttributeFlags {
    /// Only accessible from method bodies of the defining type
    pub private: bool,
    /// Cannot be reassigned after definition
    pub constant: bool,
    /// Per-instance data slot, copied into every new instance of the type
    pub init: bool,
}

impl AttributeFlags {
    /// Public, mutable, type-level attribute
    pub const NONE: AttributeFlags = AttributeFlags {
        private: false,
        constant: false,
        init: false,
    };
    /// Private attribute
    pub const PRIVATE: AttributeFlags = AttributeFlags {
        private: true,
        constant: false,
        init: false,
    };
    /// Constant attribute
    pub const CONSTANT: AttributeFlags = AttributeFlags {
        private: false,
        constant: true,
        init: false,
    };
    /// Per-instance data slot
    pub const INIT: AttributeFlags = AttributeFlags {
        private: false,
        constant: false,
        init: true,
    };

    /// Union of two flag sets
    pub fn with(self, other: AttributeFlags) -> AttributeFlags {
        AttributeFlags {
            private: self.private || other.private,
            constant: self.constant || other.constant,
            init: self.init || other.init,
        }
    }
}

/// Bytecode opcodes
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    // Literals
    /// Push constant from the constant pool at given index
    PushConstant(usize),
    /// Push the void value
    PushVoid,
    /// Push boolean true
    PushTrue,
    /// Push boolean false
    PushFalse,

    // Variables
    /// Push local slot value
    LoadLocal(LocalId),
    /// Pop into local slot
    StoreLocal(LocalId),
    /// Push the receiver bound to the current call
    LoadThis,
    /// Push static slot value (void while unset)
    LoadStatic(u32),
    /// Pop into static slot
    StoreStatic(u32),
    /// Jump to target if the static slot has been assigned
    JumpIfStaticInitialized {
        /// Static slot to test
        slot: u32,
        /// Jump target
        target: usize,
    },
    /// Push global variable named by a string constant
    LoadGlobal(usize),
    /// Pop into global variable named by a string constant
    StoreGlobal(usize),

    // Attributes
    /// Resolve attribute named by a string constant on the popped value
    GetAttribute(usize),
    /// Pop value and target, assign target.name = value
    SetAttribute(usize),
    /// Pop value, define attribute with flags on target, leave target
    DefineAttribute(usize, AttributeFlags),
    /// Pop index and container, push element
    GetIndex,
    /// Pop value, index and container, store element
    SetIndex,

    // Arithmetic and comparison
    /// Add top two values (`+`)
    Add,
    /// Subtract top from second-top (`-`)
    Sub,
    /// Multiply (`*`)
    Mul,
    /// Divide second-top by top (`/`)
    Div,
    /// Remainder (`%`)
    Mod,
    /// Negate top value (`-_`)
    Neg,
    /// Logical NOT of truthiness
    Not,
    /// Equality (`==`)
    Equal,
    /// Inequality (`!=`)
    NotEqual,
    /// Identity comparison (`===`)
    Identical,
    /// Less than (`<`)
    Less,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    Greater,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Pop type and value, push whether value's type chain contains type
    IsInstanceOf,

    // Control flow
    /// Unconditional jump to offset
    Jump(usize),
    /// Pop, jump to offset if truthy
    JumpIfTrue(usize),
    /// Pop, jump to offset if falsy
    JumpIfFalse(usize),
    /// Jump to target if the caller supplied the given parameter
    JumpIfArgumentSupplied {
        /// Parameter index
        param: u32,
        /// Jump target
        target: usize,
    },
    /// Return top of stack (or void) to the caller
    Return,

    // Calls and construction
    /// Call callee below the given number of arguments
    Call(u8),
    /// Call method named by a string constant on the receiver below the arguments
    CallMethod(usize, u8),
    /// Construct an instance of the type below the arguments
    Instantiate(u8),
    /// Create array from the given number of stack values
    CreateArray(usize),
    /// Create mapping from the given number of key/value pairs
    CreateMap(usize),
    /// Instantiate nested function template, sharing the current static data
    CreateClosure(usize),
    /// Create a type named by a string constant, popping a base type if requested
    CreateType {
        /// Constant index of the type name
        name: usize,
        /// Whether a base type is on the stack
        has_base: bool,
    },
    /// Create an empty trait bundle named by a string constant
    CreateTrait(usize),
    /// Pop trait and type, copy trait attributes into type, leave type
    ComposeTrait,

    // Exception handling
    /// Pop value from stack and raise it
    Throw,
    /// Register a catch region handler at the given offset
    PushTry(usize),
    /// Remove the innermost catch region handler
    PopTry,

    // Stack
    /// Discard top of stack
    Pop,
    /// Duplicate top of stack
    Dup,
}

impl Opcode {
    /// Check if this opcode is a terminator (ends basic block)
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Opcode::Return
                | Opcode::Jump(_)
                | Opcode::JumpIfTrue(_)
                | Opcode::JumpIfFalse(_)
                | Opcode::JumpIfArgumentSupplied { .. }
                | Opcode::JumpIfStaticInitialized { .. }
                | Opcode::Throw
        )
    }

    /// Check if this opcode is an unconditional terminator
    pub fn is_unconditional_terminator(&self) -> bool {
        matches!(self, Opcode::Return | Opcode::Jump(_) | Opcode::Throw)
    }

    /// Jump target carried by this opcode, if any
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Opcode::Jump(target)
            | Opcode::JumpIfTrue(target)
            | Opcode::JumpIfFalse(target)
            | Opcode::PushTry(target)
            | Opcode::JumpIfArgumentSupplied { target, .. }
            | Opcode::JumpIfStaticInitialized { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Constant-pool index of a name operand, if any
    pub fn name_operand(&self) -> Option<usize> {
        match self {
            Opcode::LoadGlobal(idx)
            | Opcode::StoreGlobal(idx)
            | Opcode::GetAttribute(idx)
            | Opcode::SetAttribute(idx)
            | Opcode::DefineAttribute(idx, _)
            | Opcode::CallMethod(idx, _)
            | Opcode::CreateTrait(idx)
            | Opcode::CreateType { name: idx, .. } => Some(*idx),
            _ => None,
        }
    }

    /// Operator method name used when an operand is not a primitive
    pub fn operator_name(&self) -> Option<&'static str> {
        Some(match self {
            Opcode::Add => "+",
            Opcode::Sub => "-",
            Opcode::Mul => "*",
            Opcode::Div => "/",
            Opcode::Mod => "%",
            Opcode::Neg => "-_",
            Opcode::Equal => "==",
            Opcode::Less => "<",
            Opcode::LessEqual => "<=",
            Opcode::Greater => ">",
            Opcode::GreaterEqual => ">=",
            _ => return None,
        })
    }
}
