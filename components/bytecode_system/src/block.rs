//! Instruction block - compiled body of one function
//!
//! Contains instructions, the constant pool and nested function templates.
//! A block is immutable once handed to the engine and shared by reference
//! between every closure instantiated from it.

use std::rc::Rc;

use core_types::SourcePosition;

use crate::constant::Constant;
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::template::FunctionTemplate;

/// A compiled instruction block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstructionBlock {
    /// Sequence of instructions
    pub instructions: Vec<Instruction>,
    /// Constant pool for literal values and names
    pub constants: Vec<Constant>,
    /// Number of local variable slots a call frame needs
    pub local_count: u32,
    /// Function literals defined inside this block
    pub nested_functions: Vec<Rc<FunctionTemplate>>,
}

impl InstructionBlock {
    /// Create a new empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty block with the given number of local slots
    pub fn with_locals(local_count: u32) -> Self {
        Self {
            local_count,
            ..Self::default()
        }
    }

    /// Emit an instruction without source position, returning its offset
    pub fn emit(&mut self, opcode: Opcode) -> usize {
        self.instructions.push(Instruction::new(opcode));
        self.instructions.len() - 1
    }

    /// Emit an instruction with source position, returning its offset
    pub fn emit_with_position(&mut self, opcode: Opcode, position: SourcePosition) -> usize {
        self.instructions
            .push(Instruction::with_position(opcode, position));
        self.instructions.len() - 1
    }

    /// Offset the next emitted instruction will occupy
    pub fn next_offset(&self) -> usize {
        self.instructions.len()
    }

    /// Add a constant to the constant pool and return its index
    pub fn add_constant(&mut self, value: Constant) -> usize {
        let idx = self.constants.len();
        self.constants.push(value);
        idx
    }

    /// Intern a name as a string constant, reusing an existing entry
    pub fn add_name(&mut self, name: &str) -> usize {
        if let Some(idx) = self
            .constants
            .iter()
            .position(|c| c.as_str() == Some(name))
        {
            return idx;
        }
        self.add_constant(Constant::String(name.to_string()))
    }

    /// Name stored in the constant pool at `idx`
    pub fn name_at(&self, idx: usize) -> Option<&str> {
        self.constants.get(idx).and_then(Constant::as_str)
    }

    /// Add a nested function template and return its index
    pub fn add_nested_function(&mut self, template: FunctionTemplate) -> usize {
        let idx = self.nested_functions.len();
        self.nested_functions.push(Rc::new(template));
        idx
    }

    /// Get a nested function template
    pub fn nested_function(&self, idx: usize) -> Option<&Rc<FunctionTemplate>> {
        self.nested_functions.get(idx)
    }

    /// Rewrite the jump target of the instruction at `at`
    ///
    /// Returns false if `at` does not hold a jump.
    pub fn patch_jump(&mut self, at: usize, new_target: usize) -> bool {
        let Some(inst) = self.instructions.get_mut(at) else {
            return false;
        };
        match &mut inst.opcode {
            Opcode::Jump(target)
            | Opcode::JumpIfTrue(target)
            | Opcode::JumpIfFalse(target)
            | Opcode::PushTry(target)
            | Opcode::JumpIfArgumentSupplied { target, .. }
            | Opcode::JumpIfStaticInitialized { target, .. } => {
                *target = new_target;
                true
            }
            _ => false,
        }
    }

    /// Source line of the instruction at `offset`, if recorded
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.instructions
            .get(offset)
            .and_then(|inst| inst.source_position)
            .map(|pos| pos.line)
    }

    /// Get the number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Get the number of constants
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }
}
