//! Bytecode system for the script engine
//!
//! This crate provides the instruction set, instruction blocks, function
//! templates and compiled fragments that the (external) compiler produces
//! and the execution engine consumes.
//!
//! # Features
//!
//! - Stack-machine opcode set with small-integer operands
//! - Instruction blocks with constant pool and nested function templates
//! - Arity metadata with defaulted and variadic tails
//! - Structural verification of compiled fragments
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Arity, CompiledFragment, Constant, FunctionTemplate, InstructionBlock, Opcode, Verifier};
//!
//! let mut block = InstructionBlock::new();
//! let idx = block.add_constant(Constant::Number(42.0));
//! block.emit(Opcode::PushConstant(idx));
//! block.emit(Opcode::Return);
//!
//! let fragment = CompiledFragment::new("answer", FunctionTemplate::new(None, block, Arity::fixed(0)));
//! assert!(Verifier::verify_fragment(&fragment).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod constant;
pub mod instruction;
pub mod opcode;
pub mod template;
pub mod verifier;

// Re-export main types at crate root
pub use block::InstructionBlock;
pub use constant::Constant;
pub use instruction::Instruction;
pub use opcode::{AttributeFlags, LocalId, Opcode};
pub use template::{Arity, CompiledFragment, FunctionTemplate};
pub use verifier::Verifier;
