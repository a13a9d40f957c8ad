//! Bytecode interpreter for the script engine
//!
//! This crate provides a stack-machine engine with:
//! - A frame arena and a shared operand stack, with no host recursion on
//!   script-to-script calls
//! - Parameter binding with optional, defaulted and variadic parameters
//! - Catch regions unwinding across frames, with structured failures for
//!   anything left uncaught
//! - Host registration of types, traits, native methods and wrapped values
//! - A frame guard hook and instruction counter for host-side budgets
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Arity, CompiledFragment, Constant, FunctionTemplate, InstructionBlock, LocalId, Opcode};
//! use interpreter::Engine;
//! use object_model::Value;
//!
//! // fn double(x) { return x * 2 }
//! let mut block = InstructionBlock::with_locals(1);
//! let two = block.add_constant(Constant::Number(2.0));
//! block.emit(Opcode::LoadLocal(LocalId(0)));
//! block.emit(Opcode::PushConstant(two));
//! block.emit(Opcode::Mul);
//! block.emit(Opcode::Return);
//!
//! let fragment = CompiledFragment::new("double", FunctionTemplate::new(Some("double"), block, Arity::fixed(1)));
//! let mut engine = Engine::new();
//! let double = engine.load_fragment(&fragment).unwrap();
//! assert_eq!(engine.call(&double, vec![Value::Number(21.0)]).unwrap(), Value::Number(42.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod failure;
pub mod operators;

// Re-export main types at crate root
pub use call_frame::{CallFrame, TryHandler};
pub use config::EngineConfig;
pub use engine::{Engine, FrameGuard};
pub use failure::Failure;
