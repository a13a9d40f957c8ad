//! Unit tests for InstructionBlock

use bytecode_system::{Arity, Constant, FunctionTemplate, InstructionBlock, Opcode};
use core_types::SourcePosition;

#[test]
fn test_new_block_is_empty() {
    let block = InstructionBlock::new();
    assert_eq!(block.instruction_count(), 0);
    assert_eq!(block.constant_count(), 0);
    assert_eq!(block.local_count, 0);
    assert!(block.nested_functions.is_empty());
}

#[test]
fn test_constants_are_not_deduplicated() {
    let mut block = InstructionBlock::new();
    let a = block.add_constant(Constant::Number(1.0));
    let b = block.add_constant(Constant::Number(1.0));
    assert_ne!(a, b);
    assert_eq!(block.constant_count(), 2);
}

#[test]
fn test_name_interning_skips_non_strings() {
    let mut block = InstructionBlock::new();
    block.add_constant(Constant::Bool(true));
    let idx = block.add_name("push");
    assert_eq!(idx, 1);
    assert_eq!(block.add_name("push"), 1);
    assert_eq!(block.add_name("pop"), 2);
}

#[test]
fn test_nested_functions_are_shared() {
    let mut outer = InstructionBlock::new();
    let idx = outer.add_nested_function(FunctionTemplate::new(
        Some("inner"),
        InstructionBlock::new(),
        Arity::fixed(1),
    ));
    let first = outer.nested_function(idx).cloned();
    let copy = outer.clone();
    let second = copy.nested_function(idx).cloned();
    match (first, second) {
        (Some(a), Some(b)) => assert!(std::rc::Rc::ptr_eq(&a, &b)),
        _ => panic!("nested function missing"),
    }
    assert!(outer.nested_function(idx + 1).is_none());
}

#[test]
fn test_patch_try_and_argument_jumps() {
    let mut block = InstructionBlock::new();
    let try_at = block.emit(Opcode::PushTry(0));
    let arg_at = block.emit(Opcode::JumpIfArgumentSupplied { param: 0, target: 0 });
    assert!(block.patch_jump(try_at, 5));
    assert!(block.patch_jump(arg_at, 4));
    assert_eq!(block.instructions[try_at].opcode.jump_target(), Some(5));
    assert_eq!(block.instructions[arg_at].opcode.jump_target(), Some(4));
    assert!(!block.patch_jump(99, 0));
}

#[test]
fn test_positions_are_recorded() {
    let mut block = InstructionBlock::new();
    block.emit_with_position(Opcode::PushVoid, SourcePosition::new(3, 9));
    assert_eq!(block.instructions[0].source_position, Some(SourcePosition::new(3, 9)));
    assert_eq!(block.line_at(0), Some(3));
    assert_eq!(block.line_at(1), None);
}
