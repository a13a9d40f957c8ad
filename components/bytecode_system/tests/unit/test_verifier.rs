//! Unit tests for the fragment verifier

use bytecode_system::{
    Arity, CompiledFragment, Constant, FunctionTemplate, InstructionBlock, LocalId, Opcode,
    Verifier,
};
use core_types::{ErrorKind, SourcePosition};

fn fragment_with(block: InstructionBlock, arity: Arity) -> CompiledFragment {
    CompiledFragment::new("verify", FunctionTemplate::new(Some("main"), block, arity))
}

#[test]
fn test_static_slots_come_from_fragment() {
    let mut block = InstructionBlock::new();
    block.emit(Opcode::JumpIfStaticInitialized { slot: 0, target: 2 });
    block.emit(Opcode::PushVoid);
    let mut fragment = fragment_with(block, Arity::fixed(0));
    assert!(Verifier::verify_fragment(&fragment).is_err());

    let mut fixed = fragment_with((*fragment.main).block.clone(), Arity::fixed(0));
    fixed.declare_static("cache");
    assert!(Verifier::verify_fragment(&fixed).is_ok());

    fragment.declare_static("other");
    assert!(Verifier::verify_fragment(&fragment).is_ok());
}

#[test]
fn test_argument_test_needs_declared_parameter() {
    let mut block = InstructionBlock::new();
    block.emit(Opcode::JumpIfArgumentSupplied { param: 1, target: 1 });
    assert!(Verifier::verify_fragment(&fragment_with(block.clone(), Arity::fixed(1))).is_err());
    assert!(Verifier::verify_fragment(&fragment_with(block, Arity::new(2, 1, 2))).is_ok());
}

#[test]
fn test_parameters_count_as_locals() {
    let mut block = InstructionBlock::new();
    block.emit(Opcode::LoadLocal(LocalId(1)));
    block.emit(Opcode::Return);
    assert!(Verifier::verify_fragment(&fragment_with(block, Arity::fixed(2))).is_ok());
}

#[test]
fn test_error_carries_position() {
    let mut block = InstructionBlock::new();
    block.emit(Opcode::PushVoid);
    block.emit_with_position(Opcode::Jump(40), SourcePosition::new(6, 3));
    let err = Verifier::verify_fragment(&fragment_with(block, Arity::fixed(0))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
    assert_eq!(err.line(), Some(6));
    assert!(err.message.contains("main @1"));
}

#[test]
fn test_constant_index_out_of_range() {
    let mut block = InstructionBlock::new();
    block.add_constant(Constant::Number(1.0));
    block.emit(Opcode::PushConstant(1));
    assert!(Verifier::verify_fragment(&fragment_with(block, Arity::fixed(0))).is_err());
}

#[test]
fn test_nesting_depth_limit() {
    let mut template = FunctionTemplate::new(None, InstructionBlock::new(), Arity::fixed(0));
    for _ in 0..3 {
        let mut block = InstructionBlock::new();
        let idx = block.add_nested_function(template);
        block.emit(Opcode::CreateClosure(idx));
        template = FunctionTemplate::new(None, block, Arity::fixed(0));
    }
    assert!(Verifier::new(0).with_max_depth(3).verify(&template).is_ok());
    assert!(Verifier::new(0).with_max_depth(2).verify(&template).is_err());
}
