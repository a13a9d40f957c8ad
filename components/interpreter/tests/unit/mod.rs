//! Unit tests for interpreter components

use bytecode_system::{
    Arity, AttributeFlags, CompiledFragment, Constant, FunctionTemplate, InstructionBlock, LocalId,
    Opcode,
};
use core_types::ErrorKind;
use interpreter::{Engine, EngineConfig, Failure};
use object_model::{resolver, Value};

fn run(engine: &mut Engine, build: impl FnOnce(&mut InstructionBlock)) -> Result<Value, Failure> {
    let mut block = InstructionBlock::with_locals(2);
    build(&mut block);
    let main = FunctionTemplate::new(Some("main"), block, Arity::fixed(0));
    engine.execute_fragment(&CompiledFragment::new("unit", main))
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.max_call_depth, 1024);
    assert_eq!(config.instruction_limit, None);
    assert!(config.verify_fragments);
}

#[test]
fn test_config_from_json() {
    let config =
        EngineConfig::from_json(r#"{ "instruction_limit": 500, "verify_fragments": false }"#).unwrap();
    assert_eq!(config.instruction_limit, Some(500));
    assert!(!config.verify_fragments);
    assert_eq!(config.max_call_depth, 1024);
    assert!(EngineConfig::from_json("{ not json").is_err());
}

// ============================================================================
// Engine state
// ============================================================================

#[test]
fn test_builtin_types_are_globals() {
    let engine = Engine::new();
    for name in ["Object", "Array", "Map", "String", "Number", "Exception", "UserFunction"] {
        match engine.get_global(name) {
            Some(Value::Type(t)) => assert_eq!(t.name(), name),
            other => panic!("{} missing: {:?}", name, other),
        }
    }
}

#[test]
fn test_store_and_load_global() {
    let mut engine = Engine::new();
    let result = run(&mut engine, |b| {
        let name = b.add_name("answer");
        let n = b.add_constant(Constant::Number(42.0));
        b.emit(Opcode::PushConstant(n));
        b.emit(Opcode::StoreGlobal(name));
        b.emit(Opcode::LoadGlobal(name));
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap(), Value::Number(42.0));
    assert_eq!(engine.get_global("answer"), Some(Value::Number(42.0)));
}

#[test]
fn test_unknown_global_is_attribute_not_found() {
    let mut engine = Engine::new();
    let err = run(&mut engine, |b| {
        let name = b.add_name("nowhere");
        b.emit(Opcode::LoadGlobal(name));
        b.emit(Opcode::Return);
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AttributeNotFound);
}

// ============================================================================
// Locals, stack and control flow
// ============================================================================

#[test]
fn test_locals_and_conditional_jumps() {
    let mut engine = Engine::new();
    // x = 3; if !(x < 2) { return "big" } return "small"
    let result = run(&mut engine, |b| {
        let three = b.add_constant(Constant::Number(3.0));
        let two = b.add_constant(Constant::Number(2.0));
        let big = b.add_constant(Constant::String("big".into()));
        let small = b.add_constant(Constant::String("small".into()));
        b.emit(Opcode::PushConstant(three));
        b.emit(Opcode::StoreLocal(LocalId(0)));
        b.emit(Opcode::LoadLocal(LocalId(0)));
        b.emit(Opcode::PushConstant(two));
        b.emit(Opcode::Less);
        b.emit(Opcode::Not);
        b.emit(Opcode::JumpIfTrue(9));
        b.emit(Opcode::PushConstant(small));
        b.emit(Opcode::Return);
        b.emit(Opcode::PushConstant(big));
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap(), Value::string("big"));
}

#[test]
fn test_string_concatenation_and_identity() {
    let mut engine = Engine::new();
    let result = run(&mut engine, |b| {
        let prefix = b.add_constant(Constant::String("n=".into()));
        let n = b.add_constant(Constant::Number(2.5));
        b.emit(Opcode::PushConstant(prefix));
        b.emit(Opcode::PushConstant(n));
        b.emit(Opcode::Add);
        b.emit(Opcode::Dup);
        b.emit(Opcode::Identical);
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap(), Value::Bool(true));
}

#[test]
fn test_return_with_empty_stack_is_void() {
    let mut engine = Engine::new();
    let result = run(&mut engine, |b| {
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap(), Value::Void);
}

#[test]
fn test_operand_stack_underflow_is_internal() {
    let mut engine = Engine::new();
    let err = run(&mut engine, |b| {
        b.emit(Opcode::Add);
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn test_array_index_read_write() {
    let mut engine = Engine::new();
    // a = [1, 2]; a[3] = 9; return [a[3], a[10], a.size()]
    let result = run(&mut engine, |b| {
        let one = b.add_constant(Constant::Number(1.0));
        let two = b.add_constant(Constant::Number(2.0));
        let three = b.add_constant(Constant::Number(3.0));
        let nine = b.add_constant(Constant::Number(9.0));
        let ten = b.add_constant(Constant::Number(10.0));
        let size = b.add_name("size");
        b.emit(Opcode::PushConstant(one));
        b.emit(Opcode::PushConstant(two));
        b.emit(Opcode::CreateArray(2));
        b.emit(Opcode::StoreLocal(LocalId(0)));
        b.emit(Opcode::LoadLocal(LocalId(0)));
        b.emit(Opcode::PushConstant(three));
        b.emit(Opcode::PushConstant(nine));
        b.emit(Opcode::SetIndex);
        b.emit(Opcode::LoadLocal(LocalId(0)));
        b.emit(Opcode::PushConstant(three));
        b.emit(Opcode::GetIndex);
        b.emit(Opcode::LoadLocal(LocalId(0)));
        b.emit(Opcode::PushConstant(ten));
        b.emit(Opcode::GetIndex);
        b.emit(Opcode::LoadLocal(LocalId(0)));
        b.emit(Opcode::CallMethod(size, 0));
        b.emit(Opcode::CreateArray(3));
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap().to_string(), "[9, void, 4]");
}

#[test]
fn test_array_store_far_past_end_is_recoverable() {
    let mut engine = Engine::new();
    // try { [][1e300] = 1 } catch (e) { return e.kind }
    let result = run(&mut engine, |b| {
        let huge = b.add_constant(Constant::Number(1e300));
        let one = b.add_constant(Constant::Number(1.0));
        let kind = b.add_name("kind");
        let handler = b.emit(Opcode::PushTry(0));
        b.emit(Opcode::CreateArray(0));
        b.emit(Opcode::PushConstant(huge));
        b.emit(Opcode::PushConstant(one));
        b.emit(Opcode::SetIndex);
        b.emit(Opcode::PopTry);
        b.emit(Opcode::PushVoid);
        b.emit(Opcode::Return);
        let target = b.next_offset();
        b.patch_jump(handler, target);
        b.emit(Opcode::GetAttribute(kind));
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap(), Value::string("TypeMismatchError"));

    let array = Value::array(vec![]);
    let err = engine
        .call_method(&array, "set", vec![Value::Number(1e12), Value::Void])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatchError);
    assert_eq!(
        engine.call_method(&array, "size", vec![]).unwrap(),
        Value::Number(0.0)
    );
}

#[test]
fn test_map_literal_and_lookup() {
    let mut engine = Engine::new();
    let result = run(&mut engine, |b| {
        let k1 = b.add_constant(Constant::String("a".into()));
        let v1 = b.add_constant(Constant::Number(1.0));
        let k2 = b.add_constant(Constant::String("b".into()));
        let v2 = b.add_constant(Constant::Number(2.0));
        b.emit(Opcode::PushConstant(k1));
        b.emit(Opcode::PushConstant(v1));
        b.emit(Opcode::PushConstant(k2));
        b.emit(Opcode::PushConstant(v2));
        b.emit(Opcode::CreateMap(2));
        b.emit(Opcode::PushConstant(k2));
        b.emit(Opcode::GetIndex);
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap(), Value::Number(2.0));
}

#[test]
fn test_map_key_must_be_primitive() {
    let mut engine = Engine::new();
    let err = run(&mut engine, |b| {
        b.emit(Opcode::CreateArray(0));
        b.emit(Opcode::PushVoid);
        b.emit(Opcode::CreateMap(1));
        b.emit(Opcode::Return);
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatchError);
}

// ============================================================================
// Types and traits built by bytecode
// ============================================================================

#[test]
fn test_create_type_with_base_and_trait() {
    let mut engine = Engine::new();
    // trait Named { label = "named" }
    // type Shape; type Square : Shape with Named
    // return Square.new() instanceof Shape
    let result = run(&mut engine, |b| {
        let named = b.add_name("Named");
        let label = b.add_name("label");
        let text = b.add_constant(Constant::String("named".into()));
        let shape = b.add_name("Shape");
        let square = b.add_name("Square");
        b.emit(Opcode::CreateTrait(named));
        b.emit(Opcode::PushConstant(text));
        b.emit(Opcode::DefineAttribute(label, AttributeFlags::NONE));
        b.emit(Opcode::StoreGlobal(named));
        b.emit(Opcode::CreateType { name: shape, has_base: false });
        b.emit(Opcode::StoreGlobal(shape));
        b.emit(Opcode::LoadGlobal(shape));
        b.emit(Opcode::CreateType { name: square, has_base: true });
        b.emit(Opcode::LoadGlobal(named));
        b.emit(Opcode::ComposeTrait);
        b.emit(Opcode::StoreGlobal(square));
        b.emit(Opcode::LoadGlobal(square));
        b.emit(Opcode::Instantiate(0));
        b.emit(Opcode::Dup);
        b.emit(Opcode::StoreLocal(LocalId(0)));
        b.emit(Opcode::LoadGlobal(shape));
        b.emit(Opcode::IsInstanceOf);
        b.emit(Opcode::Return);
    });
    assert_eq!(result.unwrap(), Value::Bool(true));

    let square = match engine.get_global("Square") {
        Some(Value::Type(t)) => t,
        other => panic!("expected type, got {:?}", other),
    };
    let chain: Vec<_> = resolver::type_chain_of(&square)
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(chain, vec!["Square", "Shape", "Object"]);
    assert_eq!(
        engine.get_attribute(&Value::Type(square), "label").unwrap(),
        Value::string("named")
    );
}

#[test]
fn test_compose_requires_type_and_trait() {
    let mut engine = Engine::new();
    let err = run(&mut engine, |b| {
        b.emit(Opcode::PushVoid);
        b.emit(Opcode::PushVoid);
        b.emit(Opcode::ComposeTrait);
        b.emit(Opcode::Return);
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatchError);
}

#[test]
fn test_instanceof_requires_type() {
    let mut engine = Engine::new();
    let err = run(&mut engine, |b| {
        b.emit(Opcode::PushTrue);
        b.emit(Opcode::PushTrue);
        b.emit(Opcode::IsInstanceOf);
        b.emit(Opcode::Return);
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatchError);
}

#[test]
fn test_host_declared_trait_and_type() {
    let mut engine = Engine::new();
    let greeter = engine.declare_trait("Greeter");
    greeter.define("greeting", Value::string("hello"), AttributeFlags::NONE);
    let person = engine.declare_type("Person", None);
    engine.compose_trait(&person, &greeter);
    greeter.define("late", Value::Void, AttributeFlags::NONE);

    assert!(matches!(engine.get_global("Greeter"), Some(Value::Trait(_))));
    let t = Value::Type(person);
    assert_eq!(engine.get_attribute(&t, "greeting").unwrap(), Value::string("hello"));
    assert_eq!(
        engine.get_attribute(&t, "late").unwrap_err().kind(),
        ErrorKind::AttributeNotFound
    );

    engine.set_attribute(&t, "greeting", Value::string("hi")).unwrap();
    assert_eq!(engine.get_attribute(&t, "greeting").unwrap(), Value::string("hi"));
}

#[test]
fn test_constant_attribute_rejects_assignment() {
    let mut engine = Engine::new();
    let t = engine.declare_type("Config", None);
    t.define("VERSION", Value::Number(1.0), AttributeFlags::CONSTANT);
    let err = engine
        .set_attribute(&Value::Type(t), "VERSION", Value::Number(2.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessError);
}
