//! Native methods of the built-in types

use std::rc::Rc;

use core_types::{ErrorKind, ScriptError};
use object_model::{
    resolver, AccessContext, BuiltinTypes, Invoker, Signal, StaticData, UserFunction, Value,
};

/// Invoker for natives that never call back into scripts
struct Detached {
    builtins: BuiltinTypes,
}

impl Invoker for Detached {
    fn call_value(
        &mut self,
        _callee: &Value,
        _this: Option<Value>,
        _args: Vec<Value>,
    ) -> Result<Value, Signal> {
        Err(ScriptError::internal("no engine").into())
    }

    fn call_method(
        &mut self,
        _receiver: &Value,
        _name: &str,
        _args: Vec<Value>,
    ) -> Result<Value, Signal> {
        Err(ScriptError::internal("no engine").into())
    }

    fn builtins(&self) -> &BuiltinTypes {
        &self.builtins
    }
}

fn call(inv: &mut Detached, receiver: &Value, name: &str, args: &[Value]) -> Result<Value, Signal> {
    let method = resolver::find_method(receiver, name, &AccessContext::host(), &inv.builtins)?;
    match method {
        Value::Native(native) => native.invoke(inv, receiver, args),
        other => panic!("{} is not native: {:?}", name, other),
    }
}

fn ok(result: Result<Value, Signal>) -> Value {
    match result {
        Ok(v) => v,
        Err(signal) => panic!("unexpected signal {:?}", signal),
    }
}

fn error_kind(result: Result<Value, Signal>) -> ErrorKind {
    match result {
        Err(Signal::Error(e)) => e.kind,
        other => panic!("expected error, got {:?}", other),
    }
}

#[test]
fn test_array_methods() {
    let mut inv = Detached { builtins: BuiltinTypes::new() };
    let arr = Value::array(vec![]);
    ok(call(&mut inv, &arr, "push", &[Value::Number(1.0), Value::Number(2.0)]));
    assert_eq!(ok(call(&mut inv, &arr, "size", &[])), Value::Number(2.0));
    assert_eq!(ok(call(&mut inv, &arr, "get", &[Value::Number(9.0)])), Value::Void);
    ok(call(&mut inv, &arr, "set", &[Value::Number(3.0), Value::Bool(true)]));
    assert_eq!(ok(call(&mut inv, &arr, "size", &[])), Value::Number(4.0));
    assert_eq!(ok(call(&mut inv, &arr, "pop", &[])), Value::Bool(true));
    assert_eq!(ok(call(&mut inv, &arr, "get", &[Value::Number(2.0)])), Value::Void);
}

#[test]
fn test_native_arity_bounds() {
    let mut inv = Detached { builtins: BuiltinTypes::new() };
    let arr = Value::array(vec![]);
    assert_eq!(error_kind(call(&mut inv, &arr, "push", &[])), ErrorKind::ArityError);
    assert_eq!(
        error_kind(call(&mut inv, &arr, "size", &[Value::Void])),
        ErrorKind::ArityError
    );
}

#[test]
fn test_map_methods() {
    let mut inv = Detached { builtins: BuiltinTypes::new() };
    let map = Value::map(Default::default());
    ok(call(&mut inv, &map, "set", &[Value::string("b"), Value::Number(1.0)]));
    ok(call(&mut inv, &map, "set", &[Value::string("a"), Value::Number(2.0)]));
    assert_eq!(ok(call(&mut inv, &map, "contains", &[Value::string("a")])), Value::Bool(true));
    assert_eq!(ok(call(&mut inv, &map, "get", &[Value::string("z")])), Value::Void);
    assert_eq!(ok(call(&mut inv, &map, "keys", &[])).to_string(), "[b, a]");
    assert_eq!(
        error_kind(call(&mut inv, &map, "get", &[Value::array(vec![])])),
        ErrorKind::TypeMismatchError
    );
}

#[test]
fn test_type_introspection_methods() {
    let mut inv = Detached { builtins: BuiltinTypes::new() };
    let number_type = ok(call(&mut inv, &Value::Number(3.0), "getType", &[]));
    assert_eq!(ok(call(&mut inv, &number_type, "getName", &[])), Value::string("Number"));
    let base = ok(call(&mut inv, &number_type, "getBaseType", &[]));
    assert_eq!(ok(call(&mut inv, &base, "getName", &[])), Value::string("Object"));
    assert_eq!(ok(call(&mut inv, &base, "getBaseType", &[])), Value::Void);
    assert_eq!(
        ok(call(&mut inv, &Value::string("x"), "isA", &[base])),
        Value::Bool(true)
    );
}

#[test]
fn test_function_introspection_methods() {
    use bytecode_system::{Arity, FunctionTemplate, InstructionBlock};

    let mut inv = Detached { builtins: BuiltinTypes::new() };
    let template = FunctionTemplate::new(
        Some("f"),
        InstructionBlock::new(),
        Arity::new(3, 1, 3).with_variadic(2),
    )
    .at_line(17);
    let func = Value::Function(Rc::new(UserFunction::instantiate(
        Rc::new(template),
        Rc::new(StaticData::default()),
    )));
    assert_eq!(ok(call(&mut inv, &func, "getParamCount", &[])), Value::Number(3.0));
    assert_eq!(ok(call(&mut inv, &func, "getMinParamCount", &[])), Value::Number(1.0));
    assert_eq!(ok(call(&mut inv, &func, "getMaxParamCount", &[])), Value::Number(-1.0));
    assert_eq!(ok(call(&mut inv, &func, "getMultiParam", &[])), Value::Number(2.0));
    assert_eq!(ok(call(&mut inv, &func, "getLine", &[])), Value::Number(17.0));
}

#[test]
fn test_function_clone_shares_block_and_static_data() {
    use bytecode_system::{Arity, AttributeFlags, FunctionTemplate, InstructionBlock};

    let mut inv = Detached { builtins: BuiltinTypes::new() };
    let template = FunctionTemplate::new(Some("f"), InstructionBlock::new(), Arity::fixed(0));
    let original = Rc::new(UserFunction::instantiate(
        Rc::new(template),
        Rc::new(StaticData::new(vec!["s".to_string()])),
    ));
    original.define("tag", Value::string("a"), AttributeFlags::NONE);
    let func = Value::Function(original.clone());

    match ok(call(&mut inv, &func, "clone", &[])) {
        Value::Function(copy) => {
            assert!(!Rc::ptr_eq(&copy, &original));
            assert!(copy.shares_template(&original));
            assert!(copy.shares_static_data(&original));
            copy.assign("tag", Value::string("b"));
            assert_eq!(original.get_own("tag").map(|a| a.value), Some(Value::string("a")));
        }
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn test_string_length_counts_chars() {
    let mut inv = Detached { builtins: BuiltinTypes::new() };
    assert_eq!(
        ok(call(&mut inv, &Value::string("héllo"), "length", &[])),
        Value::Number(5.0)
    );
}
