//! API contract tests for object_model
//! Verifies the public surface other components rely on

use std::rc::Rc;

use object_model::{
    break_references, is_instance_of, own_attributes, reference_count, type_chain, type_of,
    Attribute, AttributeFlags, BoundMethod, BuiltinTypes, ExtObject, IdentityRegistry,
    NativeFunction, Signal, StaticData, TraitBundle, TypeObject, Value, WrappedValue,
};

#[test]
fn test_value_variants_exist() {
    let builtins = BuiltinTypes::new();
    let t = Rc::new(TypeObject::new("T", Some(builtins.object.clone())));
    let native = Rc::new(NativeFunction::new("n", 0, None, |_, _, _| Ok(Value::Void)));
    let values = vec![
        Value::Void,
        Value::Bool(true),
        Value::Number(1.0),
        Value::string("s"),
        Value::array(vec![]),
        Value::map(Default::default()),
        Value::Object(Rc::new(ExtObject::new(t.clone()))),
        Value::Native(native.clone()),
        Value::Bound(Rc::new(BoundMethod::new(Value::Void, Value::Native(native)))),
        Value::Type(t.clone()),
        Value::Trait(Rc::new(TraitBundle::new("Tr"))),
        Value::Wrapped(Rc::new(WrappedValue::new(t, 0_u8))),
    ];
    for value in &values {
        // Every value has a live type rooted at Object
        let chain = type_chain(value, &builtins);
        assert!(Rc::ptr_eq(chain.last().unwrap(), &builtins.object));
        assert!(is_instance_of(value, &builtins.object, &builtins));
        assert!(!type_of(value, &builtins).name().is_empty());
    }
}

#[test]
fn test_attribute_fields() {
    let attr = Attribute {
        value: Value::Void,
        flags: AttributeFlags::PRIVATE,
    };
    assert!(attr.is_private());
}

#[test]
fn test_introspection_surface() {
    let t = Rc::new(TypeObject::new("T", None));
    t.define("a", Value::Number(1.0), AttributeFlags::NONE);
    let tv = Value::Type(t);
    assert_eq!(own_attributes(&tv).map(|a| a.len()), Some(1));
    let mut registry = IdentityRegistry::new();
    assert!(registry.register(&tv).is_some());
    assert!(reference_count(&tv) >= 2);
    assert_eq!(break_references(&tv), 1);
}

#[test]
fn test_static_data_is_shared_handle() {
    let data = Rc::new(StaticData::new(vec!["x".to_string()]));
    let other = data.clone();
    data.set(0, Value::Number(1.0)).unwrap();
    assert!(other.is_initialized(0));
}

#[test]
fn test_signal_catchability() {
    use core_types::ScriptError;
    assert!(Signal::Raise(Value::Void).is_catchable());
    assert!(Signal::from(ScriptError::arity("f", 1, Some(1), 0)).is_catchable());
    assert!(!Signal::from(ScriptError::internal("bad")).is_catchable());
}
