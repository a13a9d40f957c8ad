//! Visibility and mutability checks on attribute access

use std::rc::Rc;

use core_types::ErrorKind;
use object_model::{
    resolver, AccessContext, AttributeFlags, BuiltinTypes, ExtObject, TypeObject, Value,
};

fn account_type(builtins: &BuiltinTypes) -> Rc<TypeObject> {
    let t = Rc::new(TypeObject::new("Account", Some(builtins.object.clone())));
    t.define(
        "balance",
        Value::Number(0.0),
        AttributeFlags::INIT.with(AttributeFlags::PRIVATE),
    );
    t.define("CURRENCY", Value::string("EUR"), AttributeFlags::CONSTANT);
    t
}

#[test]
fn test_private_hidden_from_host() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    let acc = Value::Object(Rc::new(ExtObject::instantiate(&t)));
    let err = resolver::get_attribute(&acc, "balance", &AccessContext::host(), &builtins)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessError);
    assert!(err.message.contains("private to Account"));
}

#[test]
fn test_private_visible_to_self() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    let acc = Value::Object(Rc::new(ExtObject::instantiate(&t)));
    let ctx = AccessContext::within(acc.clone());
    resolver::set_attribute(&acc, "balance", Value::Number(10.0), &ctx, &builtins).unwrap();
    assert_eq!(
        resolver::get_attribute(&acc, "balance", &ctx, &builtins).unwrap(),
        Value::Number(10.0)
    );
}

#[test]
fn test_private_visible_to_sibling_instance() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    let a = Value::Object(Rc::new(ExtObject::instantiate(&t)));
    let b = Value::Object(Rc::new(ExtObject::instantiate(&t)));
    let ctx = AccessContext::within(a);
    assert!(resolver::get_attribute(&b, "balance", &ctx, &builtins).is_ok());
}

#[test]
fn test_private_hidden_from_unrelated_method() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    let other = Rc::new(TypeObject::new("Auditor", Some(builtins.object.clone())));
    let acc = Value::Object(Rc::new(ExtObject::instantiate(&t)));
    let auditor = Value::Object(Rc::new(ExtObject::instantiate(&other)));
    let ctx = AccessContext::within(auditor);
    let err = resolver::set_attribute(&acc, "balance", Value::Number(1.0), &ctx, &builtins)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessError);
}

#[test]
fn test_private_hidden_from_subtype_method() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    let savings = Rc::new(TypeObject::new("Savings", Some(t.clone())));
    let acc = Value::Object(Rc::new(ExtObject::instantiate(&savings)));

    let err = resolver::get_attribute(&acc, "balance", &AccessContext::within(acc.clone()), &builtins)
        .unwrap_err();
    assert!(err.message.contains("private to Account"));
    let err = resolver::get_attribute(&acc, "balance", &AccessContext::within(Value::Type(savings)), &builtins)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessError);
    assert!(resolver::get_attribute(&acc, "balance", &AccessContext::within(Value::Type(t)), &builtins).is_ok());
}

#[test]
fn test_static_method_on_type_reaches_private() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    let acc = Value::Object(Rc::new(ExtObject::instantiate(&t)));
    let ctx = AccessContext::within(Value::Type(t));
    assert!(resolver::get_attribute(&acc, "balance", &ctx, &builtins).is_ok());
}

#[test]
fn test_constant_cannot_be_assigned() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    let ctx = AccessContext::host();
    let err = resolver::set_attribute(
        &Value::Type(t.clone()),
        "CURRENCY",
        Value::string("USD"),
        &ctx,
        &builtins,
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessError);
    assert_eq!(t.get_own("CURRENCY").map(|a| a.value), Some(Value::string("EUR")));
}

#[test]
fn test_define_overrides_constant() {
    let builtins = BuiltinTypes::new();
    let t = account_type(&builtins);
    resolver::define_attribute(
        &Value::Type(t.clone()),
        "CURRENCY",
        Value::string("USD"),
        AttributeFlags::CONSTANT,
    )
    .unwrap();
    assert_eq!(t.get_own("CURRENCY").map(|a| a.value), Some(Value::string("USD")));
}

#[test]
fn test_shadowing_keeps_private_flag() {
    let builtins = BuiltinTypes::new();
    let t = Rc::new(TypeObject::new("T", Some(builtins.object.clone())));
    t.define("secret", Value::Number(1.0), AttributeFlags::PRIVATE);
    let obj = Value::Object(Rc::new(ExtObject::instantiate(&t)));
    let inside = AccessContext::within(obj.clone());
    resolver::set_attribute(&obj, "secret", Value::Number(2.0), &inside, &builtins).unwrap();
    assert!(resolver::get_attribute(&obj, "secret", &AccessContext::host(), &builtins).is_err());
}

#[test]
fn test_set_on_array_is_type_mismatch() {
    let builtins = BuiltinTypes::new();
    let err = resolver::set_attribute(
        &Value::array(vec![]),
        "length",
        Value::Number(0.0),
        &AccessContext::host(),
        &builtins,
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatchError);
}
