//! Unit tests for Arity, FunctionTemplate and CompiledFragment

use bytecode_system::{Arity, CompiledFragment, FunctionTemplate, InstructionBlock};

#[test]
fn test_defaulted_tail_bounds() {
    // fn(a, b = 1)
    let arity = Arity::new(2, 1, 2);
    assert!(arity.validate().is_ok());
    assert!(!arity.admits(0));
    assert!(arity.admits(1));
    assert!(arity.admits(5));
    assert_eq!(arity.max_bound(), Some(2));
    assert_eq!(arity.positional_limit(), 2);
}

#[test]
fn test_variadic_collects_rest() {
    // fn(a, rest...)
    let arity = Arity::new(2, 1, 2).with_variadic(1);
    assert_eq!(arity.positional_limit(), 1);
    assert_eq!(arity.max_bound(), None);
    assert!(arity.validate().is_ok());
}

#[test]
fn test_min_above_positional_is_invalid() {
    let arity = Arity::new(3, 3, 3).with_variadic(1);
    assert!(arity.validate().is_err());
}

#[test]
fn test_template_defaults() {
    let template = FunctionTemplate::new(None, InstructionBlock::new(), Arity::fixed(0));
    assert_eq!(template.line, 0);
    assert_eq!(template.display_name(), "<anonymous>");
    assert_eq!(template.at_line(12).line, 12);
}

#[test]
fn test_fragment_without_statics() {
    let fragment = CompiledFragment::new(
        "main.escript",
        FunctionTemplate::new(Some("main"), InstructionBlock::new(), Arity::fixed(0)),
    );
    assert_eq!(fragment.source_name, "main.escript");
    assert!(fragment.static_names.is_empty());
    assert_eq!(fragment.main.display_name(), "main");
}
