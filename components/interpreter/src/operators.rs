//! Primitive fast paths for arithmetic and comparison
//!
//! `None` means no primitive rule applies and the engine falls back to an
//! operator method on the left operand.

use bytecode_system::Opcode;
use object_model::Value;

/// Apply a binary arithmetic or ordering opcode to primitive operands
///
/// ```
/// use bytecode_system::Opcode;
/// use interpreter::operators::binary;
/// use object_model::Value;
///
/// assert_eq!(binary(&Opcode::Add, &Value::Number(1.0), &Value::Number(2.0)), Some(Value::Number(3.0)));
/// assert_eq!(binary(&Opcode::Add, &Value::string("n="), &Value::Number(2.0)), Some(Value::string("n=2")));
/// assert_eq!(binary(&Opcode::Less, &Value::Void, &Value::Number(2.0)), None);
/// ```
pub fn binary(opcode: &Opcode, a: &Value, b: &Value) -> Option<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numeric(opcode, *x, *y),
        (Value::String(x), Value::String(y)) => match opcode {
            Opcode::Add => Some(Value::string(&format!("{}{}", x, y))),
            Opcode::Less => Some(Value::Bool(x < y)),
            Opcode::LessEqual => Some(Value::Bool(x <= y)),
            Opcode::Greater => Some(Value::Bool(x > y)),
            Opcode::GreaterEqual => Some(Value::Bool(x >= y)),
            _ => None,
        },
        // String concatenation renders the other primitive operand
        (Value::String(x), other) if matches!(opcode, Opcode::Add) && other.is_primitive() => {
            Some(Value::string(&format!("{}{}", x, other)))
        }
        (other, Value::String(y)) if matches!(opcode, Opcode::Add) && other.is_primitive() => {
            Some(Value::string(&format!("{}{}", other, y)))
        }
        _ => None,
    }
}

fn numeric(opcode: &Opcode, x: f64, y: f64) -> Option<Value> {
    let value = match opcode {
        Opcode::Add => Value::Number(x + y),
        Opcode::Sub => Value::Number(x - y),
        Opcode::Mul => Value::Number(x * y),
        Opcode::Div => Value::Number(x / y),
        Opcode::Mod => Value::Number(x % y),
        Opcode::Less => Value::Bool(x < y),
        Opcode::LessEqual => Value::Bool(x <= y),
        Opcode::Greater => Value::Bool(x > y),
        Opcode::GreaterEqual => Value::Bool(x >= y),
        _ => return None,
    };
    Some(value)
}

/// Unary minus on a number
pub fn negate(a: &Value) -> Option<Value> {
    a.as_number().map(|n| Value::Number(-n))
}

/// Whether `==` is decided without an operator method
///
/// Only extensible objects may override equality.
pub fn has_builtin_equality(a: &Value) -> bool {
    !matches!(a, Value::Object(_))
}
