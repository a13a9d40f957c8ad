//! Literal values stored in an instruction block's constant pool

use std::fmt;

/// A compile-time literal
///
/// Constants never reference runtime objects; the engine turns them into
/// runtime values when they are pushed.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// The void value
    Void,
    /// Boolean literal
    Bool(bool),
    /// Number literal (IEEE 754 double)
    Number(f64),
    /// String literal, also used for attribute and global names
    String(String),
}

impl Constant {
    /// Check if constant is a number
    pub fn is_number(&self) -> bool {
        matches!(self, Constant::Number(_))
    }

    /// Try to get the number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Constant::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Constant {
    fn from(n: f64) -> Self {
        Constant::Number(n)
    }
}

impl From<bool> for Constant {
    fn from(b: bool) -> Self {
        Constant::Bool(b)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::String(s.to_string())
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Void => write!(f, "void"),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Number(n) => write!(f, "{}", n),
            Constant::String(s) => write!(f, "{:?}", s),
        }
    }
}
