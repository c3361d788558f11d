//! The tagged runtime value

use crate::{ArrayRef, Fraction};
use num_complex::Complex64;
use std::fmt;

/// Identity of an IR function carried inside a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub u64);

/// Runtime type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeId {
    Undef,
    Bool,
    Int,
    Fraction,
    Float,
    Complex,
    Function,
    Array,
}

impl TypeId {
    pub fn name(self) -> &'static str {
        match self {
            TypeId::Undef => "undef",
            TypeId::Bool => "bool",
            TypeId::Int => "int",
            TypeId::Fraction => "frac",
            TypeId::Float => "float",
            TypeId::Complex => "cplx",
            TypeId::Function => "fn",
            TypeId::Array => "arr",
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A runtime value: the atomic unit of computation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undef,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex64),
    Fraction(Fraction),
    Function(FuncRef),
    Array(ArrayRef),
}

impl Value {
    pub fn id(&self) -> TypeId {
        match self {
            Value::Undef => TypeId::Undef,
            Value::Bool(_) => TypeId::Bool,
            Value::Int(_) => TypeId::Int,
            Value::Float(_) => TypeId::Float,
            Value::Complex(_) => TypeId::Complex,
            Value::Fraction(_) => TypeId::Fraction,
            Value::Function(_) => TypeId::Function,
            Value::Array(_) => TypeId::Array,
        }
    }

    /// Byte size used for IR-constant encoding
    pub fn size_of(&self) -> usize {
        match self.id() {
            TypeId::Undef => 0,
            TypeId::Bool => 1,
            TypeId::Int => 8,
            TypeId::Float => 8,
            TypeId::Complex => 16,
            TypeId::Fraction => 24,
            TypeId::Function => 8,
            TypeId::Array => 16,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Value::Undef)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<FuncRef> {
        match self {
            Value::Function(f) => Some(*f),
            _ => None,
        }
    }

    pub fn complex(re: f64, im: f64) -> Value {
        Value::Complex(Complex64::new(re, im))
    }

    pub fn fraction(num: i64, den: i64) -> Value {
        Value::Fraction(Fraction::new(num, den))
    }

    pub fn pi() -> Value {
        Value::Float(std::f64::consts::PI)
    }

    pub fn e() -> Value {
        Value::Float(std::f64::consts::E)
    }

    pub fn i() -> Value {
        Value::complex(0.0, 1.0)
    }

    /// Parses an integer literal in the given base; the prefix has
    /// already been stripped by the lexer for bin/hex, but octal still
    /// carries its leading zero.
    pub fn parse_int(text: &str, base: u32) -> Value {
        let digits = match base {
            2 | 16 => &text[2..],
            8 => text.trim_start_matches('0'),
            _ => text,
        };
        if base == 8 && digits.is_empty() {
            return Value::Int(0);
        }
        match i64::from_str_radix(digits, base) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Undef,
        }
    }

    pub fn parse_float(text: &str) -> Value {
        match text.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::Undef,
        }
    }
}

/// Integer formatting base for result printing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBase {
    Bin,
    Oct,
    Dec,
    Hex,
}

/// Formats a value for display, rendering integers in the given base
pub fn format_value(val: &Value, base: IntBase) -> String {
    match val {
        Value::Int(n) => format_int(*n, base),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value(&v, base)).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

fn format_int(n: i64, base: IntBase) -> String {
    let sign = if n < 0 { "-" } else { "" };
    let mag = n.unsigned_abs();
    match base {
        IntBase::Bin => format!("{}0b{:b}", sign, mag),
        IntBase::Oct => format!("{}0{:o}", sign, mag),
        IntBase::Dec => format!("{}", n),
        IntBase::Hex => format!("{}0x{:x}", sign, mag),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => write!(f, "undef"),
            Value::Bool(b) => write!(f, "{}", if *b { "_true" } else { "_false" }),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Complex(c) => write!(f, "({}, {})", c.re, c.im),
            Value::Fraction(fr) => write!(f, "{}", fr),
            Value::Function(_) => write!(f, "<function>"),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (idx, item) in arr.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_integer_bases() {
        assert_eq!(Value::parse_int("42", 10), Value::Int(42));
        assert_eq!(Value::parse_int("0b101", 2), Value::Int(5));
        assert_eq!(Value::parse_int("0xff", 16), Value::Int(255));
        assert_eq!(Value::parse_int("010", 8), Value::Int(8));
        assert_eq!(Value::parse_int("0", 8), Value::Int(0));
    }

    #[test]
    fn type_ids() {
        assert_eq!(Value::Int(1).id(), TypeId::Int);
        assert_eq!(Value::fraction(1, 2).id(), TypeId::Fraction);
        assert_eq!(Value::Undef.id(), TypeId::Undef);
    }

    #[test]
    fn int_base_formatting() {
        assert_eq!(format_value(&Value::Int(255), IntBase::Hex), "0xff");
        assert_eq!(format_value(&Value::Int(5), IntBase::Bin), "0b101");
        assert_eq!(format_value(&Value::Int(-8), IntBase::Oct), "-010");
        assert_eq!(format_value(&Value::Int(7), IntBase::Dec), "7");
    }
}
