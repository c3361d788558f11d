//! Unary and binary operator dispatch over values
//!
//! Operands are coerced to a common type along the promotion lattice
//! `Bool < Int < Fraction < Float < Complex`. Functions are sticky,
//! arrays broadcast (see `binary_as_array`), and anything touching
//! `Undef` stays `Undef`.

use crate::{ArrayRef, Fraction, TypeId, Value, ValueStore};
use num_complex::Complex64;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Neg,
    BitNot,
    LogNot,
    LogIs,
    Abs,
    Head,
    Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Root,
    BitAnd,
    BitOr,
    BitXor,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        use BinaryOp::*;
        matches!(self, Less | LessEq | Greater | GreaterEq | Equal | NotEqual)
    }
}

// Casters. A failed cast means the operation has no meaning for the
// operand and the result becomes Undef.

pub fn to_bool(val: &Value) -> Option<bool> {
    match val {
        Value::Undef => None,
        Value::Bool(b) => Some(*b),
        Value::Int(n) => Some(*n != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::Complex(c) => Some(c.re != 0.0 || c.im != 0.0),
        Value::Fraction(f) => Some(!f.is_zero()),
        Value::Function(_) => Some(true),
        Value::Array(a) => Some(!a.is_empty()),
    }
}

pub fn to_int(val: &Value) -> Option<i64> {
    match val {
        Value::Bool(b) => Some(*b as i64),
        Value::Int(n) => Some(*n),
        // no narrowing from the wider numeric types
        _ => None,
    }
}

pub fn to_float(val: &Value) -> Option<f64> {
    match val {
        Value::Bool(b) => Some(*b as i64 as f64),
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        Value::Fraction(f) => Some(f.to_f64()),
        // a complex with zero imaginary part does not implicitly narrow
        _ => None,
    }
}

pub fn to_fraction(val: &Value) -> Option<Fraction> {
    match val {
        Value::Bool(b) => Some(Fraction::new(*b as i64, 1)),
        Value::Int(n) => Some(Fraction::new(*n, 1)),
        Value::Fraction(f) => Some(*f),
        _ => None,
    }
}

pub fn to_complex(val: &Value) -> Option<Complex64> {
    match val {
        Value::Bool(b) => Some(Complex64::new(*b as i64 as f64, 0.0)),
        Value::Int(n) => Some(Complex64::new(*n as f64, 0.0)),
        Value::Float(f) => Some(Complex64::new(*f, 0.0)),
        Value::Fraction(f) => Some(Complex64::new(f.to_f64(), 0.0)),
        Value::Complex(c) => Some(*c),
        _ => None,
    }
}

fn rank(id: TypeId) -> Option<u8> {
    match id {
        TypeId::Bool => Some(0),
        TypeId::Int => Some(1),
        TypeId::Fraction => Some(2),
        TypeId::Float => Some(3),
        TypeId::Complex => Some(4),
        _ => None,
    }
}

/// The common type two numeric operands widen to
pub fn common_type(l: TypeId, r: TypeId) -> Option<TypeId> {
    let (lr, rr) = (rank(l)?, rank(r)?);
    Some(if lr >= rr { l } else { r })
}

/// Applies a unary operator
pub fn unary(op: UnaryOp, val: &Value, store: &mut ValueStore) -> Value {
    if let Value::Array(arr) = val {
        return unary_as_array(op, arr, store);
    }

    match op {
        UnaryOp::Plus => match val {
            Value::Bool(b) => Value::Int(*b as i64),
            Value::Int(_) | Value::Float(_) | Value::Complex(_) | Value::Fraction(_) => val.clone(),
            _ => Value::Undef,
        },
        UnaryOp::Neg => match val {
            Value::Bool(b) => Value::Int(-(*b as i64)),
            Value::Int(n) => Value::Int(n.wrapping_neg()),
            Value::Float(f) => Value::Float(-f),
            Value::Complex(c) => Value::Complex(-c),
            Value::Fraction(f) => Value::Fraction(f.neg()),
            _ => Value::Undef,
        },
        UnaryOp::BitNot => match to_int(val) {
            Some(n) => Value::Int(!n),
            None => Value::Undef,
        },
        UnaryOp::LogNot => Value::Bool(!to_bool(val).unwrap_or(false)),
        UnaryOp::LogIs => Value::Bool(to_bool(val) == Some(true)),
        UnaryOp::Abs => match val {
            Value::Bool(b) => Value::Int(*b as i64),
            Value::Int(n) => Value::Int(n.wrapping_abs()),
            Value::Float(f) => Value::Float(f.abs()),
            Value::Complex(c) => Value::Float(c.norm()),
            Value::Fraction(f) => Value::Fraction(f.abs()),
            _ => Value::Undef,
        },
        // scalars are their own head and have no tail
        UnaryOp::Head => match val {
            Value::Undef => Value::Undef,
            other => other.clone(),
        },
        UnaryOp::Tail => Value::Undef,
    }
}

fn unary_as_array(op: UnaryOp, arr: &ArrayRef, store: &mut ValueStore) -> Value {
    match op {
        UnaryOp::LogNot | UnaryOp::LogIs => {
            let as_bool = Value::Bool(!arr.is_empty());
            unary(op, &as_bool, store)
        }
        UnaryOp::Head => arr.get(0).unwrap_or(Value::Undef),
        UnaryOp::Tail => Value::Array(arr.tail()),
        _ => {
            let mapped: Vec<Value> = arr.iter().map(|item| unary(op, &item, store)).collect();
            Value::Array(store.from_values(mapped))
        }
    }
}

/// Applies a binary operator
pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value, store: &mut ValueStore) -> Value {
    if lhs.is_undef() || rhs.is_undef() {
        return Value::Undef;
    }
    if lhs.is_array() || rhs.is_array() {
        return binary_as_array(op, lhs, rhs, store);
    }

    // functions are sticky, except that two of them compare by identity
    match (lhs, rhs) {
        (Value::Function(l), Value::Function(r)) if op.is_comparison() => {
            return match op {
                BinaryOp::Equal => Value::Bool(l == r),
                BinaryOp::NotEqual => Value::Bool(l != r),
                _ => Value::Undef,
            };
        }
        (Value::Function(_), _) => return lhs.clone(),
        (_, Value::Function(_)) => return rhs.clone(),
        _ => {}
    }

    use BinaryOp::*;
    match op {
        BitAnd | BitOr | BitXor => {
            let (Some(l), Some(r)) = (to_int(lhs), to_int(rhs)) else {
                return Value::Undef;
            };
            Value::Int(match op {
                BitAnd => l & r,
                BitOr => l | r,
                _ => l ^ r,
            })
        }
        Equal => eq_values(lhs, rhs).map(Value::Bool).unwrap_or_default(),
        NotEqual => eq_values(lhs, rhs).map(|b| Value::Bool(!b)).unwrap_or_default(),
        Less => cmp_values(lhs, rhs).map(|o| Value::Bool(o == Ordering::Less)).unwrap_or_default(),
        LessEq => cmp_values(lhs, rhs).map(|o| Value::Bool(o != Ordering::Greater)).unwrap_or_default(),
        Greater => cmp_values(lhs, rhs).map(|o| Value::Bool(o == Ordering::Greater)).unwrap_or_default(),
        GreaterEq => cmp_values(lhs, rhs).map(|o| Value::Bool(o != Ordering::Less)).unwrap_or_default(),
        Add | Sub | Mul | Div | Mod => arithmetic(op, lhs, rhs),
        Pow => power(lhs, rhs),
        Root => root(lhs, rhs),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use BinaryOp::*;
    let Some(common) = common_type(lhs.id(), rhs.id()) else {
        return Value::Undef;
    };

    match common {
        TypeId::Bool | TypeId::Int => {
            let (Some(l), Some(r)) = (to_int(lhs), to_int(rhs)) else {
                return Value::Undef;
            };
            match op {
                Add => Value::Int(l.wrapping_add(r)),
                Sub => Value::Int(l.wrapping_sub(r)),
                Mul => Value::Int(l.wrapping_mul(r)),
                // integer division and modulo promote to float
                Div => Value::Float(l as f64 / r as f64),
                Mod => Value::Float((l as f64) % (r as f64)),
                _ => Value::Undef,
            }
        }
        TypeId::Fraction => {
            let (Some(l), Some(r)) = (to_fraction(lhs), to_fraction(rhs)) else {
                return Value::Undef;
            };
            match op {
                Add => Value::Fraction(l.add(&r)),
                Sub => Value::Fraction(l.sub(&r)),
                Mul => Value::Fraction(l.mul(&r)),
                Div => Value::Fraction(l.div(&r)),
                Mod => Value::Float(l.to_f64() % r.to_f64()),
                _ => Value::Undef,
            }
        }
        TypeId::Float => {
            let (Some(l), Some(r)) = (to_float(lhs), to_float(rhs)) else {
                return Value::Undef;
            };
            match op {
                Add => Value::Float(l + r),
                Sub => Value::Float(l - r),
                Mul => Value::Float(l * r),
                Div => Value::Float(l / r),
                Mod => Value::Float(l % r),
                _ => Value::Undef,
            }
        }
        TypeId::Complex => {
            let (Some(l), Some(r)) = (to_complex(lhs), to_complex(rhs)) else {
                return Value::Undef;
            };
            match op {
                Add => Value::Complex(l + r),
                Sub => Value::Complex(l - r),
                Mul => Value::Complex(l * r),
                Div => Value::Complex(l / r),
                Mod => mod_complex(l, r),
                _ => Value::Undef,
            }
        }
        _ => Value::Undef,
    }
}

/// Complex modulo: component-wise `fmod` against a real divisor,
/// Gaussian remainder (`l - r * round(l / r)`) otherwise
fn mod_complex(l: Complex64, r: Complex64) -> Value {
    if r.im == 0.0 {
        return Value::Complex(Complex64::new(l.re % r.re, l.im % r.re));
    }
    let q = l / r;
    let rounded = Complex64::new(q.re.round(), q.im.round());
    Value::Complex(l - r * rounded)
}

fn power(lhs: &Value, rhs: &Value) -> Value {
    let Some(common) = common_type(lhs.id(), rhs.id()) else {
        return Value::Undef;
    };
    if common == TypeId::Complex {
        let (Some(l), Some(r)) = (to_complex(lhs), to_complex(rhs)) else {
            return Value::Undef;
        };
        return Value::Complex(l.powc(r));
    }

    let (Some(base), Some(exp)) = (to_float(lhs), to_float(rhs)) else {
        return Value::Undef;
    };
    power_f(base, exp)
}

/// Recognises values that are integers up to floating-point noise,
/// e.g. `1 / (1 / 3)` which lands a few ulps away from 3
fn near_integer(x: f64) -> Option<i64> {
    if !x.is_finite() {
        return None;
    }
    let r = x.round();
    if (x - r).abs() < 1e-9 * x.abs().max(1.0) {
        Some(r as i64)
    } else {
        None
    }
}

/// Real power with negative-base handling:
/// - integral exponent keeps the algebraic sign
/// - an even-integer root of a negative base is pure imaginary
/// - an odd-integer root of a negative base is the negated real root
fn power_f(base: f64, exp: f64) -> Value {
    if base >= 0.0 || exp == 0.0 {
        return Value::Float(base.powf(exp));
    }

    if let Some(e) = near_integer(exp) {
        let mag = base.abs().powf(exp);
        return Value::Float(if e % 2 != 0 { -mag } else { mag });
    }

    if let Some(root) = near_integer(1.0 / exp) {
        if root % 2 == 0 {
            // even root: rotate out of the reals
            let principal = Complex64::new(0.0, base.abs().sqrt());
            let remainder = 2.0 * exp;
            let interim =
                if (remainder.abs() - 1.0).abs() < 1e-12 { principal } else { principal.powf(remainder) };
            let result = if remainder > 0.0 { interim } else { interim.inv() };
            return Value::Complex(result);
        }
        return Value::Float(-base.abs().powf(exp));
    }

    Value::Float(base.powf(exp))
}

fn root(lhs: &Value, rhs: &Value) -> Value {
    let Some(common) = common_type(lhs.id(), rhs.id()) else {
        return Value::Undef;
    };
    if common == TypeId::Complex {
        let (Some(l), Some(r)) = (to_complex(lhs), to_complex(rhs)) else {
            return Value::Undef;
        };
        return Value::Complex(l.powc(r.inv()));
    }
    let (Some(base), Some(exp)) = (to_float(lhs), to_float(rhs)) else {
        return Value::Undef;
    };
    power_f(base, 1.0 / exp)
}

fn eq_values(lhs: &Value, rhs: &Value) -> Option<bool> {
    let common = common_type(lhs.id(), rhs.id())?;
    match common {
        TypeId::Bool | TypeId::Int => Some(to_int(lhs)? == to_int(rhs)?),
        TypeId::Fraction => Some(to_fraction(lhs)?.eq_value(&to_fraction(rhs)?)),
        TypeId::Float => Some(to_float(lhs)? == to_float(rhs)?),
        TypeId::Complex => Some(to_complex(lhs)? == to_complex(rhs)?),
        _ => None,
    }
}

fn cmp_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    let common = common_type(lhs.id(), rhs.id())?;
    match common {
        TypeId::Bool | TypeId::Int => Some(to_int(lhs)?.cmp(&to_int(rhs)?)),
        TypeId::Fraction => {
            let (l, r) = (to_fraction(lhs)?, to_fraction(rhs)?);
            Some(if l.eq_value(&r) {
                Ordering::Equal
            } else if l.less(&r) {
                Ordering::Less
            } else {
                Ordering::Greater
            })
        }
        TypeId::Float => to_float(lhs)?.partial_cmp(&to_float(rhs)?),
        // complex numbers are not ordered
        _ => None,
    }
}

// Array semantics

fn as_array_operand(val: &Value, store: &mut ValueStore) -> Option<ArrayRef> {
    match val {
        Value::Array(a) => Some(a.clone()),
        Value::Undef => None,
        scalar => Some(store.from_values(vec![scalar.clone()])),
    }
}

fn binary_as_array(op: BinaryOp, lhs: &Value, rhs: &Value, store: &mut ValueStore) -> Value {
    let (Some(l), Some(r)) = (as_array_operand(lhs, store), as_array_operand(rhs, store)) else {
        return Value::Undef;
    };

    if op.is_comparison() {
        let ord = compare_arrays(&l, &r, store);
        use BinaryOp::*;
        return Value::Bool(match op {
            Equal => ord == Ordering::Equal,
            NotEqual => ord != Ordering::Equal,
            Less => ord == Ordering::Less,
            LessEq => ord != Ordering::Greater,
            Greater => ord == Ordering::Greater,
            GreaterEq => ord != Ordering::Less,
            _ => unreachable!("non-comparison BinaryOp filtered out by is_comparison guard"),
        });
    }

    // an empty operand contributes a unit array for shape purposes
    let l_items = if l.is_empty() { vec![Value::Int(0)] } else { l.to_vec() };
    let r_items = if r.is_empty() { vec![Value::Int(0)] } else { r.to_vec() };

    let mut out = Vec::with_capacity(l_items.len() * r_items.len());
    for li in &l_items {
        for ri in &r_items {
            out.push(binary(op, li, ri, store));
        }
    }
    Value::Array(store.from_values(out))
}

/// Total order over arrays: element-wise lexicographic over the common
/// prefix, element count as the final tiebreaker
pub fn compare_arrays(lhs: &ArrayRef, rhs: &ArrayRef, store: &mut ValueStore) -> Ordering {
    if lhs.same_view(rhs) {
        return Ordering::Equal;
    }

    let common = lhs.len().min(rhs.len());
    for idx in 0..common {
        let le = lhs.get(idx).unwrap_or(Value::Undef);
        let re = rhs.get(idx).unwrap_or(Value::Undef);
        if to_bool(&binary(BinaryOp::Equal, &le, &re, store)) == Some(true) {
            continue;
        }
        if to_bool(&binary(BinaryOp::Less, &le, &re, store)) == Some(true) {
            return Ordering::Less;
        }
        return Ordering::Greater;
    }

    lhs.len().cmp(&rhs.len())
}

/// Invokes a type constructor. Returns `Undef` when validation fails
/// (wrong arity or an argument that cannot convert).
pub fn instantiate(ty: TypeId, args: &[Value]) -> Value {
    match ty {
        TypeId::Bool => match args {
            [] => Value::Bool(false),
            [v] => to_bool(v).map(Value::Bool).unwrap_or_default(),
            _ => Value::Undef,
        },
        TypeId::Int => match args {
            [] => Value::Int(0),
            [v] => to_int(v).map(Value::Int).unwrap_or_default(),
            _ => Value::Undef,
        },
        TypeId::Float => match args {
            [] => Value::Float(0.0),
            [v] => to_float(v).map(Value::Float).unwrap_or_default(),
            _ => Value::Undef,
        },
        TypeId::Fraction => match args {
            [n, d] => match (to_int(n), to_int(d)) {
                (Some(n), Some(d)) => Value::Fraction(Fraction::new(n, d)),
                _ => Value::Undef,
            },
            _ => Value::Undef,
        },
        TypeId::Complex => match args {
            [] => Value::complex(0.0, 0.0),
            [re] => to_float(re).map(|re| Value::complex(re, 0.0)).unwrap_or_default(),
            [re, im] => match (to_float(re), to_float(im)) {
                (Some(re), Some(im)) => Value::complex(re, im),
                _ => Value::Undef,
            },
            _ => Value::Undef,
        },
        _ => Value::Undef,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> ValueStore {
        ValueStore::new()
    }

    #[test]
    fn promotion_add() {
        let mut st = store();
        assert_eq!(binary(BinaryOp::Add, &Value::Int(1), &Value::Int(2), &mut st), Value::Int(3));
        assert_eq!(
            binary(BinaryOp::Add, &Value::Int(1), &Value::Float(2.0), &mut st),
            Value::Float(3.0)
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::Int(2), &Value::fraction(1, 2), &mut st),
            Value::fraction(5, 2)
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::Float(4.0), &Value::fraction(1, 2), &mut st),
            Value::Float(4.5)
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::Int(1), &Value::complex(1.0, 2.0), &mut st),
            Value::complex(2.0, 2.0)
        );
    }

    #[test]
    fn fraction_sum() {
        let mut st = store();
        let res =
            binary(BinaryOp::Add, &Value::fraction(1, 2), &Value::fraction(1, 3), &mut st);
        assert_eq!(res, Value::fraction(5, 6));
    }

    #[test]
    fn complex_product() {
        let mut st = store();
        let res = binary(
            BinaryOp::Mul,
            &Value::complex(7.0, 10.0),
            &Value::complex(10.0, 11.0),
            &mut st,
        );
        assert_eq!(res, Value::complex(-40.0, 177.0));
    }

    #[test]
    fn integer_division_promotes_to_float() {
        let mut st = store();
        assert_eq!(binary(BinaryOp::Div, &Value::Int(2), &Value::Int(2), &mut st), Value::Float(1.0));
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(1), &Value::Int(0), &mut st),
            Value::Float(f64::INFINITY)
        );
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(-1), &Value::Int(0), &mut st),
            Value::Float(f64::NEG_INFINITY)
        );
        let nan = binary(BinaryOp::Div, &Value::Int(0), &Value::Int(0), &mut st);
        assert!(matches!(nan, Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn fraction_division_by_zero_is_marked() {
        let mut st = store();
        let res =
            binary(BinaryOp::Div, &Value::fraction(1, 2), &Value::fraction(0, 1), &mut st);
        match res {
            Value::Fraction(f) => assert!(f.is_infinity()),
            other => panic!("expected fraction, got {:?}", other),
        }
    }

    #[test]
    fn negative_base_powers() {
        let mut st = store();
        let sqrt = binary(BinaryOp::Pow, &Value::Int(-4), &Value::Float(0.5), &mut st);
        assert_eq!(sqrt, Value::complex(0.0, 2.0));

        let cbrt = binary(BinaryOp::Pow, &Value::Int(-8), &Value::Float(1.0 / 3.0), &mut st);
        match cbrt {
            Value::Float(f) => assert!((f + 2.0).abs() < 1e-9),
            other => panic!("expected float, got {:?}", other),
        }

        let square = binary(BinaryOp::Pow, &Value::Int(-2), &Value::Int(2), &mut st);
        assert_eq!(square, Value::Float(4.0));
        let cube = binary(BinaryOp::Pow, &Value::Int(-2), &Value::Int(3), &mut st);
        assert_eq!(cube, Value::Float(-8.0));
    }

    #[test]
    fn root_mirrors_power() {
        let mut st = store();
        let res = binary(BinaryOp::Root, &Value::Int(-4), &Value::Int(2), &mut st);
        assert_eq!(res, Value::complex(0.0, 2.0));
        let res = binary(BinaryOp::Root, &Value::Int(27), &Value::Int(3), &mut st);
        match res {
            Value::Float(f) => assert!((f - 3.0).abs() < 1e-9),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn bitwise_requires_integers() {
        let mut st = store();
        assert_eq!(binary(BinaryOp::BitAnd, &Value::Int(6), &Value::Int(3), &mut st), Value::Int(2));
        assert_eq!(unary(UnaryOp::BitNot, &Value::Int(2), &mut st), Value::Int(!2));
        assert_eq!(unary(UnaryOp::BitNot, &Value::Float(2.0), &mut st), Value::Undef);
        assert_eq!(
            binary(BinaryOp::BitXor, &Value::Float(1.0), &Value::Int(1), &mut st),
            Value::Undef
        );
    }

    #[test]
    fn undef_is_viral() {
        let mut st = store();
        assert_eq!(binary(BinaryOp::Add, &Value::Undef, &Value::Int(1), &mut st), Value::Undef);
        assert_eq!(unary(UnaryOp::Neg, &Value::Undef, &mut st), Value::Undef);
        // except for the logical tests, which treat Undef as "not a value"
        assert_eq!(unary(UnaryOp::LogNot, &Value::Undef, &mut st), Value::Bool(true));
        assert_eq!(unary(UnaryOp::LogIs, &Value::Undef, &mut st), Value::Bool(false));
    }

    #[test]
    fn scalar_broadcasts_over_array() {
        let mut st = store();
        let arr = Value::Array(st.from_values(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        let res = binary(BinaryOp::Mul, &arr, &Value::Int(2), &mut st);
        let out = res.as_array().unwrap().to_vec();
        assert_eq!(out, vec![Value::Int(2), Value::Int(4), Value::Int(6)]);
    }

    #[test]
    fn array_pairs_are_cartesian() {
        let mut st = store();
        let l = Value::Array(st.from_values(vec![Value::Int(1), Value::Int(2)]));
        let r = Value::Array(st.from_values(vec![Value::Int(10), Value::Int(20), Value::Int(30)]));
        let res = binary(BinaryOp::Add, &l, &r, &mut st);
        let out = res.as_array().unwrap().to_vec();
        assert_eq!(out.len(), 6);
        assert_eq!(out[0], Value::Int(11));
        assert_eq!(out[5], Value::Int(32));
    }

    #[test]
    fn empty_array_acts_as_unit() {
        let mut st = store();
        let empty = Value::Array(st.from_values(vec![]));
        let arr = Value::Array(st.from_values(vec![Value::Int(5)]));
        let res = binary(BinaryOp::Add, &empty, &arr, &mut st);
        let out = res.as_array().unwrap().to_vec();
        assert_eq!(out, vec![Value::Int(5)]);
    }

    #[test]
    fn array_comparison_is_total() {
        let mut st = store();
        let a = st.from_values(vec![Value::Int(1), Value::Int(2)]);
        let b = st.from_values(vec![Value::Int(1), Value::Int(3)]);
        let c = st.from_values(vec![Value::Int(1), Value::Int(2)]);
        let longer = st.from_values(vec![Value::Int(1), Value::Int(2), Value::Int(0)]);

        assert_eq!(compare_arrays(&a, &b, &mut st), Ordering::Less);
        assert_eq!(compare_arrays(&b, &a, &mut st), Ordering::Greater);
        assert_eq!(compare_arrays(&a, &c, &mut st), Ordering::Equal);
        assert_eq!(compare_arrays(&a, &longer, &mut st), Ordering::Less);
    }

    #[test]
    fn elementwise_unary_maps() {
        let mut st = store();
        let arr = Value::Array(st.from_values(vec![Value::Int(1), Value::Int(-2)]));
        let res = unary(UnaryOp::Neg, &arr, &mut st);
        assert_eq!(res.as_array().unwrap().to_vec(), vec![Value::Int(-1), Value::Int(2)]);
    }

    #[test]
    fn head_and_tail() {
        let mut st = store();
        let arr = Value::Array(st.from_values(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        assert_eq!(unary(UnaryOp::Head, &arr, &mut st), Value::Int(1));
        let tail = unary(UnaryOp::Tail, &arr, &mut st);
        assert_eq!(tail.as_array().unwrap().to_vec(), vec![Value::Int(2), Value::Int(3)]);
        assert_eq!(unary(UnaryOp::Head, &Value::Int(7), &mut st), Value::Int(7));
        assert_eq!(unary(UnaryOp::Tail, &Value::Int(7), &mut st), Value::Undef);
    }

    #[test]
    fn constructors_validate() {
        assert_eq!(instantiate(TypeId::Fraction, &[Value::Int(1), Value::Int(2)]), Value::fraction(1, 2));
        assert_eq!(instantiate(TypeId::Fraction, &[Value::Int(1)]), Value::Undef);
        assert_eq!(instantiate(TypeId::Complex, &[Value::Int(7), Value::Int(10)]), Value::complex(7.0, 10.0));
        assert_eq!(instantiate(TypeId::Int, &[Value::Float(1.5)]), Value::Undef);
        assert_eq!(instantiate(TypeId::Bool, &[Value::Int(3)]), Value::Bool(true));
        assert_eq!(instantiate(TypeId::Float, &[]), Value::Float(0.0));
    }

    #[test]
    fn functions_are_sticky() {
        let mut st = store();
        let f = Value::Function(crate::FuncRef(1));
        assert_eq!(binary(BinaryOp::Add, &f, &Value::Int(1), &mut st), f);
        assert_eq!(binary(BinaryOp::Mul, &Value::Int(1), &f, &mut st), f);
        assert_eq!(
            binary(BinaryOp::Equal, &f, &Value::Function(crate::FuncRef(1)), &mut st),
            Value::Bool(true)
        );
    }

    #[test]
    fn algebraic_identities() {
        let mut st = store();
        for v in [Value::Int(5), Value::Float(2.5), Value::fraction(3, 7), Value::complex(1.0, 2.0)] {
            let negneg = unary(UnaryOp::Neg, &unary(UnaryOp::Neg, &v, &mut st), &mut st);
            assert_eq!(negneg, v);
            assert_eq!(binary(BinaryOp::Add, &v, &Value::Int(0), &mut st).id(), {
                // adding the int zero may widen the type but not the value
                common_type(v.id(), TypeId::Int).unwrap()
            });
            let same = binary(BinaryOp::Mul, &v, &Value::Int(1), &mut st);
            assert_eq!(to_complex(&same), to_complex(&v));
        }
    }
}
