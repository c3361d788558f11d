//! Property tests for the algebraic laws of value arithmetic

use proptest::prelude::*;
use std::cmp::Ordering;
use tnac_value::{binary, compare_arrays, unary, BinaryOp, UnaryOp, Value, ValueStore};

fn numeric_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(|n| Value::Int(n as i64)),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        (any::<i16>(), 1i16..1000).prop_map(|(n, d)| Value::fraction(n as i64, d as i64)),
        (-1.0e3f64..1.0e3, -1.0e3f64..1.0e3).prop_map(|(re, im)| Value::complex(re, im)),
    ]
}

fn int_array() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(any::<i16>().prop_map(|n| n as i64), 0..6)
}

proptest! {
    #[test]
    fn double_negation_is_identity(v in numeric_value()) {
        let mut store = ValueStore::new();
        let negneg = unary(UnaryOp::Neg, &unary(UnaryOp::Neg, &v, &mut store), &mut store);
        prop_assert_eq!(negneg, v);
    }

    #[test]
    fn additive_identity(v in numeric_value()) {
        let mut store = ValueStore::new();
        let sum = binary(BinaryOp::Add, &v, &Value::Int(0), &mut store);
        // the sum may be widened but must compare equal to the original
        let eq = binary(BinaryOp::Equal, &sum, &v, &mut store);
        prop_assert_eq!(eq, Value::Bool(true));
    }

    #[test]
    fn multiplicative_identity(v in numeric_value()) {
        let mut store = ValueStore::new();
        let prod = binary(BinaryOp::Mul, &v, &Value::Int(1), &mut store);
        let eq = binary(BinaryOp::Equal, &prod, &v, &mut store);
        prop_assert_eq!(eq, Value::Bool(true));
    }

    #[test]
    fn array_comparison_is_total(l in int_array(), r in int_array()) {
        let mut store = ValueStore::new();
        let la = store.from_values(l.iter().copied().map(Value::Int).collect());
        let ra = store.from_values(r.iter().copied().map(Value::Int).collect());

        let ord = compare_arrays(&la, &ra, &mut store);
        let rev = compare_arrays(&ra, &la, &mut store);
        prop_assert_eq!(ord, rev.reverse());

        if l == r {
            prop_assert_eq!(ord, Ordering::Equal);
        } else {
            prop_assert_ne!(ord, Ordering::Equal);
        }
    }
}
