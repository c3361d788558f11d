//! Runtime value model for the tnac language
//!
//! A value is a tagged sum over booleans, 64-bit integers, IEEE-754
//! doubles, complex numbers, exact rationals, function references and
//! reference-counted array views. Operator dispatch promotes operands
//! along `Bool < Int < Fraction < Float < Complex`; functions are
//! sticky and arrays broadcast.

pub mod arith;
pub mod fraction;
pub mod store;
pub mod value;

pub use arith::{
    binary, common_type, compare_arrays, instantiate, to_bool, to_complex, to_float, to_fraction,
    to_int, unary, BinaryOp, UnaryOp,
};
pub use fraction::Fraction;
pub use store::{ArrayData, ArrayRef, ValueStore};
pub use value::{format_value, FuncRef, IntBase, TypeId, Value};
