//! Lowering from AST to the CFG intermediate representation
//!
//! The compiler visits the parsed tree with an operand stack, folds
//! constant sub-expressions through the value model, and emits
//! register-based instructions into basic blocks. Conditionals become
//! block diamonds joined by Phi nodes; logical operators short-circuit
//! through the same mechanism.

pub mod compiler;
pub mod context;

pub use compiler::Compiler;
