//! Control-flow-graph IR for the tnac pipeline
//!
//! Functions contain basic blocks; blocks contain instructions in
//! execution order and end with a single terminator. Values flow
//! through SSA-disciplined virtual registers; joins go through Phi
//! nodes fed by edges carrying the value chosen on each branch.

pub mod cfg;
pub mod instructions;

pub use cfg::Cfg;
pub use instructions::{
    BasicBlock, BlockId, Edge, EdgeId, FuncId, Function, InstrId, Instruction, OpCode, Operand,
    RegId, RegName, RegScope, VReg,
};
