//! IR evaluation for tnac
//!
//! The machine interprets the CFG produced by the compiler: a call
//! stack of frames, an environment mapping registers to frame slots,
//! branching records consulted by Phi, and the array-as-callable
//! iteration state.

pub mod env;
pub mod frame;
pub mod machine;

pub use env::Env;
pub use frame::{CallStack, Frame, InstrPtr, DEFAULT_STACK_CAPACITY};
pub use machine::Machine;
