//! Syntax analysis for the tnac language
//!
//! A Pratt precedence parser building an arena AST, wired to sema for
//! immediate name resolution and to feedback for diagnostics and
//! commands.

pub mod ast;
pub mod commands;
pub mod diag;
pub mod parser;
pub mod precedence;

pub use ast::{Ast, Node, NodeData, NodeId, NodeKind};
pub use parser::{ParseOutcome, Parser};
pub use precedence::Precedence;
