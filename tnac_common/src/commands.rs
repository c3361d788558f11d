//! Command payloads delivered through feedback
//!
//! Commands are `#name arg...` sequences recognised between expressions.
//! The parser captures them as plain data; validation against a
//! descriptor table happens in the command interpreter, and dispatch is
//! entirely up to the host.

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The shape of a single command argument, as far as validation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    String,
    Identifier,
    Int,
    Float,
    Other,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::String => write!(f, "string"),
            ArgKind::Identifier => write!(f, "identifier"),
            ArgKind::Int => write!(f, "integer"),
            ArgKind::Float => write!(f, "float"),
            ArgKind::Other => write!(f, "token"),
        }
    }
}

/// One command argument: its raw text plus the kind it lexed as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArg {
    pub value: String,
    pub kind: ArgKind,
    pub span: Span,
}

impl CommandArg {
    pub fn new(value: impl Into<String>, kind: ArgKind, span: Span) -> Self {
        Self { value: value.into(), kind, span }
    }
}

/// A parsed command ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub span: Span,
    pub args: Vec<CommandArg>,
}

impl Command {
    pub fn new(name: impl Into<String>, span: Span, args: Vec<CommandArg>) -> Self {
        Self { name: name.into(), span, args }
    }

    pub fn arg(&self, idx: usize) -> Option<&CommandArg> {
        self.args.get(idx)
    }
}
