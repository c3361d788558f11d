//! Scope and symbol definitions

use tnac_common::Span;

/// Index of a scope inside the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// Index of a symbol inside the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymId(pub u32);

/// What kind of region a scope delimits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
}

/// A lexical scope. Depth is 0 at global and grows inward.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub depth: u32,
}

impl Scope {
    pub fn is_function(&self) -> bool {
        self.kind == ScopeKind::Function
    }
}

/// Discriminates symbols without looking at their payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymKind {
    Variable,
    Parameter,
    Function,
    Module,
    ScopeRef,
    Deferred,
}

/// Kind-specific symbol payload
#[derive(Debug, Clone)]
pub enum SymData {
    Variable,
    Parameter,
    Function {
        /// The scope the function owns (its body)
        owned: ScopeId,
        param_count: usize,
    },
    Module {
        owned: ScopeId,
        param_count: usize,
    },
    /// Alias to another scope, produced by import components
    ScopeRef { referenced: ScopeId },
    /// Forward-declared; resolved later or never
    Deferred,
}

/// A named entity interned in the symbol table
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymId,
    pub name: String,
    pub owner: ScopeId,
    pub loc: Span,
    pub data: SymData,
}

impl Symbol {
    pub fn kind(&self) -> SymKind {
        match self.data {
            SymData::Variable => SymKind::Variable,
            SymData::Parameter => SymKind::Parameter,
            SymData::Function { .. } => SymKind::Function,
            SymData::Module { .. } => SymKind::Module,
            SymData::ScopeRef { .. } => SymKind::ScopeRef,
            SymData::Deferred => SymKind::Deferred,
        }
    }

    pub fn is(&self, kind: SymKind) -> bool {
        self.kind() == kind
    }

    /// Variables and parameters are the only assignable symbols
    pub fn is_assignable(&self) -> bool {
        matches!(self.kind(), SymKind::Variable | SymKind::Parameter)
    }

    /// The scope this symbol owns, if it owns one
    pub fn owned_scope(&self) -> Option<ScopeId> {
        match self.data {
            SymData::Function { owned, .. } | SymData::Module { owned, .. } => Some(owned),
            SymData::ScopeRef { referenced } => Some(referenced),
            _ => None,
        }
    }

    pub fn param_count(&self) -> usize {
        match self.data {
            SymData::Function { param_count, .. } | SymData::Module { param_count, .. } => {
                param_count
            }
            _ => 0,
        }
    }
}
