//! Symbol table: names mapped to symbols in respect of their scopes

use crate::{Scope, ScopeId, ScopeKind, SymData, SymId, SymKind, Symbol};
use std::collections::HashMap;
use thiserror::Error;
use tnac_common::Span;

/// Insertion failures; surfaced as compile errors by the parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemaError {
    #[error("parameter redefinition")]
    ParamRedef,
    #[error("name already defined with a different kind")]
    NameRedef,
}

/// Stores scopes and symbols; symbols are addressed by
/// `name -> (scope -> symbol)`.
///
/// Insertion is idempotent for a same-kind symbol at the same scope and
/// fails fast when a different-kind symbol already owns the name there.
#[derive(Debug, Default)]
pub struct SymTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    names: HashMap<String, HashMap<ScopeId, SymId>>,
}

impl SymTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let depth = parent.map_or(0, |p| self.scope(p).depth + 1);
        self.scopes.push(Scope { id, parent, kind, depth });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn symbol(&self, id: SymId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn add_variable(
        &mut self,
        name: &str,
        parent: ScopeId,
        loc: Span,
    ) -> Result<SymId, SemaError> {
        self.make_symbol(name, parent, loc, SymData::Variable)
    }

    pub fn add_parameter(
        &mut self,
        name: &str,
        parent: ScopeId,
        loc: Span,
    ) -> Result<SymId, SemaError> {
        self.make_symbol(name, parent, loc, SymData::Parameter)
    }

    pub fn add_function(
        &mut self,
        name: &str,
        parent: ScopeId,
        loc: Span,
        owned: ScopeId,
        param_count: usize,
    ) -> Result<SymId, SemaError> {
        self.make_symbol(name, parent, loc, SymData::Function { owned, param_count })
    }

    pub fn add_module(
        &mut self,
        name: &str,
        parent: ScopeId,
        loc: Span,
        owned: ScopeId,
    ) -> Result<SymId, SemaError> {
        self.make_symbol(name, parent, loc, SymData::Module { owned, param_count: 0 })
    }

    pub fn add_scope_ref(
        &mut self,
        name: &str,
        parent: ScopeId,
        loc: Span,
        referenced: ScopeId,
    ) -> Result<SymId, SemaError> {
        self.make_symbol(name, parent, loc, SymData::ScopeRef { referenced })
    }

    pub fn add_deferred(
        &mut self,
        name: &str,
        parent: ScopeId,
        loc: Span,
    ) -> Result<SymId, SemaError> {
        self.make_symbol(name, parent, loc, SymData::Deferred)
    }

    /// Looks for a symbol starting from the given scope and walking the
    /// parent chain. Crossing a `Function` scope boundary hides
    /// variables and parameters declared beyond it.
    pub fn lookup(&self, name: &str, from: ScopeId) -> Option<SymId> {
        let scopes = self.names.get(name)?;
        let mut cur = Some(from);
        let mut crossed_fn = false;
        while let Some(scope_id) = cur {
            if let Some(&sym) = scopes.get(&scope_id) {
                let hidden = crossed_fn
                    && matches!(self.symbol(sym).kind(), SymKind::Variable | SymKind::Parameter);
                if !hidden {
                    return Some(sym);
                }
            }
            let scope = self.scope(scope_id);
            if scope.is_function() {
                crossed_fn = true;
            }
            cur = scope.parent;
        }
        None
    }

    /// Looks up a symbol in the given scope only
    pub fn scoped_lookup(&self, name: &str, scope: ScopeId) -> Option<SymId> {
        self.names.get(name).and_then(|scopes| scopes.get(&scope)).copied()
    }

    /// All symbols of a given kind, in declaration order
    pub fn symbols_of(&self, kind: SymKind) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(move |s| s.kind() == kind)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    fn make_symbol(
        &mut self,
        name: &str,
        parent: ScopeId,
        loc: Span,
        data: SymData,
    ) -> Result<SymId, SemaError> {
        let new_kind = kind_of(&data);
        if let Some(existing) = self.scoped_lookup(name, parent) {
            let existing_kind = self.symbol(existing).kind();
            if existing_kind == new_kind {
                // Same-kind lookups are idempotent
                return Ok(existing);
            }
            return Err(match new_kind {
                SymKind::Parameter => SemaError::ParamRedef,
                _ => SemaError::NameRedef,
            });
        }

        let id = SymId(self.symbols.len() as u32);
        self.symbols.push(Symbol { id, name: name.to_string(), owner: parent, loc, data });
        self.names.entry(name.to_string()).or_default().insert(parent, id);
        Ok(id)
    }
}

fn kind_of(data: &SymData) -> SymKind {
    match data {
        SymData::Variable => SymKind::Variable,
        SymData::Parameter => SymKind::Parameter,
        SymData::Function { .. } => SymKind::Function,
        SymData::Module { .. } => SymKind::Module,
        SymData::ScopeRef { .. } => SymKind::ScopeRef,
        SymData::Deferred => SymKind::Deferred,
    }
}
