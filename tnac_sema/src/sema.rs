//! The semantic analyser: a scope stack over the symbol table
//!
//! The parser drives this while it descends; scopes are opened and
//! closed symmetrically (the parser uses guards for that) and every
//! declaration or identifier use goes through here.

use crate::{ScopeId, ScopeKind, SemaError, SymData, SymId, SymKind, SymTable, Symbol};
use log::debug;
use tnac_common::Span;

pub struct Sema {
    table: SymTable,
    stack: Vec<ScopeId>,
    opened: usize,
    closed: usize,
    name_idx: u64,
}

impl Default for Sema {
    fn default() -> Self {
        Self::new()
    }
}

impl Sema {
    pub fn new() -> Self {
        Self { table: SymTable::new(), stack: Vec::new(), opened: 0, closed: 0, name_idx: 0 }
    }

    pub fn table(&self) -> &SymTable {
        &self.table
    }

    /// Pushes a fresh scope of the given kind and makes it current
    pub fn open_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.stack.last().copied();
        let id = self.table.add_scope(parent, kind);
        self.stack.push(id);
        self.opened += 1;
        debug!("open scope {:?} ({:?}, depth {})", id, kind, self.table.scope(id).depth);
        id
    }

    /// Pops the current scope
    pub fn close_scope(&mut self) {
        let popped = self.stack.pop();
        self.closed += 1;
        debug!("close scope {:?}", popped);
    }

    /// Re-enters an already existing scope (used when a parser branch
    /// continues a module parsed earlier)
    pub fn enter_existing(&mut self, scope: ScopeId) {
        self.stack.push(scope);
        self.opened += 1;
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        self.stack.last().copied()
    }

    fn cur(&self) -> ScopeId {
        self.current_scope().expect("no open scope")
    }

    /// Open/close call counts; equal after a balanced parse
    pub fn scope_balance(&self) -> (usize, usize) {
        (self.opened, self.closed)
    }

    pub fn add_variable(&mut self, name: &str, loc: Span) -> Result<SymId, SemaError> {
        let scope = self.cur();
        self.table.add_variable(name, scope, loc)
    }

    pub fn add_parameter(&mut self, name: &str, loc: Span) -> Result<SymId, SemaError> {
        let scope = self.cur();
        self.table.add_parameter(name, scope, loc)
    }

    /// Declares a function in the scope *enclosing* the given body
    /// scope: the function's name is visible where the function is
    /// declared, not only inside it.
    pub fn add_function(
        &mut self,
        name: &str,
        loc: Span,
        owned: ScopeId,
        param_count: usize,
    ) -> Result<SymId, SemaError> {
        let parent = self.table.scope(owned).parent.unwrap_or(owned);
        self.table.add_function(name, parent, loc, owned, param_count)
    }

    pub fn add_module(&mut self, name: &str, loc: Span, owned: ScopeId) -> Result<SymId, SemaError> {
        let parent = self.table.scope(owned).parent.unwrap_or(owned);
        self.table.add_module(name, parent, loc, owned)
    }

    pub fn add_scope_ref(
        &mut self,
        name: &str,
        loc: Span,
        referenced: ScopeId,
    ) -> Result<SymId, SemaError> {
        let scope = self.cur();
        self.table.add_scope_ref(name, scope, loc, referenced)
    }

    pub fn add_deferred(&mut self, name: &str, loc: Span) -> Result<SymId, SemaError> {
        let scope = self.cur();
        self.table.add_deferred(name, scope, loc)
    }

    /// Records the parameter count of a module after `_entry`
    pub fn set_module_params(&mut self, sym: SymId, count: usize) {
        if let SymData::Module { param_count, .. } = &mut self.table.symbol_mut(sym).data {
            *param_count = count;
        }
    }

    /// Walks enclosing scopes; hides variables and parameters across
    /// function boundaries
    pub fn find(&self, name: &str) -> Option<SymId> {
        let scope = self.current_scope()?;
        self.table.lookup(name, scope)
    }

    /// Current scope only
    pub fn find_scoped(&self, name: &str) -> Option<SymId> {
        let scope = self.current_scope()?;
        self.table.scoped_lookup(name, scope)
    }

    pub fn symbol(&self, id: SymId) -> &Symbol {
        self.table.symbol(id)
    }

    pub fn kind_of(&self, id: SymId) -> SymKind {
        self.table.symbol(id).kind()
    }

    /// Produces a unique name for an anonymous function. The leading
    /// angle bracket keeps it out of the user's namespace.
    pub fn contrive_name(&mut self) -> String {
        let name = format!("<anon:{}>", self.name_idx);
        self.name_idx += 1;
        name
    }
}
