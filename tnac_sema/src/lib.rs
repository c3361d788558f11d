//! Semantic analysis for the tnac language
//!
//! Scopes form a stack during parsing; symbols are interned in a table
//! keyed `name -> (scope -> symbol)`. Name resolution walks enclosing
//! scopes but hides variables and parameters across function
//! boundaries — tnac functions do not capture free variables.

pub mod sema;
pub mod symbols;
pub mod table;

pub use sema::Sema;
pub use symbols::{Scope, ScopeId, ScopeKind, SymData, SymId, SymKind, Symbol};
pub use table::{SemaError, SymTable};
