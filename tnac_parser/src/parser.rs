//! Recursive-descent parser with a Pratt precedence ladder
//!
//! The parser drives sema as it goes: every declaration and identifier
//! use is resolved immediately, and scopes open/close symmetrically
//! around function bodies, conditionals and patterns. Errors become
//! `Error` AST nodes, invalidate their ancestors, and parsing carries
//! on so later mistakes still get reported.

use crate::ast::{Ast, NodeData, NodeId, NodeKind};
use crate::commands;
use crate::diag;
use crate::precedence::Precedence;
use log::debug;
use std::path::PathBuf;
use tnac_common::{Diagnostic, Feedback, FileId, Span};
use tnac_lexer::{Lexer, Token, TokenKind};
use tnac_sema::{ScopeId, ScopeKind, Sema, SymKind};

/// Where an error diagnostic anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrPos {
    /// At the offending token itself
    Current,
    /// Just past the last consumed token
    Last,
}

/// Nested bodies stop at `;`, the top level only at end of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeLevel {
    Global,
    Nested,
}

/// What one `parse` call produced
#[derive(Debug, Clone, Copy)]
pub struct ParseOutcome {
    pub module: NodeId,
    /// The last expression of the batch; what a REPL would print
    pub last: Option<NodeId>,
}

pub struct Parser<'a> {
    ast: &'a mut Ast,
    sema: &'a mut Sema,
    feedback: &'a mut Feedback,
    lex: Lexer,
    last_tok: Option<Token>,
    terminate_at: Option<TokenKind>,
}

impl<'a> Parser<'a> {
    pub fn new(ast: &'a mut Ast, sema: &'a mut Sema, feedback: &'a mut Feedback) -> Self {
        Self {
            ast,
            sema,
            feedback,
            lex: Lexer::new("", 0),
            last_tok: None,
            terminate_at: None,
        }
    }

    /// Parses one buffer into the named module, creating root, global
    /// scope and the module on first use. Scope opens and closes are
    /// balanced within the call.
    pub fn parse(&mut self, input: &str, file_id: FileId, module_name: &str) -> ParseOutcome {
        debug!("parsing {} bytes into module '{}'", input.len(), module_name);
        self.lex = Lexer::new(input, file_id);
        self.last_tok = None;
        self.terminate_at = None;

        if self.ast.root().is_none() {
            self.ast.make_root();
        }
        let root = self.ast.root().expect("root was just ensured");

        // the global scope is always the first one the table hands out
        if self.sema.table().scope_count() == 0 {
            self.sema.open_scope(ScopeKind::Global);
        } else {
            self.sema.enter_existing(ScopeId(0));
        }

        let module = self.start_module(root, module_name, file_id);

        self.import_seq(module);
        self.entry(module);

        let exprs = self.expression_list(ScopeLevel::Global);
        let last = exprs.last().copied();
        for e in exprs {
            self.ast.append_child(module, e);
        }

        self.sema.close_scope(); // module
        self.sema.close_scope(); // global

        ParseOutcome { module, last }
    }

    // Module plumbing

    fn start_module(&mut self, root: NodeId, name: &str, file_id: FileId) -> NodeId {
        if let Some(existing) = self.ast.find_module(name) {
            let scope = match self.ast.data(existing) {
                NodeData::Module { scope, .. } => *scope,
                _ => unreachable!("find_module returns modules"),
            };
            self.sema.enter_existing(scope);
            return existing;
        }

        let scope = self.sema.open_scope(ScopeKind::Module);
        let loc = Span::single(tnac_common::Position::start(), file_id);
        let sym = self
            .sema
            .add_module(name, loc, scope)
            .unwrap_or_else(|_| panic!("module name '{}' already bound to a non-module", name));
        let module = self.ast.make(NodeData::Module {
            name: name.to_string(),
            sym,
            scope,
            imports: Vec::new(),
            params: Vec::new(),
            children: Vec::new(),
        });
        self.ast.append_child(root, module);
        module
    }

    fn entry(&mut self, module: NodeId) {
        if !self.peek().is(TokenKind::KwEntry) {
            return;
        }
        self.next_tok();

        if !self.peek().is(TokenKind::ParenOpen) {
            let tok = self.peek().clone();
            self.error_expr(&tok, diag::expected('('), ErrPos::Current);
            return;
        }
        self.next_tok();

        let mut params = self.formal_params();
        if !self.peek().is(TokenKind::ParenClose) {
            let tok = self.peek().clone();
            let err = self.error_expr(&tok, diag::expected(')'), ErrPos::Last);
            params.push(self.ast.make(NodeData::ParamDecl { name: tok, sym: None, err: Some(err) }));
        } else {
            self.next_tok();
        }

        let count = params.len();
        let sym = match self.ast.data(module) {
            NodeData::Module { sym, .. } => *sym,
            _ => unreachable!("entry is parsed inside a module"),
        };
        self.sema.set_module_params(sym, count);
        self.ast.set_module_params(module, params);
    }

    fn import_seq(&mut self, module: NodeId) {
        while let Some(imp) = self.import_dir(module) {
            self.ast.add_import(module, imp);
            if self.peek().is(TokenKind::ExprSep) {
                self.next_tok();
            }
        }
    }

    fn import_dir(&mut self, module: NodeId) -> Option<NodeId> {
        if !self.peek().is(TokenKind::KwImport) {
            return None;
        }
        let kw = self.next_tok();

        let mut components = Vec::new();
        let mut load_path = PathBuf::new();

        while self.peek().is_identifier() {
            let id = self.next_tok();
            load_path.push(id.text());

            if self.peek().is(TokenKind::Dot) {
                self.next_tok();
                // intermediate component; a placeholder until the final
                // module resolves
                let sym = match self.sema.add_deferred(id.text(), id.at()) {
                    Ok(sym) => sym,
                    Err(_) => self
                        .sema
                        .find(id.text())
                        .expect("existing symbol blocked the deferred insert"),
                };
                components.push(self.ast.make(NodeData::Id { tok: id, sym }));

                if !self.peek().is_identifier() {
                    let tok = self.peek().clone();
                    let err = self.error_expr(&tok, diag::expected_id(), ErrPos::Last);
                    self.ast.append_child(module, err);
                    return None;
                }
                continue;
            }

            // final component: ask the host to load the file, then
            // resolve or pre-register the module symbol
            let loaded = self.feedback.load_file(&load_path);
            let mod_sym = if loaded {
                match self.sema.find(id.text()) {
                    Some(s) if self.sema.kind_of(s) == SymKind::Module => Some(s),
                    Some(_) => None,
                    None => {
                        // the file is queued but not parsed yet;
                        // register the module ahead of its definition
                        self.sema.enter_existing(ScopeId(0));
                        let scope = self.sema.open_scope(ScopeKind::Module);
                        self.sema.close_scope();
                        self.sema.close_scope();
                        self.sema.add_module(id.text(), id.at(), scope).ok()
                    }
                }
            } else {
                None
            };

            let Some(mod_sym) = mod_sym else {
                let err = self.error_expr(&id, diag::import_failed(id.text()), ErrPos::Current);
                self.ast.append_child(module, err);
                return None;
            };

            components.push(self.ast.make(NodeData::Id { tok: id, sym: mod_sym }));
            return Some(self.ast.make(NodeData::Import { kw, components, target: mod_sym }));
        }

        let err = self.error_expr(&kw, diag::empty_import(), ErrPos::Last);
        self.ast.append_child(module, err);
        None
    }

    // Token plumbing

    fn peek(&mut self) -> &Token {
        self.lex.peek()
    }

    fn next_tok(&mut self) -> Token {
        let tok = self.lex.next_token();
        self.last_tok = Some(tok.clone());
        tok
    }

    fn last_or<'t>(&'t self, dummy: &'t Token) -> &'t Token {
        self.last_tok.as_ref().unwrap_or(dummy)
    }

    fn error_expr(&mut self, pos: &Token, msg: String, at: ErrPos) -> NodeId {
        let anchor = match at {
            ErrPos::Current => pos.clone(),
            ErrPos::Last => self.last_or(pos).after(),
        };
        let diagnostic = Diagnostic::error(msg.clone(), anchor.at());
        self.feedback.parse_error(&diagnostic);
        self.ast.make_error(anchor, msg)
    }

    // Commands

    fn command(&mut self, consume_separator: bool) {
        if !self.peek().is(TokenKind::Command) {
            return;
        }
        let name = self.next_tok();
        let mut args = Vec::new();
        loop {
            let next = self.peek();
            if next.is_eol() {
                break;
            }
            if next.is(TokenKind::ExprSep) {
                if consume_separator {
                    self.next_tok();
                }
                break;
            }
            args.push(self.next_tok());
        }
        if let Err(err) = commands::interpret(&name, &args, self.feedback) {
            self.feedback.report(err);
        }
    }

    // Expression sequencing

    fn expression_list(&mut self, level: ScopeLevel) -> Vec<NodeId> {
        let mut res = Vec::new();

        while !self.peek().is_eol() {
            self.command(true);
            if self.peek().is_eol() {
                break;
            }

            let before = (self.peek().kind(), self.peek().at());
            let e = self.ret_expr();
            res.push(e);
            self.command(false);

            let next_kind = self.peek().kind();
            if next_kind == TokenKind::Eol {
                break;
            }
            if level == ScopeLevel::Nested && next_kind == TokenKind::Semicolon {
                break;
            }
            if next_kind == TokenKind::ExprSep {
                self.next_tok();
                continue;
            }
            if self.has_implicit_separator(e) {
                continue;
            }

            if self.ast.is_valid(e) {
                let tok = self.peek().clone();
                res.push(self.error_expr(&tok, diag::expected_expr_sep(), ErrPos::Last));
            } else if (self.peek().kind(), self.peek().at()) == before {
                // a failed sub-parse may leave the stream untouched;
                // force progress so the loop cannot spin
                self.next_tok();
            }
        }

        res
    }

    fn has_implicit_separator(&self, id: NodeId) -> bool {
        match self.ast.data(id) {
            NodeData::Binary { right, .. } => self.has_implicit_separator(*right),
            NodeData::Unary { operand, .. } => self.has_implicit_separator(*operand),
            NodeData::VarDecl { init, .. } => self.has_implicit_separator(*init),
            NodeData::FuncDecl { .. }
            | NodeData::Cond { .. }
            | NodeData::CondShort { .. }
            | NodeData::Pattern { .. } => true,
            _ => false,
        }
    }

    fn ret_expr(&mut self) -> NodeId {
        if self.peek().is(TokenKind::KwRet) {
            let tok = self.next_tok();
            let value = self.expr();
            return self.ast.make(NodeData::Ret { tok, value });
        }
        self.expr()
    }

    fn expr(&mut self) -> NodeId {
        self.decl_expr()
    }

    // Declarations

    fn decl_expr(&mut self) -> NodeId {
        let Some(decl) = self.declarator() else {
            return self.assign_expr();
        };
        if !self.ast.is_valid(decl) {
            let pos = self.ast.pos(decl).cloned().unwrap_or_else(|| self.peek().clone());
            return self.error_expr(&pos, diag::invalid_decl(), ErrPos::Current);
        }
        decl
    }

    /// An unbound identifier begins a declaration
    fn declarator(&mut self) -> Option<NodeId> {
        if !self.peek().is_identifier() {
            return None;
        }
        let name = self.peek().text().to_string();
        if self.sema.find(&name).is_some() {
            return None;
        }
        let name_tok = self.next_tok();
        Some(self.var_decl(name_tok))
    }

    fn var_decl(&mut self, name: Token) -> NodeId {
        let op = self.peek().clone();

        if op.is(TokenKind::ParenOpen) {
            return self.func_decl(name);
        }

        let init = if op.is(TokenKind::Assign) {
            self.next_tok();
            self.expr()
        } else {
            self.error_expr(&op, diag::expected_init(), ErrPos::Current)
        };

        let sym = match self.sema.add_variable(name.text(), name.at()) {
            Ok(sym) => sym,
            Err(_) => {
                return self.error_expr(&name, diag::name_redef(), ErrPos::Current);
            }
        };
        self.ast.make(NodeData::VarDecl { name, sym, init })
    }

    fn func_decl(&mut self, name: Token) -> NodeId {
        debug_assert!(self.peek().is(TokenKind::ParenOpen));
        self.next_tok();

        let owned = self.sema.open_scope(ScopeKind::Function);

        let mut params = self.formal_params();
        if !self.peek().is(TokenKind::ParenClose) {
            let tok = self.peek().clone();
            let err = self.error_expr(&tok, diag::expected(')'), ErrPos::Last);
            params.push(self.ast.make(NodeData::ParamDecl { name: tok, sym: None, err: Some(err) }));
        } else {
            self.next_tok();
        }

        let name = if name.is(TokenKind::KwFunction) {
            Token::new(TokenKind::Identifier, self.sema.contrive_name(), name.at())
        } else {
            name
        };

        // register before the body so the function can call itself
        let sym = self.sema.add_function(name.text(), name.at(), owned, params.len());

        let body_children = if self.peek().is(TokenKind::Semicolon) {
            self.next_tok();
            Vec::new()
        } else {
            let mut list = self.expression_list(ScopeLevel::Nested);
            if !self.peek().is(TokenKind::Semicolon) {
                let tok = self.peek().clone();
                list.push(self.error_expr(&tok, diag::expected_func_end(), ErrPos::Last));
            } else {
                self.next_tok();
            }
            list
        };

        self.sema.close_scope();

        let body = self.ast.make(NodeData::Scope { children: body_children });
        match sym {
            Ok(sym) => self.ast.make(NodeData::FuncDecl { name, sym, params, body }),
            Err(_) => self.error_expr(&name, diag::name_redef(), ErrPos::Current),
        }
    }

    fn param_decl(&mut self) -> NodeId {
        let name = self.peek().clone();

        if !name.is_identifier() {
            self.expr();
            let err = self.error_expr(&name, diag::expected_id(), ErrPos::Current);
            return self.ast.make(NodeData::ParamDecl { name, sym: None, err: Some(err) });
        }

        if self.sema.find_scoped(name.text()).is_some() {
            self.next_tok();
            let err = self.error_expr(&name, diag::param_redef(), ErrPos::Current);
            return self.ast.make(NodeData::ParamDecl { name, sym: None, err: Some(err) });
        }

        self.next_tok();
        let sym = self.sema.add_parameter(name.text(), name.at()).ok();

        let next = self.peek().clone();
        let err = if !next
            .is_any(&[TokenKind::Comma, TokenKind::ParenClose, TokenKind::Semicolon, TokenKind::Eol])
        {
            self.expr();
            Some(self.error_expr(&name, diag::expr_not_allowed(), ErrPos::Current))
        } else {
            None
        };

        self.ast.make(NodeData::ParamDecl { name, sym, err })
    }

    fn formal_params(&mut self) -> Vec<NodeId> {
        let mut res = Vec::new();
        loop {
            if self.peek().is_any(&[TokenKind::ParenClose, TokenKind::Eol]) {
                break;
            }
            res.push(self.param_decl());
            if self.peek().is(TokenKind::Comma) {
                self.next_tok();
                continue;
            }
            break;
        }
        res
    }

    // Expressions

    fn assign_expr(&mut self) -> NodeId {
        let mut lhs = self.binary_expr(Precedence::LogicalOr);

        if !self.peek().is(TokenKind::Assign) {
            return lhs;
        }

        match self.ast.data(lhs) {
            NodeData::Id { sym, .. } => {
                if !self.sema.symbol(*sym).is_assignable() {
                    let pos = self.ast.pos(lhs).cloned().unwrap_or_else(|| self.peek().clone());
                    lhs = self.error_expr(&pos, diag::expected_assignable(), ErrPos::Current);
                }
            }
            _ => {
                let pos = self.ast.pos(lhs).cloned().unwrap_or_else(|| self.peek().clone());
                lhs = self.error_expr(&pos, diag::expected_single_id(), ErrPos::Current);
            }
        }

        let op = self.next_tok();
        let rhs = self.assign_expr();
        self.ast.make(NodeData::Assign { op, left: lhs, right: rhs })
    }

    fn binary_expr(&mut self, prec: Precedence) -> NodeId {
        let mut res = self.expr_by_prec(prec);

        loop {
            let (next_kind, matches) = {
                let next = self.peek();
                (next.kind(), prec.matches(next))
            };
            if Some(next_kind) == self.terminate_at {
                break;
            }
            if !matches {
                break;
            }
            let op = self.next_tok();
            let rhs = self.expr_by_prec(prec);
            res = self.ast.make(NodeData::Binary { op, left: res, right: rhs });
        }

        res
    }

    fn expr_by_prec(&mut self, prec: Precedence) -> NodeId {
        let next = prec.next();
        if next == Precedence::Unary {
            return self.unary_expr();
        }
        self.binary_expr(next)
    }

    fn unary_expr(&mut self) -> NodeId {
        if !self.peek().kind().is_unary_op() {
            return self.call_expr();
        }
        let op = self.next_tok();
        let operand = self.unary_expr();
        self.ast.make(NodeData::Unary { op, operand })
    }

    fn call_expr(&mut self) -> NodeId {
        let mut res = self.primary_expr();

        loop {
            if self.peek().is(TokenKind::ParenOpen) {
                self.next_tok();
                let args = self.arg_list(TokenKind::ParenClose);
                if !self.peek().is(TokenKind::ParenClose) {
                    let tok = self.peek().clone();
                    return self.error_expr(&tok, diag::expected(')'), ErrPos::Last);
                }
                self.next_tok();
                res = self.ast.make(NodeData::Call { callee: res, args });
                continue;
            }
            if self.peek().is(TokenKind::Dot) {
                self.next_tok();
                if !self.peek().is_identifier() {
                    let tok = self.peek().clone();
                    return self.error_expr(&tok, diag::expected_id(), ErrPos::Last);
                }
                let member = self.next_tok();
                res = self.ast.make(NodeData::Dot { target: res, member });
                continue;
            }
            break;
        }

        res
    }

    fn arg_list(&mut self, closing: TokenKind) -> Vec<NodeId> {
        let mut res = Vec::new();
        while !self.peek().is_eol() {
            if self.peek().is(closing) {
                break;
            }
            res.push(self.expr());
            if !self.peek().is(TokenKind::Comma) {
                break;
            }
            self.next_tok();
        }
        res
    }

    fn primary_expr(&mut self) -> NodeId {
        let next = self.peek().clone();

        if next.is_literal() {
            let tok = self.next_tok();
            return self.ast.make(NodeData::Literal { tok });
        }

        if next.kind().is_type_keyword() {
            return self.typed_expr();
        }

        if next.is(TokenKind::KwFunction) {
            return self.anonymous_function();
        }

        if next.is(TokenKind::KwResult) {
            let tok = self.next_tok();
            return self.ast.make(NodeData::Result { tok });
        }

        if next.is(TokenKind::BracketOpen) {
            return self.array_expr();
        }

        if next.is(TokenKind::Pipe) {
            return self.abs_expr();
        }

        if next.is(TokenKind::ParenOpen) {
            return self.paren_expr();
        }

        if next.is(TokenKind::CurlyOpen) {
            return self.cond_expr();
        }

        if next.is_identifier() {
            let sym = self.sema.find(next.text());
            let tok = self.next_tok();
            return match sym {
                Some(sym) => self.ast.make(NodeData::Id { tok, sym }),
                None => self.error_expr(&tok, diag::undef_id(), ErrPos::Current),
            };
        }

        let err = self.next_tok();
        self.error_expr(&err, diag::expected_expr(), ErrPos::Current)
    }

    fn anonymous_function(&mut self) -> NodeId {
        debug_assert!(self.peek().is(TokenKind::KwFunction));
        let kw = self.next_tok();
        if !self.peek().is(TokenKind::ParenOpen) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected('('), ErrPos::Current);
        }
        let decl = self.func_decl(kw.clone());
        if !self.ast.is_valid(decl) {
            return self.error_expr(&kw, diag::invalid_lambda(), ErrPos::Current);
        }
        decl
    }

    fn typed_expr(&mut self) -> NodeId {
        let kw = self.next_tok();

        if !self.peek().is(TokenKind::ParenOpen) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected_args(), ErrPos::Last);
        }
        self.next_tok();

        let args = self.arg_list(TokenKind::ParenClose);
        if !self.peek().is(TokenKind::ParenClose) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected(')'), ErrPos::Last);
        }
        self.next_tok();

        self.ast.make(NodeData::Typed { kw, args })
    }

    fn array_expr(&mut self) -> NodeId {
        let pos = self.next_tok();
        let mut elements = self.arg_list(TokenKind::BracketClose);

        if !self.peek().is(TokenKind::BracketClose) {
            let tok = self.peek().clone();
            elements.push(self.error_expr(&tok, diag::expected(']'), ErrPos::Last));
        } else {
            self.next_tok();
        }

        self.ast.make(NodeData::Array { pos, elements })
    }

    fn paren_expr(&mut self) -> NodeId {
        self.next_tok();

        let saved = self.terminate_at.take();
        let inner = self.expr();
        self.terminate_at = saved;

        if !self.peek().is(TokenKind::ParenClose) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected(')'), ErrPos::Last);
        }
        self.next_tok();
        self.ast.make(NodeData::Paren { inner })
    }

    fn abs_expr(&mut self) -> NodeId {
        self.next_tok();

        let saved = self.terminate_at.replace(TokenKind::Pipe);
        let inner = self.expr();
        self.terminate_at = saved;

        if !self.peek().is(TokenKind::Pipe) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected('|'), ErrPos::Last);
        }
        self.next_tok();
        self.ast.make(NodeData::Abs { inner })
    }

    // Conditionals

    fn cond_expr(&mut self) -> NodeId {
        self.sema.open_scope(ScopeKind::Block);
        let res = self.cond_expr_inner();
        self.sema.close_scope();
        res
    }

    fn cond_expr_inner(&mut self) -> NodeId {
        let cond = self.cond();
        if self.peek().is(TokenKind::Arrow) {
            self.next_tok();
            return self.cond_short(cond);
        }
        self.cond_body(cond)
    }

    fn cond(&mut self) -> NodeId {
        debug_assert!(self.peek().is(TokenKind::CurlyOpen));
        self.next_tok();

        if self.peek().is(TokenKind::CurlyClose) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::empty_cond(), ErrPos::Current);
        }

        let c = self.expr();
        if !self.peek().is(TokenKind::CurlyClose) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected('}'), ErrPos::Last);
        }
        self.next_tok();
        c
    }

    fn cond_short(&mut self, cond: NodeId) -> NodeId {
        if !self.peek().is(TokenKind::CurlyOpen) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected('{'), ErrPos::Current);
        }
        self.next_tok();

        let mut on_true = None;
        let mut on_false = None;

        if !self.peek().is_any(&[TokenKind::Comma, TokenKind::CurlyClose]) {
            on_true = Some(self.expr());
        }

        if !self.peek().is(TokenKind::CurlyClose) {
            if self.peek().is(TokenKind::Comma) {
                self.next_tok();
                if !self.peek().is(TokenKind::CurlyClose) {
                    on_false = Some(self.expr());
                }
            } else {
                let tok = self.peek().clone();
                self.expr();
                on_false = Some(self.error_expr(&tok, diag::expected(','), ErrPos::Current));
            }
        }

        if !self.peek().is(TokenKind::CurlyClose) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected('}'), ErrPos::Last);
        }
        self.next_tok();

        self.ast.make(NodeData::CondShort { cond, on_true, on_false })
    }

    fn cond_body(&mut self, cond: NodeId) -> NodeId {
        let mut patterns = Vec::new();
        while !self.peek().is_any(&[TokenKind::Eol, TokenKind::Semicolon]) {
            patterns.push(self.cond_pattern());
        }

        if !self.peek().is(TokenKind::Semicolon) {
            let tok = self.peek().clone();
            patterns.push(self.error_expr(&tok, diag::expected_cond_end(), ErrPos::Last));
        }
        self.next_tok();

        let scope = self.ast.make(NodeData::Scope { children: patterns });
        self.ast.make(NodeData::Cond { cond, patterns: scope })
    }

    fn cond_pattern(&mut self) -> NodeId {
        self.sema.open_scope(ScopeKind::Block);
        let matcher = self.cond_matcher();

        let body_children = if !self.peek().is(TokenKind::Semicolon) {
            let mut list = self.expression_list(ScopeLevel::Nested);
            if !self.peek().is(TokenKind::Semicolon) {
                let tok = self.next_tok();
                list.push(self.error_expr(&tok, diag::expected_pattern_end(), ErrPos::Last));
            }
            list
        } else {
            Vec::new()
        };
        self.next_tok();
        self.sema.close_scope();

        let body = self.ast.make(NodeData::Scope { children: body_children });
        self.ast.make(NodeData::Pattern { matcher, body })
    }

    fn cond_matcher(&mut self) -> NodeId {
        if !self.peek().is(TokenKind::CurlyOpen) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected('{'), ErrPos::Current);
        }

        let mut op = self.next_tok();
        let mut checked = None;

        let is_rel = |t: &Token| {
            t.is_any(&[
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Less,
                TokenKind::LessEq,
                TokenKind::Greater,
                TokenKind::GreaterEq,
            ])
        };
        let is_unary_matcher =
            |t: &Token| t.is_any(&[TokenKind::Exclamation, TokenKind::Question]);

        if is_rel(self.peek()) {
            op = self.next_tok();
            if self.peek().is(TokenKind::CurlyClose) {
                let tok = self.next_tok();
                return self.error_expr(&tok, diag::expected_expr(), ErrPos::Current);
            }
        } else if is_unary_matcher(self.peek()) {
            op = self.next_tok();
        }

        if !self.peek().is(TokenKind::CurlyClose) {
            let mut inner = self.expr();
            if is_unary_matcher(&op) {
                inner = self.ast.make(NodeData::Unary { op: op.clone(), operand: inner });
            }
            if !self.peek().is(TokenKind::CurlyClose) {
                let tok = self.peek().clone();
                return self.error_expr(&tok, diag::expected('}'), ErrPos::Last);
            }
            checked = Some(inner);
        }

        self.next_tok();
        if !self.peek().is(TokenKind::Arrow) {
            let tok = self.peek().clone();
            return self.error_expr(&tok, diag::expected_matcher_def(), ErrPos::Last);
        }
        self.next_tok();

        self.ast.make(NodeData::Matcher { op, checked })
    }
}

/// Convenience for hosts and tests: is this node an error expression?
pub fn is_error(ast: &Ast, id: NodeId) -> bool {
    ast.kind(id) == NodeKind::Error
}
