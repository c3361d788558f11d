//! AST to IR lowering
//!
//! The compiler walks the AST with an operand stack. Sub-expressions
//! whose operands are all known values fold at compile time through
//! the same value arithmetic the evaluator uses, so folding is
//! observationally equivalent to executing the unfolded IR.

use crate::context::FuncCtx;
use log::debug;
use std::collections::HashSet;
use tnac_common::{Feedback, Span};
use tnac_lexer::{Token, TokenKind};
use tnac_parser::{Ast, NodeData, NodeId};
use tnac_sema::{Sema, SymId, SymKind};
use tnac_ir::{BlockId, Cfg, EdgeId, FuncId, OpCode, Operand};
use tnac_value::{
    binary as val_binary, instantiate, to_bool, unary as val_unary, BinaryOp, FuncRef, TypeId,
    UnaryOp, Value, ValueStore,
};

fn binary_op_of(tok: TokenKind) -> Option<(BinaryOp, OpCode)> {
    use TokenKind::*;
    Some(match tok {
        Plus => (BinaryOp::Add, OpCode::Add),
        Minus => (BinaryOp::Sub, OpCode::Sub),
        Asterisk => (BinaryOp::Mul, OpCode::Mul),
        Slash => (BinaryOp::Div, OpCode::Div),
        Percent => (BinaryOp::Mod, OpCode::Mod),
        Pow => (BinaryOp::Pow, OpCode::Pow),
        Root => (BinaryOp::Root, OpCode::Root),
        Amp => (BinaryOp::BitAnd, OpCode::And),
        Pipe => (BinaryOp::BitOr, OpCode::Or),
        Hat => (BinaryOp::BitXor, OpCode::Xor),
        Eq => (BinaryOp::Equal, OpCode::CmpE),
        NotEq => (BinaryOp::NotEqual, OpCode::CmpNE),
        Less => (BinaryOp::Less, OpCode::CmpL),
        LessEq => (BinaryOp::LessEq, OpCode::CmpLE),
        Greater => (BinaryOp::Greater, OpCode::CmpG),
        GreaterEq => (BinaryOp::GreaterEq, OpCode::CmpGE),
        _ => return None,
    })
}

fn unary_op_of(tok: TokenKind) -> Option<(UnaryOp, OpCode)> {
    use TokenKind::*;
    Some(match tok {
        Plus => (UnaryOp::Plus, OpCode::Plus),
        Minus => (UnaryOp::Neg, OpCode::Neg),
        Tilde => (UnaryOp::BitNot, OpCode::BNeg),
        Exclamation => (UnaryOp::LogNot, OpCode::CmpNot),
        Question => (UnaryOp::LogIs, OpCode::CmpIs),
        _ => return None,
    })
}

fn type_of_kw(tok: TokenKind) -> Option<(TypeId, OpCode)> {
    use TokenKind::*;
    Some(match tok {
        KwBool => (TypeId::Bool, OpCode::Bool),
        KwInt => (TypeId::Int, OpCode::Int),
        KwFloat => (TypeId::Float, OpCode::Float),
        KwFraction => (TypeId::Fraction, OpCode::Frac),
        KwComplex => (TypeId::Complex, OpCode::Cplx),
        _ => return None,
    })
}

fn func_id_of(sym: SymId) -> FuncId {
    FuncId(sym.0 as u64)
}

pub struct Compiler<'a> {
    sema: &'a Sema,
    ast: &'a Ast,
    cfg: &'a mut Cfg,
    store: &'a mut ValueStore,
    feedback: &'a mut Feedback,
    stack: Vec<Operand>,
    ctx: Vec<FuncCtx>,
}

impl<'a> Compiler<'a> {
    pub fn new(
        sema: &'a Sema,
        ast: &'a Ast,
        cfg: &'a mut Cfg,
        store: &'a mut ValueStore,
        feedback: &'a mut Feedback,
    ) -> Self {
        Self { sema, ast, cfg, store, feedback, stack: Vec::new(), ctx: Vec::new() }
    }

    /// Compiles every module under the root, imported modules first
    pub fn compile_root(&mut self, root: NodeId) {
        let modules = self.ast.children(root);
        let mut visited = HashSet::new();
        for m in modules {
            self.compile_module_rec(m, &mut visited);
        }
    }

    fn compile_module_rec(&mut self, module: NodeId, visited: &mut HashSet<NodeId>) {
        if !visited.insert(module) {
            return;
        }
        let imports = match self.ast.data(module) {
            NodeData::Module { imports, .. } => imports.clone(),
            _ => return,
        };
        for imp in imports {
            if let NodeData::Import { target, .. } = self.ast.data(imp) {
                if let Some(dep) = self.module_node_of(*target) {
                    self.compile_module_rec(dep, visited);
                }
            }
        }
        self.compile_module(module);
    }

    fn module_node_of(&self, sym: SymId) -> Option<NodeId> {
        let root = self.ast.root()?;
        self.ast
            .children(root)
            .into_iter()
            .find(|m| matches!(self.ast.data(*m), NodeData::Module { sym: s, .. } if *s == sym))
    }

    fn compile_module(&mut self, module: NodeId) {
        let (sym, name, params, children) = match self.ast.data(module) {
            NodeData::Module { sym, name, params, children, .. } => {
                (*sym, name.clone(), params.clone(), children.clone())
            }
            _ => return,
        };

        let fid = func_id_of(sym);
        // a module compiled on an earlier pass has its blocks already
        if self.cfg.find_function(fid).is_some_and(|f| !f.blocks.is_empty()) {
            return;
        }
        debug!("compiling module '{}'", name);

        self.cfg.declare_module(fid, name, params.len());
        let entry = self.cfg.create_block(fid, "entry");
        self.ctx.push(FuncCtx::new(fid, entry));

        for (idx, p) in params.iter().enumerate() {
            self.compile_param(*p, idx as u16);
        }
        let ret = self.compile_statements(&children);
        if let Some(op) = ret {
            self.emit_ret(op);
        }
        self.ctx.pop();
    }

    fn compile_function(&mut self, sym: SymId, params: &[NodeId], body: NodeId) {
        let name = self.sema.symbol(sym).name.clone();
        let fid = func_id_of(sym);
        let parent = self.cur().func;
        self.cfg.declare_function(fid, Some(parent), name, params.len());
        if self.cfg.function(fid).entry.is_some() {
            // declared and compiled already (idempotent redeclaration)
            return;
        }
        let entry = self.cfg.create_block(fid, "entry");
        self.ctx.push(FuncCtx::new(fid, entry));

        for (idx, p) in params.iter().enumerate() {
            self.compile_param(*p, idx as u16);
        }
        let children = self.ast.children(body);
        let ret = self.compile_statements(&children);
        if let Some(op) = ret {
            self.emit_ret(op);
        }
        self.ctx.pop();
    }

    fn compile_param(&mut self, param: NodeId, idx: u16) {
        let sym = match self.ast.data(param) {
            NodeData::ParamDecl { sym, .. } => *sym,
            _ => None,
        };
        let Some(sym) = sym else {
            return;
        };
        self.emit_alloc(sym);
        self.stack.push(Operand::Param(idx));
        self.emit_store(sym);
        self.stack.pop();
    }

    /// Compiles a statement list and returns the operand carrying its
    /// final value, or `None` when every path already returned
    fn compile_statements(&mut self, children: &[NodeId]) -> Option<Operand> {
        let depth = self.stack.len();

        for child in children {
            if self.cur().returned {
                let at = self.span_of(*child);
                self.feedback.compile_warning(at, "unreachable code after return");
                break;
            }
            if !self.ast.is_valid(*child) {
                let at = self.span_of(*child);
                let msg = self
                    .first_error_message(*child)
                    .unwrap_or_else(|| "expression skipped due to earlier errors".to_string());
                self.feedback.compile_error(at, &msg);
                continue;
            }
            self.compile(*child);
        }

        if self.cur().returned {
            self.stack.truncate(depth);
            return None;
        }

        let op = if self.stack.len() > depth {
            self.stack.pop().expect("stack checked non-empty")
        } else {
            Operand::Value(Value::Undef)
        };
        self.stack.truncate(depth);
        Some(op)
    }

    fn first_error_message(&self, node: NodeId) -> Option<String> {
        if let Some(msg) = self.ast.error_message(node) {
            return Some(msg.to_string());
        }
        for child in self.ast.children(node) {
            if !self.ast.is_valid(child) {
                if let Some(msg) = self.first_error_message(child) {
                    return Some(msg);
                }
            }
        }
        None
    }

    fn span_of(&self, node: NodeId) -> Span {
        self.ast.pos(node).map(|t| t.at()).unwrap_or_else(Span::dummy)
    }

    // Expression dispatch

    fn compile(&mut self, node: NodeId) {
        let data = self.ast.data(node).clone();
        match data {
            NodeData::Literal { tok } => self.compile_literal(&tok),
            NodeData::Id { sym, tok } => self.compile_id(sym, &tok),
            NodeData::Unary { op, operand } => self.compile_unary(&op, operand),
            NodeData::Binary { op, left, right } => self.compile_binary(&op, left, right),
            NodeData::Assign { left, right, .. } => self.compile_assign(left, right),
            NodeData::Paren { inner } => self.compile(inner),
            NodeData::Abs { inner } => self.compile_abs(inner),
            NodeData::Typed { kw, args } => self.compile_typed(&kw, &args),
            NodeData::Call { callee, args } => self.compile_call(callee, &args),
            NodeData::Dot { target, member } => self.compile_dot(target, &member),
            NodeData::Array { elements, .. } => self.compile_array(&elements),
            NodeData::Result { .. } => self.compile_result(),
            NodeData::Ret { value, .. } => self.compile_ret(value),
            NodeData::VarDecl { sym, init, .. } => self.compile_var_decl(sym, init),
            NodeData::FuncDecl { sym, params, body, .. } => {
                self.compile_function(sym, &params, body);
                self.stack.push(Operand::Value(Value::Function(FuncRef(sym.0 as u64))));
            }
            NodeData::CondShort { cond, on_true, on_false } => {
                self.compile_cond_short(cond, on_true, on_false)
            }
            NodeData::Cond { cond, patterns } => self.compile_cond(cond, patterns),
            // structure nodes never appear in statement position
            _ => self.stack.push(Operand::Value(Value::Undef)),
        }
    }

    fn compile_literal(&mut self, tok: &Token) {
        use TokenKind::*;
        let val = match tok.kind() {
            KwTrue => Value::Bool(true),
            KwFalse => Value::Bool(false),
            KwI => Value::i(),
            KwPi => Value::pi(),
            KwE => Value::e(),
            IntDec => Value::parse_int(tok.text(), 10),
            IntBin => Value::parse_int(tok.text(), 2),
            IntOct => Value::parse_int(tok.text(), 8),
            IntHex => Value::parse_int(tok.text(), 16),
            Float => Value::parse_float(tok.text()),
            _ => Value::Undef,
        };
        self.stack.push(Operand::Value(val));
    }

    fn compile_id(&mut self, sym: SymId, tok: &Token) {
        match self.sema.kind_of(sym) {
            SymKind::Variable | SymKind::Parameter => self.emit_load(sym, tok),
            SymKind::Function | SymKind::Module | SymKind::ScopeRef | SymKind::Deferred => {
                self.stack.push(Operand::Value(Value::Function(FuncRef(sym.0 as u64))));
            }
        }
    }

    fn compile_unary(&mut self, op: &Token, operand: NodeId) {
        self.compile(operand);
        let val = self.pop();
        let Some((vop, opcode)) = unary_op_of(op.kind()) else {
            self.stack.push(Operand::Value(Value::Undef));
            return;
        };
        if let Operand::Value(v) = &val {
            let folded = val_unary(vop, v, self.store);
            self.stack.push(Operand::Value(folded));
            return;
        }
        self.emit_unary(opcode, val);
    }

    fn compile_binary(&mut self, op: &Token, left: NodeId, right: NodeId) {
        if matches!(op.kind(), TokenKind::LogAnd | TokenKind::LogOr) {
            return self.compile_logical(op, left, right);
        }

        self.compile(left);
        self.compile(right);
        let rhs = self.pop();
        let lhs = self.pop();

        let Some((vop, opcode)) = binary_op_of(op.kind()) else {
            self.stack.push(Operand::Value(Value::Undef));
            return;
        };
        if let (Operand::Value(l), Operand::Value(r)) = (&lhs, &rhs) {
            let folded = val_binary(vop, l, r, self.store);
            self.stack.push(Operand::Value(folded));
            return;
        }
        self.emit_binary(opcode, lhs, rhs);
    }

    fn compile_logical(&mut self, op: &Token, left: NodeId, right: NodeId) {
        let is_and = op.kind() == TokenKind::LogAnd;

        self.compile(left);
        let lhs = self.pop();

        if let Operand::Value(v) = &lhs {
            let b = to_bool(v).unwrap_or(false);
            let forced = (b && !is_and) || (!b && is_and);
            if forced {
                self.feedback.compile_warning(
                    op.at(),
                    if b { "condition is always true" } else { "condition is always false" },
                );
                self.stack.push(Operand::Value(Value::Bool(b)));
                return;
            }
            // the known side cannot decide the result; it reduces to
            // the truthiness of the right side
            self.compile(right);
            let rhs = self.pop();
            self.emit_is(rhs);
            return;
        }

        let stem = if is_and { "land" } else { "lor" };
        let func = self.cur().func;
        let rhs_name = self.cur_mut().block_name(&format!("{}.rhs", stem));
        let end_name = self.cur_mut().block_name(&format!("{}.end", stem));
        let rhs_block = self.cfg.create_block(func, rhs_name);
        let end_block = self.cfg.create_block(func, end_name);

        let short_val = Operand::Value(Value::Bool(!is_and));
        let short_edge = if is_and {
            // false short-circuits straight to the end
            self.emit_cond_jump(lhs, rhs_block, end_block, Operand::Value(Value::Undef), short_val)
                .1
        } else {
            self.emit_cond_jump(lhs, end_block, rhs_block, short_val, Operand::Value(Value::Undef))
                .0
        };

        self.set_block(rhs_block);
        self.compile(right);
        let rhs = self.pop();
        self.emit_is(rhs);
        let rhs_bool = self.pop();
        let rhs_edge = self.emit_jump(end_block, rhs_bool);

        self.set_block(end_block);
        self.emit_phi(&[short_edge, rhs_edge]);
    }

    fn compile_assign(&mut self, left: NodeId, right: NodeId) {
        self.compile(right);
        let sym = match self.ast.data(left) {
            NodeData::Id { sym, .. } => *sym,
            // the parser replaced a bad target with an error node and
            // invalidated the tree; nothing to store into
            _ => {
                return;
            }
        };
        self.emit_store(sym);
    }

    fn compile_var_decl(&mut self, sym: SymId, init: NodeId) {
        self.emit_alloc(sym);
        self.compile(init);
        self.emit_store(sym);
    }

    fn compile_abs(&mut self, inner: NodeId) {
        self.compile(inner);
        let val = self.pop();
        if let Operand::Value(v) = &val {
            let folded = val_unary(UnaryOp::Abs, v, self.store);
            self.stack.push(Operand::Value(folded));
            return;
        }
        self.emit_unary(OpCode::Abs, val);
    }

    fn compile_typed(&mut self, kw: &Token, args: &[NodeId]) {
        let Some((type_id, opcode)) = type_of_kw(kw.kind()) else {
            self.stack.push(Operand::Value(Value::Undef));
            return;
        };

        for arg in args {
            self.compile(*arg);
        }
        let ops = self.pop_n(args.len());

        if ops.iter().all(Operand::is_value) {
            let vals: Vec<Value> =
                ops.iter().filter_map(|o| o.as_value().cloned()).collect();
            self.stack.push(Operand::Value(instantiate(type_id, &vals)));
            return;
        }

        let instr = self.cfg.add_instruction(self.cur().block(), opcode);
        let res = self.result_reg(opcode.name());
        self.cfg.add_operand(instr, Operand::Reg(res));
        for op in ops {
            self.cfg.add_operand(instr, op);
        }
        self.stack.push(Operand::Reg(res));
    }

    fn compile_call(&mut self, callee: NodeId, args: &[NodeId]) {
        self.compile(callee);
        let callee_op = self.pop();
        for arg in args {
            self.compile(*arg);
        }
        let arg_ops = self.pop_n(args.len());

        let instr = self.cfg.add_instruction(self.cur().block(), OpCode::Call);
        let res = self.result_reg("call");
        self.cfg.add_operand(instr, Operand::Reg(res));
        self.cfg.add_operand(instr, callee_op);
        for op in arg_ops {
            self.cfg.add_operand(instr, op);
        }
        self.stack.push(Operand::Reg(res));
    }

    fn compile_dot(&mut self, target: NodeId, member: &Token) {
        self.compile(target);
        let src = self.pop();
        let instr = self.cfg.add_instruction(self.cur().block(), OpCode::DynBind);
        let res = self.result_reg("dynbind");
        self.cfg.add_operand(instr, Operand::Reg(res));
        self.cfg.add_operand(instr, src);
        self.cfg.add_operand(instr, Operand::Name(member.text().to_string()));
        self.stack.push(Operand::Reg(res));
    }

    fn compile_array(&mut self, elements: &[NodeId]) {
        for e in elements {
            self.compile(*e);
        }
        let ops = self.pop_n(elements.len());

        if ops.iter().all(Operand::is_value) {
            // a pure-value array becomes an interned constant
            let vals: Vec<Value> =
                ops.iter().filter_map(|o| o.as_value().cloned()).collect();
            let arr = self.store.from_values(vals);
            let value = Value::Array(arr.clone());
            self.cfg.intern(arr.id(), value.clone());
            self.stack.push(Operand::Value(value));
            return;
        }

        let instr = self.cfg.add_instruction(self.cur().block(), OpCode::Arr);
        let res = self.result_reg("arr");
        self.cfg.add_operand(instr, Operand::Reg(res));
        self.cfg.add_operand(instr, Operand::Index(ops.len() as u64));
        for op in ops {
            let append = self.cfg.add_instruction(self.cur().block(), OpCode::Append);
            self.cfg.add_operand(append, op);
            self.cfg.add_operand(append, Operand::Reg(res));
        }
        self.stack.push(Operand::Reg(res));
    }

    fn compile_result(&mut self) {
        let top = self.stack.last().cloned().unwrap_or(Operand::Value(Value::Undef));
        self.stack.push(top);
    }

    fn compile_ret(&mut self, value: NodeId) {
        self.compile(value);
        let op = self.pop();
        self.emit_ret(op);
        self.cur_mut().returned = true;
    }

    // Conditionals

    fn compile_cond_short(
        &mut self,
        cond: NodeId,
        on_true: Option<NodeId>,
        on_false: Option<NodeId>,
    ) {
        self.compile(cond);
        let cond_op = self.pop();

        // two literal arms need no control flow at all; a Select picks
        // between the ready values
        if let (Some(t), Some(f)) = (on_true, on_false) {
            let literal = |n: NodeId| matches!(self.ast.data(n), NodeData::Literal { .. });
            if literal(t) && literal(f) {
                self.compile(t);
                let tv = self.pop();
                self.compile(f);
                let fv = self.pop();
                let instr = self.cfg.add_instruction(self.cur().block(), OpCode::Select);
                let res = self.result_reg("select");
                self.cfg.add_operand(instr, Operand::Reg(res));
                self.cfg.add_operand(instr, cond_op);
                self.cfg.add_operand(instr, tv);
                self.cfg.add_operand(instr, fv);
                self.stack.push(Operand::Reg(res));
                return;
            }
        }

        let func = self.cur().func;
        let then_name = self.cur_mut().block_name("cshort.true");
        let else_name = self.cur_mut().block_name("cshort.false");
        let end_name = self.cur_mut().block_name("cshort.end");
        let then_b = self.cfg.create_block(func, then_name);
        let else_b = self.cfg.create_block(func, else_name);
        let end_b = self.cfg.create_block(func, end_name);

        self.emit_cond_jump(
            cond_op.clone(),
            then_b,
            else_b,
            Operand::Value(Value::Undef),
            Operand::Value(Value::Undef),
        );

        self.set_block(then_b);
        let tv = match on_true {
            Some(t) => {
                self.compile(t);
                self.pop()
            }
            // an empty true arm yields the condition's own value
            None => cond_op.clone(),
        };
        let te = self.emit_jump(end_b, tv);

        self.set_block(else_b);
        let fv = match on_false {
            Some(f) => {
                self.compile(f);
                self.pop()
            }
            None => Operand::Value(Value::Undef),
        };
        let fe = self.emit_jump(end_b, fv);

        self.set_block(end_b);
        self.emit_phi(&[te, fe]);
    }

    fn compile_cond(&mut self, cond: NodeId, patterns: NodeId) {
        self.compile(cond);
        let cond_op = self.pop();

        let func = self.cur().func;
        let end_name = self.cur_mut().block_name("cond.end");
        let end_b = self.cfg.create_block(func, end_name);

        let mut phi_edges: Vec<EdgeId> = Vec::new();
        let mut saw_default = false;

        for pattern in self.ast.children(patterns) {
            let NodeData::Pattern { matcher, body } = self.ast.data(pattern).clone() else {
                continue;
            };
            let matcher_data = self.ast.data(matcher).clone();

            if let NodeData::Matcher { op, checked } = matcher_data {
                let is_default = op.is(TokenKind::CurlyOpen) && checked.is_none();

                if is_default {
                    // the default arm ends the chain
                    let body_name = self.cur_mut().block_name("cond.body");
                    let body_b = self.cfg.create_block(func, body_name);
                    self.emit_jump(body_b, Operand::Value(Value::Undef));
                    self.set_block(body_b);
                    if let Some(e) = self.compile_pattern_body(body, end_b) {
                        phi_edges.push(e);
                    }
                    saw_default = true;
                    break;
                }

                let check = self.matcher_condition(&op, checked, &cond_op);
                let body_name = self.cur_mut().block_name("cond.body");
                let next_name = self.cur_mut().block_name("cond.next");
                let body_b = self.cfg.create_block(func, body_name);
                let next_b = self.cfg.create_block(func, next_name);

                self.emit_cond_jump(
                    check,
                    body_b,
                    next_b,
                    Operand::Value(Value::Undef),
                    Operand::Value(Value::Undef),
                );

                self.set_block(body_b);
                if let Some(e) = self.compile_pattern_body(body, end_b) {
                    phi_edges.push(e);
                }
                self.set_block(next_b);
            }
        }

        if !saw_default {
            // falling off the chain leaves the conditional undefined
            let e = self.emit_jump(end_b, Operand::Value(Value::Undef));
            phi_edges.push(e);
        }

        self.set_block(end_b);
        if phi_edges.is_empty() {
            self.stack.push(Operand::Value(Value::Undef));
        } else {
            self.emit_phi(&phi_edges);
        }
    }

    /// Lowers one matcher to the boolean operand guarding its body
    fn matcher_condition(
        &mut self,
        op: &Token,
        checked: Option<NodeId>,
        cond_op: &Operand,
    ) -> Operand {
        match checked {
            None => {
                // bare unary matcher applies to the condition itself
                let Some((vop, opcode)) = unary_op_of(op.kind()) else {
                    return Operand::Value(Value::Undef);
                };
                if let Operand::Value(v) = cond_op {
                    return Operand::Value(val_unary(vop, v, self.store));
                }
                self.emit_unary(opcode, cond_op.clone());
                self.pop()
            }
            Some(checked) => {
                self.compile(checked);
                let rhs = self.pop();
                // relational matchers compare explicitly, everything
                // else matches on equality
                let (vop, opcode) = match binary_op_of(op.kind()) {
                    Some(pair) if pair.0.is_comparison() => pair,
                    _ => (BinaryOp::Equal, OpCode::CmpE),
                };
                if let (Operand::Value(l), Operand::Value(r)) = (cond_op, &rhs) {
                    return Operand::Value(val_binary(vop, l, r, self.store));
                }
                self.emit_binary(opcode, cond_op.clone(), rhs);
                self.pop()
            }
        }
    }

    /// Compiles a pattern body in the current block and wires it to
    /// the join block. Returns the join edge, or `None` when the body
    /// returned from the function instead.
    fn compile_pattern_body(&mut self, body: NodeId, end_b: BlockId) -> Option<EdgeId> {
        let saved = self.cur().returned;
        self.cur_mut().returned = false;

        let children = self.ast.children(body);
        let value = self.compile_statements(&children);

        let edge = value.map(|op| self.emit_jump(end_b, op));
        self.cur_mut().returned = saved;
        edge
    }

    // Emissions

    fn cur(&self) -> &FuncCtx {
        self.ctx.last().expect("compiling inside a function")
    }

    fn cur_mut(&mut self) -> &mut FuncCtx {
        self.ctx.last_mut().expect("compiling inside a function")
    }

    fn pop(&mut self) -> Operand {
        self.stack.pop().unwrap_or(Operand::Value(Value::Undef))
    }

    fn pop_n(&mut self, n: usize) -> Vec<Operand> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.pop());
        }
        out.reverse();
        out
    }

    fn set_block(&mut self, block: BlockId) {
        let ctx = self.cur_mut();
        ctx.cur_block = Some(block);
        // cached loads may come from blocks not on the runtime path
        ctx.last_read.clear();
    }

    fn result_reg(&mut self, stem: &str) -> tnac_ir::RegId {
        let idx = self.cur_mut().next_reg_idx();
        self.cfg.make_register(format!("{}.{}", stem, idx))
    }

    fn emit_alloc(&mut self, sym: SymId) {
        let name = self.sema.symbol(sym).name.clone();
        let (entry, at) = {
            let ctx = self.cur();
            (ctx.entry, ctx.alloca_count)
        };
        let instr = self.cfg.insert_instruction(entry, OpCode::Alloc, Some(at));
        let reg = self.cfg.make_register(name);
        self.cfg.add_operand(instr, Operand::Reg(reg));
        let ctx = self.cur_mut();
        ctx.alloca_count += 1;
        ctx.var_regs.insert(sym, reg);
    }

    fn emit_store(&mut self, sym: SymId) {
        let val = self.pop();
        let Some(target) = self.cur().var_regs.get(&sym).copied() else {
            // storage never materialised (declaration itself failed)
            self.stack.push(val);
            return;
        };
        let instr = self.cfg.add_instruction(self.cur().block(), OpCode::Store);
        self.cfg.add_operand(instr, val.clone());
        self.cfg.add_operand(instr, Operand::Reg(target));
        self.cur_mut().modified(sym);
        self.stack.push(val);
    }

    fn emit_load(&mut self, sym: SymId, tok: &Token) {
        if let Some(cached) = self.cur().last_read.get(&sym).copied() {
            self.stack.push(Operand::Reg(cached));
            return;
        }
        let Some(target) = self.cur().var_regs.get(&sym).copied() else {
            self.feedback.compile_error(tok.at(), "Undefined identifier");
            self.stack.push(Operand::Value(Value::Undef));
            return;
        };
        let instr = self.cfg.add_instruction(self.cur().block(), OpCode::Load);
        let idx = self.cur_mut().next_reg_idx();
        let res = self.cfg.make_register_idx(idx);
        self.cfg.add_operand(instr, Operand::Reg(res));
        self.cfg.add_operand(instr, Operand::Reg(target));
        self.cur_mut().last_read.insert(sym, res);
        self.stack.push(Operand::Reg(res));
    }

    fn emit_unary(&mut self, opcode: OpCode, val: Operand) {
        let instr = self.cfg.add_instruction(self.cur().block(), opcode);
        let res = self.result_reg(opcode.name());
        self.cfg.add_operand(instr, Operand::Reg(res));
        self.cfg.add_operand(instr, val);
        self.stack.push(Operand::Reg(res));
    }

    fn emit_binary(&mut self, opcode: OpCode, lhs: Operand, rhs: Operand) {
        let instr = self.cfg.add_instruction(self.cur().block(), opcode);
        let res = self.result_reg(opcode.name());
        self.cfg.add_operand(instr, Operand::Reg(res));
        self.cfg.add_operand(instr, lhs);
        self.cfg.add_operand(instr, rhs);
        self.stack.push(Operand::Reg(res));
    }

    /// Coerces an operand to a boolean, folding when possible
    fn emit_is(&mut self, op: Operand) {
        if let Operand::Value(v) = &op {
            let folded = val_unary(UnaryOp::LogIs, v, self.store);
            self.stack.push(Operand::Value(folded));
            return;
        }
        self.emit_unary(OpCode::CmpIs, op);
    }

    fn emit_ret(&mut self, op: Operand) {
        let instr = self.cfg.add_instruction(self.cur().block(), OpCode::Ret);
        self.cfg.add_operand(instr, op);
    }

    fn emit_jump(&mut self, target: BlockId, edge_value: Operand) -> EdgeId {
        let cur = self.cur().block();
        let instr = self.cfg.add_instruction(cur, OpCode::Jump);
        self.cfg.add_operand(instr, Operand::Block(target));
        self.cfg.make_edge(cur, target, edge_value)
    }

    fn emit_cond_jump(
        &mut self,
        cond: Operand,
        on_true: BlockId,
        on_false: BlockId,
        true_value: Operand,
        false_value: Operand,
    ) -> (EdgeId, EdgeId) {
        let cur = self.cur().block();
        let instr = self.cfg.add_instruction(cur, OpCode::Jump);
        self.cfg.add_operand(instr, cond);
        self.cfg.add_operand(instr, Operand::Block(on_true));
        self.cfg.add_operand(instr, Operand::Block(on_false));
        let te = self.cfg.make_edge(cur, on_true, true_value);
        let fe = self.cfg.make_edge(cur, on_false, false_value);
        (te, fe)
    }

    fn emit_phi(&mut self, edges: &[EdgeId]) {
        let block = self.cur().block();
        let idx = self.cur_mut().next_reg_idx();
        let (instr, res) = self.cfg.synth_phi(block, format!("phi.{}", idx));
        for e in edges {
            self.cfg.add_operand(instr, Operand::Edge(*e));
        }
        self.stack.push(Operand::Reg(res));
    }
}
