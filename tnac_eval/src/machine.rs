//! The IR evaluator
//!
//! Walks basic blocks instruction by instruction with a call stack,
//! frame-local memory and a `(frame, register) -> slot` environment.
//! Branching records per active function feed Phi nodes; an in-flight
//! map keyed by array identity lets array-as-callable iteration
//! suspend across calls and resume on return.

use crate::env::Env;
use crate::frame::{CallStack, Frame, InstrPtr, DEFAULT_STACK_CAPACITY};
use log::trace;
use std::collections::HashMap;
use tnac_common::{Feedback, Span, TnacError};
use tnac_ir::{BlockId, Cfg, FuncId, OpCode, Operand, RegScope};
use tnac_value::{
    binary as val_binary, instantiate, to_bool, unary as val_unary, ArrayRef, BinaryOp, TypeId,
    UnaryOp, Value, ValueStore,
};

fn unary_op_of(oc: OpCode) -> Option<UnaryOp> {
    use OpCode::*;
    Some(match oc {
        Abs => UnaryOp::Abs,
        CmpNot => UnaryOp::LogNot,
        CmpIs => UnaryOp::LogIs,
        Plus => UnaryOp::Plus,
        Neg => UnaryOp::Neg,
        BNeg => UnaryOp::BitNot,
        Head => UnaryOp::Head,
        Tail => UnaryOp::Tail,
        _ => return None,
    })
}

fn binary_op_of(oc: OpCode) -> Option<BinaryOp> {
    use OpCode::*;
    Some(match oc {
        Add => BinaryOp::Add,
        Sub => BinaryOp::Sub,
        Mul => BinaryOp::Mul,
        Div => BinaryOp::Div,
        Mod => BinaryOp::Mod,
        Pow => BinaryOp::Pow,
        Root => BinaryOp::Root,
        And => BinaryOp::BitAnd,
        Or => BinaryOp::BitOr,
        Xor => BinaryOp::BitXor,
        CmpE => BinaryOp::Equal,
        CmpL => BinaryOp::Less,
        CmpLE => BinaryOp::LessEq,
        CmpNE => BinaryOp::NotEqual,
        CmpG => BinaryOp::Greater,
        CmpGE => BinaryOp::GreaterEq,
        _ => return None,
    })
}

fn type_id_of(oc: OpCode) -> Option<TypeId> {
    use OpCode::*;
    Some(match oc {
        Bool => TypeId::Bool,
        Int => TypeId::Int,
        Float => TypeId::Float,
        Frac => TypeId::Fraction,
        Cplx => TypeId::Complex,
        _ => return None,
    })
}

/// Branching record of one active function: the pair Phi consults
#[derive(Debug, Clone, Copy)]
struct Branch {
    from: Option<BlockId>,
    to: BlockId,
}

/// In-flight iteration state of one array being called
#[derive(Debug, Default)]
struct ArrCall {
    idx: usize,
    results: Vec<Value>,
    /// Caller-frame slot the pending element call returns into
    pending: Option<usize>,
}

enum ArrStep {
    Finished(Value),
    Suspended,
}

pub struct Machine<'a> {
    cfg: &'a Cfg,
    store: &'a mut ValueStore,
    feedback: &'a mut Feedback,
    env: Env,
    stack: CallStack,
    ip: Option<InstrPtr>,
    branching: Vec<Branch>,
    result: Value,
    arr_calls: HashMap<u64, ArrCall>,
}

impl<'a> Machine<'a> {
    pub fn new(cfg: &'a Cfg, store: &'a mut ValueStore, feedback: &'a mut Feedback) -> Self {
        Self {
            cfg,
            store,
            feedback,
            env: Env::new(),
            stack: CallStack::new(DEFAULT_STACK_CAPACITY),
            ip: None,
            branching: Vec::new(),
            result: Value::Undef,
            arr_calls: HashMap::new(),
        }
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Evaluates a module function to completion and returns its value
    pub fn evaluate(&mut self, module: FuncId) -> Value {
        self.env.clear();
        self.stack.clear();
        self.branching.clear();
        self.arr_calls.clear();
        self.result = Value::Undef;

        if self.cfg.find_function(module).is_none() {
            return Value::Undef;
        }
        if !self.enter(module, Vec::new(), 0, None) {
            return Value::Undef;
        }
        self.evaluate_current();
        self.result.clone()
    }

    /// Runs until the instruction pointer goes dead
    pub fn evaluate_current(&mut self) {
        while self.step() {}
    }

    /// Executes one instruction; false once evaluation has finished
    pub fn step(&mut self) -> bool {
        let Some(ip) = self.ip else {
            return false;
        };
        self.dispatch(ip);
        true
    }

    // Frame and value plumbing

    fn cur_frame(&self) -> &Frame {
        self.stack.top().expect("a frame is active while evaluating")
    }

    fn cur_frame_mut(&mut self) -> &mut Frame {
        self.stack.top_mut().expect("a frame is active while evaluating")
    }

    fn get_value(&self, op: &Operand) -> Option<Value> {
        match op {
            Operand::Value(v) => Some(v.clone()),
            Operand::Reg(r) => {
                if self.cfg.register(*r).scope == RegScope::Global {
                    return self.cfg.constant_for(*r).cloned();
                }
                let frame = self.cur_frame();
                let slot = self.env.find(frame.no, *r)?;
                Some(frame.value_for(slot))
            }
            // arguments occupy the leading frame slots
            Operand::Param(i) => Some(self.cur_frame().value_for(*i as usize)),
            _ => None,
        }
    }

    fn store_value(&mut self, slot: usize, val: Value) {
        self.cur_frame_mut().store(slot, val.clone());
        self.result = val;
    }

    /// Slot bound to a register in the current frame, allocating on
    /// first sight
    fn alloc_new(&mut self, reg: tnac_ir::RegId) -> usize {
        let no = self.cur_frame().no;
        if let Some(slot) = self.env.find(no, reg) {
            return slot;
        }
        let slot = self.cur_frame_mut().allocate();
        self.env.map(no, reg, slot);
        slot
    }

    fn enter(
        &mut self,
        func: FuncId,
        args: Vec<Value>,
        ret_slot: usize,
        jump_back: Option<InstrPtr>,
    ) -> bool {
        let f = self.cfg.function(func);
        let Some(entry) = f.entry else {
            self.ip = None;
            return false;
        };
        if self.stack.push(f.name.clone(), args, ret_slot, jump_back).is_none() {
            self.feedback.report(TnacError::runtime_error("Stack overflow"));
            self.ip = None;
            return false;
        }
        self.branching.push(Branch { from: None, to: entry });
        self.ip = Some(InstrPtr::new(entry, 0));
        true
    }

    fn leave(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.env.remove_frame(frame.no);
            self.ip = frame.jump_back;
        } else {
            self.ip = None;
        }
        self.branching.pop();
    }

    fn jump_to(&mut self, block: BlockId) {
        let br = self.branching.last_mut().expect("branching record exists inside a function");
        br.from = Some(br.to);
        br.to = block;
        self.ip = Some(InstrPtr::new(block, 0));
    }

    // Dispatch

    fn dispatch(&mut self, ip: InstrPtr) {
        let instr_id = self.cfg.block(ip.block).instrs[ip.idx];
        let instr = self.cfg.instr(instr_id);
        let oc = instr.op;
        let ops = instr.operands.clone();
        trace!("step {:?}.{} {}", ip.block, ip.idx, oc);

        match oc {
            OpCode::Jump => return self.exec_jump(&ops),
            OpCode::Call => return self.exec_call(&ops, ip),
            OpCode::Ret => return self.exec_ret(&ops),
            _ => {}
        }

        match oc {
            OpCode::Alloc => {
                let reg = ops[0].as_reg().expect("alloc result is a register");
                self.alloc_new(reg);
            }
            OpCode::Arr => {
                let reg = ops[0].as_reg().expect("arr result is a register");
                let size = ops[1].as_index().unwrap_or(0) as usize;
                let slot = self.alloc_new(reg);
                let wrapper = self.store.alloc_wrapped(size);
                self.store_value(slot, Value::Array(wrapper));
            }
            OpCode::Append => {
                let val = self.get_value(&ops[0]).unwrap_or_default();
                if let Some(Value::Array(arr)) = self.get_value(&ops[1]) {
                    arr.data().push(val);
                }
            }
            OpCode::Store => {
                let val = self.get_value(&ops[0]).unwrap_or_default();
                let reg = ops[1].as_reg().expect("store target is a register");
                let slot = self.alloc_new(reg);
                self.store_value(slot, val);
            }
            OpCode::Load => self.exec_load(&ops),
            OpCode::Phi => self.exec_phi(&ops),
            OpCode::Select => {
                let reg = ops[0].as_reg().expect("select result is a register");
                let slot = self.alloc_new(reg);
                let cond = self.get_value(&ops[1]).unwrap_or_default();
                let chosen = if to_bool(&cond).unwrap_or(false) { &ops[2] } else { &ops[3] };
                let val = self.get_value(chosen).unwrap_or_default();
                self.store_value(slot, val);
            }
            OpCode::DynBind => self.exec_dyn_bind(&ops),
            OpCode::Test => {
                let reg = ops[0].as_reg().expect("test result is a register");
                let slot = self.alloc_new(reg);
                let expected = match &ops[1] {
                    Operand::Type(t) => *t,
                    _ => TypeId::Undef,
                };
                let val = self.get_value(&ops[2]).unwrap_or_default();
                self.store_value(slot, Value::Bool(val.id() == expected));
            }
            _ => {
                if let Some(op) = unary_op_of(oc) {
                    let reg = ops[0].as_reg().expect("unary result is a register");
                    let slot = self.alloc_new(reg);
                    let val = self.get_value(&ops[1]).unwrap_or_default();
                    let res = val_unary(op, &val, self.store);
                    self.store_value(slot, res);
                } else if let Some(op) = binary_op_of(oc) {
                    let reg = ops[0].as_reg().expect("binary result is a register");
                    let slot = self.alloc_new(reg);
                    let lhs = self.get_value(&ops[1]).unwrap_or_default();
                    let rhs = self.get_value(&ops[2]).unwrap_or_default();
                    let res = val_binary(op, &lhs, &rhs, self.store);
                    self.store_value(slot, res);
                } else if let Some(tid) = type_id_of(oc) {
                    let reg = ops[0].as_reg().expect("constructor result is a register");
                    let slot = self.alloc_new(reg);
                    let args: Vec<Value> =
                        ops[1..].iter().map(|o| self.get_value(o).unwrap_or_default()).collect();
                    self.store_value(slot, instantiate(tid, &args));
                }
            }
        }

        self.ip = Some(ip.next());
    }

    fn exec_load(&mut self, ops: &[Operand]) {
        let reg = ops[0].as_reg().expect("load result is a register");
        if let Operand::Param(i) = &ops[1] {
            // parameters alias their frame slot rather than copying
            let no = self.cur_frame().no;
            self.env.map(no, reg, *i as usize);
            return;
        }
        let slot = self.alloc_new(reg);
        let val = self.get_value(&ops[1]).unwrap_or_default();
        self.store_value(slot, val);
    }

    fn exec_phi(&mut self, ops: &[Operand]) {
        let reg = ops[0].as_reg().expect("phi result is a register");
        let slot = self.alloc_new(reg);
        let from = self.branching.last().and_then(|b| b.from);

        for op in &ops[1..] {
            let Some(eid) = op.as_edge() else {
                continue;
            };
            let edge = self.cfg.edge(eid);
            if Some(edge.src) != from {
                continue;
            }
            let val = self.get_value(&edge.value).unwrap_or_default();
            self.store_value(slot, val);
            return;
        }
    }

    fn exec_dyn_bind(&mut self, ops: &[Operand]) {
        let reg = ops[0].as_reg().expect("dynbind result is a register");
        let slot = self.alloc_new(reg);
        let src = self.get_value(&ops[1]).unwrap_or_default();
        let name = match &ops[2] {
            Operand::Name(n) => n.clone(),
            _ => String::new(),
        };

        let Some(fref) = src.as_function() else {
            self.feedback
                .compile_error(Span::dummy(), &format!("Undefined identifier '{}'", name));
            self.store_value(slot, Value::Undef);
            return;
        };

        match self.cfg.lookup_child(FuncId(fref.0), &name) {
            Some(child) => {
                self.store_value(slot, Value::Function(tnac_value::FuncRef(child.0)));
            }
            None => {
                self.feedback
                    .compile_error(Span::dummy(), &format!("Undefined identifier '{}'", name));
                self.store_value(slot, Value::Undef);
            }
        }
    }

    fn exec_jump(&mut self, ops: &[Operand]) {
        if ops.len() == 1 {
            let target = ops[0].as_block().expect("jump target is a block");
            self.jump_to(target);
            return;
        }
        let cond = self.get_value(&ops[0]).unwrap_or_default();
        let target = if to_bool(&cond).unwrap_or(false) {
            ops[1].as_block().expect("jump target is a block")
        } else {
            ops[2].as_block().expect("jump target is a block")
        };
        self.jump_to(target);
    }

    fn exec_ret(&mut self, ops: &[Operand]) {
        let val = self.get_value(&ops[0]).unwrap_or_default();
        let ret_slot = self.cur_frame().ret_slot;

        if self.stack.depth() <= 1 {
            // root frame: the module's value is the machine's result
            self.result = val;
            self.leave();
            return;
        }

        if let Some(caller) = self.stack.caller_mut() {
            caller.store(ret_slot, val.clone());
        }
        self.result = val;
        self.leave();
    }

    // Calls

    fn exec_call(&mut self, ops: &[Operand], ip: InstrPtr) {
        let reg = ops[0].as_reg().expect("call result is a register");
        let res_slot = self.alloc_new(reg);
        let callee = self.get_value(&ops[1]).unwrap_or_default();

        if let Value::Array(arr) = &callee {
            match self.array_call(&arr.clone(), ops, ip) {
                ArrStep::Finished(v) => {
                    self.store_value(res_slot, v);
                    self.ip = Some(ip.next());
                }
                ArrStep::Suspended => {}
            }
            return;
        }

        if self.try_call(&callee, ops, res_slot, Some(ip.next())) {
            return;
        }
        if self.ip.is_none() {
            // a fatal condition (stack overflow) halted the machine
            return;
        }

        self.feedback.report(TnacError::runtime_error(
            "invalid call: target is not callable or argument count mismatch",
        ));
        self.store_value(res_slot, Value::Undef);
        self.ip = Some(ip.next());
    }

    /// Enters a function frame for a callable value. False when the
    /// value is not a function or the arity does not match.
    fn try_call(
        &mut self,
        callee: &Value,
        ops: &[Operand],
        ret_slot: usize,
        jump_back: Option<InstrPtr>,
    ) -> bool {
        let Some(fref) = callee.as_function() else {
            return false;
        };
        let Some(func) = self.cfg.find_function(FuncId(fref.0)) else {
            return false;
        };
        if func.loose || func.entry.is_none() {
            return false;
        }
        let argc = ops.len() - 2;
        if func.param_count != argc {
            return false;
        }

        let args: Vec<Value> =
            ops[2..].iter().map(|o| self.get_value(o).unwrap_or_default()).collect();
        self.enter(FuncId(fref.0), args, ret_slot, jump_back)
    }

    /// Iterates an array used as a callable, calling each callable
    /// element with the instruction's arguments. Nested arrays
    /// recurse; non-callables are skipped; the per-array state map
    /// lets iteration resume after each element call returns.
    fn array_call(&mut self, arr: &ArrayRef, ops: &[Operand], ip: InstrPtr) -> ArrStep {
        let key = arr.id();
        let mut state = self.arr_calls.remove(&key).unwrap_or_default();

        // a just-finished element call left its value in the pending slot
        if let Some(slot) = state.pending.take() {
            state.results.push(self.cur_frame().value_for(slot));
        }

        while state.idx < arr.len() {
            let elem = arr.get(state.idx).unwrap_or(Value::Undef);
            match elem {
                Value::Array(sub) => match self.array_call(&sub, ops, ip) {
                    ArrStep::Finished(v) => {
                        state.idx += 1;
                        let empty =
                            v.as_array().map(|a| a.is_empty()).unwrap_or(false);
                        if !empty {
                            state.results.push(v);
                        }
                    }
                    ArrStep::Suspended => {
                        self.arr_calls.insert(key, state);
                        return ArrStep::Suspended;
                    }
                },
                Value::Function(_) => {
                    state.idx += 1;
                    let slot = self.cur_frame_mut().allocate();
                    // resume at the same call instruction on return
                    if self.try_call(&elem, ops, slot, Some(ip)) {
                        state.pending = Some(slot);
                        self.arr_calls.insert(key, state);
                        return ArrStep::Suspended;
                    }
                    if self.ip.is_none() {
                        // fatal condition while entering the call
                        return ArrStep::Suspended;
                    }
                    // arity mismatch: the element is skipped
                }
                _ => {
                    state.idx += 1;
                }
            }
        }

        ArrStep::Finished(Value::Array(self.store.from_values(state.results)))
    }
}
