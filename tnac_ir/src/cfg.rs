//! The control-flow graph: arena of functions, blocks, instructions,
//! edges, registers and interned constants
//!
//! All entities live in flat arenas addressed by typed ids, so
//! back-references (block -> function, instruction -> block, edges on
//! both endpoints) are plain indices and never dangle while the graph
//! lives.

use crate::{
    BasicBlock, BlockId, Edge, EdgeId, FuncId, Function, InstrId, Instruction, OpCode, Operand,
    RegId, RegName, RegScope, VReg,
};
use log::debug;
use smallvec::SmallVec;
use std::collections::HashMap;
use tnac_value::Value;

#[derive(Debug, Default)]
pub struct Cfg {
    functions: HashMap<FuncId, Function>,
    /// Declaration order, for stable printing and module iteration
    func_order: Vec<FuncId>,
    modules: Vec<FuncId>,
    blocks: Vec<BasicBlock>,
    instrs: Vec<Instruction>,
    edges: Vec<Edge>,
    regs: Vec<VReg>,
    /// Interned constants: global register plus its value
    consts: Vec<(RegId, Value)>,
    /// Array-identity keyed intern table
    interned: HashMap<u64, RegId>,
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    // Functions

    /// Declares a function, uniquely keyed by id; repeated calls with
    /// the same id return the existing entry
    pub fn declare_function(
        &mut self,
        id: FuncId,
        parent: Option<FuncId>,
        name: impl Into<String>,
        param_count: usize,
    ) -> FuncId {
        if self.functions.contains_key(&id) {
            return id;
        }
        let name = name.into();
        debug!("declare function {} ({:?})", name, id);
        self.functions.insert(
            id,
            Function {
                id,
                name,
                parent,
                children: Vec::new(),
                blocks: Vec::new(),
                entry: None,
                param_count,
                loose: false,
            },
        );
        self.func_order.push(id);
        if let Some(p) = parent {
            self.functions.get_mut(&p).expect("parent function exists").children.push(id);
        }
        id
    }

    /// Declares a module: a parentless function remembered in the
    /// module list
    pub fn declare_module(&mut self, id: FuncId, name: impl Into<String>, param_count: usize) -> FuncId {
        if !self.functions.contains_key(&id) {
            self.declare_function(id, None, name, param_count);
            self.modules.push(id);
        }
        id
    }

    /// An artificial helper function; holds otherwise-detached blocks
    /// and is not callable
    pub fn make_loose(&mut self, id: FuncId, name: impl Into<String>) -> FuncId {
        let fid = self.declare_function(id, None, name, 0);
        self.functions.get_mut(&fid).expect("just declared").loose = true;
        fid
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[&id]
    }

    pub fn find_function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(&id)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.func_order.iter().map(|id| &self.functions[id])
    }

    pub fn modules(&self) -> &[FuncId] {
        &self.modules
    }

    /// Finds a named child function; the lookup `DynBind` performs
    pub fn lookup_child(&self, parent: FuncId, name: &str) -> Option<FuncId> {
        let func = self.find_function(parent)?;
        func.children
            .iter()
            .copied()
            .find(|c| self.functions.get(c).is_some_and(|f| f.name == name && !f.loose))
    }

    // Blocks

    pub fn create_block(&mut self, func: FuncId, name: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            id,
            name: name.into(),
            func,
            instrs: Vec::new(),
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        });
        let f = self.functions.get_mut(&func).expect("owning function exists");
        f.blocks.push(id);
        if f.entry.is_none() {
            f.entry = Some(id);
        }
        id
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn entry_of(&self, func: FuncId) -> Option<BlockId> {
        self.function(func).entry
    }

    // Instructions

    /// Appends an instruction to the end of a block
    pub fn add_instruction(&mut self, block: BlockId, op: OpCode) -> InstrId {
        self.insert_instruction(block, op, None)
    }

    /// Splices an instruction before the given position inside the
    /// block's list; `None` appends
    pub fn insert_instruction(&mut self, block: BlockId, op: OpCode, at: Option<usize>) -> InstrId {
        let id = InstrId(self.instrs.len() as u32);
        self.instrs.push(Instruction { id, block, op, operands: SmallVec::new() });
        let list = &mut self.blocks[block.0 as usize].instrs;
        match at {
            Some(pos) if pos <= list.len() => list.insert(pos, id),
            _ => list.push(id),
        }
        id
    }

    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.0 as usize]
    }

    /// Adds an operand. The first operand of a result-producing opcode
    /// is the instruction's result register and gets this instruction
    /// attached as its single SSA source.
    pub fn add_operand(&mut self, instr: InstrId, op: Operand) {
        let needs_result;
        let is_first;
        {
            let ins = &self.instrs[instr.0 as usize];
            needs_result = ins.op.needs_result();
            is_first = ins.operands.is_empty();
        }
        if needs_result && is_first {
            if let Operand::Reg(reg) = &op {
                let vreg = &mut self.regs[reg.0 as usize];
                if vreg.scope == RegScope::Local {
                    debug_assert!(vreg.source.is_none(), "register defined twice");
                    vreg.source = Some(instr);
                }
            }
        }
        self.instrs[instr.0 as usize].operands.push(op);
    }

    pub fn with_operands(&mut self, instr: InstrId, ops: impl IntoIterator<Item = Operand>) {
        for op in ops {
            self.add_operand(instr, op);
        }
    }

    /// Position of an instruction inside its block
    pub fn position_of(&self, instr: InstrId) -> Option<usize> {
        let block = self.instr(instr).block;
        self.block(block).instrs.iter().position(|i| *i == instr)
    }

    // Registers

    pub fn make_register(&mut self, name: impl Into<String>) -> RegId {
        self.alloc_reg(RegName::Named(name.into()), RegScope::Local)
    }

    pub fn make_register_idx(&mut self, idx: u64) -> RegId {
        self.alloc_reg(RegName::Indexed(idx), RegScope::Local)
    }

    pub fn make_global_register(&mut self, name: impl Into<String>) -> RegId {
        self.alloc_reg(RegName::Named(name.into()), RegScope::Global)
    }

    fn alloc_reg(&mut self, name: RegName, scope: RegScope) -> RegId {
        let id = RegId(self.regs.len() as u32);
        self.regs.push(VReg { id, name, scope, source: None });
        id
    }

    pub fn register(&self, id: RegId) -> &VReg {
        &self.regs[id.0 as usize]
    }

    // Edges

    /// Records an edge and pushes it onto both endpoints' edge lists
    pub fn make_edge(&mut self, src: BlockId, dst: BlockId, value: Operand) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge { id, src, dst, value });
        self.blocks[src.0 as usize].out_edges.push(id);
        self.blocks[dst.0 as usize].in_edges.push(id);
        id
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    /// Synthesises a Phi at the head of a join block with its result
    /// register attached; the caller wires in the incoming edges
    pub fn synth_phi(&mut self, block: BlockId, reg_name: impl Into<String>) -> (InstrId, RegId) {
        let instr = self.add_instruction(block, OpCode::Phi);
        let reg = self.make_register(reg_name);
        self.add_operand(instr, Operand::Reg(reg));
        (instr, reg)
    }

    // Constants

    /// Interns an array constant by block identity; identical array
    /// references share one global register
    pub fn intern(&mut self, key: u64, value: Value) -> RegId {
        if let Some(existing) = self.interned.get(&key) {
            return *existing;
        }
        let reg = self.make_global_register(format!("const:{}", key));
        self.consts.push((reg, value));
        self.interned.insert(key, reg);
        reg
    }

    pub fn constants(&self) -> &[(RegId, Value)] {
        &self.consts
    }

    pub fn constant_for(&self, reg: RegId) -> Option<&Value> {
        self.consts.iter().find(|(r, _)| *r == reg).map(|(_, v)| v)
    }

    // Validation helpers for the structural invariants

    /// Every reachable block ends with exactly one terminator
    pub fn check_block_termination(&self) -> Result<(), String> {
        for func in self.functions.values() {
            if func.loose {
                continue;
            }
            for block in &func.blocks {
                let block = self.block(*block);
                let mut terms = block
                    .instrs
                    .iter()
                    .enumerate()
                    .filter(|(_, i)| self.instr(**i).op.is_terminator());
                match terms.next() {
                    None => {
                        return Err(format!(
                            "block {} of {} has no terminator",
                            block.name, func.name
                        ))
                    }
                    Some((pos, _)) => {
                        if pos != block.instrs.len() - 1 {
                            return Err(format!(
                                "block {} of {} has a terminator mid-block",
                                block.name, func.name
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Every local register has exactly one defining instruction
    pub fn check_single_def(&self) -> Result<(), String> {
        let mut defs: HashMap<RegId, usize> = HashMap::new();
        for instr in &self.instrs {
            if !instr.op.needs_result() {
                continue;
            }
            if let Some(Operand::Reg(reg)) = instr.operands.first() {
                if self.register(*reg).scope == RegScope::Local {
                    *defs.entry(*reg).or_default() += 1;
                }
            }
        }
        for (reg, count) in defs {
            if count != 1 {
                return Err(format!("register {} has {} definitions", self.register(reg).name, count));
            }
        }
        Ok(())
    }
}
