//! Per-function compilation context
//!
//! Tracks the current block, register numbering, variable storage
//! registers, the load cache used for common-subexpression avoidance,
//! and the most recent store (what `_result` re-reads).

use std::collections::HashMap;
use tnac_ir::{BlockId, FuncId, RegId};
use tnac_sema::SymId;

#[derive(Debug)]
pub struct FuncCtx {
    pub func: FuncId,
    pub cur_block: Option<BlockId>,
    pub entry: BlockId,
    /// Number of allocas already placed at the head of the entry block;
    /// the next one is spliced at this position so allocas always
    /// precede any use
    pub alloca_count: usize,
    /// Running index for anonymous (load) registers
    pub reg_idx: u64,
    /// Running index for block naming
    pub block_idx: u64,
    /// Storage (alloca) register per symbol
    pub var_regs: HashMap<SymId, RegId>,
    /// Last load of each symbol, reused until invalidated by a store
    pub last_read: HashMap<SymId, RegId>,
    /// The function body issued a `Ret` on the active path
    pub returned: bool,
}

impl FuncCtx {
    pub fn new(func: FuncId, entry: BlockId) -> Self {
        Self {
            func,
            cur_block: Some(entry),
            entry,
            alloca_count: 0,
            reg_idx: 0,
            block_idx: 0,
            var_regs: HashMap::new(),
            last_read: HashMap::new(),
            returned: false,
        }
    }

    pub fn block(&self) -> BlockId {
        self.cur_block.expect("a block is active while compiling")
    }

    pub fn next_reg_idx(&mut self) -> u64 {
        let idx = self.reg_idx;
        self.reg_idx += 1;
        idx
    }

    pub fn block_name(&mut self, stem: &str) -> String {
        let idx = self.block_idx;
        self.block_idx += 1;
        format!("{}.{}", stem, idx)
    }

    /// Records a store: the symbol's cached load is stale now
    pub fn modified(&mut self, sym: SymId) {
        self.last_read.remove(&sym);
    }
}
