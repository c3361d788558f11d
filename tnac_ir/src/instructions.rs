//! IR instructions, operands and virtual registers

use smallvec::SmallVec;
use std::fmt;
use tnac_value::{TypeId, Value};

/// Entity id of a function; doubles as the payload of function values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Operation code for instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Root,
    And,
    Or,
    Xor,

    // comparisons
    CmpE,
    CmpL,
    CmpLE,
    CmpNE,
    CmpG,
    CmpGE,

    // unary
    Abs,
    Plus,
    Neg,
    BNeg,
    CmpNot,
    CmpIs,
    Head,
    Tail,

    // memory
    Store,
    Load,
    Alloc,
    Arr,
    Append,

    // control
    Select,
    Call,
    Jump,
    Ret,
    Phi,

    // dynamic member binding
    DynBind,

    // type constructors
    Bool,
    Int,
    Float,
    Frac,
    Cplx,

    /// Runtime type test
    Test,
}

impl OpCode {
    /// Whether the first operand is a result register defined by this
    /// instruction
    pub fn needs_result(self) -> bool {
        !matches!(self, OpCode::Store | OpCode::Append | OpCode::Jump | OpCode::Ret)
    }

    pub fn is_terminator(self) -> bool {
        matches!(self, OpCode::Jump | OpCode::Ret)
    }

    pub fn name(self) -> &'static str {
        use OpCode::*;
        match self {
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Mod => "mod",
            Pow => "pow",
            Root => "root",
            And => "and",
            Or => "or",
            Xor => "xor",
            CmpE => "cmpe",
            CmpL => "cmpl",
            CmpLE => "cmple",
            CmpNE => "cmpne",
            CmpG => "cmpg",
            CmpGE => "cmpge",
            Abs => "abs",
            Plus => "plus",
            Neg => "neg",
            BNeg => "bneg",
            CmpNot => "cmpnot",
            CmpIs => "cmpis",
            Head => "head",
            Tail => "tail",
            Store => "store",
            Load => "load",
            Alloc => "alloc",
            Arr => "arr",
            Append => "append",
            Select => "select",
            Call => "call",
            Jump => "jmp",
            Ret => "ret",
            Phi => "phi",
            DynBind => "dynbind",
            Bool => "bool",
            Int => "int",
            Float => "float",
            Frac => "frac",
            Cplx => "cplx",
            Test => "test",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operand of an instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A known value (folded constant or literal)
    Value(Value),
    Block(BlockId),
    Reg(RegId),
    Edge(EdgeId),
    /// Indexed function parameter
    Param(u16),
    /// Plain 64-bit index (array sizes and the like)
    Index(u64),
    Name(String),
    Type(TypeId),
}

impl Operand {
    pub fn is_value(&self) -> bool {
        matches!(self, Operand::Value(_))
    }

    pub fn is_reg(&self) -> bool {
        matches!(self, Operand::Reg(_))
    }

    pub fn is_param(&self) -> bool {
        matches!(self, Operand::Param(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Operand::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_reg(&self) -> Option<RegId> {
        match self {
            Operand::Reg(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<BlockId> {
        match self {
            Operand::Block(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            Operand::Edge(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<u64> {
        match self {
            Operand::Index(i) => Some(*i),
            _ => None,
        }
    }
}

/// Register naming: either a symbolic name or a running index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegName {
    Named(String),
    Indexed(u64),
}

impl fmt::Display for RegName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegName::Named(n) => write!(f, "%{}", n),
            RegName::Indexed(i) => write!(f, "%{}", i),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegScope {
    /// SSA register defined by exactly one instruction
    Local,
    /// Interned-constant register
    Global,
}

/// Virtual register
#[derive(Debug, Clone)]
pub struct VReg {
    pub id: RegId,
    pub name: RegName,
    pub scope: RegScope,
    /// Defining instruction; local registers have exactly one
    pub source: Option<InstrId>,
}

impl VReg {
    pub fn is_global(&self) -> bool {
        self.scope == RegScope::Global
    }
}

/// An instruction: opcode plus operand list, owned by a basic block
#[derive(Debug, Clone)]
pub struct Instruction {
    pub id: InstrId,
    pub block: BlockId,
    pub op: OpCode,
    pub operands: SmallVec<[Operand; 4]>,
}

impl Instruction {
    pub fn operand(&self, idx: usize) -> &Operand {
        &self.operands[idx]
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }
}

/// Edge between two basic blocks carrying the value selected at the
/// destination's Phi when control arrives along it
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub src: BlockId,
    pub dst: BlockId,
    pub value: Operand,
}

/// Maximal straight-line instruction sequence with a single terminator
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub name: String,
    pub func: FuncId,
    pub instrs: Vec<InstrId>,
    pub in_edges: Vec<EdgeId>,
    pub out_edges: Vec<EdgeId>,
}

/// An IR function: a tree node of the module's function hierarchy
/// owning a list of basic blocks
#[derive(Debug, Clone)]
pub struct Function {
    pub id: FuncId,
    pub name: String,
    pub parent: Option<FuncId>,
    pub children: Vec<FuncId>,
    pub blocks: Vec<BlockId>,
    pub entry: Option<BlockId>,
    pub param_count: usize,
    /// Artificial helper; holds detached instructions, cannot be called
    pub loose: bool,
}
