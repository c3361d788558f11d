//! Arena-allocated abstract syntax tree
//!
//! Nodes live in a flat arena addressed by `NodeId`; children point at
//! parents through non-owning back-links. Validity propagates upward:
//! an error node invalidates every ancestor up to the root.

use tnac_lexer::Token;
use tnac_sema::{ScopeId, SymId};

/// Index of a node inside the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Node tags, one per syntactic form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Error,
    Literal,
    Id,
    Unary,
    Binary,
    Assign,
    Paren,
    Abs,
    Typed,
    Call,
    Array,
    Result,
    Ret,
    Matcher,
    Pattern,
    Cond,
    CondShort,
    Dot,
    VarDecl,
    ParamDecl,
    FuncDecl,
    Scope,
    Module,
    Import,
    Root,
}

/// Kind-specific payload; child links are arena ids
#[derive(Debug, Clone)]
pub enum NodeData {
    Error {
        pos: Token,
        msg: String,
    },
    Literal {
        tok: Token,
    },
    Id {
        tok: Token,
        sym: SymId,
    },
    Unary {
        op: Token,
        operand: NodeId,
    },
    Binary {
        op: Token,
        left: NodeId,
        right: NodeId,
    },
    Assign {
        op: Token,
        left: NodeId,
        right: NodeId,
    },
    Paren {
        inner: NodeId,
    },
    Abs {
        inner: NodeId,
    },
    Typed {
        kw: Token,
        args: Vec<NodeId>,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Array {
        pos: Token,
        elements: Vec<NodeId>,
    },
    Result {
        tok: Token,
    },
    Ret {
        tok: Token,
        value: NodeId,
    },
    /// A pattern guard. `op` keeps the matcher operator token (a
    /// relational/equality operator, a unary `!`/`?`, or the opening
    /// `{` for the default arm); `checked` is the compared expression.
    Matcher {
        op: Token,
        checked: Option<NodeId>,
    },
    Pattern {
        matcher: NodeId,
        body: NodeId,
    },
    Cond {
        cond: NodeId,
        /// Scope node holding the patterns
        patterns: NodeId,
    },
    CondShort {
        cond: NodeId,
        on_true: Option<NodeId>,
        on_false: Option<NodeId>,
    },
    Dot {
        target: NodeId,
        member: Token,
    },
    VarDecl {
        name: Token,
        sym: SymId,
        init: NodeId,
    },
    ParamDecl {
        name: Token,
        sym: Option<SymId>,
        err: Option<NodeId>,
    },
    FuncDecl {
        name: Token,
        sym: SymId,
        params: Vec<NodeId>,
        body: NodeId,
    },
    /// Ordered list of child expressions
    Scope {
        children: Vec<NodeId>,
    },
    Module {
        name: String,
        sym: SymId,
        scope: ScopeId,
        imports: Vec<NodeId>,
        params: Vec<NodeId>,
        children: Vec<NodeId>,
    },
    Import {
        kw: Token,
        components: Vec<NodeId>,
        target: SymId,
    },
    Root {
        modules: Vec<NodeId>,
    },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Error { .. } => NodeKind::Error,
            NodeData::Literal { .. } => NodeKind::Literal,
            NodeData::Id { .. } => NodeKind::Id,
            NodeData::Unary { .. } => NodeKind::Unary,
            NodeData::Binary { .. } => NodeKind::Binary,
            NodeData::Assign { .. } => NodeKind::Assign,
            NodeData::Paren { .. } => NodeKind::Paren,
            NodeData::Abs { .. } => NodeKind::Abs,
            NodeData::Typed { .. } => NodeKind::Typed,
            NodeData::Call { .. } => NodeKind::Call,
            NodeData::Array { .. } => NodeKind::Array,
            NodeData::Result { .. } => NodeKind::Result,
            NodeData::Ret { .. } => NodeKind::Ret,
            NodeData::Matcher { .. } => NodeKind::Matcher,
            NodeData::Pattern { .. } => NodeKind::Pattern,
            NodeData::Cond { .. } => NodeKind::Cond,
            NodeData::CondShort { .. } => NodeKind::CondShort,
            NodeData::Dot { .. } => NodeKind::Dot,
            NodeData::VarDecl { .. } => NodeKind::VarDecl,
            NodeData::ParamDecl { .. } => NodeKind::ParamDecl,
            NodeData::FuncDecl { .. } => NodeKind::FuncDecl,
            NodeData::Scope { .. } => NodeKind::Scope,
            NodeData::Module { .. } => NodeKind::Module,
            NodeData::Import { .. } => NodeKind::Import,
            NodeData::Root { .. } => NodeKind::Root,
        }
    }

    /// Child node ids in syntactic order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeData::Error { .. }
            | NodeData::Literal { .. }
            | NodeData::Id { .. }
            | NodeData::Result { .. } => Vec::new(),
            NodeData::Unary { operand, .. } => vec![*operand],
            NodeData::Binary { left, right, .. } | NodeData::Assign { left, right, .. } => {
                vec![*left, *right]
            }
            NodeData::Paren { inner } | NodeData::Abs { inner } => vec![*inner],
            NodeData::Typed { args, .. } => args.clone(),
            NodeData::Call { callee, args } => {
                let mut out = vec![*callee];
                out.extend(args.iter().copied());
                out
            }
            NodeData::Array { elements, .. } => elements.clone(),
            NodeData::Ret { value, .. } => vec![*value],
            NodeData::Matcher { checked, .. } => checked.iter().copied().collect(),
            NodeData::Pattern { matcher, body } => vec![*matcher, *body],
            NodeData::Cond { cond, patterns } => vec![*cond, *patterns],
            NodeData::CondShort { cond, on_true, on_false } => {
                let mut out = vec![*cond];
                out.extend(on_true.iter().copied());
                out.extend(on_false.iter().copied());
                out
            }
            NodeData::Dot { target, .. } => vec![*target],
            NodeData::VarDecl { init, .. } => vec![*init],
            NodeData::ParamDecl { err, .. } => err.iter().copied().collect(),
            NodeData::FuncDecl { params, body, .. } => {
                let mut out = params.clone();
                out.push(*body);
                out
            }
            NodeData::Scope { children } => children.clone(),
            NodeData::Module { imports, params, children, .. } => {
                let mut out = imports.clone();
                out.extend(params.iter().copied());
                out.extend(children.iter().copied());
                out
            }
            NodeData::Import { components, .. } => components.clone(),
            NodeData::Root { modules } => modules.clone(),
        }
    }
}

/// One arena slot
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub valid: bool,
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind() == kind
    }
}

/// The arena plus constructors that wire parent links and propagate
/// validity
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    pub fn is_valid(&self, id: NodeId) -> bool {
        self.node(id).valid
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.data(id).children()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a node and adopts its children
    pub fn make(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let valid = !matches!(data, NodeData::Error { .. });
        let children = data.children();
        self.nodes.push(Node { id, parent: None, valid, data });
        for child in children {
            self.adopt(id, child);
        }
        id
    }

    pub fn make_error(&mut self, pos: Token, msg: impl Into<String>) -> NodeId {
        self.make(NodeData::Error { pos, msg: msg.into() })
    }

    pub fn make_root(&mut self) -> NodeId {
        let id = self.make(NodeData::Root { modules: Vec::new() });
        self.root = Some(id);
        id
    }

    /// Wires a child under a parent and propagates invalidity upward
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        if !self.is_valid(child) {
            self.invalidate(parent);
        }
    }

    /// Appends a child to a list-bearing node and adopts it
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.node_mut(parent).data {
            NodeData::Scope { children }
            | NodeData::Root { modules: children }
            | NodeData::Module { children, .. } => children.push(child),
            other => unreachable!("append_child on a non-list node {:?}", other.kind()),
        }
        self.adopt(parent, child);
    }

    pub fn add_import(&mut self, module: NodeId, import: NodeId) {
        match &mut self.node_mut(module).data {
            NodeData::Module { imports, .. } => imports.push(import),
            other => unreachable!("add_import on {:?}", other.kind()),
        }
        self.adopt(module, import);
    }

    pub fn set_module_params(&mut self, module: NodeId, params: Vec<NodeId>) {
        for p in &params {
            self.adopt(module, *p);
        }
        match &mut self.node_mut(module).data {
            NodeData::Module { params: slot, .. } => *slot = params,
            other => unreachable!("set_module_params on {:?}", other.kind()),
        }
    }

    /// Marks a node and all its ancestors invalid
    pub fn invalidate(&mut self, mut id: NodeId) {
        loop {
            let node = self.node_mut(id);
            if !node.valid {
                break;
            }
            node.valid = false;
            match node.parent {
                Some(p) => id = p,
                None => break,
            }
        }
    }

    /// Finds a module node by name under the root
    pub fn find_module(&self, name: &str) -> Option<NodeId> {
        let root = self.root?;
        if let NodeData::Root { modules } = self.data(root) {
            for m in modules {
                if let NodeData::Module { name: n, .. } = self.data(*m) {
                    if n == name {
                        return Some(*m);
                    }
                }
            }
        }
        None
    }

    /// The error message of an error node
    pub fn error_message(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Error { msg, .. } => Some(msg),
            _ => None,
        }
    }

    /// Position token of a node, for diagnostics
    pub fn pos(&self, id: NodeId) -> Option<&Token> {
        match self.data(id) {
            NodeData::Error { pos, .. } => Some(pos),
            NodeData::Literal { tok } | NodeData::Id { tok, .. } => Some(tok),
            NodeData::Unary { op, .. }
            | NodeData::Binary { op, .. }
            | NodeData::Assign { op, .. }
            | NodeData::Matcher { op, .. } => Some(op),
            NodeData::Typed { kw, .. } => Some(kw),
            NodeData::Array { pos, .. } => Some(pos),
            NodeData::Result { tok } | NodeData::Ret { tok, .. } => Some(tok),
            NodeData::Dot { member, .. } => Some(member),
            NodeData::VarDecl { name, .. }
            | NodeData::ParamDecl { name, .. }
            | NodeData::FuncDecl { name, .. } => Some(name),
            NodeData::Import { kw, .. } => Some(kw),
            NodeData::Paren { inner } | NodeData::Abs { inner } => self.pos(*inner),
            NodeData::Call { callee, .. } => self.pos(*callee),
            NodeData::Cond { cond, .. } | NodeData::CondShort { cond, .. } => self.pos(*cond),
            NodeData::Pattern { matcher, .. } => self.pos(*matcher),
            NodeData::Scope { children } => children.first().and_then(|c| self.pos(*c)),
            NodeData::Module { .. } | NodeData::Root { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tnac_common::Span;
    use tnac_lexer::TokenKind;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Span::dummy())
    }

    #[test]
    fn parents_are_wired_on_construction() {
        let mut ast = Ast::new();
        let lhs = ast.make(NodeData::Literal { tok: tok(TokenKind::IntDec, "1") });
        let rhs = ast.make(NodeData::Literal { tok: tok(TokenKind::IntDec, "2") });
        let bin = ast.make(NodeData::Binary { op: tok(TokenKind::Plus, "+"), left: lhs, right: rhs });
        assert_eq!(ast.parent(lhs), Some(bin));
        assert_eq!(ast.parent(rhs), Some(bin));
        for child in ast.children(bin) {
            assert_eq!(ast.parent(child), Some(bin));
        }
    }

    #[test]
    fn errors_invalidate_ancestors() {
        let mut ast = Ast::new();
        let err = ast.make_error(tok(TokenKind::Error, ""), "expected expression");
        let ok = ast.make(NodeData::Literal { tok: tok(TokenKind::IntDec, "2") });
        let bin = ast.make(NodeData::Binary { op: tok(TokenKind::Plus, "+"), left: err, right: ok });
        assert!(!ast.is_valid(err));
        assert!(!ast.is_valid(bin));
        assert!(ast.is_valid(ok));
    }

    #[test]
    fn late_adoption_propagates_invalidity() {
        let mut ast = Ast::new();
        let scope = ast.make(NodeData::Scope { children: Vec::new() });
        let outer = ast.make(NodeData::Paren { inner: scope });
        assert!(ast.is_valid(outer));
        let err = ast.make_error(tok(TokenKind::Error, ""), "bad");
        ast.append_child(scope, err);
        assert!(!ast.is_valid(scope));
        assert!(!ast.is_valid(outer));
    }
}
