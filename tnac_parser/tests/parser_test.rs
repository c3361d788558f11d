//! Parser integration tests: expression shapes, declarations,
//! conditionals, error recovery and the structural AST invariants

use tnac_common::Feedback;
use tnac_parser::{Ast, NodeData, NodeId, NodeKind, ParseOutcome, Parser};
use tnac_sema::Sema;

struct Fixture {
    ast: Ast,
    sema: Sema,
    feedback: Feedback,
}

impl Fixture {
    fn new() -> Self {
        Self { ast: Ast::new(), sema: Sema::new(), feedback: Feedback::new() }
    }

    fn parse(&mut self, input: &str) -> ParseOutcome {
        let mut parser = Parser::new(&mut self.ast, &mut self.sema, &mut self.feedback);
        parser.parse(input, 0, "repl")
    }
}

fn parse(input: &str) -> (Fixture, ParseOutcome) {
    let mut fx = Fixture::new();
    let out = fx.parse(input);
    (fx, out)
}

#[test]
fn binary_precedence_shapes() {
    let (fx, out) = parse("1 + 2 * 3");
    let last = out.last.expect("one expression");
    let NodeData::Binary { op, left, right } = fx.ast.data(last) else {
        panic!("expected binary, got {:?}", fx.ast.kind(last));
    };
    assert_eq!(op.text(), "+");
    assert_eq!(fx.ast.kind(*left), NodeKind::Literal);
    assert_eq!(fx.ast.kind(*right), NodeKind::Binary);
}

#[test]
fn power_binds_tighter_than_mul() {
    let (fx, out) = parse("2 * 3 ** 2");
    let last = out.last.unwrap();
    let NodeData::Binary { op, right, .. } = fx.ast.data(last) else {
        panic!("expected binary");
    };
    assert_eq!(op.text(), "*");
    assert_eq!(fx.ast.kind(*right), NodeKind::Binary);
}

#[test]
fn unary_chains() {
    let (fx, out) = parse("--3");
    let last = out.last.unwrap();
    let NodeData::Unary { operand, .. } = fx.ast.data(last) else {
        panic!("expected unary");
    };
    assert_eq!(fx.ast.kind(*operand), NodeKind::Unary);
}

#[test]
fn declaration_vs_assignment() {
    let (fx, out) = parse("a = 1 : a = 2");
    let last = out.last.unwrap();
    // second occurrence resolves to the existing variable
    assert_eq!(fx.ast.kind(last), NodeKind::Assign);
}

#[test]
fn function_declaration_and_call() {
    let (fx, out) = parse("f(x) x * 2 ; : f(21)");
    let last = out.last.unwrap();
    assert_eq!(fx.ast.kind(last), NodeKind::Call);
    let module = out.module;
    let decls: Vec<NodeId> = fx
        .ast
        .children(module)
        .into_iter()
        .filter(|c| fx.ast.kind(*c) == NodeKind::FuncDecl)
        .collect();
    assert_eq!(decls.len(), 1);
}

#[test]
fn anonymous_function_parses() {
    let (fx, out) = parse("_fn(x) x + 1 ;");
    let last = out.last.unwrap();
    assert_eq!(fx.ast.kind(last), NodeKind::FuncDecl);
}

#[test]
fn typed_and_array_expressions() {
    let (fx, out) = parse("_frac(1, 2)");
    assert_eq!(fx.ast.kind(out.last.unwrap()), NodeKind::Typed);

    let (fx, out) = parse("[1, 2, 3]");
    let NodeData::Array { elements, .. } = fx.ast.data(out.last.unwrap()) else {
        panic!("expected array");
    };
    assert_eq!(elements.len(), 3);
}

#[test]
fn abs_and_paren() {
    let (fx, out) = parse("|1 - 4|");
    assert_eq!(fx.ast.kind(out.last.unwrap()), NodeKind::Abs);

    let (fx, out) = parse("(1 + 2) * 3");
    let NodeData::Binary { left, .. } = fx.ast.data(out.last.unwrap()) else {
        panic!("expected binary");
    };
    assert_eq!(fx.ast.kind(*left), NodeKind::Paren);
}

#[test]
fn short_conditional() {
    let (fx, out) = parse("a = 5 : { a } -> { a + 1, a - 1 }");
    let last = out.last.unwrap();
    let NodeData::CondShort { on_true, on_false, .. } = fx.ast.data(last) else {
        panic!("expected short conditional, got {:?}", fx.ast.kind(last));
    };
    assert!(on_true.is_some());
    assert!(on_false.is_some());
}

#[test]
fn pattern_conditional() {
    let (fx, out) = parse("a = 2 : { a } { == 2 } -> 10 ; { > 5 } -> 20 ; {} -> 0 ; ;");
    let last = out.last.unwrap();
    let NodeData::Cond { patterns, .. } = fx.ast.data(last) else {
        panic!("expected conditional, got {:?}", fx.ast.kind(last));
    };
    let pats = fx.ast.children(*patterns);
    assert_eq!(pats.len(), 3);
    for p in pats {
        assert_eq!(fx.ast.kind(p), NodeKind::Pattern);
    }
}

#[test]
fn ret_and_result() {
    let (fx, out) = parse("f(x) _ret x : x + 100 ; : f(1)");
    assert!(fx.ast.is_valid(out.module));

    let (fx, out) = parse("2 + 2 : _result");
    assert_eq!(fx.ast.kind(out.last.unwrap()), NodeKind::Result);
}

#[test]
fn dot_member_access() {
    let (fx, out) = parse("m = 1 : m.member");
    assert_eq!(fx.ast.kind(out.last.unwrap()), NodeKind::Dot);
}

#[test]
fn undefined_identifier_is_an_error_node() {
    let (fx, out) = parse("nope + 1");
    let last = out.last.unwrap();
    // the whole sum is invalidated by its left side
    assert!(!fx.ast.is_valid(last));
}

#[test]
fn parse_continues_after_errors() {
    let mut errors = 0usize;
    let mut fx = Fixture::new();
    fx.feedback = Feedback::new();
    // count parse errors through a scoped fixture
    let counter = std::rc::Rc::new(std::cell::RefCell::new(0usize));
    let sink = std::rc::Rc::clone(&counter);
    fx.feedback = Feedback::new().on_parse_error(move |_| *sink.borrow_mut() += 1);
    let out = fx.parse("bad1 : 1 + 2 : bad2");
    errors += *counter.borrow();
    assert!(errors >= 2, "both bad identifiers should be reported");
    // the good expression in the middle still parsed
    let kids = fx.ast.children(out.module);
    assert!(kids.iter().any(|k| fx.ast.kind(*k) == NodeKind::Binary && fx.ast.is_valid(*k)));
}

#[test]
fn parent_links_are_consistent() {
    let (fx, out) = parse("a = 1 : f(x) { x } -> { x + a, [1, 2] } ; : f(2) * |a|");
    let mut stack = vec![out.module];
    while let Some(node) = stack.pop() {
        for child in fx.ast.children(node) {
            assert_eq!(fx.ast.parent(child), Some(node), "child {:?} of {:?}", child, node);
            stack.push(child);
        }
    }
}

#[test]
fn validity_propagates_exactly_to_ancestors() {
    let (fx, out) = parse("1 + (2 * nope)");
    let module = out.module;
    assert!(!fx.ast.is_valid(module));

    // every invalid node has an invalid descendant or is an error node
    let mut stack = vec![module];
    while let Some(node) = stack.pop() {
        let children = fx.ast.children(node);
        if !fx.ast.is_valid(node) && fx.ast.kind(node) != NodeKind::Error {
            assert!(
                children.iter().any(|c| !fx.ast.is_valid(*c)),
                "invalid node {:?} without invalid descendant",
                node
            );
        }
        stack.extend(children);
    }
}

#[test]
fn scope_open_close_symmetry() {
    let inputs = [
        "1 + 2",
        "f(x) x ;",
        "f(a, b) { a } -> { b, a } ; : f(1, 2)",
        "{ 1 } { == 1 } -> 2 ; ;",
        "broken ( ( (",
        "_fn(x) x ; (5)",
    ];
    for input in inputs {
        let mut fx = Fixture::new();
        fx.parse(input);
        let (opened, closed) = fx.sema.scope_balance();
        assert_eq!(opened, closed, "unbalanced scopes for {:?}", input);
    }
}

#[test]
fn missing_closers_are_reported() {
    let counter = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&counter);
    let mut fx = Fixture::new();
    fx.feedback = Feedback::new().on_parse_error(move |d| sink.borrow_mut().push(d.message.clone()));
    fx.parse("(1 + 2");
    assert!(counter.borrow().iter().any(|m| m.contains("Expected ')'")));
}

#[test]
fn repl_state_persists_between_lines() {
    let mut fx = Fixture::new();
    fx.parse("a = 10");
    let out = fx.parse("a * 2");
    let last = out.last.unwrap();
    // `a` resolved against the symbol table built by the first line
    assert!(fx.ast.is_valid(last));
    assert_eq!(fx.ast.kind(last), NodeKind::Binary);
}

#[test]
fn commands_are_delivered_between_expressions() {
    let delivered = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&delivered);
    let mut fx = Fixture::new();
    fx.feedback = Feedback::new().on_command(move |cmd| sink.borrow_mut().push(cmd.name));
    fx.parse("#dec : 1 + 2 : #result hex");
    assert_eq!(*delivered.borrow(), vec!["dec".to_string(), "result".to_string()]);
}
