//! End-to-end pipeline tests: source text in, values out

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use tnac::State;
use tnac_common::Feedback;
use tnac_value::Value;

fn eval(input: &str) -> Value {
    let mut state = State::new(Feedback::new());
    state.eval_line(input)
}

fn eval_lines(lines: &[&str]) -> Value {
    let mut state = State::new(Feedback::new());
    let mut last = Value::Undef;
    for line in lines {
        last = state.eval_line(line);
    }
    last
}

fn assert_float(val: Value, expected: f64) {
    match val {
        Value::Float(f) if expected.is_nan() => assert!(f.is_nan(), "expected NaN, got {}", f),
        Value::Float(f) => {
            assert!((f - expected).abs() < 1e-9, "expected {}, got {}", expected, f)
        }
        other => panic!("expected float {}, got {:?}", expected, other),
    }
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
    assert_eq!(eval("128 - 127 - 1"), Value::Int(0));
    assert_eq!(eval("-2--3"), Value::Int(1));
    assert_float(eval("1.5 * 2 + 6 / 3"), 5.0);
}

#[test]
fn variables_accumulate() {
    assert_eq!(eval("a = 10 : a = a * a + a"), Value::Int(110));
    assert_eq!(eval("a = 10 : a * 2"), Value::Int(20));
    assert_float(eval("a = 2 : b = a + 2.5 : c = a + b"), 6.5);
    assert_eq!(eval("a = 10 : -a"), Value::Int(-10));
}

#[test]
fn fractions() {
    assert_eq!(eval("_fraction(1, 2) + _fraction(1, 3)"), Value::fraction(5, 6));
    assert_eq!(eval("_frac(1, 2) * _frac(1, 3)"), Value::fraction(1, 6));
    assert_eq!(eval("2 + _frac(1, 2)"), Value::fraction(5, 2));
}

#[test]
fn complex_numbers() {
    assert_eq!(eval("_complex(7, 10) * _complex(10, 11)"), Value::complex(-40.0, 177.0));
    assert_eq!(eval("_cplx(1, 2) + 1"), Value::complex(2.0, 2.0));
    assert_eq!(eval("_i * _i"), Value::complex(-1.0, 0.0));
}

#[test]
fn functions_and_calls() {
    assert_eq!(eval("f(x) x * 2 ; : f(21)"), Value::Int(42));
    assert_eq!(eval("add(a, b) a + b ; : add(add(1, 2), 3)"), Value::Int(6));
    assert_eq!(eval("f(x) x + 1 ; : g(x) f(x) * 2 ; : g(4)"), Value::Int(10));
}

#[test]
fn anonymous_functions() {
    assert_eq!(eval("_fn(x) x + 1 ; (41)"), Value::Int(42));
}

#[test]
fn early_return() {
    assert_eq!(eval("f(x) _ret x : x + 100 ; : f(1)"), Value::Int(1));
}

#[test]
fn short_conditional_picks_arms() {
    assert_eq!(eval_lines(&["a = 5", "{ a = 5 } -> { a + 1, a - 1 }"]), Value::Int(6));
    assert_eq!(eval("a = 0 : { a } -> { 1, 2 }"), Value::Int(2));
    assert_eq!(eval("a = 7 : { a > 5 } -> { 10, 20 }"), Value::Int(10));
}

#[test]
fn pattern_conditionals_chain() {
    let src = "a = 2 : { a } { == 2 } -> 10 ; { > 5 } -> 20 ; {} -> 0 ; ;";
    assert_eq!(eval(src), Value::Int(10));
    let src = "a = 9 : { a } { == 2 } -> 10 ; { > 5 } -> 20 ; {} -> 0 ; ;";
    assert_eq!(eval(src), Value::Int(20));
    let src = "a = 3 : { a } { == 2 } -> 10 ; { > 5 } -> 20 ; {} -> 0 ; ;";
    assert_eq!(eval(src), Value::Int(0));
}

#[test]
fn bare_expression_pattern_matches_on_equality() {
    let src = "a = 4 : { a } { 4 } -> 1 ; {} -> 0 ; ;";
    assert_eq!(eval(src), Value::Int(1));
}

#[test]
fn recursion() {
    let src = "fact(n) { n <= 1 } -> { 1, n * fact(n - 1) } ; : fact(5)";
    assert_eq!(eval(src), Value::Int(120));
    let src = "fib(n) { n < 2 } -> { n, fib(n - 1) + fib(n - 2) } ; : fib(10)";
    assert_eq!(eval(src), Value::Int(55));
}

#[test]
fn logical_short_circuit() {
    assert_eq!(eval("a = 1 : a > 0 && a < 2"), Value::Bool(true));
    assert_eq!(eval("a = 1 : a < 0 || a > 100"), Value::Bool(false));
    // the right side of a short-circuited && must not run
    let src = "f(x) x ; : a = 0 : a > 0 && f(1)";
    assert_eq!(eval(src), Value::Bool(false));
}

#[test]
fn result_reads_the_previous_value() {
    assert_eq!(eval("2 + 2 : _result"), Value::Int(4));
    assert_eq!(eval("2 + 2 : -_result"), Value::Int(-4));
    assert_eq!(eval("2 + 2 : _result + 3 : _result"), Value::Int(7));
    assert_eq!(eval("10 : _result * (_result + 2)"), Value::Int(120));
}

#[test]
fn division_boundaries() {
    assert_float(eval("2 / 2"), 1.0);
    assert_eq!(eval("1 / 0"), Value::Float(f64::INFINITY));
    assert_eq!(eval("0 - 1 / 0"), Value::Float(f64::NEG_INFINITY));
    assert_float(eval("0 / 0"), f64::NAN);
    assert_float(eval("1 % 0"), f64::NAN);
}

#[test]
fn power_boundaries() {
    assert_eq!(eval("(0 - 4) ** 0.5"), Value::complex(0.0, 2.0));
    assert_float(eval("8 ** (1 / 3)"), 2.0);
    match eval("(0 - 8) ** (1 / 3)") {
        Value::Float(f) => assert!((f + 2.0).abs() < 1e-9),
        other => panic!("expected float, got {:?}", other),
    }
    assert_eq!(eval("(0 - 4) // 2"), Value::complex(0.0, 2.0));
}

#[test]
fn bitwise_ops() {
    assert_eq!(eval("6 & 3"), Value::Int(2));
    assert_eq!(eval("6 | 3"), Value::Int(7));
    assert_eq!(eval("6 ^ 3"), Value::Int(5));
    assert_eq!(eval("~2"), Value::Int(!2));
    assert_eq!(eval("~2.0"), Value::Undef);
}

#[test]
fn abs_expression() {
    assert_eq!(eval("|1 - 4|"), Value::Int(3));
    assert_eq!(eval("a = 3 : |1 - a * 2|"), Value::Int(5));
}

#[test]
fn literal_bases() {
    assert_eq!(eval("0b101"), Value::Int(5));
    assert_eq!(eval("010"), Value::Int(8));
    assert_eq!(eval("0xff"), Value::Int(255));
    assert_eq!(eval("0"), Value::Int(0));
}

#[test]
fn arrays_broadcast_and_combine() {
    let v = eval("[1, 2, 3] * 2");
    assert_eq!(
        v.as_array().unwrap().to_vec(),
        vec![Value::Int(2), Value::Int(4), Value::Int(6)]
    );

    let v = eval("[1, 2] + [10, 20]");
    assert_eq!(
        v.as_array().unwrap().to_vec(),
        vec![Value::Int(11), Value::Int(21), Value::Int(12), Value::Int(22)]
    );

    assert_eq!(eval("[1, 2] < [1, 3]"), Value::Bool(true));
    assert_eq!(eval("[1, 2] == [1, 2]"), Value::Bool(true));
    assert_eq!(eval("[1, 2] < [1, 2, 0]"), Value::Bool(true));
}

#[test]
fn dynamic_arrays_evaluate_elements() {
    let v = eval("a = 5 : [a, a * 2]");
    assert_eq!(v.as_array().unwrap().to_vec(), vec![Value::Int(5), Value::Int(10)]);
}

#[test]
fn arrays_as_callables() {
    let v = eval("f(x) x + 1 ; : g(x) x * 2 ; : [f, g](10)");
    assert_eq!(v.as_array().unwrap().to_vec(), vec![Value::Int(11), Value::Int(20)]);
}

#[test]
fn nested_arrays_as_callables() {
    let v = eval("f(x) x + 1 ; : g(x) x * 2 ; : [f, [g, f], 3](2)");
    let out = v.as_array().unwrap().to_vec();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], Value::Int(3));
    assert_eq!(out[1].as_array().unwrap().to_vec(), vec![Value::Int(4), Value::Int(3)]);
}

#[test]
fn type_constructors_validate() {
    assert_eq!(eval("_int(5)"), Value::Int(5));
    assert_eq!(eval("_flt(5)"), Value::Float(5.0));
    assert_eq!(eval("_bool(3)"), Value::Bool(true));
    assert_eq!(eval("_frac(1)"), Value::Undef);
    assert_eq!(eval("a = 1.5 : _int(a)"), Value::Undef);
}

#[test]
fn undef_propagates_without_stopping() {
    assert_eq!(eval("~2.0 + 1"), Value::Undef);
    // later expressions still evaluate
    assert_eq!(eval("~2.0 : 1 + 1"), Value::Int(2));
}

#[test]
fn repl_state_persists() {
    let v = eval_lines(&["a = 10", "b = a + 5", "a + b"]);
    assert_eq!(v, Value::Int(25));
}

#[test]
fn repl_recovers_after_a_bad_line() {
    let v = eval_lines(&["a = 1", "nonsense +", "a + 1"]);
    assert_eq!(v, Value::Int(2));
}

#[test]
fn stack_overflow_is_reported() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let feedback = Feedback::new().on_error(move |msg| sink.borrow_mut().push(msg.to_string()));
    let mut state = State::new(feedback);
    state.eval_line("down(n) down(n + 1) ; : down(0)");
    assert!(errors.borrow().iter().any(|m| m.contains("Stack overflow")));
}

#[test]
fn imports_bind_modules() {
    use std::path::Path;

    let queue: tnac::ImportQueue = Rc::new(RefCell::new(Vec::new()));
    let loader_queue = Rc::clone(&queue);
    let feedback = Feedback::new().on_load_file(move |path: &Path| {
        if path.file_stem().is_some_and(|s| s == "utils") {
            loader_queue.borrow_mut().push(("utils".to_string(), "double(x) x * 2 ;".to_string()));
            return true;
        }
        false
    });

    let mut state = State::with_import_queue(queue, feedback);
    let v = state.eval_line("_import utils : utils.double(4)");
    assert_eq!(v, Value::Int(8));
}

#[test]
fn failed_imports_are_reported() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let feedback =
        Feedback::new().on_parse_error(move |d| sink.borrow_mut().push(d.message.clone()));
    let mut state = State::new(feedback);
    state.eval_line("_import nowhere");
    assert!(errors.borrow().iter().any(|m| m.contains("Failed to import")));
}

#[test]
fn diagnostics_accumulate_across_the_pipeline() {
    let mut state = State::new(Feedback::new());
    state.eval_line("nope +");
    assert!(state.diagnostics().has_errors());
    assert!(state.diagnostics().error_count() >= 1);

    let drained = state.take_diagnostics();
    assert!(!drained.is_empty());
    assert!(!state.diagnostics().has_errors());
}

#[test]
fn warnings_are_collected_too() {
    let mut state = State::new(Feedback::new());
    state.eval_line("_true || 1");
    assert!(state.diagnostics().warning_count() >= 1);
    assert!(!state.diagnostics().has_errors());
}

#[test]
fn missing_files_come_back_as_io_errors() {
    let mut state = State::new(Feedback::new());
    let err = state.eval_file(std::path::Path::new("no/such/file.tnac")).unwrap_err();
    assert!(err.to_string().contains("I/O error"));
}

#[test]
fn constants_and_keywords() {
    assert_eq!(eval("_true"), Value::Bool(true));
    assert_eq!(eval("_false"), Value::Bool(false));
    assert_float(eval("_pi"), std::f64::consts::PI);
    assert_float(eval("_e"), std::f64::consts::E);
    assert_eq!(eval("_i"), Value::complex(0.0, 1.0));
}

#[test]
fn comparisons() {
    assert_eq!(eval("1 < 2"), Value::Bool(true));
    assert_eq!(eval("2 <= 2"), Value::Bool(true));
    assert_eq!(eval("2 != 2"), Value::Bool(false));
    assert_eq!(eval("_frac(1, 2) == 0.5"), Value::Bool(true));
    assert_eq!(eval("_frac(1, 3) < _frac(1, 2)"), Value::Bool(true));
}
