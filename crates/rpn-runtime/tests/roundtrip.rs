//! tests/roundtrip.rs: code produit par rpn-core, exécuté par rpn-runtime.

use indoc::indoc;
use pretty_assertions::assert_eq;

use rpn_runtime::{execute, ExecError, ExecOptions, ExecOutput, PrintMode, RuntimeError};

fn run_with(
    src: &str,
    binds: &[(&str, f64)],
    opts: ExecOptions,
) -> Result<ExecOutput, ExecError> {
    let t = rpn_core::compile("t.rpn", src).expect("source valide");
    execute(&t.code, binds, opts)
}

fn run(src: &str, binds: &[(&str, f64)]) -> Result<ExecOutput, ExecError> {
    run_with(src, binds, ExecOptions::default())
}

#[test]
fn subtraction_leaves_five_on_top() {
    let out = run("8 3 -", &[]).unwrap();
    assert_eq!(out.stack, vec![5.0]);

    let out = run("A B -", &[("A", 8.0), ("B", 3.0)]).unwrap();
    assert_eq!(out.stack, vec![5.0]);
}

#[test]
fn assignment_round_trip() {
    let out = run("c a b 1 - / =", &[("a", 8.0), ("b", 3.0)]).unwrap();
    assert_eq!(out.bindings.get("c"), Some(&4.0));
    assert!(out.stack.is_empty());
}

#[test]
fn right_nesting_applies_inner_operator_first() {
    // 2 - (10 / 5) = 0, alors que (2 - 10) / 5 = -1.6
    let out = run("2 10 5 / -", &[]).unwrap();
    assert_eq!(out.stack, vec![0.0]);
}

#[test]
fn program_with_variables_and_print() {
    let src = indoc! {"
        a 8 =
        b 3 =
        c a b 1 - / =
        c print
    "};
    let out = run(src, &[]).unwrap();
    assert_eq!(out.stdout, "4\n");
    assert_eq!(out.stack, vec![4.0]);
}

#[test]
fn repeat_print_uses_the_previous_statement() {
    let opts = ExecOptions { print_mode: PrintMode::Repeat, ..ExecOptions::default() };
    let out = run_with("7\n3 print", &[], opts).unwrap();
    assert_eq!(out.stdout, "7\n7\n7\n");
    assert!(out.stack.is_empty());
}

#[test]
fn overflowing_repeat_count_stops_with_an_error() {
    let opts = ExecOptions { print_mode: PrintMode::Repeat, ..ExecOptions::default() };
    let e = run_with("7\ny x 10 * =\ny print", &[("x", 1e308)], opts).unwrap_err();
    assert!(matches!(e.runtime(), Some(RuntimeError::RepeatLimit { .. })), "{e}");
}

#[test]
fn division_by_zero_is_raised() {
    let e = run("a 0 /", &[("a", 1.0)]).unwrap_err();
    assert_eq!(e.runtime(), Some(&RuntimeError::DivisionByZero));
    // import, let, push a, push 0, divide
    assert_eq!(e.line(), 5);
}

#[test]
fn empty_stack_pop_is_raised() {
    let code = "import { Rpn } from '../rpn-vm.js';\nlet rpn = new Rpn();\nrpn.pop();\n";
    let e = execute(code, &[], ExecOptions::default()).unwrap_err();
    assert_eq!(e, ExecError::Runtime { line: 3, source: RuntimeError::EmptyStack });
}

#[test]
fn non_integral_print_is_raised() {
    let e = run("x print", &[("x", 2.5)]).unwrap_err();
    assert_eq!(e.runtime(), Some(&RuntimeError::NonIntegral(2.5)));
}

#[test]
fn unbound_variable_is_reported() {
    let e = run("x 1 +", &[]).unwrap_err();
    assert_eq!(e, ExecError::UnboundVariable { line: 3, name: "x".into() });
}
