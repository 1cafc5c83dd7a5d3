use std::collections::BTreeMap;

use postcheck::dataset::TestCase;
use postcheck::sandbox::{Sandbox, TrialOutcome, case_literals, to_python_literal};
use serde_json::json;

// --- to_python_literal ---

#[test]
fn scalars_become_python_literals() {
    assert_eq!(to_python_literal(&json!(null)), "None");
    assert_eq!(to_python_literal(&json!(true)), "True");
    assert_eq!(to_python_literal(&json!(false)), "False");
    assert_eq!(to_python_literal(&json!(42)), "42");
    assert_eq!(to_python_literal(&json!(-3)), "-3");
    assert_eq!(to_python_literal(&json!(2.5)), "2.5");
}

#[test]
fn strings_are_quoted_and_escaped() {
    assert_eq!(to_python_literal(&json!("abc")), "\"abc\"");
    assert_eq!(to_python_literal(&json!("a\"b")), "\"a\\\"b\"");
    assert_eq!(to_python_literal(&json!("a\nb")), "\"a\\nb\"");
    assert_eq!(to_python_literal(&json!("a\\b")), "\"a\\\\b\"");
}

#[test]
fn containers_nest() {
    assert_eq!(to_python_literal(&json!([1, "a", null])), "[1, \"a\", None]");
    assert_eq!(
        to_python_literal(&json!({"k": 1, "j": [true]})),
        "{\"j\": [True], \"k\": 1}"
    );
}

#[test]
fn case_literals_render_args_and_kwargs() {
    let mut kwargs = serde_json::Map::new();
    kwargs.insert("flag".to_string(), json!(true));
    let case = TestCase {
        args: vec![json!(1), json!("x")],
        kwargs,
    };
    let (args, kwargs) = case_literals(&case);
    assert_eq!(args, vec!["1".to_string(), "\"x\"".to_string()]);
    assert_eq!(kwargs.get("flag").map(String::as_str), Some("True"));
}

// --- sandboxed trials (need a python3 on PATH) ---

const ADD: &str = "def add(a, b):\n    return a + b\n";

fn sandbox() -> Option<Sandbox> {
    let sandbox = Sandbox::new("python3").ok()?;
    sandbox.healthcheck().ok()?;
    Some(sandbox)
}

fn no_kwargs() -> BTreeMap<String, String> {
    BTreeMap::new()
}

fn params(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn args(literals: &[&str]) -> Vec<String> {
    literals.iter().map(|l| l.to_string()).collect()
}

#[test]
fn trial_passes_when_assertion_holds() {
    let Some(sandbox) = sandbox() else { return };
    let outcome = sandbox.run_trial(
        ADD,
        "add",
        "result == a + b",
        &args(&["2", "3"]),
        &no_kwargs(),
        &params(&["a", "b"]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::Pass);
}

#[test]
fn trial_reports_false_assertion() {
    let Some(sandbox) = sandbox() else { return };
    let outcome = sandbox.run_trial(
        ADD,
        "add",
        "result == 999",
        &args(&["2", "3"]),
        &no_kwargs(),
        &params(&["a", "b"]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::AssertFailed);
}

#[test]
fn trial_reports_assertion_eval_error() {
    let Some(sandbox) = sandbox() else { return };
    let outcome = sandbox.run_trial(
        ADD,
        "add",
        "result == undefined_name",
        &args(&["2", "3"]),
        &no_kwargs(),
        &params(&["a", "b"]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::AssertError);
}

#[test]
fn trial_reports_incompatible_input() {
    let Some(sandbox) = sandbox() else { return };
    let code = "def inc(n):\n    return n + 1\n";
    let outcome = sandbox.run_trial(
        code,
        "inc",
        "result > 0",
        &args(&["'abc'"]),
        &no_kwargs(),
        &params(&["n"]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::Incompatible);
}

#[test]
fn trial_reports_call_error() {
    let Some(sandbox) = sandbox() else { return };
    let code = "def boom(n):\n    return 1 // 0\n";
    let outcome = sandbox.run_trial(
        code,
        "boom",
        "result == 0",
        &args(&["1"]),
        &no_kwargs(),
        &params(&["n"]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::CallError);
}

#[test]
fn trial_reports_unloadable_code() {
    let Some(sandbox) = sandbox() else { return };
    let outcome = sandbox.run_trial(
        "x = 1\n",
        "missing",
        "result == 1",
        &args(&[]),
        &no_kwargs(),
        &params(&[]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::LoadFailed);

    let outcome = sandbox.run_trial(
        "def broken(:\n",
        "broken",
        "result == 1",
        &args(&[]),
        &no_kwargs(),
        &params(&[]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::LoadFailed);
}

#[test]
fn trial_kills_runaway_code() {
    let Some(sandbox) = sandbox() else { return };
    let code = "def spin(n):\n    while True:\n        pass\n";
    let outcome = sandbox.run_trial(
        code,
        "spin",
        "result is None",
        &args(&["1"]),
        &no_kwargs(),
        &params(&["n"]),
        400,
    );
    assert_eq!(outcome, TrialOutcome::Timeout);
}

#[test]
fn trial_binds_kwargs_by_name() {
    let Some(sandbox) = sandbox() else { return };
    let code = "def add(a, b=0):\n    return a + b\n";
    let mut kwargs = BTreeMap::new();
    kwargs.insert("b".to_string(), "5".to_string());
    let outcome = sandbox.run_trial(
        code,
        "add",
        "result == 7 and b == 5",
        &args(&["2"]),
        &kwargs,
        &params(&["a"]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::Pass);
}

#[test]
fn trial_accepts_tuple_literals() {
    let Some(sandbox) = sandbox() else { return };
    let code = "def first(tup1):\n    return tup1[0]\n";
    let outcome = sandbox.run_trial(
        code,
        "first",
        "result == tup1[0]",
        &args(&["(4, 5)"]),
        &no_kwargs(),
        &params(&["tup1"]),
        5000,
    );
    assert_eq!(outcome, TrialOutcome::Pass);
}

// --- kill_check ---

#[test]
fn kill_check_needs_a_distinguishing_case() {
    let Some(sandbox) = sandbox() else { return };
    // boundary mutant of is_positive: n > 0 became n > 1
    let mutant = "def is_positive(n):\n    return n > 1\n";
    let assertion = "result == (n > 0)";
    let p = params(&["n"]);

    let zero_only = vec![TestCase {
        args: vec![json!(0)],
        kwargs: serde_json::Map::new(),
    }];
    assert!(!sandbox.kill_check(mutant, "is_positive", assertion, &zero_only, &p, 2000));

    let with_boundary = vec![
        TestCase {
            args: vec![json!(0)],
            kwargs: serde_json::Map::new(),
        },
        TestCase {
            args: vec![json!(1)],
            kwargs: serde_json::Map::new(),
        },
    ];
    assert!(sandbox.kill_check(mutant, "is_positive", assertion, &with_boundary, &p, 2000));
}

#[test]
fn kill_check_counts_mutant_exceptions_as_kills() {
    let Some(sandbox) = sandbox() else { return };
    let mutant = "def add(a, b):\n    return a + undefined\n";
    let cases = vec![TestCase {
        args: vec![json!(1), json!(2)],
        kwargs: serde_json::Map::new(),
    }];
    assert!(sandbox.kill_check(mutant, "add", "result == a + b", &cases, &params(&["a", "b"]), 2000));
}

// --- check_equivalent ---

fn cases(pairs: &[(i64, i64)]) -> Vec<TestCase> {
    pairs
        .iter()
        .map(|(a, b)| TestCase {
            args: vec![json!(a), json!(b)],
            kwargs: serde_json::Map::new(),
        })
        .collect()
}

#[test]
fn commuted_addition_is_equivalent() {
    let Some(sandbox) = sandbox() else { return };
    let mutant = "def add(a, b):\n    return b + a\n";
    assert!(sandbox.check_equivalent(ADD, mutant, "add", &cases(&[(1, 2), (3, 4)]), 5000));
}

#[test]
fn subtraction_mutant_diverges() {
    let Some(sandbox) = sandbox() else { return };
    let mutant = "def add(a, b):\n    return a - b\n";
    assert!(!sandbox.check_equivalent(ADD, mutant, "add", &cases(&[(1, 2), (3, 4)]), 5000));
}

#[test]
fn unloadable_mutant_is_not_equivalent() {
    let Some(sandbox) = sandbox() else { return };
    let mutant = "def add(a:\n";
    assert!(!sandbox.check_equivalent(ADD, mutant, "add", &cases(&[(1, 2)]), 5000));
}
