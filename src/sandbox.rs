use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::dataset::TestCase;

/// Outcome of one sandboxed trial: run the code, call the function with
/// one test case, evaluate the assertion over the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Assertion evaluated truthy.
    Pass,
    /// Assertion evaluated falsy or raised AssertionError.
    AssertFailed,
    /// Assertion evaluation raised something else (NameError, TypeError, ...).
    AssertError,
    /// The call raised an exception outside the incompatible-input set.
    CallError,
    /// The call raised IndexError/TypeError/ValueError/KeyError: the input
    /// does not fit the function's real signature.
    Incompatible,
    /// The code failed to exec, or the named function was not defined.
    LoadFailed,
    /// Wall-clock deadline expired; the interpreter was killed.
    Timeout,
}

// Exit-code protocol shared with the driver scripts.
const EXIT_PASS: i32 = 0;
const EXIT_ASSERT_FALSE: i32 = 10;
const EXIT_INCOMPATIBLE: i32 = 11;
const EXIT_CALL_ERROR: i32 = 12;
const EXIT_LOAD_ERROR: i32 = 13;
const EXIT_ASSERT_ERROR: i32 = 14;
const EXIT_DIVERGENT: i32 = 20;
const EXIT_EQUIVALENT: i32 = 21;

/// Driver executed once per trial. The execution namespace is fresh and
/// seeded only with a small fixed set of utility modules; the outcome
/// travels back through the exit code.
const TRIAL_DRIVER: &str = r#"import ast, heapq, json, math, re, sys

def main():
    with open(sys.argv[1], "r", encoding="utf-8") as fh:
        payload = json.load(fh)

    namespace = {"math": math, "re": re, "heapq": heapq, "sys": sys}
    try:
        exec(compile(payload["code"], "<code>", "exec"), namespace)
        func = namespace[payload["function"]]
        if not callable(func):
            raise TypeError(payload["function"])
    except BaseException:
        sys.exit(13)

    try:
        args = [ast.literal_eval(text) for text in payload["args"]]
        kwargs = {name: ast.literal_eval(text) for name, text in payload["kwargs"].items()}
    except BaseException:
        sys.exit(11)

    try:
        result = func(*args, **kwargs)
    except (IndexError, TypeError, ValueError, KeyError):
        sys.exit(11)
    except BaseException:
        sys.exit(12)

    env = dict(namespace)
    env["result"] = result
    for name, value in zip(payload["params"], args):
        env[name] = value
    env.update(kwargs)

    try:
        ok = eval(compile(payload["assertion"], "<postcondition>", "eval"), env)
    except AssertionError:
        sys.exit(10)
    except BaseException:
        sys.exit(14)

    sys.exit(0 if ok else 10)

main()
"#;

/// Driver for the equivalence filter: run original and mutant on the same
/// cases, compare result repr or exception type per case.
const EQUIV_DRIVER: &str = r#"import ast, heapq, json, math, re, sys

def load(code, name):
    namespace = {"math": math, "re": re, "heapq": heapq, "sys": sys}
    exec(compile(code, "<code>", "exec"), namespace)
    return namespace[name]

def signature(func, literals, kwarg_literals):
    args = [ast.literal_eval(text) for text in literals]
    kwargs = {name: ast.literal_eval(text) for name, text in kwarg_literals.items()}
    try:
        return ("ok", repr(func(*args, **kwargs)))
    except BaseException as exc:
        return ("err", type(exc).__name__)

def main():
    with open(sys.argv[1], "r", encoding="utf-8") as fh:
        payload = json.load(fh)

    try:
        original = load(payload["original"], payload["function"])
        mutant = load(payload["mutant"], payload["function"])
    except BaseException:
        sys.exit(20)

    for case in payload["cases"]:
        try:
            a = signature(original, case["args"], case["kwargs"])
            b = signature(mutant, case["args"], case["kwargs"])
        except BaseException:
            sys.exit(20)
        if a != b:
            sys.exit(20)
    sys.exit(21)

main()
"#;

#[derive(Serialize)]
struct TrialPayload<'a> {
    code: &'a str,
    function: &'a str,
    assertion: &'a str,
    args: &'a [String],
    kwargs: &'a BTreeMap<String, String>,
    params: &'a [String],
}

#[derive(Serialize)]
struct EquivCase {
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct EquivPayload<'a> {
    original: &'a str,
    mutant: &'a str,
    function: &'a str,
    cases: Vec<EquivCase>,
}

/// Executes generated code and assertions in short-lived interpreter
/// processes so a runaway mutant can never touch this process's state.
/// Not thread-safe: the payload file is reused between sequential calls.
pub struct Sandbox {
    python: String,
    trial_driver: PathBuf,
    equiv_driver: PathBuf,
    payload_path: PathBuf,
    _scratch: tempfile::TempDir,
}

impl Sandbox {
    pub fn new(python: &str) -> Result<Sandbox, String> {
        let scratch = tempfile::Builder::new()
            .prefix(&format!("postcheck-{:08x}-", fastrand::u32(..)))
            .tempdir()
            .map_err(|e| format!("Failed to create sandbox directory: {}", e))?;

        let trial_driver = scratch.path().join("trial_driver.py");
        let equiv_driver = scratch.path().join("equiv_driver.py");
        std::fs::write(&trial_driver, TRIAL_DRIVER)
            .map_err(|e| format!("Failed to write trial driver: {}", e))?;
        std::fs::write(&equiv_driver, EQUIV_DRIVER)
            .map_err(|e| format!("Failed to write equivalence driver: {}", e))?;

        Ok(Sandbox {
            python: python.to_string(),
            trial_driver,
            equiv_driver,
            payload_path: scratch.path().join("payload.json"),
            _scratch: scratch,
        })
    }

    /// Check the interpreter actually runs before starting a long batch.
    pub fn healthcheck(&self) -> Result<(), String> {
        let output = Command::new(&self.python)
            .arg("--version")
            .output()
            .map_err(|e| format!("Failed to run {}: {}", self.python, e))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(format!("{} --version exited with failure", self.python))
        }
    }

    /// Run one trial: exec `code`, call `function` with the given argument
    /// literals, evaluate `assertion` with `result` and parameter bindings.
    pub fn run_trial(
        &self,
        code: &str,
        function: &str,
        assertion: &str,
        args: &[String],
        kwargs: &BTreeMap<String, String>,
        params: &[String],
        timeout_ms: u64,
    ) -> TrialOutcome {
        let payload = TrialPayload {
            code,
            function,
            assertion,
            args,
            kwargs,
            params,
        };
        let Ok(json) = serde_json::to_string(&payload) else {
            return TrialOutcome::LoadFailed;
        };
        if std::fs::write(&self.payload_path, json).is_err() {
            return TrialOutcome::LoadFailed;
        }

        match self.run_driver(&self.trial_driver, timeout_ms) {
            DriverResult::Exited(code) => match code {
                EXIT_PASS => TrialOutcome::Pass,
                EXIT_ASSERT_FALSE => TrialOutcome::AssertFailed,
                EXIT_INCOMPATIBLE => TrialOutcome::Incompatible,
                EXIT_CALL_ERROR => TrialOutcome::CallError,
                EXIT_LOAD_ERROR => TrialOutcome::LoadFailed,
                EXIT_ASSERT_ERROR => TrialOutcome::AssertError,
                // Interpreter crash, MemoryError, unknown code: the call
                // misbehaved.
                _ => TrialOutcome::CallError,
            },
            DriverResult::TimedOut => TrialOutcome::Timeout,
            DriverResult::SpawnFailed => TrialOutcome::LoadFailed,
        }
    }

    /// Completeness verdict for one mutant against one assertion: the
    /// first test case whose trial does not pass kills the mutant and
    /// short-circuits the rest. At most 100 cases are sampled.
    pub fn kill_check(
        &self,
        mutant_code: &str,
        function: &str,
        assertion: &str,
        test_cases: &[TestCase],
        params: &[String],
        timeout_ms: u64,
    ) -> bool {
        let sample = &test_cases[..test_cases.len().min(100)];
        for case in sample {
            let (args, kwargs) = case_literals(case);
            let outcome = self.run_trial(
                mutant_code,
                function,
                assertion,
                &args,
                &kwargs,
                params,
                timeout_ms,
            );
            if outcome != TrialOutcome::Pass {
                return true;
            }
        }
        false
    }

    /// Behavioral-equivalence probe for the generator. Returns true only
    /// when original and mutant agree (result or exception type) on every
    /// sampled case; a timeout conservatively reports "not equivalent" so
    /// real mutants are not discarded over pathological inputs.
    pub fn check_equivalent(
        &self,
        original: &str,
        mutant: &str,
        function: &str,
        test_cases: &[TestCase],
        timeout_ms: u64,
    ) -> bool {
        let cases = test_cases
            .iter()
            .map(|case| {
                let (args, kwargs) = case_literals(case);
                EquivCase { args, kwargs }
            })
            .collect();
        let payload = EquivPayload {
            original,
            mutant,
            function,
            cases,
        };
        let Ok(json) = serde_json::to_string(&payload) else {
            return false;
        };
        if std::fs::write(&self.payload_path, json).is_err() {
            return false;
        }

        match self.run_driver(&self.equiv_driver, timeout_ms) {
            DriverResult::Exited(EXIT_EQUIVALENT) => true,
            DriverResult::Exited(EXIT_DIVERGENT) => false,
            // Timeout or crash: keep the mutant.
            _ => false,
        }
    }

    fn run_driver(&self, driver: &PathBuf, timeout_ms: u64) -> DriverResult {
        let child = Command::new(&self.python)
            .arg(driver)
            .arg(&self.payload_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(_) => return DriverResult::SpawnFailed,
        };

        let start = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return DriverResult::Exited(status.code().unwrap_or(EXIT_CALL_ERROR));
                }
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return DriverResult::TimedOut;
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
                Err(_) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return DriverResult::SpawnFailed;
                }
            }
        }
    }
}

enum DriverResult {
    Exited(i32),
    TimedOut,
    SpawnFailed,
}

/// Convert one test case into Python literal text. Literals rather than
/// raw JSON cross the boundary so the driver's `ast.literal_eval` can
/// rebuild values JSON cannot express directly (None, True, tuples from
/// the input generator).
pub fn case_literals(case: &TestCase) -> (Vec<String>, BTreeMap<String, String>) {
    let args = case.args.iter().map(to_python_literal).collect();
    let kwargs = case
        .kwargs
        .iter()
        .map(|(name, value)| (name.clone(), to_python_literal(value)))
        .collect();
    (args, kwargs)
}

/// Render a JSON value as a Python literal expression.
pub fn to_python_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".to_string(),
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => python_string_literal(s),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(to_python_literal).collect();
            format!("[{}]", parts.join(", "))
        }
        serde_json::Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", python_string_literal(k), to_python_literal(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn python_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
