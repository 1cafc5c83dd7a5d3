use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::PostconditionEntry;
use crate::inputs::{self, ParamKind};
use crate::output;
use crate::sandbox::{Sandbox, TrialOutcome};
use crate::{STRATEGIES, is_unusable_assertion, syntax};

pub const DEFAULT_TRIALS: usize = 100;
pub const DEFAULT_TRIAL_TIMEOUT_MS: u64 = 5000;
/// How many random draws the trial loop may spend finding compatible
/// inputs before giving up.
const DRAW_MULTIPLIER: usize = 4;

/// Closed verdict set for one (function, assertion) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    UntestableEmpty,
    UntestableSyntax,
    ErrorSignature,
    ErrorHealthcheck,
    ErrorEval,
    ErrorLoadingFunction,
}

/// Normalize an assertion string into a bare boolean expression: drop
/// markdown fences, a leading `assert` keyword, and a trailing message
/// literal; rewrite alternate result-variable spellings to `result`.
/// Idempotent: cleaning a cleaned assertion changes nothing.
pub fn clean_assertion(raw: &str) -> String {
    let defenced = strip_code_fences(raw.trim());
    let mut expr = defenced.trim();
    if let Some(rest) = expr.strip_prefix("assert ") {
        expr = rest.trim_start();
    } else if expr.starts_with("assert(") {
        // keep the paren: "assert(x)" is "assert" applied to "(x)"
        expr = &expr["assert".len()..];
    }
    let expr = strip_trailing_message(expr.trim());
    normalize_result_names(expr.trim())
}

fn strip_code_fences(text: &str) -> &str {
    let mut s = text;
    if s.starts_with("```") {
        s = match s.find('\n') {
            Some(pos) => &s[pos + 1..],
            None => "",
        };
    }
    if let Some(stripped) = s.trim_end().strip_suffix("```") {
        s = stripped;
    }
    s.trim()
}

/// Drop a trailing `, "message"` at paren depth zero, the optional second
/// operand of an assert statement.
fn strip_trailing_message(expr: &str) -> &str {
    let trimmed = expr.trim_end();
    let Some(last) = trimmed.chars().last() else {
        return trimmed;
    };
    if last != '"' && last != '\'' {
        return trimmed;
    }
    let bytes = trimmed.as_bytes();
    let quote = last as u8;
    // walk back to the literal's opening quote
    let mut i = trimmed.len() - 1;
    loop {
        if i == 0 {
            return trimmed;
        }
        i -= 1;
        if bytes[i] == quote && (i == 0 || bytes[i - 1] != b'\\') {
            break;
        }
    }
    let head = trimmed[..i].trim_end();
    if !head.ends_with(',') {
        return trimmed;
    }
    let without_comma = &head[..head.len() - 1];
    if paren_depth(without_comma) != 0 {
        return trimmed;
    }
    without_comma.trim_end()
}

fn paren_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut in_string: Option<char> = None;
    let mut prev = '\0';
    for c in text.chars() {
        if let Some(q) = in_string {
            if c == q && prev != '\\' {
                in_string = None;
            }
        } else {
            match c {
                '\'' | '"' => in_string = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        prev = c;
    }
    depth
}

const RESULT_ALIASES: [&str; 6] = ["ret", "res", "retval", "return_value", "output", "answer"];

/// Replace standalone alias identifiers with `result`. Skips string
/// literals, attribute accesses (`x.res`) and call targets (`res(...)`).
fn normalize_result_names(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' || c == '"' {
            // copy the whole string literal untouched
            out.push(c);
            let quote = c;
            i += 1;
            while i < chars.len() {
                out.push(chars[i]);
                if chars[i] == quote && chars[i - 1] != '\\' {
                    i += 1;
                    break;
                }
                i += 1;
            }
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            let prev = chars[..start].iter().rev().find(|c| !c.is_whitespace());
            let next = chars[i..].iter().find(|c| !c.is_whitespace());
            let is_alias = RESULT_ALIASES.contains(&ident.as_str())
                && prev != Some(&'.')
                && next != Some(&'(');
            if is_alias {
                out.push_str("result");
            } else {
                out.push_str(&ident);
            }
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// A cleaned assertion must parse as exactly one expression statement.
pub fn is_boolean_expression(expr: &str) -> bool {
    let Some((tree, _)) = syntax::parse_source(expr) else {
        return false;
    };
    let root = tree.root_node();
    root.named_child_count() == 1
        && root
            .named_child(0)
            .is_some_and(|child| child.kind() == "expression_statement")
}

/// Property-based verdict for one (function, assertion) pair: randomized
/// trials against the original function, with incompatible inputs
/// discarded and redrawn rather than counted.
pub fn evaluate_assertion(
    sandbox: &Sandbox,
    function_code: &str,
    raw_assertion: &str,
    trials: usize,
    timeout_ms: u64,
) -> Verdict {
    if is_unusable_assertion(raw_assertion) {
        return Verdict::UntestableEmpty;
    }
    let assertion = clean_assertion(raw_assertion);
    if assertion.is_empty() {
        return Verdict::UntestableEmpty;
    }
    if !is_boolean_expression(&assertion) {
        return Verdict::UntestableSyntax;
    }

    let Ok(function) = syntax::function_name(function_code) else {
        return Verdict::ErrorLoadingFunction;
    };
    let params = syntax::function_params(function_code);
    if params.is_empty() {
        // A declared-but-unextractable parameter list means we cannot
        // bind trial arguments by name.
        if let Some(declared) = syntax::declared_param_text(function_code) {
            if !declared.is_empty() {
                return Verdict::ErrorSignature;
            }
        }
    }
    let kinds: Vec<ParamKind> = params
        .iter()
        .map(|param| inputs::infer_param_kind(param, function_code))
        .collect();

    let kwargs = BTreeMap::new();
    let mut compatible = 0;
    for _ in 0..trials * DRAW_MULTIPLIER {
        if compatible >= trials {
            break;
        }
        let args = inputs::random_case(&kinds);
        let outcome = sandbox.run_trial(
            function_code,
            &function,
            &assertion,
            &args,
            &kwargs,
            &params,
            timeout_ms,
        );
        match outcome {
            TrialOutcome::Pass => compatible += 1,
            TrialOutcome::Incompatible => continue,
            TrialOutcome::AssertFailed | TrialOutcome::CallError => return Verdict::Fail,
            TrialOutcome::AssertError => return Verdict::ErrorEval,
            TrialOutcome::LoadFailed => return Verdict::ErrorLoadingFunction,
            TrialOutcome::Timeout => return Verdict::ErrorHealthcheck,
        }
    }
    if compatible >= trials {
        Verdict::Pass
    } else {
        // Could not find enough compatible inputs within the draw budget.
        Verdict::ErrorHealthcheck
    }
}

/// Evaluate every entry against every fixed strategy.
pub fn evaluate(
    entries: &[PostconditionEntry],
    sandbox: &Sandbox,
    trials: usize,
    timeout_ms: u64,
    quiet: bool,
) -> crate::report::CorrectnessReport {
    let mut report = BTreeMap::new();
    for entry in entries {
        if !quiet {
            output::print_progress(&format!("Evaluating function {}...", entry.task_id));
        }
        let mut per_strategy = BTreeMap::new();
        for strategy in STRATEGIES {
            let raw = entry
                .generated_postconditions
                .get(strategy)
                .map(String::as_str)
                .unwrap_or("");
            let verdict =
                evaluate_assertion(sandbox, &entry.function_code, raw, trials, timeout_ms);
            if !quiet {
                output::print_progress(&format!("  {}: {:?}", strategy, verdict));
            }
            per_strategy.insert(strategy.to_string(), verdict);
        }
        report.insert(entry.task_id.to_string(), per_strategy);
    }
    report
}
