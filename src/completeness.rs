use std::collections::BTreeMap;
use std::time::Duration;

use crate::dataset::{PostconditionEntry, TestCase};
use crate::report::CompletenessReport;
use crate::sandbox::Sandbox;
use crate::{STRATEGIES, correctness, generator, is_unusable_assertion, output, syntax};

pub const DEFAULT_MUTANTS: usize = 5;
pub const DEFAULT_KILL_TIMEOUT_MS: u64 = 1000;

pub struct Options {
    /// Target mutant count per function.
    pub mutants: usize,
    /// Per-trial wall-clock deadline for kill checks.
    pub timeout_ms: u64,
    /// Outer deadline for generating one function's mutants.
    pub generation_budget: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            mutants: DEFAULT_MUTANTS,
            timeout_ms: DEFAULT_KILL_TIMEOUT_MS,
            generation_budget: generator::DEFAULT_GENERATION_BUDGET,
        }
    }
}

/// Mutation-kill scoring for every entry that has test cases. Entries
/// without test cases are skipped (absent from the report); per-function
/// faults never abort the batch.
pub fn evaluate(
    entries: &[PostconditionEntry],
    test_cases: &BTreeMap<i64, Vec<TestCase>>,
    sandbox: &Sandbox,
    options: &Options,
    quiet: bool,
) -> CompletenessReport {
    let mut report = BTreeMap::new();
    for entry in entries {
        let Some(cases) = test_cases.get(&entry.task_id) else {
            if !quiet {
                output::print_progress(&format!(
                    "No test cases for function {}, skipping",
                    entry.task_id
                ));
            }
            continue;
        };
        if !quiet {
            output::print_progress(&format!("Evaluating function {}...", entry.task_id));
        }
        let scores = score_entry(entry, cases, sandbox, options, quiet);
        report.insert(entry.task_id.to_string(), scores);
    }
    report
}

/// Kill rates for one entry: generate mutants once, score each strategy's
/// assertion over the deduplicated mutant set.
pub fn score_entry(
    entry: &PostconditionEntry,
    cases: &[TestCase],
    sandbox: &Sandbox,
    options: &Options,
    quiet: bool,
) -> BTreeMap<String, u32> {
    let mut scores = BTreeMap::new();

    let mutants = generator::generate_with_budget(
        &entry.function_code,
        cases,
        options.mutants,
        Some(sandbox),
        options.generation_budget,
    );
    if mutants.is_empty() {
        // Defined degenerate case: unscorable functions report 0 for
        // every strategy.
        for strategy in STRATEGIES {
            scores.insert(strategy.to_string(), 0);
        }
        return scores;
    }
    let unique = generator::dedupe_by_code(&mutants);
    let params = syntax::function_params(&entry.function_code);

    for strategy in STRATEGIES {
        let raw = entry
            .generated_postconditions
            .get(strategy)
            .map(String::as_str)
            .unwrap_or("");
        if is_unusable_assertion(raw) {
            scores.insert(strategy.to_string(), 0);
            continue;
        }
        let assertion = correctness::clean_assertion(raw);

        let mut killed = 0;
        for mutant in &unique {
            let is_killed = match syntax::function_name(&mutant.code) {
                Ok(name) => sandbox.kill_check(
                    &mutant.code,
                    &name,
                    &assertion,
                    cases,
                    &params,
                    options.timeout_ms,
                ),
                // An unloadable mutant raises on exec: exception means kill.
                Err(_) => true,
            };
            if is_killed {
                killed += 1;
            }
        }
        let rate = (killed * 100 / unique.len()) as u32;
        if !quiet {
            output::print_progress(&format!(
                "  {}: {}/{} killed ({}%)",
                strategy,
                killed,
                unique.len(),
                rate
            ));
        }
        scores.insert(strategy.to_string(), rate);
    }
    scores
}
