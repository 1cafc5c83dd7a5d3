use postcheck::{completeness, correctness, dataset, generator, output, report, syntax};

use postcheck::sandbox::Sandbox;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "postcheck",
    version,
    about = "Completeness and correctness evaluation for generated postconditions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mutation-kill (completeness) evaluation against curated test cases
    Completeness {
        /// Function dataset JSON
        #[arg(long)]
        functions: PathBuf,
        /// Generated postconditions JSON
        #[arg(long)]
        postconditions: PathBuf,
        /// Curated test cases JSON
        #[arg(long = "test-cases")]
        test_cases: PathBuf,
        /// Report output path
        #[arg(long, default_value = "completeness_report.json")]
        out: PathBuf,
        /// Target mutants per function
        #[arg(long, default_value_t = completeness::DEFAULT_MUTANTS)]
        mutants: usize,
        /// Per-trial timeout for kill checks (ms)
        #[arg(long, default_value_t = completeness::DEFAULT_KILL_TIMEOUT_MS)]
        timeout_ms: u64,
        /// Outer per-function mutant-generation deadline (ms)
        #[arg(long, default_value_t = 30_000)]
        generation_budget_ms: u64,
        /// Python interpreter for the sandbox
        #[arg(long, default_value = "python3", env = "POSTCHECK_PYTHON")]
        python: String,
        /// Output the report JSON to stdout
        #[arg(long)]
        json: bool,
        /// Exit code only, no output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Property-based (correctness) evaluation over randomized inputs
    Correctness {
        /// Generated postconditions JSON
        #[arg(long)]
        postconditions: PathBuf,
        /// Report output path
        #[arg(long, default_value = "correctness_report.json")]
        out: PathBuf,
        /// Randomized trials per assertion
        #[arg(long, default_value_t = correctness::DEFAULT_TRIALS)]
        trials: usize,
        /// Per-trial timeout (ms)
        #[arg(long, default_value_t = correctness::DEFAULT_TRIAL_TIMEOUT_MS)]
        timeout_ms: u64,
        /// Python interpreter for the sandbox
        #[arg(long, default_value = "python3", env = "POSTCHECK_PYTHON")]
        python: String,
        /// Output the report JSON to stdout
        #[arg(long)]
        json: bool,
        /// Exit code only, no output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Inspect the mutants generated for a Python source file
    Mutants {
        /// Python source file
        file: PathBuf,
        /// Function name to scope mutation to
        #[arg(short, long)]
        function: Option<String>,
        /// Target mutant count
        #[arg(short = 'n', long, default_value_t = completeness::DEFAULT_MUTANTS)]
        count: usize,
        /// Output JSON instead of diffs
        #[arg(long)]
        json: bool,
    },
    /// Summary of the last evaluation run
    Status {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Completeness {
            functions,
            postconditions,
            test_cases,
            out,
            mutants,
            timeout_ms,
            generation_budget_ms,
            python,
            json,
            quiet,
        } => cmd_completeness(
            functions,
            postconditions,
            test_cases,
            out,
            mutants,
            timeout_ms,
            generation_budget_ms,
            python,
            json,
            quiet,
        ),
        Commands::Correctness {
            postconditions,
            out,
            trials,
            timeout_ms,
            python,
            json,
            quiet,
        } => cmd_correctness(postconditions, out, trials, timeout_ms, python, json, quiet),
        Commands::Mutants {
            file,
            function,
            count,
            json,
        } => cmd_mutants(file, function, count, json),
        Commands::Status { json } => cmd_status(json),
    };

    process::exit(exit_code);
}

fn make_sandbox(python: &str) -> Result<Sandbox, i32> {
    let sandbox = match Sandbox::new(python) {
        Ok(s) => s,
        Err(e) => {
            output::print_error(&format!("Failed to set up sandbox: {}", e));
            return Err(3);
        }
    };
    if let Err(e) = sandbox.healthcheck() {
        output::print_error(&format!(
            "Python interpreter unavailable: {}. Pass --python <bin>.",
            e
        ));
        return Err(3);
    }
    Ok(sandbox)
}

#[allow(clippy::too_many_arguments)]
fn cmd_completeness(
    functions: PathBuf,
    postconditions: PathBuf,
    test_cases: PathBuf,
    out: PathBuf,
    mutants: usize,
    timeout_ms: u64,
    generation_budget_ms: u64,
    python: String,
    json_mode: bool,
    quiet: bool,
) -> i32 {
    for path in [&functions, &postconditions, &test_cases] {
        if !path.exists() {
            output::print_error(&format!(
                "Input artifact not found: {}. Check the path and try again.",
                path.display()
            ));
            return 2;
        }
    }

    // Loading any of the three artifacts is the only fatal failure.
    let records = match dataset::load_functions(&functions) {
        Ok(r) => r,
        Err(e) => {
            output::print_error(&e);
            return 3;
        }
    };
    let entries = match dataset::load_postconditions(&postconditions) {
        Ok(e) => e,
        Err(e) => {
            output::print_error(&e);
            return 3;
        }
    };
    let case_sets = match dataset::load_test_cases(&test_cases) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&e);
            return 3;
        }
    };
    let case_index = dataset::index_test_cases(case_sets);

    let progress_quiet = quiet || json_mode;
    if !progress_quiet {
        let incomplete = entries.iter().filter(|e| dataset::needs_regeneration(e)).count();
        output::print_progress(&format!(
            "Loaded {} functions, {} postcondition entries ({} with missing/failed assertions)",
            records.len(),
            entries.len(),
            incomplete
        ));
    }

    let sandbox = match make_sandbox(&python) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let options = completeness::Options {
        mutants,
        timeout_ms,
        generation_budget: Duration::from_millis(generation_budget_ms),
    };
    let result = completeness::evaluate(&entries, &case_index, &sandbox, &options, progress_quiet);

    if let Err(e) = report::save_completeness(&out, &result) {
        output::print_error(&e);
        return 3;
    }
    let summary = report::summarize_completeness(&result);
    report::save_summary(&summary);

    if quiet {
        return 0;
    }
    if json_mode {
        match serde_json::to_string(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                output::print_error(&format!("Failed to serialize report: {}", e));
                return 3;
            }
        }
    } else {
        output::print_summary(&summary);
        output::print_success(&format!("Report saved to {}", out.display()));
    }
    0
}

fn cmd_correctness(
    postconditions: PathBuf,
    out: PathBuf,
    trials: usize,
    timeout_ms: u64,
    python: String,
    json_mode: bool,
    quiet: bool,
) -> i32 {
    if !postconditions.exists() {
        output::print_error(&format!(
            "Input artifact not found: {}. Check the path and try again.",
            postconditions.display()
        ));
        return 2;
    }
    let entries = match dataset::load_postconditions(&postconditions) {
        Ok(e) => e,
        Err(e) => {
            output::print_error(&e);
            return 3;
        }
    };

    let sandbox = match make_sandbox(&python) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let progress_quiet = quiet || json_mode;
    let result = correctness::evaluate(&entries, &sandbox, trials, timeout_ms, progress_quiet);

    if let Err(e) = report::save_correctness(&out, &result) {
        output::print_error(&e);
        return 3;
    }
    let summary = report::summarize_correctness(&result);
    report::save_summary(&summary);

    if quiet {
        return 0;
    }
    if json_mode {
        match serde_json::to_string(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                output::print_error(&format!("Failed to serialize report: {}", e));
                return 3;
            }
        }
    } else {
        output::print_summary(&summary);
        output::print_success(&format!("Report saved to {}", out.display()));
    }
    0
}

fn cmd_mutants(file: PathBuf, function: Option<String>, count: usize, json_mode: bool) -> i32 {
    if !file.exists() {
        output::print_error(&format!(
            "Source file not found: {}. Check the path and try again.",
            file.display()
        ));
        return 2;
    }
    let source = match std::fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            output::print_error(&format!("Failed to read {}: {}", file.display(), e));
            return 3;
        }
    };

    let scoped = match &function {
        Some(name) => {
            let available = syntax::list_functions(&source);
            if !available.iter().any(|n| n == name) {
                output::print_error(&format!(
                    "Function '{}' not found. Available: {}",
                    name,
                    available.join(", ")
                ));
                return 2;
            }
            match syntax::function_text(&source, name) {
                Some(text) => text,
                None => {
                    output::print_error(&format!("Failed to extract function '{}'", name));
                    return 3;
                }
            }
        }
        None => source,
    };

    // Inspection only: no sandbox, no equivalence filtering.
    let mutants = generator::generate(&scoped, &[], count, None);
    if mutants.is_empty() {
        if json_mode {
            println!("[]");
        } else {
            output::print_success("No mutable code found.");
        }
        return 0;
    }

    if json_mode {
        match serde_json::to_string(&mutants) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                output::print_error(&format!("Failed to serialize mutants: {}", e));
                return 3;
            }
        }
    } else {
        output::print_mutants(&scoped, &mutants);
    }
    0
}

fn cmd_status(json_mode: bool) -> i32 {
    match report::load_summary() {
        Some(summary) => {
            if json_mode {
                match serde_json::to_string(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(_) => return 3,
                }
            } else {
                output::print_summary(&summary);
            }
            0
        }
        None => {
            output::print_error("No previous run found. Run `postcheck completeness` or `postcheck correctness` first.");
            2
        }
    }
}
