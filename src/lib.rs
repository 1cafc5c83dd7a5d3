pub mod completeness;
pub mod correctness;
pub mod dataset;
pub mod generator;
pub mod inputs;
pub mod mutants;
pub mod operators;
pub mod output;
pub mod report;
pub mod sandbox;
pub mod syntax;

/// The fixed, closed set of prompt-strategy names postconditions are keyed by.
pub const STRATEGIES: [&str; 3] = ["naive", "few_shot", "chain_of_thought"];

/// Sentinel left in place of an assertion when extraction failed upstream.
pub const EXTRACTION_FAILED_SENTINEL: &str = "Failed to extract postcondition";

/// An assertion that is empty or carries a known failure sentinel scores
/// zero / untestable immediately, without any execution.
pub fn is_unusable_assertion(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || trimmed.contains(EXTRACTION_FAILED_SENTINEL)
        || trimmed.contains("ERROR")
}
