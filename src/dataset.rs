use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::STRATEGIES;

/// One entry of the external function dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub task_id: i64,
    pub prompt: String,
    pub code: String,
}

/// Generated postconditions for one function, keyed by strategy name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostconditionEntry {
    pub task_id: i64,
    pub function_code: String,
    pub generated_postconditions: BTreeMap<String, String>,
}

/// One literal test case: positional args plus keyword args.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    #[serde(default)]
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

/// Curated test cases for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseSet {
    pub task_id: i64,
    pub test_cases: Vec<TestCase>,
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&data).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

pub fn load_functions(path: &Path) -> Result<Vec<FunctionRecord>, String> {
    load_json(path)
}

pub fn load_postconditions(path: &Path) -> Result<Vec<PostconditionEntry>, String> {
    load_json(path)
}

pub fn load_test_cases(path: &Path) -> Result<Vec<TestCaseSet>, String> {
    load_json(path)
}

/// Index test-case sets by task id, preserving the supplied case order.
pub fn index_test_cases(sets: Vec<TestCaseSet>) -> BTreeMap<i64, Vec<TestCase>> {
    sets.into_iter()
        .map(|set| (set.task_id, set.test_cases))
        .collect()
}

/// An entry needs regeneration upstream when any fixed strategy is missing
/// an assertion or carries a failure sentinel.
pub fn needs_regeneration(entry: &PostconditionEntry) -> bool {
    STRATEGIES.iter().any(|strategy| {
        match entry.generated_postconditions.get(*strategy) {
            Some(text) => crate::is_unusable_assertion(text),
            None => true,
        }
    })
}
