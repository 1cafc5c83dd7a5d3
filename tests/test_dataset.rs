use std::collections::BTreeMap;

use postcheck::dataset::{
    self, PostconditionEntry, index_test_cases, load_functions, load_postconditions,
    load_test_cases, needs_regeneration,
};

fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// --- loading ---

#[test]
fn load_functions_reads_records() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "functions.json",
        r#"[{"task_id": 7, "prompt": "Add two numbers.", "code": "def add(a, b):\n    return a + b\n"}]"#,
    );
    let records = load_functions(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].task_id, 7);
    assert!(records[0].code.contains("def add"));
}

#[test]
fn load_postconditions_reads_strategy_map() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "postconditions.json",
        r#"[{
            "task_id": 7,
            "function_code": "def add(a, b):\n    return a + b\n",
            "generated_postconditions": {
                "naive": "assert result == a + b",
                "few_shot": "assert result is not None",
                "chain_of_thought": "assert result == a + b"
            }
        }]"#,
    );
    let entries = load_postconditions(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].generated_postconditions.get("naive").unwrap(),
        "assert result == a + b"
    );
}

#[test]
fn load_test_cases_defaults_missing_kwargs() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "cases.json",
        r#"[{"task_id": 7, "test_cases": [{"args": [1, 2]}, {"args": [], "kwargs": {"b": 3}}]}]"#,
    );
    let sets = load_test_cases(&path).unwrap();
    assert_eq!(sets[0].test_cases.len(), 2);
    assert!(sets[0].test_cases[0].kwargs.is_empty());
    assert_eq!(sets[0].test_cases[1].kwargs.get("b").unwrap(), 3);
}

#[test]
fn load_reports_missing_file() {
    let err = load_functions(std::path::Path::new("/nonexistent/functions.json")).unwrap_err();
    assert!(err.contains("Failed to read"));
}

#[test]
fn load_reports_malformed_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_fixture(&dir, "bad.json", "{not json");
    let err = load_postconditions(&path).unwrap_err();
    assert!(err.contains("Failed to parse"));
}

// --- index_test_cases ---

#[test]
fn index_test_cases_keys_by_task() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "cases.json",
        r#"[
            {"task_id": 2, "test_cases": [{"args": [1]}]},
            {"task_id": 1, "test_cases": [{"args": [2]}, {"args": [3]}]}
        ]"#,
    );
    let index = index_test_cases(load_test_cases(&path).unwrap());
    assert_eq!(index.get(&1).unwrap().len(), 2);
    assert_eq!(index.get(&2).unwrap().len(), 1);
    assert!(!index.contains_key(&3));
}

// --- needs_regeneration ---

fn entry_with(strategies: &[(&str, &str)]) -> PostconditionEntry {
    let generated: BTreeMap<String, String> = strategies
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    PostconditionEntry {
        task_id: 1,
        function_code: "def f(x):\n    return x\n".to_string(),
        generated_postconditions: generated,
    }
}

#[test]
fn complete_entry_does_not_need_regeneration() {
    let entry = entry_with(&[
        ("naive", "assert result == x"),
        ("few_shot", "assert result is not None"),
        ("chain_of_thought", "assert result == x"),
    ]);
    assert!(!needs_regeneration(&entry));
}

#[test]
fn missing_strategy_needs_regeneration() {
    let entry = entry_with(&[("naive", "assert result == x")]);
    assert!(needs_regeneration(&entry));
}

#[test]
fn sentinel_strategy_needs_regeneration() {
    let entry = entry_with(&[
        ("naive", "assert result == x"),
        ("few_shot", "Failed to extract postcondition"),
        ("chain_of_thought", "assert result == x"),
    ]);
    assert!(needs_regeneration(&entry));
    let entry = entry_with(&[
        ("naive", "assert result == x"),
        ("few_shot", "ERROR: timeout"),
        ("chain_of_thought", "assert result == x"),
    ]);
    assert!(needs_regeneration(&entry));
}

// --- serde round-trip of reports' inputs ---

#[test]
fn postcondition_entry_roundtrips() {
    let entry = entry_with(&[("naive", "assert result == x")]);
    let json = serde_json::to_string(&entry).unwrap();
    let back: PostconditionEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back.task_id, entry.task_id);
    assert_eq!(back.generated_postconditions, entry.generated_postconditions);
}

#[test]
fn test_case_default_is_empty() {
    let case = dataset::TestCase::default();
    assert!(case.args.is_empty());
    assert!(case.kwargs.is_empty());
}
