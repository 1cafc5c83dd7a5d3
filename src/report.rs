use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::correctness::Verdict;

/// task_id (stringified) -> strategy -> integer kill rate (0-100).
pub type CompletenessReport = BTreeMap<String, BTreeMap<String, u32>>;

/// task_id (stringified) -> strategy -> verdict tag.
pub type CorrectnessReport = BTreeMap<String, BTreeMap<String, Verdict>>;

/// Headline numbers for the last run, kept for the `status` subcommand.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: String,
    pub functions: usize,
    /// completeness: mean kill rate per strategy;
    /// correctness: pass fraction per strategy.
    pub strategy_stats: BTreeMap<String, f64>,
}

pub fn summarize_completeness(report: &CompletenessReport) -> RunSummary {
    let mut totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for scores in report.values() {
        for (strategy, rate) in scores {
            let entry = totals.entry(strategy.clone()).or_insert((0, 0));
            entry.0 += u64::from(*rate);
            entry.1 += 1;
        }
    }
    let strategy_stats = totals
        .into_iter()
        .map(|(strategy, (sum, count))| (strategy, sum as f64 / count.max(1) as f64))
        .collect();
    RunSummary {
        mode: "completeness".to_string(),
        functions: report.len(),
        strategy_stats,
    }
}

pub fn summarize_correctness(report: &CorrectnessReport) -> RunSummary {
    let mut totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for verdicts in report.values() {
        for (strategy, verdict) in verdicts {
            let entry = totals.entry(strategy.clone()).or_insert((0, 0));
            if *verdict == Verdict::Pass {
                entry.0 += 1;
            }
            entry.1 += 1;
        }
    }
    let strategy_stats = totals
        .into_iter()
        .map(|(strategy, (passes, count))| (strategy, passes as f64 / count.max(1) as f64))
        .collect();
    RunSummary {
        mode: "correctness".to_string(),
        functions: report.len(),
        strategy_stats,
    }
}

fn save_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

pub fn save_completeness(path: &Path, report: &CompletenessReport) -> Result<(), String> {
    save_pretty(path, report)
}

pub fn save_correctness(path: &Path, report: &CorrectnessReport) -> Result<(), String> {
    save_pretty(path, report)
}

fn state_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".postcheck-state.json")
}

pub fn save_summary(summary: &RunSummary) {
    if let Ok(json) = serde_json::to_string(summary) {
        let _ = std::fs::write(state_path(), json);
    }
}

pub fn load_summary() -> Option<RunSummary> {
    let data = std::fs::read_to_string(state_path()).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_summary_to(path: &Path, summary: &RunSummary) {
    if let Ok(json) = serde_json::to_string(summary) {
        let _ = std::fs::write(path, json);
    }
}

pub fn load_summary_from(path: &Path) -> Option<RunSummary> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}
