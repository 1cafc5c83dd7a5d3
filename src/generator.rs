use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::dataset::TestCase;
use crate::mutants::{self, Mutant, Rewrite};
use crate::operators::{self, Intensity, OperatorKind};
use crate::sandbox::Sandbox;
use crate::syntax;

/// Test-case prefix used to judge behavioral equivalence.
const EQUIV_SAMPLE: usize = 10;
const EQUIV_TIMEOUT_MS: u64 = 3000;
/// Bounded per-kind site prefix for the pairwise compound search.
const COMPOUND_SITE_PREFIX: usize = 4;
const STACKING_ROUNDS: usize = 3;
const CONSTANT_DELTAS: [i64; 4] = [1, -1, 2, -2];

pub const DEFAULT_GENERATION_BUDGET: Duration = Duration::from_secs(30);

/// Generate up to `target` distinct, best-effort non-equivalent mutants.
///
/// Passing `None` for the sandbox (or an empty test-case slice) skips the
/// equivalence filter; candidates are then kept, the same conservative
/// direction a filter timeout takes.
pub fn generate(
    source: &str,
    test_cases: &[TestCase],
    target: usize,
    sandbox: Option<&Sandbox>,
) -> Vec<Mutant> {
    generate_with_budget(source, test_cases, target, sandbox, DEFAULT_GENERATION_BUDGET)
}

/// As `generate`, with an explicit per-function generation deadline. A
/// deadline tripped mid-generation discards everything in flight and
/// yields an empty list, so one intractable function cannot stall a run.
pub fn generate_with_budget(
    source: &str,
    test_cases: &[TestCase],
    target: usize,
    sandbox: Option<&Sandbox>,
    budget: Duration,
) -> Vec<Mutant> {
    if target == 0 {
        return Vec::new();
    }
    let Some((_, text)) = syntax::parse_source(source) else {
        return Vec::new();
    };
    let Ok(function) = syntax::function_name(&text) else {
        return Vec::new();
    };

    let mut seen = BTreeSet::new();
    seen.insert(text.trim().to_string());

    let mut generation = Generation {
        original: text,
        function,
        target,
        test_cases,
        sandbox,
        deadline: Instant::now() + budget,
        expired: false,
        seen,
        accepted: Vec::new(),
    };

    generation.single_site_pass();
    if !generation.done() {
        generation.compound_pass();
    }
    if !generation.done() {
        generation.constant_offset_pass();
    }
    if !generation.done() {
        generation.stacking_pass();
    }

    if generation.expired {
        return Vec::new();
    }
    generation.pad_with_duplicates();
    generation.accepted
}

struct Generation<'a> {
    original: String,
    function: String,
    target: usize,
    test_cases: &'a [TestCase],
    sandbox: Option<&'a Sandbox>,
    deadline: Instant,
    expired: bool,
    seen: BTreeSet<String>,
    accepted: Vec<Mutant>,
}

impl Generation<'_> {
    fn done(&self) -> bool {
        self.accepted.len() >= self.target
    }

    fn out_of_time(&mut self) -> bool {
        if !self.expired && Instant::now() >= self.deadline {
            self.expired = true;
        }
        self.expired
    }

    /// Accept a candidate if it is parseable, textually distinct from the
    /// original and every prior mutant, and not behaviorally equivalent.
    fn offer(&mut self, code: String, operator: String, site: String, provenance: &str) -> bool {
        if self.done() {
            return false;
        }
        let key = code.trim().to_string();
        if self.seen.contains(&key) {
            return false;
        }
        if syntax::parse_source(&code).is_none() {
            return false;
        }
        if self.is_equivalent(&code) {
            return false;
        }
        self.seen.insert(key);
        self.accepted.push(Mutant {
            code,
            operator,
            site,
            provenance: provenance.to_string(),
        });
        true
    }

    fn is_equivalent(&self, candidate: &str) -> bool {
        let Some(sandbox) = self.sandbox else {
            return false;
        };
        if self.test_cases.is_empty() {
            return false;
        }
        let sample = &self.test_cases[..self.test_cases.len().min(EQUIV_SAMPLE)];
        sandbox.check_equivalent(
            &self.original,
            candidate,
            &self.function,
            sample,
            EQUIV_TIMEOUT_MS,
        )
    }

    /// Pass 1: every kind, default intensity first, every site index.
    fn single_site_pass(&mut self) {
        for intensity in [Intensity::Default, Intensity::Aggressive] {
            for kind in OperatorKind::ALL {
                let sites = syntax::enumerate_sites(&self.original, kind, intensity);
                for rewrite in sites {
                    if self.done() || self.out_of_time() {
                        return;
                    }
                    let code = mutants::apply_rewrite(&self.original, &rewrite);
                    let provenance = match intensity {
                        Intensity::Default => "single",
                        Intensity::Aggressive => "single_aggressive",
                    };
                    self.offer(code, kind.tag().to_string(), rewrite.site.to_string(), provenance);
                }
            }
        }
    }

    /// Pass 2: two single-site rewrites applied to one copy, drawn from a
    /// bounded prefix of each kind's sites.
    fn compound_pass(&mut self) {
        let mut pool: Vec<Rewrite> = Vec::new();
        for kind in OperatorKind::ALL {
            pool.extend(
                syntax::enumerate_sites(&self.original, kind, Intensity::Default)
                    .into_iter()
                    .take(COMPOUND_SITE_PREFIX),
            );
        }
        for i in 0..pool.len() {
            for j in i + 1..pool.len() {
                if self.done() || self.out_of_time() {
                    return;
                }
                let (a, b) = (&pool[i], &pool[j]);
                let Some(code) = mutants::apply_rewrite_pair(&self.original, a, b) else {
                    continue;
                };
                self.offer(
                    code,
                    format!("compound_{}_{}", a.kind.tag(), b.kind.tag()),
                    format!("{}_{}", a.site, b.site),
                    "compound",
                );
            }
        }
    }

    /// Pass 3: perturb each integer literal by small deltas as an
    /// orthogonal diversity source.
    fn constant_offset_pass(&mut self) {
        let sites = syntax::enumerate_sites(&self.original, OperatorKind::Constant, Intensity::Default);
        for rewrite in sites {
            if rewrite.original.parse::<i64>().is_err() {
                continue;
            }
            for delta in CONSTANT_DELTAS {
                if self.done() || self.out_of_time() {
                    return;
                }
                let Some(replacement) = operators::constant_offset_rewrite(&rewrite.original, delta)
                else {
                    continue;
                };
                if replacement == rewrite.original {
                    continue;
                }
                let mut variant = rewrite.clone();
                variant.replacement = replacement;
                let code = mutants::apply_rewrite(&self.original, &variant);
                self.offer(
                    code,
                    OperatorKind::Constant.tag().to_string(),
                    format!("{}{:+}", rewrite.site, delta),
                    "constant_offset",
                );
            }
        }
    }

    /// Pass 4: re-mutate accepted mutants for a few rounds.
    fn stacking_pass(&mut self) {
        for _ in 0..STACKING_ROUNDS {
            if self.done() {
                return;
            }
            let bases: Vec<String> = self
                .accepted
                .iter()
                .map(|mutant| mutant.code.clone())
                .collect();
            if bases.is_empty() {
                return;
            }
            let mut progressed = false;
            for base in bases {
                for kind in [OperatorKind::Constant, OperatorKind::BinOp, OperatorKind::Compare] {
                    if self.done() || self.out_of_time() {
                        return;
                    }
                    let sites = syntax::enumerate_sites(&base, kind, Intensity::Default);
                    let Some(rewrite) = sites.first() else {
                        continue;
                    };
                    let code = mutants::apply_rewrite(&base, rewrite);
                    if self.offer(code, kind.tag().to_string(), rewrite.site.to_string(), "stacked")
                    {
                        progressed = true;
                    }
                }
            }
            if !progressed {
                return;
            }
        }
    }

    /// Last resort: pad to exactly `target` by duplicating accepted
    /// mutants under a distinct provenance tag. Downstream scoring
    /// deduplicates by code text, so padding never inflates denominators.
    fn pad_with_duplicates(&mut self) {
        if self.accepted.is_empty() {
            return;
        }
        let real = self.accepted.len();
        let mut i = 0;
        while self.accepted.len() < self.target {
            let mut copy = self.accepted[i % real].clone();
            copy.provenance = format!("duplicate:{}", i);
            self.accepted.push(copy);
            i += 1;
        }
        self.accepted.truncate(self.target);
    }
}

/// Unique mutants by exact code text, preserving first-seen order. This is
/// the denominator set for kill-rate scoring.
pub fn dedupe_by_code(mutants: &[Mutant]) -> Vec<&Mutant> {
    let mut seen = BTreeSet::new();
    let mut unique = Vec::new();
    for mutant in mutants {
        if seen.insert(mutant.code.trim()) {
            unique.push(mutant);
        }
    }
    unique
}
