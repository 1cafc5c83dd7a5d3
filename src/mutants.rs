use serde::{Deserialize, Serialize};

/// A single byte-range rewrite discovered at a mutation site. Applying it
/// to the original source text yields the mutant's source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rewrite {
    pub kind: crate::operators::OperatorKind,
    /// Ordinal index among sites of the same kind, assigned in pre-order.
    /// Positional: not stable across trees with different structure.
    pub site: usize,
    pub line: usize,
    pub column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    pub original: String,
    pub replacement: String,
}

/// A finished mutant: full source text plus where it came from.
///
/// Invariant (enforced by the generator): `code` differs from the original
/// function's text and from every other mutant in the batch, except for
/// entries whose provenance starts with "duplicate".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutant {
    pub code: String,
    pub operator: String,
    pub site: String,
    pub provenance: String,
}

impl Mutant {
    pub fn is_duplicate_padding(&self) -> bool {
        self.provenance.starts_with("duplicate")
    }
}

/// Splice a rewrite into source text. Byte offsets come from the same
/// parse the rewrite was discovered in.
pub fn apply_rewrite(source: &str, rewrite: &Rewrite) -> String {
    let mut result = String::with_capacity(source.len());
    result.push_str(&source[..rewrite.start_byte]);
    result.push_str(&rewrite.replacement);
    result.push_str(&source[rewrite.end_byte..]);
    result
}

/// Apply two rewrites to one copy. Ranges must not overlap; the later
/// splice is applied first so earlier offsets stay valid.
pub fn apply_rewrite_pair(source: &str, a: &Rewrite, b: &Rewrite) -> Option<String> {
    let (first, second) = if a.start_byte <= b.start_byte { (a, b) } else { (b, a) };
    if second.start_byte < first.end_byte {
        return None;
    }
    Some(apply_rewrite(&apply_rewrite(source, second), first))
}
