use crate::syntax::{self, node_text};

/// Inferred semantic category for a parameter. Drives which randomized
/// input generator the correctness harness uses. This is a best-effort
/// heuristic, not a type system: a wrong inference produces incompatible
/// inputs that the trial loop discards, never a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    List,
    Tuple,
    Integer,
}

const TEXT_NAMES: [&str; 12] = [
    "s", "s1", "s2", "str1", "str2", "text", "string", "word", "chars", "sentence", "message",
    "char",
];

const LIST_NAMES: [&str; 12] = [
    "arr", "nums", "lst", "list1", "list2", "items", "elements", "array", "numbers", "values",
    "seq", "data",
];

const STRING_METHODS: [&str; 12] = [
    "split",
    "strip",
    "upper",
    "lower",
    "join",
    "replace",
    "startswith",
    "endswith",
    "isdigit",
    "isalpha",
    "title",
    "count",
];

/// Infer a parameter's semantic category from its name, then from how the
/// function's syntax tree uses it. Name heuristics win for speed and
/// stability; absence of every signal defaults to integer.
pub fn infer_param_kind(param: &str, source: &str) -> ParamKind {
    let lower = param.to_lowercase();
    if TEXT_NAMES.contains(&lower.as_str()) {
        return ParamKind::Text;
    }
    if lower.starts_with("tup") || lower.contains("tuple") {
        return ParamKind::Tuple;
    }
    if LIST_NAMES.contains(&lower.as_str()) {
        return ParamKind::List;
    }
    match usage_kind(param, source) {
        Some(kind) => kind,
        None => ParamKind::Integer,
    }
}

/// Syntax-usage signatures: iteration, indexing, or len() mark a list;
/// string-only method calls or string concatenation mark text.
fn usage_kind(param: &str, source: &str) -> Option<ParamKind> {
    let (tree, text) = syntax::parse_source(source)?;
    let mut is_list = false;
    let mut is_text = false;
    syntax::walk(tree.root_node(), &mut |node| {
        match node.kind() {
            "for_statement" => {
                if let Some(right) = node.child_by_field_name("right") {
                    if right.kind() == "identifier" && node_text(right, &text) == param {
                        is_list = true;
                    }
                }
            }
            "subscript" => {
                if let Some(value) = node.child_by_field_name("value") {
                    if value.kind() == "identifier" && node_text(value, &text) == param {
                        is_list = true;
                    }
                }
            }
            "call" => {
                if let Some(func) = node.child_by_field_name("function") {
                    // len(param)
                    if func.kind() == "identifier" && node_text(func, &text) == "len" {
                        if let Some(args) = node.child_by_field_name("arguments") {
                            let count = args.child_count();
                            for i in 0..count {
                                if let Some(arg) = args.child(i) {
                                    if arg.kind() == "identifier"
                                        && node_text(arg, &text) == param
                                    {
                                        is_list = true;
                                    }
                                }
                            }
                        }
                    }
                    // param.split(), param.upper(), ...
                    if func.kind() == "attribute" {
                        let object = func.child_by_field_name("object");
                        let attribute = func.child_by_field_name("attribute");
                        if let (Some(object), Some(attribute)) = (object, attribute) {
                            if object.kind() == "identifier"
                                && node_text(object, &text) == param
                                && STRING_METHODS.contains(&node_text(attribute, &text))
                            {
                                is_text = true;
                            }
                        }
                    }
                }
            }
            "binary_operator" => {
                // param + "literal" concatenation
                if let Some(op) = node.child_by_field_name("operator") {
                    if op.kind() == "+" {
                        let left = node.child_by_field_name("left");
                        let right = node.child_by_field_name("right");
                        if let (Some(left), Some(right)) = (left, right) {
                            let touches_param = (left.kind() == "identifier"
                                && node_text(left, &text) == param)
                                || (right.kind() == "identifier"
                                    && node_text(right, &text) == param);
                            let has_string =
                                left.kind() == "string" || right.kind() == "string";
                            if touches_param && has_string {
                                is_text = true;
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    });
    if is_list {
        Some(ParamKind::List)
    } else if is_text {
        Some(ParamKind::Text)
    } else {
        None
    }
}

/// Draw one random value for the kind, rendered as a Python literal.
pub fn random_literal(kind: ParamKind) -> String {
    match kind {
        ParamKind::Integer => fastrand::u8(0..=100).to_string(),
        ParamKind::Text => {
            let len = fastrand::usize(0..=10);
            let word: String = (0..len).map(|_| fastrand::lowercase()).collect();
            format!("'{}'", word)
        }
        ParamKind::Tuple => {
            let len = fastrand::usize(2..=4);
            let parts: Vec<String> =
                (0..len).map(|_| fastrand::u8(0..=20).to_string()).collect();
            format!("({})", parts.join(", "))
        }
        ParamKind::List => {
            let len = fastrand::usize(0..=8);
            let parts: Vec<String> = (0..len).map(|_| random_list_element()).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

/// Lists are heterogeneous on purpose: small ints, short strings, and
/// small tuples exercise more of the function's behavior.
fn random_list_element() -> String {
    match fastrand::usize(0..4) {
        0 | 1 => fastrand::u8(0..=20).to_string(),
        2 => {
            let len = fastrand::usize(1..=4);
            let word: String = (0..len).map(|_| fastrand::lowercase()).collect();
            format!("'{}'", word)
        }
        _ => format!("({}, {})", fastrand::u8(0..=9), fastrand::u8(0..=9)),
    }
}

/// One randomized argument tuple for a parameter list.
pub fn random_case(kinds: &[ParamKind]) -> Vec<String> {
    kinds.iter().map(|kind| random_literal(*kind)).collect()
}
