use tree_sitter::{Node, Parser, Tree};

use crate::mutants::Rewrite;
use crate::operators::{self, Intensity, OperatorKind};

/// Raised when neither parsing nor the textual header scan can recover a
/// function name from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExtractionError;

impl std::fmt::Display for NameExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not extract a function name from the source")
    }
}

impl std::error::Error for NameExtractionError {}

fn python_parser() -> Parser {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .expect("Failed to set Python grammar");
    parser
}

/// Parse source, attempting one repair pass (trailing-whitespace
/// normalization) if the first parse contains errors. Returns the tree
/// together with the text it was parsed from, so byte offsets always
/// refer to the returned text.
pub fn parse_source(source: &str) -> Option<(Tree, String)> {
    let mut parser = python_parser();
    let tree = parser.parse(source, None)?;
    if !tree.root_node().has_error() {
        return Some((tree, source.to_string()));
    }
    let repaired: String = source
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    let tree = parser.parse(&repaired, None)?;
    if tree.root_node().has_error() {
        return None;
    }
    Some((tree, repaired))
}

pub fn node_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Pre-order walk over every node in the tree.
pub fn walk<'a>(node: Node<'a>, visit: &mut impl FnMut(Node<'a>)) {
    visit(node);
    let count = node.child_count();
    for i in 0..count {
        if let Some(child) = node.child(i) {
            walk(child, visit);
        }
    }
}

/// Name of the function under evaluation. Generated code sometimes defines
/// helpers before the entry point, so the *last* function defined wins.
/// Falls back to a textual `def <name>(` scan when the source is
/// unparsable.
pub fn function_name(source: &str) -> Result<String, NameExtractionError> {
    if let Some((tree, text)) = parse_source(source) {
        let mut names = Vec::new();
        walk(tree.root_node(), &mut |node| {
            if node.kind() == "function_definition" {
                if let Some(name_node) = node.child_by_field_name("name") {
                    names.push(node_text(name_node, &text).to_string());
                }
            }
        });
        if let Some(last) = names.pop() {
            return Ok(last);
        }
    }
    textual_function_name(source).ok_or(NameExtractionError)
}

fn textual_function_name(source: &str) -> Option<String> {
    let mut last = None;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("def ") {
            let rest = rest.trim_start();
            let name: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if !name.is_empty() && rest[name.len()..].trim_start().starts_with('(') {
                last = Some(name);
            }
        }
    }
    last
}

fn last_function_node<'a>(root: Node<'a>) -> Option<Node<'a>> {
    let mut last = None;
    walk(root, &mut |node| {
        if node.kind() == "function_definition" {
            last = Some(node);
        }
    });
    last
}

/// Ordered parameter names of the last function defined in the source.
/// `self` and splat parameters are not bindable by name and are skipped.
pub fn function_params(source: &str) -> Vec<String> {
    let Some((tree, text)) = parse_source(source) else {
        return Vec::new();
    };
    let Some(func) = last_function_node(tree.root_node()) else {
        return Vec::new();
    };
    let Some(params_node) = func.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut params = Vec::new();
    let count = params_node.child_count();
    for i in 0..count {
        let Some(child) = params_node.child(i) else {
            continue;
        };
        let name = match child.kind() {
            "identifier" => Some(node_text(child, &text).to_string()),
            "typed_parameter" => child
                .child(0)
                .filter(|n| n.kind() == "identifier")
                .map(|n| node_text(n, &text).to_string()),
            "default_parameter" | "typed_default_parameter" => child
                .child_by_field_name("name")
                .map(|n| node_text(n, &text).to_string()),
            _ => None,
        };
        if let Some(name) = name {
            if name != "self" {
                params.push(name);
            }
        }
    }
    params
}

/// Raw text between the parens of the last `def` header. Used to tell a
/// zero-parameter function apart from one whose parameters we failed to
/// extract structurally.
pub fn declared_param_text(source: &str) -> Option<String> {
    let mut last = None;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("def ") {
            if let Some(open) = trimmed.find('(') {
                if let Some(close) = trimmed[open..].find(')') {
                    last = Some(trimmed[open + 1..open + close].trim().to_string());
                }
            }
        }
    }
    last
}

/// List all function names in the source (skips dunder and test functions).
pub fn list_functions(source: &str) -> Vec<String> {
    let Some((tree, text)) = parse_source(source) else {
        return Vec::new();
    };
    let mut names = Vec::new();
    walk(tree.root_node(), &mut |node| {
        if node.kind() == "function_definition" {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, &text);
                if !name.starts_with("__") && !name.starts_with("test_") {
                    names.push(name.to_string());
                }
            }
        }
    });
    names
}

/// Full text of a named function definition, for scoped mutant inspection.
pub fn function_text(source: &str, name: &str) -> Option<String> {
    let (tree, text) = parse_source(source)?;
    let mut found = None;
    walk(tree.root_node(), &mut |node| {
        if node.kind() == "function_definition" && found.is_none() {
            if let Some(name_node) = node.child_by_field_name("name") {
                if node_text(name_node, &text) == name {
                    found = Some(node_text(node, &text).to_string());
                }
            }
        }
    });
    found
}

/// Enumerate every addressable mutation site of one kind, in pre-order.
/// The vector index is the site's ordinal id; only nodes with a viable
/// rewrite count as sites.
pub fn enumerate_sites(source: &str, kind: OperatorKind, intensity: Intensity) -> Vec<Rewrite> {
    let Some((tree, text)) = parse_source(source) else {
        return Vec::new();
    };
    let mut sites = Vec::new();
    walk(tree.root_node(), &mut |node| {
        if let Some((start, end, replacement)) = site_rewrite(node, &text, kind, intensity) {
            let original = text[start..end].to_string();
            if replacement == original {
                return;
            }
            sites.push(Rewrite {
                kind,
                site: sites.len(),
                line: node.start_position().row + 1,
                column: node.start_position().column + 1,
                start_byte: start,
                end_byte: end,
                original,
                replacement,
            });
        }
    });
    sites
}

/// Number of addressable sites of a kind; bounds the index domain for
/// generation.
pub fn count_sites(source: &str, kind: OperatorKind) -> usize {
    enumerate_sites(source, kind, Intensity::Default).len()
}

fn site_rewrite(
    node: Node,
    source: &str,
    kind: OperatorKind,
    intensity: Intensity,
) -> Option<(usize, usize, String)> {
    match kind {
        OperatorKind::Compare => {
            if node.kind() != "comparison_operator" {
                return None;
            }
            // Rewrite the first operator token, matching the fixed
            // flip table; chained comparisons keep their later operators.
            let count = node.child_count();
            for i in 0..count {
                let child = node.child(i)?;
                if let Some(replacement) =
                    operators::comparison_rewrite(child.kind(), intensity)
                {
                    return Some((
                        child.start_byte(),
                        child.end_byte(),
                        replacement.to_string(),
                    ));
                }
                match child.kind() {
                    "is" | "in" | "not in" | "is not" | "<>" => return None,
                    _ => {}
                }
            }
            None
        }
        OperatorKind::BinOp => {
            if node.kind() != "binary_operator" {
                return None;
            }
            let op = node.child_by_field_name("operator")?;
            let replacement = operators::arithmetic_rewrite(op.kind(), intensity)?;
            Some((op.start_byte(), op.end_byte(), replacement.to_string()))
        }
        OperatorKind::BoolOp => {
            if node.kind() != "boolean_operator" {
                return None;
            }
            let op = node.child_by_field_name("operator")?;
            let replacement = operators::boolean_rewrite(node_text(op, source))?;
            Some((op.start_byte(), op.end_byte(), replacement.to_string()))
        }
        OperatorKind::Constant => {
            match node.kind() {
                "integer" | "true" | "false" | "string" => {}
                _ => return None,
            }
            if is_docstring(node) {
                return None;
            }
            let literal = node_text(node, source);
            let replacement = operators::constant_rewrite(literal, intensity)?;
            Some((node.start_byte(), node.end_byte(), replacement))
        }
        OperatorKind::Unary => match node.kind() {
            "not_operator" => {
                let operand = node.child(1)?;
                Some((
                    node.start_byte(),
                    node.end_byte(),
                    node_text(operand, source).to_string(),
                ))
            }
            "unary_operator" => {
                let op = node.child(0)?;
                let flipped = operators::sign_rewrite(op.kind())?;
                Some((op.start_byte(), op.end_byte(), flipped.to_string()))
            }
            _ => None,
        },
        OperatorKind::Return => {
            if node.kind() != "return_statement" || node.child_count() < 2 {
                return None;
            }
            Some((
                node.start_byte(),
                node.end_byte(),
                operators::return_rewrite().to_string(),
            ))
        }
    }
}

/// A string that is the sole expression of a statement is a docstring,
/// not business logic.
fn is_docstring(node: Node) -> bool {
    if node.kind() != "string" {
        return false;
    }
    match node.parent() {
        Some(parent) => parent.kind() == "expression_statement" && parent.child_count() == 1,
        None => false,
    }
}
