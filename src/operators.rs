use serde::{Deserialize, Serialize};

/// Operator kinds, in the fixed order generation enumerates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Compare,
    BinOp,
    BoolOp,
    Constant,
    Unary,
    Return,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 6] = [
        OperatorKind::Compare,
        OperatorKind::BinOp,
        OperatorKind::BoolOp,
        OperatorKind::Constant,
        OperatorKind::Unary,
        OperatorKind::Return,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            OperatorKind::Compare => "compare",
            OperatorKind::BinOp => "binop",
            OperatorKind::BoolOp => "boolop",
            OperatorKind::Constant => "constant",
            OperatorKind::Unary => "unary",
            OperatorKind::Return => "return",
        }
    }
}

/// Mutation intensity. The default tables make the smallest behavioral
/// change; aggressive tables push harder when the default pass cannot
/// reach the target mutant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Default,
    Aggressive,
}

/// Relational operator flips. Default swaps orientation; aggressive
/// collapses relations toward equality.
pub fn comparison_rewrite(op: &str, intensity: Intensity) -> Option<&'static str> {
    match intensity {
        Intensity::Default => match op {
            ">" => Some("<"),
            "<" => Some(">"),
            ">=" => Some("<="),
            "<=" => Some(">="),
            "==" => Some("!="),
            "!=" => Some("=="),
            _ => None,
        },
        Intensity::Aggressive => match op {
            ">" => Some(">="),
            "<" => Some("<="),
            ">=" => Some("=="),
            "<=" => Some("=="),
            "==" => Some("<="),
            "!=" => Some("=="),
            _ => None,
        },
    }
}

/// Arithmetic operator swaps.
pub fn arithmetic_rewrite(op: &str, intensity: Intensity) -> Option<&'static str> {
    match intensity {
        Intensity::Default => match op {
            "+" => Some("-"),
            "-" => Some("+"),
            "*" => Some("//"),
            "//" => Some("*"),
            "/" => Some("*"),
            "%" => Some("*"),
            _ => None,
        },
        Intensity::Aggressive => match op {
            "+" => Some("*"),
            "-" => Some("//"),
            "*" => Some("+"),
            "/" => Some("-"),
            "//" => Some("%"),
            "%" => Some("+"),
            _ => None,
        },
    }
}

/// `and` <-> `or`. Intensity makes no difference here.
pub fn boolean_rewrite(op: &str) -> Option<&'static str> {
    match op {
        "and" => Some("or"),
        "or" => Some("and"),
        _ => None,
    }
}

/// Literal replacement. Covers integers, booleans and plain strings;
/// anything else is not a constant site.
pub fn constant_rewrite(literal: &str, intensity: Intensity) -> Option<String> {
    if let Ok(n) = literal.parse::<i64>() {
        let mutated = match intensity {
            Intensity::Default => match n {
                0 => 1,
                1 => 0,
                n if n > 0 => n + 1,
                n => n - 1,
            },
            Intensity::Aggressive => {
                if n == 0 {
                    2
                } else {
                    n.saturating_mul(2)
                }
            }
        };
        if mutated == n {
            return None;
        }
        return Some(mutated.to_string());
    }
    match literal {
        "True" => return Some("False".to_string()),
        "False" => return Some("True".to_string()),
        _ => {}
    }
    if literal.starts_with('"') || literal.starts_with('\'') {
        let empty = literal == "\"\"" || literal == "''";
        let replacement = if empty {
            "\"__mutant__\""
        } else {
            match intensity {
                Intensity::Default => "\"\"",
                Intensity::Aggressive => "\"__mutant__\"",
            }
        };
        if replacement == literal {
            return None;
        }
        return Some(replacement.to_string());
    }
    None
}

/// Perturb an integer literal by a fixed delta (constant-offset fallback).
pub fn constant_offset_rewrite(literal: &str, delta: i64) -> Option<String> {
    let n = literal.parse::<i64>().ok()?;
    let mutated = n.checked_add(delta)?;
    Some(mutated.to_string())
}

/// Flip a unary arithmetic sign operator.
pub fn sign_rewrite(op: &str) -> Option<&'static str> {
    match op {
        "-" => Some("+"),
        "+" => Some("-"),
        _ => None,
    }
}

/// Replacement for a valued return statement.
pub fn return_rewrite() -> &'static str {
    "return None"
}
