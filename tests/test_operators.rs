use postcheck::operators::{
    self, Intensity, OperatorKind, arithmetic_rewrite, boolean_rewrite, comparison_rewrite,
    constant_offset_rewrite, constant_rewrite, sign_rewrite,
};

// --- comparison_rewrite ---

#[test]
fn comparison_default_flips_orientation() {
    assert_eq!(comparison_rewrite(">", Intensity::Default), Some("<"));
    assert_eq!(comparison_rewrite("<", Intensity::Default), Some(">"));
    assert_eq!(comparison_rewrite(">=", Intensity::Default), Some("<="));
    assert_eq!(comparison_rewrite("<=", Intensity::Default), Some(">="));
    assert_eq!(comparison_rewrite("==", Intensity::Default), Some("!="));
    assert_eq!(comparison_rewrite("!=", Intensity::Default), Some("=="));
}

#[test]
fn comparison_aggressive_collapses_toward_equality() {
    assert_eq!(comparison_rewrite(">", Intensity::Aggressive), Some(">="));
    assert_eq!(comparison_rewrite("<", Intensity::Aggressive), Some("<="));
    assert_eq!(comparison_rewrite(">=", Intensity::Aggressive), Some("=="));
    assert_eq!(comparison_rewrite("<=", Intensity::Aggressive), Some("=="));
    assert_eq!(comparison_rewrite("==", Intensity::Aggressive), Some("<="));
    assert_eq!(comparison_rewrite("!=", Intensity::Aggressive), Some("=="));
}

#[test]
fn comparison_ignores_identity_and_membership() {
    for op in ["is", "in", "not in", "is not"] {
        assert_eq!(comparison_rewrite(op, Intensity::Default), None);
        assert_eq!(comparison_rewrite(op, Intensity::Aggressive), None);
    }
}

// --- arithmetic_rewrite ---

#[test]
fn arithmetic_default_table() {
    assert_eq!(arithmetic_rewrite("+", Intensity::Default), Some("-"));
    assert_eq!(arithmetic_rewrite("-", Intensity::Default), Some("+"));
    assert_eq!(arithmetic_rewrite("*", Intensity::Default), Some("//"));
    assert_eq!(arithmetic_rewrite("//", Intensity::Default), Some("*"));
    assert_eq!(arithmetic_rewrite("/", Intensity::Default), Some("*"));
    assert_eq!(arithmetic_rewrite("%", Intensity::Default), Some("*"));
}

#[test]
fn arithmetic_aggressive_table_differs_from_default() {
    for op in ["+", "-", "*", "/", "//", "%"] {
        let default = arithmetic_rewrite(op, Intensity::Default).unwrap();
        let aggressive = arithmetic_rewrite(op, Intensity::Aggressive).unwrap();
        assert_ne!(default, aggressive, "op {}", op);
        assert_ne!(aggressive, op, "op {}", op);
    }
}

#[test]
fn arithmetic_ignores_non_arithmetic_tokens() {
    assert_eq!(arithmetic_rewrite("**", Intensity::Default), None);
    assert_eq!(arithmetic_rewrite("&", Intensity::Default), None);
}

// --- boolean_rewrite ---

#[test]
fn boolean_swaps_and_or() {
    assert_eq!(boolean_rewrite("and"), Some("or"));
    assert_eq!(boolean_rewrite("or"), Some("and"));
    assert_eq!(boolean_rewrite("not"), None);
}

// --- constant_rewrite ---

#[test]
fn constant_default_integers() {
    assert_eq!(constant_rewrite("0", Intensity::Default).as_deref(), Some("1"));
    assert_eq!(constant_rewrite("1", Intensity::Default).as_deref(), Some("0"));
    assert_eq!(constant_rewrite("5", Intensity::Default).as_deref(), Some("6"));
    assert_eq!(constant_rewrite("-3", Intensity::Default).as_deref(), Some("-4"));
}

#[test]
fn constant_aggressive_integers() {
    assert_eq!(constant_rewrite("0", Intensity::Aggressive).as_deref(), Some("2"));
    assert_eq!(constant_rewrite("1", Intensity::Aggressive).as_deref(), Some("2"));
    assert_eq!(constant_rewrite("7", Intensity::Aggressive).as_deref(), Some("14"));
}

#[test]
fn constant_booleans_flip() {
    assert_eq!(constant_rewrite("True", Intensity::Default).as_deref(), Some("False"));
    assert_eq!(constant_rewrite("False", Intensity::Aggressive).as_deref(), Some("True"));
}

#[test]
fn constant_strings() {
    assert_eq!(
        constant_rewrite("\"abc\"", Intensity::Default).as_deref(),
        Some("\"\"")
    );
    assert_eq!(
        constant_rewrite("\"abc\"", Intensity::Aggressive).as_deref(),
        Some("\"__mutant__\"")
    );
    // empty strings always get the marker, never a no-op
    assert_eq!(
        constant_rewrite("\"\"", Intensity::Default).as_deref(),
        Some("\"__mutant__\"")
    );
    assert_eq!(
        constant_rewrite("''", Intensity::Default).as_deref(),
        Some("\"__mutant__\"")
    );
}

#[test]
fn constant_ignores_other_literals() {
    assert_eq!(constant_rewrite("3.14", Intensity::Default), None);
    assert_eq!(constant_rewrite("None", Intensity::Default), None);
}

// --- constant_offset_rewrite ---

#[test]
fn constant_offset_applies_delta() {
    assert_eq!(constant_offset_rewrite("5", 2).as_deref(), Some("7"));
    assert_eq!(constant_offset_rewrite("5", -2).as_deref(), Some("3"));
    assert_eq!(constant_offset_rewrite("0", -1).as_deref(), Some("-1"));
    assert_eq!(constant_offset_rewrite("abc", 1), None);
}

// --- sign_rewrite / return_rewrite ---

#[test]
fn sign_flips() {
    assert_eq!(sign_rewrite("-"), Some("+"));
    assert_eq!(sign_rewrite("+"), Some("-"));
    assert_eq!(sign_rewrite("~"), None);
}

#[test]
fn return_replacement_is_none_literal() {
    assert_eq!(operators::return_rewrite(), "return None");
}

// --- OperatorKind ---

#[test]
fn operator_kind_tags_are_distinct() {
    let tags: Vec<&str> = OperatorKind::ALL.iter().map(|k| k.tag()).collect();
    let mut deduped = tags.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), tags.len());
}

#[test]
fn operator_kind_serializes_snake_case() {
    let json = serde_json::to_string(&OperatorKind::BinOp).unwrap();
    assert_eq!(json, "\"bin_op\"");
}
