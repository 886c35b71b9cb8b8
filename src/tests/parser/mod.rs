// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, clippy::panic)]

use crate::ast::*;
use crate::error::FormulaError;
use crate::parser::Parser;
use crate::utils::limits::{LimitError, Limits};

use anyhow::Result;

fn parse(formula: &str) -> core::result::Result<Expr, FormulaError> {
    Parser::parse_str("formula", formula, &Limits::default())
}

// Renders the tree fully parenthesized so that shape can be compared as text.
fn render(expr: &Expr) -> String {
    match expr {
        Expr::Number { value, .. } => format!("{value}"),
        Expr::String { value, .. } => format!("{value:?}"),
        Expr::Var { name, .. } => name.to_string(),
        Expr::RefDot { refr, field, .. } => format!("{}.{}", render(refr), field.1),
        Expr::RefBrack { refr, index, .. } => format!("{}[{}]", render(refr), render(index)),
        Expr::UnaryExpr { expr, .. } => format!("(-{})", render(expr)),
        Expr::ArithExpr { op, lhs, rhs, .. } => {
            format!("({} {} {})", render(lhs), op.symbol(), render(rhs))
        }
        Expr::Call { name, params, .. } => format!(
            "{}({})",
            name.1,
            params.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn shape(formula: &str) -> Result<String> {
    Ok(render(&parse(formula)?))
}

#[test]
fn precedence_and_associativity() -> Result<()> {
    assert_eq!(shape("1 + 2 * 3")?, "(1 + (2 * 3))");
    assert_eq!(shape("1 - 2 - 3")?, "((1 - 2) - 3)");
    assert_eq!(shape("8 / 4 / 2")?, "((8 / 4) / 2)");
    assert_eq!(shape("2 ^ 3 ^ 2")?, "(2 ^ (3 ^ 2))");
    assert_eq!(shape("2 * 3 ^ 2")?, "(2 * (3 ^ 2))");
    assert_eq!(shape("-a ^ 2")?, "((-a) ^ 2)");
    assert_eq!(shape("(a + b) * (c - d)")?, "((a + b) * (c - d))");
    Ok(())
}

#[test]
fn postfix_references_chain_left_to_right() -> Result<()> {
    assert_eq!(shape("a.b.c")?, "a.b.c");
    assert_eq!(shape("rolls[i + 1].value")?, "rolls[(i + 1)].value");
    assert_eq!(shape("stats['str']")?, "stats[\"str\"]");
    Ok(())
}

#[test]
fn calls() -> Result<()> {
    assert_eq!(shape("max(a, b, 3)")?, "max(a, b, 3)");
    assert_eq!(shape("sum(rolls) / count(rolls)")?, "(sum(rolls) / count(rolls))");
    assert_eq!(shape("abs(-x)")?, "abs((-x))");
    Ok(())
}

#[test]
fn node_count_matches_tree() -> Result<()> {
    for formula in ["a", "a + b * c", "max(a.b, c[1], -d)", "2 ^ 3 ^ 4"] {
        let source = crate::lexer::Source::from_contents(
            "formula".to_string(),
            formula.to_string(),
            &Limits::default(),
        )?;
        let mut parser = Parser::new(&source, &Limits::default())?;
        let expr = parser.parse()?;
        assert_eq!(parser.node_count(), expr.node_count(), "{formula}");
    }
    Ok(())
}

#[test]
fn syntax_errors() {
    let cases = [
        ("", "empty formula"),
        ("   ", "empty formula"),
        ("1 +", "unexpected end of formula"),
        ("(1 + 2", "expecting `)`"),
        ("a b", "unexpected `b` after expression"),
        ("a.", "expecting identifier"),
        ("a[1", "expecting `]`"),
        ("--a", "unexpected `-`"),
        ("max(1,)", "unexpected `)`"),
    ];
    for (formula, expected) in cases {
        match parse(formula) {
            Err(e @ FormulaError::Syntax { .. }) => {
                assert!(e.to_string().contains(expected), "{formula}: {e}")
            }
            r => panic!("{formula}: unexpected result {r:?}"),
        }
    }
}

#[test]
fn unknown_function_lists_supported_ones() {
    match parse("floor(1.5)") {
        Err(FormulaError::UnknownFunction { name, message }) => {
            assert_eq!(name, "floor");
            assert!(message.contains("abs, count, max, min, sum"), "{message}");
        }
        r => panic!("unexpected result {r:?}"),
    }
}

#[test]
fn argument_counts_are_checked() {
    for (formula, expected) in [
        ("abs()", "`abs` expects 1 argument, got 0"),
        ("sum(a, b)", "`sum` expects 1 argument, got 2"),
        ("max()", "`max` expects at least 1 argument, got 0"),
    ] {
        match parse(formula) {
            Err(e @ FormulaError::InvalidArgumentCount { .. }) => {
                assert!(e.to_string().contains(expected), "{formula}: {e}")
            }
            r => panic!("{formula}: unexpected result {r:?}"),
        }
    }
}

#[test]
fn depth_counts_parens_arguments_and_indexes() {
    let limits = Limits {
        max_ast_depth: 3,
        ..Limits::default()
    };
    let ok = ["((a))", "abs((a))", "a[(b)]", "x[y[1]]"];
    for formula in ok {
        assert!(Parser::parse_str("formula", formula, &limits).is_ok(), "{formula}");
    }

    let too_deep = ["(((a)))", "abs(abs(abs(a)))", "a[b[c[1]]]", "max(1, (a[(b)]))"];
    for formula in too_deep {
        let err = Parser::parse_str("formula", formula, &limits).unwrap_err();
        assert!(
            matches!(
                err,
                FormulaError::Limit(LimitError::FormulaDepthExceeded { observed: 4, limit: 3 })
            ),
            "{formula}: {err}"
        );
    }
}

#[test]
fn blocked_names_are_rejected_anywhere() {
    for formula in [
        "__proto__",
        "a.constructor",
        "1 + x.y.prototype",
        "sum(a.__proto__)",
        "a[constructor]",
        "constructor(1)",
    ] {
        let err = parse(formula).unwrap_err();
        assert!(
            matches!(
                err,
                FormulaError::Limit(LimitError::BlockedPropertyAccess { .. })
            ),
            "{formula}: {err}"
        );
    }
    assert!(parse("my_constructor + proto_value + prototypes").is_ok());
}
