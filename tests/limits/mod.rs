// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use formulary::*;

fn numbers(n: usize) -> Value {
    let mut context = Value::new_object();
    if let Ok(fields) = context.as_object_mut() {
        fields.insert("numbers".into(), Value::from(vec![Value::from(2.0); n]));
    }
    context
}

fn limit_of(r: core::result::Result<(), FormulaError>) -> LimitError {
    match r {
        Err(FormulaError::Limit(e)) => e,
        r => panic!("expected a limit error, got {r:?}"),
    }
}

#[test]
fn formula_length() {
    let engine = Engine::new();

    // Padding with whitespace keeps the formula otherwise trivial.
    let at_limit = format!("1{}", " ".repeat(9_999));
    assert!(engine.parse_formula("f", &at_limit).is_ok());

    let over = format!("1{}", " ".repeat(10_000));
    let e = limit_of(engine.parse_formula("f", &over));
    assert_eq!(
        e,
        LimitError::FormulaLengthExceeded {
            observed: 10_001,
            limit: 10_000
        }
    );
    assert!(e.to_string().contains("got 10001"));

    let e = limit_of(engine.parse_formula("f", &"x".repeat(15_000)));
    assert!(e.to_string().contains("got 15000"));
}

#[test]
fn nesting_depth() {
    let engine = Engine::new();
    let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));

    assert!(engine.parse_formula("f", &nested(19)).is_ok());

    let e = limit_of(engine.parse_formula("f", &nested(25)));
    assert!(matches!(
        e,
        LimitError::FormulaDepthExceeded {
            observed: 21,
            limit: 20
        }
    ));
    assert!(e.to_string().contains("stack overflow"));

    let calls = format!("{}x{}", "abs(".repeat(25), ")".repeat(25));
    assert!(matches!(
        limit_of(engine.parse_formula("f", &calls)),
        LimitError::FormulaDepthExceeded { .. }
    ));
}

#[test]
fn node_count() {
    let engine = Engine::new();
    let chain = |n: usize| vec!["a"; n].join(" + ");

    // n operands and n - 1 additions.
    assert!(engine.parse_formula("f", &chain(250)).is_ok());

    let e = limit_of(engine.parse_formula("f", &chain(300)));
    assert!(matches!(
        e,
        LimitError::FormulaComplexityExceeded {
            observed: 501,
            limit: 500
        }
    ));
    assert!(e.to_string().contains("Simplify the formula"));
}

#[test]
fn array_size() -> Result<()> {
    let engine = Engine::new();

    for formula in ["sum(numbers)", "count(numbers)", "numbers[0]", "max(numbers)"] {
        assert!(engine.eval_formula(formula, &numbers(1_000)).is_ok(), "{formula}");

        match engine.eval_formula(formula, &numbers(1_001)) {
            Err(FormulaError::Limit(e @ LimitError::ArraySizeExceeded { .. })) => {
                assert!(e.to_string().contains("got 1001"), "{formula}: {e}");
            }
            r => panic!("{formula}: unexpected result {r:?}"),
        }
    }

    // The array is rejected before its index expression is evaluated.
    assert!(matches!(
        engine.eval_formula("numbers[1 / 0]", &numbers(1_001)),
        Err(FormulaError::Limit(LimitError::ArraySizeExceeded { .. }))
    ));
    assert!(matches!(
        engine.eval_formula("numbers[1 / 0]", &numbers(1_000)),
        Err(FormulaError::DivisionByZero { .. })
    ));

    assert_eq!(
        engine.eval_formula("sum(numbers)", &numbers(1_000))?,
        Value::from(2000.0)
    );
    Ok(())
}

#[test]
fn blocked_names_at_parse_time() {
    let engine = Engine::new();
    for formula in [
        "__proto__",
        "constructor + 1",
        "stats.prototype",
        "a.b.__proto__.c",
        "max(1, x.constructor)",
        "rolls[prototype]",
    ] {
        let e = limit_of(engine.parse_formula("f", formula));
        assert!(
            matches!(e, LimitError::BlockedPropertyAccess { .. }),
            "{formula}: {e}"
        );
    }
}

#[test]
fn blocked_keys_in_context_are_unreachable() -> Result<()> {
    let engine = Engine::new();
    let context = Value::from_json_str(r#"{ "stats": { "__proto__": 1, "str": 8 }, "k": "__proto__" }"#)?;

    assert_eq!(engine.eval_formula("stats['str']", &context)?, Value::from(8.0));
    assert!(matches!(
        engine.eval_formula("stats[k]", &context),
        Err(FormulaError::Limit(LimitError::BlockedPropertyAccess { .. }))
    ));
    Ok(())
}

#[test]
fn configured_limits() -> Result<()> {
    let limits = Limits::from_json_str(
        r#"{ "max_formula_length": 16, "max_ast_depth": 2, "max_node_count": 5, "max_array_size": 3 }"#,
    )?;
    let engine = Engine::new().with_limits(limits);
    assert_eq!(engine.limits(), &limits);

    assert!(matches!(
        limit_of(engine.parse_formula("f", "aaaaaaaaaaaaaaaaa")),
        LimitError::FormulaLengthExceeded { limit: 16, .. }
    ));
    assert!(matches!(
        limit_of(engine.parse_formula("f", "((1))")),
        LimitError::FormulaDepthExceeded { limit: 2, .. }
    ));
    assert!(matches!(
        limit_of(engine.parse_formula("f", "1 + 2 + 3 + 4")),
        LimitError::FormulaComplexityExceeded { limit: 5, .. }
    ));
    assert!(matches!(
        engine.eval_formula("count(numbers)", &numbers(4)),
        Err(FormulaError::Limit(LimitError::ArraySizeExceeded { limit: 3, .. }))
    ));
    Ok(())
}
