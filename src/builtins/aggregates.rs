// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::Expr;
use crate::builtins::utils::{ensure_array, ensure_numeric};
use crate::builtins::{Arity, BuiltinFcn};
use crate::error::FormulaError;
use crate::lexer::Span;
use crate::utils::limits::Limits;
use crate::value::{Float, Value};

use std::collections::HashMap;

type Result<T> = core::result::Result<T, FormulaError>;

pub fn register(m: &mut HashMap<&'static str, (BuiltinFcn, Arity)>) {
    m.insert("count", (count, Arity::Exactly(1)));
    m.insert("max", (max, Arity::AtLeast(1)));
    m.insert("min", (min, Arity::AtLeast(1)));
    m.insert("sum", (sum, Arity::Exactly(1)));
}

fn count(_span: &Span, params: &[Expr], args: &[Value], limits: &Limits) -> Result<Value> {
    let items = ensure_array("count", &params[0], &args[0])?;
    limits.check_array_size(items.len())?;
    Ok(Value::from(items.len()))
}

fn sum(_span: &Span, params: &[Expr], args: &[Value], limits: &Limits) -> Result<Value> {
    let items = ensure_array("sum", &params[0], &args[0])?;
    limits.check_array_size(items.len())?;

    let mut v = 0 as Float;
    for e in items {
        if let Value::Number(n) = e {
            v += n;
        }
    }
    Ok(Value::from(v))
}

// With a single array argument the numeric elements of the array are
// compared; otherwise every argument is an operand. An empty array yields
// undefined.
fn numeric_operands(
    fcn: &str,
    params: &[Expr],
    args: &[Value],
    limits: &Limits,
) -> Result<Vec<Float>> {
    if let [Value::Array(items)] = args {
        limits.check_array_size(items.len())?;
        return Ok(items
            .iter()
            .filter_map(|e| match e {
                Value::Number(n) => Some(*n),
                _ => None,
            })
            .collect());
    }

    params
        .iter()
        .zip(args.iter())
        .map(|(p, a)| ensure_numeric(fcn, p, a))
        .collect()
}

fn max(_span: &Span, params: &[Expr], args: &[Value], limits: &Limits) -> Result<Value> {
    Ok(numeric_operands("max", params, args, limits)?
        .into_iter()
        .reduce(Float::max)
        .map_or(Value::Undefined, Value::from))
}

fn min(_span: &Span, params: &[Expr], args: &[Value], limits: &Limits) -> Result<Value> {
    Ok(numeric_operands("min", params, args, limits)?
        .into_iter()
        .reduce(Float::min)
        .map_or(Value::Undefined, Value::from))
}
