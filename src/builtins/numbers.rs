// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{ArithOp, Expr};
use crate::builtins::utils::{ensure_numeric, ensure_text};
use crate::builtins::{Arity, BuiltinFcn};
use crate::error::FormulaError;
use crate::lexer::Span;
use crate::utils::limits::Limits;
use crate::value::Value;

use std::collections::HashMap;

type Result<T> = core::result::Result<T, FormulaError>;

pub fn register(m: &mut HashMap<&'static str, (BuiltinFcn, Arity)>) {
    m.insert("abs", (abs, Arity::Exactly(1)));
}

pub fn arithmetic_operation(
    span: &Span,
    op: &ArithOp,
    expr1: &Expr,
    expr2: &Expr,
    v1: Value,
    v2: Value,
) -> Result<Value> {
    let op_name = op.symbol();

    if *op == ArithOp::Add && (matches!(v1, Value::String(_)) || matches!(v2, Value::String(_))) {
        let mut s = ensure_text(op_name, expr1, &v1)?;
        s.push_str(&ensure_text(op_name, expr2, &v2)?);
        return Ok(Value::from(s));
    }

    let v1 = ensure_numeric(op_name, expr1, &v1)?;
    let v2 = ensure_numeric(op_name, expr2, &v2)?;

    Ok(Value::from(match op {
        ArithOp::Add => v1 + v2,
        ArithOp::Sub => v1 - v2,
        ArithOp::Mul => v1 * v2,
        ArithOp::Div if v2 == 0.0 => {
            return Err(FormulaError::DivisionByZero {
                message: span.message("error", "division by zero"),
            })
        }
        ArithOp::Div => v1 / v2,
        ArithOp::Pow => v1.powf(v2),
    }))
}

fn abs(_span: &Span, params: &[Expr], args: &[Value], _limits: &Limits) -> Result<Value> {
    Ok(Value::from(ensure_numeric("abs", &params[0], &args[0])?.abs()))
}
