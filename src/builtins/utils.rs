// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::Expr;
use crate::error::FormulaError;
use crate::lexer::Span;
use crate::value::{Float, Value};

type Result<T> = core::result::Result<T, FormulaError>;

fn type_mismatch(span: &Span, msg: &str) -> FormulaError {
    FormulaError::TypeMismatch {
        message: span.message("error", msg),
    }
}

/// Coerces an operand to a number.
///
/// Absent values and `null` count as `0` and booleans as `1`/`0`. Strings,
/// arrays and objects are rejected.
pub fn ensure_numeric(fcn: &str, arg: &Expr, v: &Value) -> Result<Float> {
    Ok(match v {
        Value::Number(n) => *n,
        Value::Bool(b) => *b as u8 as Float,
        Value::Null | Value::Undefined => 0.0,
        _ => {
            return Err(type_mismatch(
                arg.span(),
                &format!(
                    "`{fcn}` expects numeric argument. Got {} instead",
                    v.type_name()
                ),
            ))
        }
    })
}

/// Returns the elements of an array argument. Absent and `null` are treated
/// as empty.
pub fn ensure_array<'a>(fcn: &str, arg: &Expr, v: &'a Value) -> Result<&'a [Value]> {
    Ok(match v {
        Value::Array(a) => a.as_slice(),
        Value::Null | Value::Undefined => &[],
        _ => {
            return Err(type_mismatch(
                arg.span(),
                &format!(
                    "`{fcn}` expects array argument. Got {} instead",
                    v.type_name()
                ),
            ))
        }
    })
}

/// Renders a value for string concatenation.
pub fn ensure_text(op: &str, arg: &Expr, v: &Value) -> Result<String> {
    Ok(match v {
        Value::String(s) => s.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Undefined => String::new(),
        _ => {
            return Err(type_mismatch(
                arg.span(),
                &format!("cannot apply `{op}` to {} and string", v.type_name()),
            ))
        }
    })
}

/// Integral values print without a fractional part.
pub fn format_number(n: Float) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
