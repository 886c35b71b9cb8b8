// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{ArithOp, Expr, UnaryOp};
use crate::builtins;
use crate::builtins::utils::ensure_numeric;
use crate::error::FormulaError;
use crate::lexer::Span;
use crate::utils::limits::{self, Limits};
use crate::value::{Float, Value};
use crate::Rc;

use log::trace;

type Result<T> = core::result::Result<T, FormulaError>;

/// Tree-walking evaluator for a parsed formula.
///
/// The context is read-only; evaluation has no side effects. Blocked names
/// and array sizes are enforced again here since the context is supplied
/// separately from the formula.
pub struct Interpreter<'a> {
    context: &'a Value,
    limits: &'a Limits,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a Value, limits: &'a Limits) -> Self {
        Self { context, limits }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value> {
        let v = self.eval_expr(expr)?;
        trace!("evaluated `{}` to {v}", expr.span().text());
        Ok(v)
    }

    fn lookup_var(&self, name: &str) -> Result<Value> {
        limits::check_name(name)?;
        Ok(self.context[name].clone())
    }

    fn eval_ref_dot(&self, refr: &Expr, field: &str) -> Result<Value> {
        limits::check_name(field)?;
        let obj = self.eval_expr(refr)?;
        Ok(obj[field].clone())
    }

    fn eval_ref_brack(&self, refr: &Expr, index: &Expr) -> Result<Value> {
        let target = self.eval_expr(refr)?;
        if let Value::Array(items) = &target {
            self.limits.check_array_size(items.len())?;
        }
        let index = self.eval_expr(index)?;

        Ok(match (&target, &index) {
            (Value::Array(_), Value::Number(n)) => match Self::as_index(*n) {
                Some(idx) => target[idx].clone(),
                None => Value::Undefined,
            },
            (Value::Object(_), Value::String(key)) => {
                limits::check_name(key)?;
                target[key.as_ref()].clone()
            }
            _ => Value::Undefined,
        })
    }

    // Only non-negative integral numbers address array elements.
    fn as_index(n: Float) -> Option<usize> {
        if n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as Float {
            Some(n as usize)
        } else {
            None
        }
    }

    fn eval_unary_expr(&self, op: &UnaryOp, expr: &Expr) -> Result<Value> {
        let v = self.eval_expr(expr)?;
        match op {
            UnaryOp::Neg => Ok(Value::from(-ensure_numeric("-", expr, &v)?)),
        }
    }

    fn eval_arith_expr(&self, span: &Span, op: &ArithOp, lhs: &Expr, rhs: &Expr) -> Result<Value> {
        let lhs_value = self.eval_expr(lhs)?;
        let rhs_value = self.eval_expr(rhs)?;
        builtins::numbers::arithmetic_operation(span, op, lhs, rhs, lhs_value, rhs_value)
    }

    fn eval_call(&self, span: &Span, name: &(Span, Rc<str>), params: &[Expr]) -> Result<Value> {
        let builtin = match builtins::lookup(&name.1) {
            Some((builtin, _)) => builtin,
            None => {
                return Err(FormulaError::UnknownFunction {
                    name: name.1.to_string(),
                    message: name.0.message("error", "unknown function"),
                })
            }
        };

        let mut args = Vec::with_capacity(params.len());
        for p in params {
            args.push(self.eval_expr(p)?);
        }

        builtin(span, params, &args[..], self.limits)
    }

    fn eval_expr(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::from(*value)),
            Expr::String { value, .. } => Ok(Value::String(value.clone())),
            Expr::Var { name, .. } => self.lookup_var(name),
            Expr::RefDot { refr, field, .. } => self.eval_ref_dot(refr, &field.1),
            Expr::RefBrack { refr, index, .. } => self.eval_ref_brack(refr, index),
            Expr::UnaryExpr { op, expr, .. } => self.eval_unary_expr(op, expr),
            Expr::ArithExpr {
                span, op, lhs, rhs, ..
            } => self.eval_arith_expr(span, op, lhs, rhs),
            Expr::Call { span, name, params } => self.eval_call(span, name, params),
        }
    }
}
