// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod aggregates;
pub mod numbers;
pub mod utils;

use crate::ast::Expr;
use crate::error::FormulaError;
use crate::lexer::Span;
use crate::utils::limits::Limits;
use crate::value::Value;

use core::fmt;
use std::collections::HashMap;

use lazy_static::lazy_static;

pub type BuiltinFcn = fn(&Span, &[Expr], &[Value], &Limits) -> Result<Value, FormulaError>;

/// Number of arguments a builtin accepts. Checked when the call is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Self::Exactly(e) => n == *e,
            Self::AtLeast(e) => n >= *e,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Self::Exactly(1) | Self::AtLeast(1))
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Exactly(e) => write!(f, "{e}"),
            Self::AtLeast(e) => write!(f, "at least {e}"),
        }
    }
}

#[rustfmt::skip]
lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, (BuiltinFcn, Arity)> = {
	let mut m : HashMap<&'static str, (BuiltinFcn, Arity)>  = HashMap::new();

	numbers::register(&mut m);
	aggregates::register(&mut m);

	m
    };
}

pub fn lookup(name: &str) -> Option<&'static (BuiltinFcn, Arity)> {
    BUILTINS.get(name)
}

/// Supported function names in alphabetical order.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}
