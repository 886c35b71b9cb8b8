// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::*;
use crate::value::Float;
use crate::Rc;

use core::{cmp, fmt, ops::Deref};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl ArithOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Neg,
}

/// Shared handle to an immutable node. Parsed formulas are cached as
/// `Ref<Expr>` so that evaluators can hold a root without copying the tree.
pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

/// A formula node. Children are owned exclusively by their parent.
#[derive(Debug)]
pub enum Expr {
    Number {
        span: Span,
        value: Float,
    },

    String {
        span: Span,
        value: Rc<str>,
    },

    // Bare identifier, looked up in the context.
    Var {
        span: Span,
        name: Rc<str>,
    },

    // a.b
    RefDot {
        span: Span,
        refr: Box<Expr>,
        field: (Span, Rc<str>),
    },

    // a[b]
    RefBrack {
        span: Span,
        refr: Box<Expr>,
        index: Box<Expr>,
    },

    UnaryExpr {
        span: Span,
        op: UnaryOp,
        expr: Box<Expr>,
    },

    ArithExpr {
        span: Span,
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Call {
        span: Span,
        name: (Span, Rc<str>),
        params: Vec<Expr>,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Self::Number { span, .. }
            | Self::String { span, .. }
            | Self::Var { span, .. }
            | Self::RefDot { span, .. }
            | Self::RefBrack { span, .. }
            | Self::UnaryExpr { span, .. }
            | Self::ArithExpr { span, .. }
            | Self::Call { span, .. } => span,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::Number { .. } | Self::String { .. } | Self::Var { .. } => 0,
            Self::RefDot { refr, .. } => refr.node_count(),
            Self::RefBrack { refr, index, .. } => refr.node_count() + index.node_count(),
            Self::UnaryExpr { expr, .. } => expr.node_count(),
            Self::ArithExpr { lhs, rhs, .. } => lhs.node_count() + rhs.node_count(),
            Self::Call { params, .. } => params.iter().map(Expr::node_count).sum(),
        }
    }
}
