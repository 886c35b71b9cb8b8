// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::utils::limits::LimitError;

use thiserror::Error;

/// Errors produced while parsing or evaluating a formula.
///
/// All of them are local to one formula. Hosts rendering a form are expected
/// to report the error next to the offending field and carry on with the rest.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// A security ceiling was hit. The message is the limit's own.
    #[error(transparent)]
    Limit(#[from] LimitError),

    #[error("{message}")]
    Syntax { message: String },

    #[error("{message}")]
    UnknownFunction { name: String, message: String },

    #[error("{message}")]
    InvalidArgumentCount {
        name: String,
        expected: String,
        actual: usize,
        message: String,
    },

    #[error("formula for field `{field_id}` has not been parsed. Call parse_formula before evaluate.")]
    NotParsed { field_id: String },

    #[error("{message}")]
    DivisionByZero { message: String },

    #[error("{message}")]
    TypeMismatch { message: String },
}

impl FormulaError {
    /// The security limit behind this error, if any.
    pub fn limit(&self) -> Option<&LimitError> {
        match self {
            Self::Limit(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_limit(&self) -> bool {
        self.limit().is_some()
    }
}
