// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use super::BLOCKED_NAMES;

/// Errors reported when a security ceiling is enforced.
///
/// Every message names the configured limit, the observed value (`got N`),
/// the attack the limit defends against and what the formula author can do
/// about it.
#[derive(Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Reported by the source precheck, before any token is produced.
    FormulaLengthExceeded {
        /// Length of the formula in characters.
        observed: usize,
        /// Configured maximum length.
        limit: usize,
    },
    /// Reported by the parser when nesting goes beyond the configured depth.
    FormulaDepthExceeded { observed: usize, limit: usize },
    /// Reported by the parser when the AST grows beyond the configured node count.
    FormulaComplexityExceeded { observed: usize, limit: usize },
    /// Reported by the evaluator before iterating or indexing an oversized array.
    ArraySizeExceeded { observed: usize, limit: usize },
    /// Reported when an identifier, path segment or object key is a blocked name.
    BlockedPropertyAccess { name: String },
}

impl LimitError {
    /// One sentence naming the attack class the limit prevents.
    pub fn rationale(&self) -> &'static str {
        match self {
            Self::FormulaLengthExceeded { .. } => {
                "Oversized formulas are rejected before parsing to prevent resource exhaustion."
            }
            Self::FormulaDepthExceeded { .. } => {
                "Deeply nested formulas are rejected to prevent stack overflow during parsing and evaluation."
            }
            Self::FormulaComplexityExceeded { .. } => {
                "Large expression trees are rejected to prevent CPU and memory exhaustion during evaluation."
            }
            Self::ArraySizeExceeded { .. } => {
                "Large arrays are rejected to prevent CPU and memory exhaustion during evaluation."
            }
            Self::BlockedPropertyAccess { .. } => {
                "Reserved names are rejected to prevent prototype pollution and object-model injection."
            }
        }
    }

    /// What the formula author can do to stay within the limit.
    pub fn remedy(&self) -> &'static str {
        match self {
            Self::FormulaLengthExceeded { .. } => {
                "Shorten the formula or split the calculation across several computed fields."
            }
            Self::FormulaDepthExceeded { .. } => {
                "Reduce the number of nested parentheses, function calls or array indexes."
            }
            Self::FormulaComplexityExceeded { .. } => {
                "Simplify the formula or split it across several computed fields."
            }
            Self::ArraySizeExceeded { .. } => {
                "Reduce the number of entries or aggregate the data before evaluating the formula."
            }
            Self::BlockedPropertyAccess { .. } => "Rename the property to a name that is not reserved.",
        }
    }
}

impl fmt::Debug for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormulaLengthExceeded { observed, limit } => f
                .debug_struct("FormulaLengthExceeded")
                .field("observed", observed)
                .field("limit", limit)
                .finish(),
            Self::FormulaDepthExceeded { observed, limit } => f
                .debug_struct("FormulaDepthExceeded")
                .field("observed", observed)
                .field("limit", limit)
                .finish(),
            Self::FormulaComplexityExceeded { observed, limit } => f
                .debug_struct("FormulaComplexityExceeded")
                .field("observed", observed)
                .field("limit", limit)
                .finish(),
            Self::ArraySizeExceeded { observed, limit } => f
                .debug_struct("ArraySizeExceeded")
                .field("observed", observed)
                .field("limit", limit)
                .finish(),
            Self::BlockedPropertyAccess { name } => f
                .debug_struct("BlockedPropertyAccess")
                .field("name", name)
                .finish(),
        }
    }
}

impl fmt::Display for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormulaLengthExceeded { observed, limit } => write!(
                f,
                "formula length exceeds maximum of {limit} characters (got {observed})."
            )?,
            Self::FormulaDepthExceeded { observed, limit } => write!(
                f,
                "formula nesting depth exceeds maximum of {limit} levels (got {observed})."
            )?,
            Self::FormulaComplexityExceeded { observed, limit } => write!(
                f,
                "formula complexity exceeds maximum of {limit} nodes (got {observed})."
            )?,
            Self::ArraySizeExceeded { observed, limit } => write!(
                f,
                "array size exceeds maximum of {limit} elements (got {observed})."
            )?,
            Self::BlockedPropertyAccess { name } => write!(
                f,
                "access to property `{name}` is blocked (reserved names: {}; got `{name}`).",
                BLOCKED_NAMES.join(", ")
            )?,
        }
        write!(f, " {} {}", self.rationale(), self.remedy())
    }
}

impl core::error::Error for LimitError {}
