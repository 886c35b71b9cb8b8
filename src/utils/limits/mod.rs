// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Security ceilings shared by the parser and the evaluator.
//!
//! Formulas are authored by people who may be hostile. Instead of wall-clock
//! timeouts, every unit of work is bounded structurally: the source length
//! bounds lexing, the depth and node ceilings bound the AST, and the array
//! ceiling bounds every aggregate. Together they put a small constant upper
//! bound on the work done by any single parse or evaluation.
//!
//! The blocked-name list is inherited from prototype-based object models where
//! `__proto__`, `constructor` and `prototype` can corrupt shared behavior.
//! [`Value`](crate::Value) has no prototype chain, so here the list is purely
//! defense in depth against contexts deserialized from untrusted JSON that
//! carry such keys.

mod error;

pub use error::LimitError;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const MAX_FORMULA_LENGTH: usize = 10_000;
pub const MAX_AST_DEPTH: usize = 20;
pub const MAX_NODE_COUNT: usize = 500;
pub const MAX_ARRAY_SIZE: usize = 1_000;
pub const BLOCKED_NAMES: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Configurable ceilings. `Limits::default()` yields the documented constants.
///
/// Hosts may load overrides from JSON; omitted fields keep their defaults:
///
/// ```ignore
/// let limits = Limits::from_json_str(r#"{ "max_array_size": 250 }"#)?;
/// assert_eq!(limits.max_node_count, MAX_NODE_COUNT);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum formula length in characters.
    pub max_formula_length: usize,
    /// Maximum nesting depth. The top-level expression is depth 1.
    pub max_ast_depth: usize,
    /// Maximum number of AST nodes in a single formula.
    pub max_node_count: usize,
    /// Maximum length of an array operand.
    pub max_array_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_formula_length: MAX_FORMULA_LENGTH,
            max_ast_depth: MAX_AST_DEPTH,
            max_node_count: MAX_NODE_COUNT,
            max_array_size: MAX_ARRAY_SIZE,
        }
    }
}

impl Limits {
    pub fn from_json_str(json: &str) -> Result<Limits> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn check_formula_length(&self, observed: usize) -> Result<(), LimitError> {
        if observed > self.max_formula_length {
            return Err(LimitError::FormulaLengthExceeded {
                observed,
                limit: self.max_formula_length,
            });
        }
        Ok(())
    }

    pub fn check_depth(&self, observed: usize) -> Result<(), LimitError> {
        if observed > self.max_ast_depth {
            return Err(LimitError::FormulaDepthExceeded {
                observed,
                limit: self.max_ast_depth,
            });
        }
        Ok(())
    }

    pub fn check_node_count(&self, observed: usize) -> Result<(), LimitError> {
        if observed > self.max_node_count {
            return Err(LimitError::FormulaComplexityExceeded {
                observed,
                limit: self.max_node_count,
            });
        }
        Ok(())
    }

    pub fn check_array_size(&self, observed: usize) -> Result<(), LimitError> {
        if observed > self.max_array_size {
            return Err(LimitError::ArraySizeExceeded {
                observed,
                limit: self.max_array_size,
            });
        }
        Ok(())
    }
}

/// Rejects names that exactly match [`BLOCKED_NAMES`]. Names merely containing
/// them (`my_constructor`) are accepted.
pub fn check_name(name: &str) -> Result<(), LimitError> {
    if is_blocked_name(name) {
        return Err(LimitError::BlockedPropertyAccess {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn is_blocked_name(name: &str) -> bool {
    BLOCKED_NAMES.contains(&name)
}
