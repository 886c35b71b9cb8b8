// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hardened parser and evaluator for computed form fields.
//!
//! Formulas such as `(str + dex) * 2` or `sum(damageRolls)` are parsed once
//! into an AST and evaluated repeatedly against per-entity data. Formulas are
//! untrusted, so parsing and evaluation are bounded by the limits in
//! [`utils::limits`].
//!
//! ```ignore
//! use formulary::{Engine, FormComputedField, Value};
//!
//! let engine = Engine::new();
//! engine.parse_formula("power", "(str + dex) * 2")?;
//!
//! let field = FormComputedField::new("power", "(str + dex) * 2");
//! let context = Value::from_json_str(r#"{"str": 3, "dex": 4}"#)?;
//! assert_eq!(engine.evaluate(&field, &context)?, Value::from(14.0));
//! ```

mod ast;
mod builtins;
mod engine;
mod error;
mod interpreter;
mod lexer;
mod parser;
pub mod utils;
mod value;

#[cfg(feature = "arc")]
pub(crate) use std::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub(crate) use std::rc::Rc;

pub use engine::{CachedFormula, Engine, FormComputedField, FormulaCache, ValidationResult};
pub use error::FormulaError;
pub use utils::limits::{LimitError, Limits};
pub use value::{Float, Value};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::interpreter::*;
    pub use crate::lexer::*;
    pub use crate::parser::*;
}
