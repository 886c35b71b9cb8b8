// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::error::FormulaError;
use crate::interpreter::*;
use crate::parser::*;
use crate::utils::limits::Limits;
use crate::value::*;
use crate::Rc;

use std::collections::{BTreeMap, HashMap};

use log::{debug, trace, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

type Result<T> = core::result::Result<T, FormulaError>;

/// A computed field as it appears in a form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormComputedField {
    pub id: String,
    pub formula: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default = "FormComputedField::computed")]
    pub kind: String,
}

impl FormComputedField {
    pub fn new(id: &str, formula: &str) -> Self {
        Self {
            id: id.to_string(),
            formula: formula.to_string(),
            label: String::new(),
            kind: Self::computed(),
        }
    }

    fn computed() -> String {
        "computed".to_string()
    }
}

/// Outcome of [`Engine::validate_formula`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A parsed formula together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct CachedFormula {
    source: Rc<str>,
    expr: Ref<Expr>,
}

impl CachedFormula {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Ref<Expr> {
        &self.expr
    }
}

/// Parsed formulas keyed by field id.
///
/// Entries are replaced by re-parsing and are never evicted implicitly.
/// Readers clone the entry out of the lock before evaluating it.
#[derive(Debug, Default)]
pub struct FormulaCache {
    entries: RwLock<HashMap<String, CachedFormula>>,
}

impl FormulaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, field_id: &str, formula: CachedFormula) {
        self.entries.write().insert(field_id.to_string(), formula);
    }

    pub fn get(&self, field_id: &str) -> Option<CachedFormula> {
        self.entries.read().get(field_id).cloned()
    }

    pub fn remove(&self, field_id: &str) -> Option<CachedFormula> {
        self.entries.write().remove(field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.entries.read().contains_key(field_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Ids of all cached fields, sorted.
    pub fn field_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// The formula evaluation engine.
#[derive(Debug, Clone)]
pub struct Engine {
    cache: Rc<FormulaCache>,
    limits: Limits,
}

/// Create a default engine.
impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_cache(Rc::new(FormulaCache::new()))
    }

    /// Create an engine that shares `cache` with its other owners.
    pub fn with_cache(cache: Rc<FormulaCache>) -> Self {
        Self {
            cache,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn cache(&self) -> &Rc<FormulaCache> {
        &self.cache
    }

    // Diagnostics always name the source `formula` so that validation reports
    // exactly what parsing a field would.
    fn compile(&self, formula: &str) -> Result<Expr> {
        Parser::parse_str("formula", formula, &self.limits)
    }

    /// Parse `formula` and cache it under `field_id`.
    ///
    /// An existing entry is replaced only when parsing succeeds.
    pub fn parse_formula(&self, field_id: &str, formula: &str) -> Result<()> {
        let expr = self.compile(formula)?;
        debug!(
            "parsed formula for `{field_id}` ({} nodes)",
            expr.node_count()
        );
        self.cache.insert(
            field_id,
            CachedFormula {
                source: formula.into(),
                expr: Ref::new(expr),
            },
        );
        Ok(())
    }

    /// Evaluate the cached formula of `field` against `context`.
    ///
    /// The formula must have been parsed with [`Engine::parse_formula`].
    pub fn evaluate(&self, field: &FormComputedField, context: &Value) -> Result<Value> {
        let cached = self
            .cache
            .get(&field.id)
            .ok_or_else(|| FormulaError::NotParsed {
                field_id: field.id.clone(),
            })?;
        trace!("evaluating `{}`", field.id);
        Interpreter::new(context, &self.limits).eval(&cached.expr)
    }

    /// Check `formula` without caching it.
    pub fn validate_formula(&self, formula: &str) -> ValidationResult {
        match self.compile(formula) {
            Ok(_) => ValidationResult {
                valid: true,
                error: None,
            },
            Err(e) => ValidationResult {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }

    /// Parse and evaluate `formula` in one step, bypassing the cache.
    pub fn eval_formula(&self, formula: &str, context: &Value) -> Result<Value> {
        let expr = self.compile(formula)?;
        Interpreter::new(context, &self.limits).eval(&expr)
    }

    /// Parse every field of a form. Fields that fail are reported by id and
    /// do not prevent the others from being cached.
    pub fn parse_form(&self, fields: &[FormComputedField]) -> BTreeMap<String, FormulaError> {
        let mut errors = BTreeMap::new();
        for field in fields {
            if let Err(e) = self.parse_formula(&field.id, &field.formula) {
                warn!("rejected formula for `{}`: {e}", field.id);
                errors.insert(field.id.clone(), e);
            }
        }
        errors
    }

    /// Evaluate every field of a form against the same context.
    pub fn evaluate_form(
        &self,
        fields: &[FormComputedField],
        context: &Value,
    ) -> BTreeMap<String, Result<Value>> {
        fields
            .iter()
            .map(|field| (field.id.clone(), self.evaluate(field, context)))
            .collect()
    }
}
