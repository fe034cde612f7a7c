//! A named formula with its own variable scope.

use super::ast::Term;
use super::chars;
use super::error::{EvalError, FormulaError};
use super::evaluator::{self, EvalContext};
use super::functions::RANDOM;
use super::parser::parse_expression;
use super::random::{RandomSource, SharedRandom};
use super::scope::Scope;
use super::value::Number;
use crate::units::{Architectural, Unformat};
use std::cell::RefCell;
use std::fmt;
use tracing::{debug, warn};

/// One formula instance: configuration, the parsed tree and its translated text.
///
/// Every successful [`Expression::set_expression`] replaces the tree; a failed
/// one leaves no tree behind.
pub struct Expression {
    name: Option<String>,
    source: String,
    translated: String,
    root: Option<Term>,
    scope: Scope,
    strict: bool,
    units: Box<dyn Unformat + Send>,
    random: RefCell<Box<dyn RandomSource>>,
}

impl Default for Expression {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("translated", &self.translated)
            .field("root", &self.root)
            .field("scope", &self.scope)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl Expression {
    pub fn new() -> Self {
        Self {
            name: None,
            source: String::new(),
            translated: String::new(),
            root: None,
            scope: Scope::new(),
            strict: false,
            units: Box::new(Architectural),
            random: RefCell::new(Box::new(SharedRandom)),
        }
    }

    /// Draw `random` values from `source` instead of the process-wide generator.
    pub fn with_random_source(mut self, source: impl RandomSource + 'static) -> Self {
        self.random = RefCell::new(Box::new(source));
        self
    }

    /// Convert number literals with `units` instead of [`Architectural`].
    pub fn with_units(mut self, units: impl Unformat + Send + 'static) -> Self {
        self.units = Box::new(units);
        self
    }

    /// Make undeclared variables an evaluation failure instead of zero.
    pub fn set_strict_lookups(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the formula's own name. Variables may not share it.
    pub fn set_name(&mut self, name: &str) -> Result<(), FormulaError> {
        check_identifier(name)?;
        if self.scope.contains(name) {
            return Err(reject(FormulaError::DuplicateKey(name.to_string())));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Declare or overwrite a variable.
    pub fn declare_variable(&mut self, name: &str, value: f64) -> Result<(), FormulaError> {
        check_identifier(name)?;
        if self.is_own_name(name) {
            return Err(reject(FormulaError::DuplicateKey(name.to_string())));
        }
        self.scope.declare(name, value);
        Ok(())
    }

    /// Declare a variable whose value is folded into the tree at parse time.
    pub fn declare_fixed_variable(&mut self, name: &str, value: f64) -> Result<(), FormulaError> {
        self.declare_variable(name, value)?;
        self.scope.mark_fixed(name);
        Ok(())
    }

    /// Show `name` as `display` in the translated text. Lookups keep using `name`.
    pub fn rename_variable(&mut self, name: &str, display: &str) {
        self.scope.rename(name, display);
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Parse `text`, replacing any previous tree.
    pub fn set_expression(&mut self, text: &str) -> Result<(), FormulaError> {
        self.source = text.to_string();
        self.root = None;
        self.translated.clear();

        match parse_expression(text, &self.scope, self.units.as_ref()) {
            Ok(parsed) => {
                debug!("Parsed '{}' as '{}'", text, parsed.translated);
                self.root = Some(parsed.term);
                self.translated = parsed.translated;
                Ok(())
            }
            Err(e) => {
                warn!("Rejected expression '{}': {}", text, e);
                Err(FormulaError::InvalidInput(e))
            }
        }
    }

    /// The text last passed to [`Expression::set_expression`].
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source text with fixed-variable values and display names substituted.
    pub fn translated_text(&self) -> &str {
        &self.translated
    }

    pub fn term(&self) -> Option<&Term> {
        self.root.as_ref()
    }

    /// Evaluate the current tree; `None` on any evaluation failure.
    pub fn evaluate(&self) -> Option<f64> {
        match self.try_evaluate() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Evaluation of '{}' failed: {}", self.source, e);
                None
            }
        }
    }

    pub fn try_evaluate(&self) -> Result<f64, EvalError> {
        let root = self.root.as_ref().ok_or(EvalError::NoExpression)?;
        let mut random = self.random.borrow_mut();
        EvalContext::new(&self.scope, &mut **random)
            .strict(self.strict)
            .eval(root)
    }

    /// [`Expression::evaluate`] widened to the host number type.
    pub fn value(&self) -> Option<Number> {
        self.evaluate().map(Number::from)
    }

    /// True unless the tree reads a variable or draws a random number.
    pub fn is_const_expression(&self) -> bool {
        self.root.as_ref().map_or(true, evaluator::is_constant)
    }

    /// Append the free variables of the tree to `names`.
    pub fn collect_variables(&self, names: &mut Vec<String>) {
        if let Some(root) = &self.root {
            evaluator::collect_variables(root, names);
        }
    }

    fn is_own_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|own| own.to_lowercase() == name.to_lowercase())
    }
}

fn check_identifier(name: &str) -> Result<(), FormulaError> {
    let valid = name.chars().next().is_some_and(|c| !chars::is_digit(c))
        && name.chars().all(chars::is_word);
    if !valid {
        return Err(reject(FormulaError::InvalidName(name.to_string())));
    }
    if name.to_lowercase() == RANDOM {
        return Err(reject(FormulaError::ReservedName(name.to_string())));
    }
    Ok(())
}

fn reject(error: FormulaError) -> FormulaError {
    warn!("{}", error);
    error
}
