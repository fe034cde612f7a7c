//! Tree-walking evaluation and static queries over a parsed [`Term`].

use super::ast::{BinaryOperator, Term};
use super::error::EvalError;
use super::functions::{self, round_half_up};
use super::random::RandomSource;
use super::scope::{is_builtin_constant, Scope};
use tracing::warn;

/// Evaluation context
pub struct EvalContext<'a> {
    scope: &'a Scope,
    random: &'a mut dyn RandomSource,
    /// Fail on undeclared names instead of reading them as zero
    strict: bool,
}

impl<'a> EvalContext<'a> {
    pub fn new(scope: &'a Scope, random: &'a mut dyn RandomSource) -> Self {
        Self {
            scope,
            random,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Variables are read from the scope on every call, never snapshotted.
    pub fn eval(&mut self, term: &Term) -> Result<f64, EvalError> {
        match term {
            Term::Number(n) => Ok(*n),

            Term::Variable(name) => self.lookup(name),

            Term::UnaryMinus(operand) => Ok(-self.eval(operand)?),

            Term::Random => Ok(self.random.draw()),

            Term::BinaryOp { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;

                match op {
                    BinaryOperator::Add => Ok(l + r),
                    BinaryOperator::Sub => Ok(l - r),
                    BinaryOperator::Mul => Ok(l * r),
                    BinaryOperator::Div => Ok(l / r),
                    BinaryOperator::Mod => modulo(l, r),
                    BinaryOperator::Pow => Ok(l.powf(r)),
                }
            }

            Term::Function { name, arg } => {
                let f = functions::registry()
                    .unary(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                Ok(f(self.eval(arg)?))
            }

            Term::Function2 {
                name,
                first,
                second,
            } => {
                let f = functions::registry()
                    .binary(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                Ok(f(self.eval(first)?, self.eval(second)?))
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<f64, EvalError> {
        match self.scope.value(name) {
            Some(value) => Ok(value),
            None if self.strict => Err(EvalError::UndefinedVariable(name.to_string())),
            None => {
                warn!("Undeclared variable '{}' evaluated as 0", name);
                Ok(0.0)
            }
        }
    }
}

/// `round(l) mod round(r)` on integers; the sign follows the dividend.
fn modulo(l: f64, r: f64) -> Result<f64, EvalError> {
    let dividend = round_half_up(l) as i64;
    let divisor = round_half_up(r) as i64;
    dividend
        .checked_rem(divisor)
        .map(|rem| rem as f64)
        .ok_or(EvalError::InvalidModulo { dividend, divisor })
}

/// False when the term or any descendant reads a variable or draws a random number.
pub fn is_constant(term: &Term) -> bool {
    match term {
        Term::Variable(_) | Term::Random => false,
        _ => term.children().into_iter().all(is_constant),
    }
}

/// Append the variable names of `term` to `names`, children before parents.
///
/// Built-in constants are skipped. A name is appended when `names` is empty
/// at that moment, otherwise only when not already present.
pub fn collect_variables(term: &Term, names: &mut Vec<String>) {
    for child in term.children() {
        collect_variables(child, names);
    }
    if let Term::Variable(name) = term {
        if is_builtin_constant(name) {
            return;
        }
        // Equivalent to `!names.contains(name)`; the empty case is spelled out
        // because callers may pass a pre-seeded accumulator.
        if names.is_empty() || !names.contains(name) {
            names.push(name.clone());
        }
    }
}
