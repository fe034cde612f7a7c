//! Formula language: tokenizer, parser, tree and evaluator.
//!
//! Provides:
//! - Arithmetic with `+ - * / % ^` and parentheses
//! - Case-insensitive variables, with `pi` and `e` pre-declared
//! - Fixed variables folded into the tree at parse time
//! - Display-only renames applied to the translated text
//! - Built-in functions (degree-based trigonometry, rounding, `pow`, `max`, ...)
//! - Architectural feet/inches literals such as `5'-6 1/2"`

pub mod ast;
pub mod chars;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod random;
pub mod scope;
pub mod value;

#[cfg(test)]
mod tests;

pub use ast::{BinaryOperator, Term};
pub use error::{EvalError, FormulaError, ParseError};
pub use evaluator::{collect_variables, is_constant, EvalContext};
pub use expression::Expression;
pub use parser::{parse_expression, Parsed};
pub use random::{RandomSource, SharedRandom};
pub use scope::Scope;
pub use value::Number;
